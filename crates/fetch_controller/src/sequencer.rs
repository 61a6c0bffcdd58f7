use shared::InvocationId;

/// Hands out strictly increasing invocation ids and remembers the latest one.
#[derive(Debug, Default)]
pub struct Sequencer {
    counter: u64,
    latest: Option<InvocationId>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next id and makes it the latest. Must run before the fetch it
    /// tags is dispatched.
    pub fn issue(&mut self) -> InvocationId {
        let id = self.latest.map_or(InvocationId(1), InvocationId::next);
        self.counter += 1;
        self.latest = Some(id);
        id
    }

    pub fn latest(&self) -> Option<InvocationId> {
        self.latest
    }

    /// Number of invocations issued so far.
    pub fn issued(&self) -> u64 {
        self.counter
    }

    pub fn guard(&self) -> RaceGuard<'_> {
        RaceGuard { sequencer: self }
    }
}

/// Completion-time filter: only the most recently issued invocation may land.
#[derive(Debug, Clone, Copy)]
pub struct RaceGuard<'a> {
    sequencer: &'a Sequencer,
}

impl RaceGuard<'_> {
    pub fn accepts(&self, id: InvocationId) -> bool {
        self.sequencer.latest == Some(id)
    }
}

#[cfg(test)]
#[path = "tests/sequencer_tests.rs"]
mod tests;
