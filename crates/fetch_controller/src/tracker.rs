use shared::Args;

use crate::compare;

/// Remembers the parameter snapshot of the previous evaluation.
///
/// Only one snapshot is kept, so returning to an older parameter list after a
/// change counts as a fresh change.
#[derive(Debug, Default)]
pub struct DependencyTracker {
    last: Option<Args>,
}

impl DependencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True on the first call and whenever `params` differs structurally from
    /// the previous call. The snapshot is overwritten either way.
    pub fn needs_fetch(&mut self, params: &Args) -> bool {
        let changed = match &self.last {
            None => true,
            Some(previous) => !compare::args_equal(previous, params),
        };
        self.last = Some(params.clone());
        changed
    }

    pub fn last(&self) -> Option<&Args> {
        self.last.as_ref()
    }
}

#[cfg(test)]
#[path = "tests/tracker_tests.rs"]
mod tests;
