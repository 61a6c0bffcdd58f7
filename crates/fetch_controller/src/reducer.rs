use shared::{Args, InvocationId};

/// Metadata handed to the reducer alongside an accepted result.
#[derive(Debug, Clone, Copy)]
pub struct UpdateMeta<'a> {
    /// Parameter snapshot the accepted invocation was issued with.
    pub args: &'a Args,
    pub invocation: InvocationId,
}

/// Folds an accepted fetch result into the next application state.
///
/// Implementations must be pure. The returned value replaces the previous state
/// wholesale; the controller calls `update` exactly once per accepted result
/// and never for a stale one.
pub trait StateReducer<S, R>: Send + Sync {
    fn update(&self, previous: &S, result: R, meta: &UpdateMeta<'_>) -> S;
}

impl<S, R, F> StateReducer<S, R> for F
where
    F: Fn(&S, R, &UpdateMeta<'_>) -> S + Send + Sync,
{
    fn update(&self, previous: &S, result: R, meta: &UpdateMeta<'_>) -> S {
        self(previous, result, meta)
    }
}
