//! Dependency-tracked, race-safe wrapper around an asynchronous fetcher.
//!
//! A [`Controller`] is evaluated by a reactive layer once per render cycle. It
//! re-invokes the fetcher only when the parameters changed structurally, drops
//! results from superseded invocations, and folds accepted results into the
//! exposed state through a caller-supplied reducer.

pub mod compare;
mod controller;
pub mod fetcher;
pub mod reducer;
pub mod sequencer;
pub mod settings;
pub mod tracker;

pub use controller::{
    create_controller, Controller, ControllerConfig, ControllerEvent, EvaluateInput, Snapshot,
};
pub use fetcher::Fetcher;
pub use reducer::{StateReducer, UpdateMeta};
pub use sequencer::{RaceGuard, Sequencer};
pub use settings::ControllerSettings;
pub use shared::{
    args, Args, ControllerError, ControllerPhase, FetchFailure, InvocationId, SubscriptionId, Value,
};
pub use tracker::DependencyTracker;
