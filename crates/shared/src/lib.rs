//! Data model shared by the fetch controller and the applications driving it.

pub mod domain;
pub mod error;
pub mod value;

pub use domain::{ControllerPhase, InvocationId, SubscriptionId};
pub use error::{ControllerError, FetchFailure};
pub use value::{Args, OpaqueRef, Value};
