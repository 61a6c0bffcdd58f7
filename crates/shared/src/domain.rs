use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(InvocationId);
id_newtype!(SubscriptionId);

impl InvocationId {
    /// Id following this one. Ids start at 1, so 0 is never handed out.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl SubscriptionId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerPhase {
    Idle,
    Fetching,
}

impl ControllerPhase {
    pub fn is_loading(self) -> bool {
        self == ControllerPhase::Fetching
    }
}
