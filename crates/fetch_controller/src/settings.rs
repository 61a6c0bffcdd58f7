use serde::Deserialize;
use shared::ControllerError;

const DEFAULT_NAME: &str = "controller";
const DEFAULT_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Label attached to every log line of the instance.
    pub name: String,
    /// Buffer of the broadcast channel behind [`Controller::subscribe`].
    ///
    /// [`Controller::subscribe`]: crate::Controller::subscribe
    pub event_capacity: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.into(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ControllerSettings {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ControllerError> {
        if self.name.trim().is_empty() {
            return Err(ControllerError::InvalidSettings(
                "controller name must not be empty".into(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(ControllerError::InvalidSettings(format!(
                "event_capacity for `{}` must be at least 1",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = ControllerSettings::default();
        assert_eq!(settings.name, "controller");
        assert_eq!(settings.event_capacity, 64);
        settings.validate().expect("defaults validate");
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let settings: ControllerSettings = toml::from_str("name = \"search\"").expect("parse");
        assert_eq!(settings, ControllerSettings::named("search"));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let settings: ControllerSettings = toml::from_str("event_capacity = 0").expect("parse");
        let err = settings.validate().expect_err("zero capacity");
        assert!(err.to_string().contains("event_capacity"));
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(ControllerSettings::named("  ").validate().is_err());
    }
}
