use std::{fs, io, path::Path};

use anyhow::{bail, Context};
use fetch_controller::ControllerSettings;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlaygroundSettings {
    pub controller: ControllerSettings,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
    /// Pause between two scripted argument changes.
    pub step_ms: u64,
    pub script: Vec<String>,
}

impl Default for PlaygroundSettings {
    fn default() -> Self {
        Self {
            controller: ControllerSettings::named("playground"),
            min_latency_ms: 20,
            max_latency_ms: 200,
            step_ms: 50,
            script: ["first", "second", "second", "third"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl PlaygroundSettings {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.controller.validate()?;
        if self.min_latency_ms > self.max_latency_ms {
            bail!(
                "min_latency_ms ({}) exceeds max_latency_ms ({})",
                self.min_latency_ms,
                self.max_latency_ms
            );
        }
        if self.script.is_empty() {
            bail!("script must contain at least one step");
        }
        Ok(())
    }
}

/// File first, then `PLAYGROUND__*` environment overrides.
pub fn load_settings(path: &Path) -> anyhow::Result<PlaygroundSettings> {
    let mut settings = match fs::read_to_string(path) {
        Ok(raw) => toml::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => PlaygroundSettings::default(),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_env_overrides(settings: &mut PlaygroundSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("PLAYGROUND__NAME") {
        settings.controller.name = v;
    }
    if let Some(v) = lookup("PLAYGROUND__EVENT_CAPACITY") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.controller.event_capacity = parsed;
        }
    }
    if let Some(v) = lookup("PLAYGROUND__MIN_LATENCY_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.min_latency_ms = parsed;
        }
    }
    if let Some(v) = lookup("PLAYGROUND__MAX_LATENCY_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.max_latency_ms = parsed;
        }
    }
    if let Some(v) = lookup("PLAYGROUND__STEP_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.step_ms = parsed;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
