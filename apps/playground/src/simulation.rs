//! Scripted reactive layer driving one controller against a simulated backend.

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use fetch_controller::{
    args, Args, Controller, ControllerConfig, Fetcher, Snapshot, StateReducer, UpdateMeta,
};
use serde::Serialize;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::info;

use crate::config::PlaygroundSettings;

/// Answers after a latency derived from the args, so runs are reproducible
/// while completions still arrive out of order. Args starting with `fail`
/// produce an error.
pub struct SimulatedBackend {
    min_latency: Duration,
    spread_ms: u64,
}

impl SimulatedBackend {
    pub fn new(min_latency_ms: u64, max_latency_ms: u64) -> Self {
        Self {
            min_latency: Duration::from_millis(min_latency_ms),
            spread_ms: max_latency_ms.saturating_sub(min_latency_ms),
        }
    }

    fn latency_for(&self, key: &str) -> Duration {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let jitter = hasher.finish() % self.spread_ms.saturating_add(1);
        self.min_latency + Duration::from_millis(jitter)
    }
}

#[async_trait]
impl Fetcher<String> for SimulatedBackend {
    async fn fetch(&self, args: Args) -> Result<String> {
        let key = args.to_string();
        tokio::time::sleep(self.latency_for(&key)).await;
        if key.starts_with("fail") {
            return Err(anyhow!("simulated backend failure for `{key}`"));
        }
        Ok(format!("result:{key}"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlaygroundState {
    pub last: String,
    pub history: Vec<String>,
}

pub struct HistoryReducer;

impl StateReducer<PlaygroundState, String> for HistoryReducer {
    fn update(
        &self,
        previous: &PlaygroundState,
        result: String,
        meta: &UpdateMeta<'_>,
    ) -> PlaygroundState {
        let mut history = previous.history.clone();
        history.push(format!("#{} {}", meta.invocation, meta.args));
        PlaygroundState {
            last: result,
            history,
        }
    }
}

/// One rendered evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub step: usize,
    pub args: String,
    pub loading: bool,
    pub state: PlaygroundState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Frame {
    fn capture(step: usize, args: &Args, snapshot: &Snapshot<PlaygroundState>) -> Self {
        Self {
            step,
            args: args.to_string(),
            loading: snapshot.loading,
            state: (*snapshot.state).clone(),
            error: snapshot.error.as_ref().map(ToString::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub frames: Vec<Frame>,
    pub issued: u64,
}

pub async fn run(settings: &PlaygroundSettings) -> Result<Report> {
    let controller = Controller::new(
        SimulatedBackend::new(settings.min_latency_ms, settings.max_latency_ms),
        ControllerConfig::with_reducer(PlaygroundState::default(), HistoryReducer)
            .settings(settings.controller.clone()),
    )?;
    let mut events = controller.subscribe();
    let mut frames = Vec::new();

    for (step, raw) in settings.script.iter().enumerate() {
        let current = args![raw.as_str()];
        let snapshot = controller.evaluate(current.clone());
        frames.push(Frame::capture(step, &current, &snapshot));
        tokio::time::sleep(Duration::from_millis(settings.step_ms)).await;

        // Re-render once per signal that arrived during the pause.
        loop {
            match events.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => {
                    let snapshot = controller.evaluate(current.clone());
                    frames.push(Frame::capture(step, &current, &snapshot));
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Closed) => bail!("controller event channel closed"),
            }
        }
    }

    let last_step = settings.script.len().saturating_sub(1);
    let current = settings
        .script
        .last()
        .map(|raw| args![raw.as_str()])
        .unwrap_or_default();
    loop {
        let snapshot = controller.evaluate(current.clone());
        if !snapshot.loading {
            frames.push(Frame::capture(last_step, &current, &snapshot));
            break;
        }
        match events.recv().await {
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => bail!("controller event channel closed"),
        }
    }

    let issued = controller.issued_count();
    info!(controller = controller.name(), issued, frames = frames.len(), "script finished");
    Ok(Report { frames, issued })
}

#[cfg(test)]
#[path = "tests/simulation_tests.rs"]
mod tests;
