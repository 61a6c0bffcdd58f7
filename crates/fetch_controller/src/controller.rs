use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use shared::{Args, ControllerError, ControllerPhase, FetchFailure, InvocationId, SubscriptionId};
use tokio::{runtime::Handle, sync::broadcast};
use tracing::{debug, info, warn};

use crate::{
    fetcher::Fetcher,
    reducer::{StateReducer, UpdateMeta},
    sequencer::Sequencer,
    settings::ControllerSettings,
    tracker::DependencyTracker,
};

type ChangeCallback = Arc<dyn Fn(&ControllerEvent) + Send + Sync>;

/// What the reactive layer passes on each evaluation. Missing args is the
/// empty parameter list.
#[derive(Debug, Clone, Default)]
pub struct EvaluateInput {
    pub args: Option<Args>,
}

impl EvaluateInput {
    pub fn with_args(args: Args) -> Self {
        Self { args: Some(args) }
    }
}

impl From<Args> for EvaluateInput {
    fn from(args: Args) -> Self {
        Self::with_args(args)
    }
}

/// The `{loading, state}` pair returned by every evaluation, plus the last
/// accepted failure.
pub struct Snapshot<S> {
    pub loading: bool,
    pub state: Arc<S>,
    pub error: Option<FetchFailure>,
}

impl<S> Snapshot<S> {
    pub fn phase(&self) -> ControllerPhase {
        if self.loading {
            ControllerPhase::Fetching
        } else {
            ControllerPhase::Idle
        }
    }
}

impl<S> Clone for Snapshot<S> {
    fn clone(&self) -> Self {
        Self {
            loading: self.loading,
            state: Arc::clone(&self.state),
            error: self.error.clone(),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Snapshot<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("loading", &self.loading)
            .field("state", &self.state)
            .field("error", &self.error)
            .finish()
    }
}

/// Emitted once per accepted completion. Stale completions emit nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    Settled {
        invocation: InvocationId,
    },
    Failed {
        invocation: InvocationId,
        failure: FetchFailure,
    },
}

impl ControllerEvent {
    pub fn invocation(&self) -> InvocationId {
        match self {
            ControllerEvent::Settled { invocation }
            | ControllerEvent::Failed { invocation, .. } => *invocation,
        }
    }
}

pub struct ControllerConfig<S, R> {
    initial_state: S,
    reducer: Arc<dyn StateReducer<S, R>>,
    settings: ControllerSettings,
    runtime: Option<Handle>,
}

impl<S, R> ControllerConfig<S, R> {
    pub fn new<F>(initial_state: S, update: F) -> Self
    where
        F: Fn(&S, R, &UpdateMeta<'_>) -> S + Send + Sync + 'static,
    {
        Self::with_reducer(initial_state, update)
    }

    pub fn with_reducer(initial_state: S, reducer: impl StateReducer<S, R> + 'static) -> Self {
        Self {
            initial_state,
            reducer: Arc::new(reducer),
            settings: ControllerSettings::default(),
            runtime: None,
        }
    }

    pub fn settings(mut self, settings: ControllerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Runtime completions are spawned on. Defaults to the runtime current at
    /// construction.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }
}

/// One use site's fetch lifecycle: dependency snapshot, invocation sequence
/// and accumulated state.
///
/// Cloning yields another handle to the same instance.
pub struct Controller<S, R> {
    shared: Arc<Shared<S, R>>,
}

impl<S, R> Clone for Controller<S, R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct Shared<S, R> {
    name: String,
    fetcher: Arc<dyn Fetcher<R>>,
    reducer: Arc<dyn StateReducer<S, R>>,
    runtime: Handle,
    events: broadcast::Sender<ControllerEvent>,
    listeners: Mutex<Listeners>,
    core: Mutex<Core<S>>,
}

struct Listeners {
    next: SubscriptionId,
    callbacks: Vec<(SubscriptionId, ChangeCallback)>,
}

struct Core<S> {
    tracker: DependencyTracker,
    sequencer: Sequencer,
    state: Arc<S>,
    error: Option<FetchFailure>,
    settled: Option<InvocationId>,
}

impl<S> Core<S> {
    /// Loading until the latest issued invocation has been accepted.
    fn loading(&self) -> bool {
        self.sequencer.latest() != self.settled
    }

    fn snapshot(&self) -> Snapshot<S> {
        Snapshot {
            loading: self.loading(),
            state: Arc::clone(&self.state),
            error: self.error.clone(),
        }
    }
}

pub fn create_controller<S, R>(
    fetcher: impl Fetcher<R> + 'static,
    config: ControllerConfig<S, R>,
) -> Result<Controller<S, R>, ControllerError>
where
    S: Send + Sync + 'static,
    R: Send + 'static,
{
    Controller::new(fetcher, config)
}

impl<S, R> Controller<S, R>
where
    S: Send + Sync + 'static,
    R: Send + 'static,
{
    pub fn new(
        fetcher: impl Fetcher<R> + 'static,
        config: ControllerConfig<S, R>,
    ) -> Result<Self, ControllerError> {
        let ControllerConfig {
            initial_state,
            reducer,
            settings,
            runtime,
        } = config;
        settings.validate()?;

        let runtime = match runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| ControllerError::NoRuntime {
                name: settings.name.clone(),
            })?,
        };
        let (events, _) = broadcast::channel(settings.event_capacity);

        Ok(Self {
            shared: Arc::new(Shared {
                name: settings.name,
                fetcher: Arc::new(fetcher),
                reducer,
                runtime,
                events,
                listeners: Mutex::new(Listeners {
                    next: SubscriptionId(1),
                    callbacks: Vec::new(),
                }),
                core: Mutex::new(Core {
                    tracker: DependencyTracker::new(),
                    sequencer: Sequencer::new(),
                    state: Arc::new(initial_state),
                    error: None,
                    settled: None,
                }),
            }),
        })
    }

    /// Called by the reactive layer on every evaluation cycle.
    ///
    /// Issues a fetch when the args changed structurally since the previous
    /// call (always on the first call) and returns the state as of now. The
    /// result of that fetch shows up on a later evaluation, after the change
    /// signal fires.
    pub fn evaluate(&self, input: impl Into<EvaluateInput>) -> Snapshot<S> {
        let args = input.into().args.unwrap_or_default();
        let mut core = self.shared.lock_core();
        if !core.tracker.needs_fetch(&args) {
            return core.snapshot();
        }

        let invocation = core.sequencer.issue();
        let snapshot = core.snapshot();
        drop(core);

        debug!(
            controller = %self.shared.name,
            %invocation,
            %args,
            "dependencies changed, issuing fetch"
        );
        self.dispatch(invocation, args);
        snapshot
    }

    /// Re-issues the fetch with the last evaluated args without touching the
    /// dependency snapshot. Returns `None` before the first evaluation.
    pub fn refetch(&self) -> Option<InvocationId> {
        let mut core = self.shared.lock_core();
        let Some(args) = core.tracker.last().cloned() else {
            debug!(controller = %self.shared.name, "refetch ignored before first evaluation");
            return None;
        };
        let invocation = core.sequencer.issue();
        drop(core);

        debug!(controller = %self.shared.name, %invocation, %args, "refetch issued");
        self.dispatch(invocation, args);
        Some(invocation)
    }

    /// Current state without evaluating.
    pub fn snapshot(&self) -> Snapshot<S> {
        self.shared.lock_core().snapshot()
    }

    pub fn issued_count(&self) -> u64 {
        self.shared.lock_core().sequencer.issued()
    }

    pub fn latest_invocation(&self) -> Option<InvocationId> {
        self.shared.lock_core().sequencer.latest()
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Registers a callback run once per accepted completion, after the new
    /// state is visible.
    pub fn on_change<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ControllerEvent) + Send + Sync + 'static,
    {
        let mut listeners = self.shared.lock_listeners();
        let id = listeners.next;
        listeners.next = id.next();
        listeners.callbacks.push((id, Arc::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.shared.lock_listeners();
        let before = listeners.callbacks.len();
        listeners.callbacks.retain(|(existing, _)| *existing != id);
        listeners.callbacks.len() != before
    }

    /// Same events as [`Controller::on_change`], for async consumers.
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.shared.events.subscribe()
    }

    fn dispatch(&self, invocation: InvocationId, args: Args) {
        let shared = Arc::clone(&self.shared);
        self.shared.runtime.spawn(async move {
            let fetcher = Arc::clone(&shared.fetcher);
            let outcome = fetcher.fetch(args.clone()).await;
            shared.complete(invocation, &args, outcome);
        });
    }
}

impl<S, R> Shared<S, R> {
    fn lock_core(&self) -> MutexGuard<'_, Core<S>> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Listeners> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_latest(&self, core: &Core<S>, invocation: InvocationId) -> bool {
        let accepted = core.sequencer.guard().accepts(invocation);
        if !accepted {
            debug!(
                controller = %self.name,
                %invocation,
                latest = ?core.sequencer.latest(),
                "discarding stale completion"
            );
        }
        accepted
    }

    fn complete(&self, invocation: InvocationId, args: &Args, outcome: anyhow::Result<R>) {
        let previous = {
            let core = self.lock_core();
            if !self.is_latest(&core, invocation) {
                return;
            }
            Arc::clone(&core.state)
        };

        let event = match outcome {
            Ok(result) => {
                // The reducer runs unlocked; a panic in it leaves the state untouched.
                let meta = UpdateMeta { args, invocation };
                let next = self.reducer.update(&previous, result, &meta);

                let mut core = self.lock_core();
                if !self.is_latest(&core, invocation) {
                    return;
                }
                core.state = Arc::new(next);
                core.error = None;
                core.settled = Some(invocation);
                info!(controller = %self.name, %invocation, "fetch settled");
                ControllerEvent::Settled { invocation }
            }
            Err(err) => {
                let failure = FetchFailure::new(invocation, format!("{err:#}"));

                let mut core = self.lock_core();
                if !self.is_latest(&core, invocation) {
                    return;
                }
                core.error = Some(failure.clone());
                core.settled = Some(invocation);
                warn!(
                    controller = %self.name,
                    %invocation,
                    error = %failure.message,
                    "fetch failed"
                );
                ControllerEvent::Failed {
                    invocation,
                    failure,
                }
            }
        };

        self.notify(event);
    }

    fn notify(&self, event: ControllerEvent) {
        let callbacks: Vec<ChangeCallback> = self
            .lock_listeners()
            .callbacks
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(&event);
        }
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
