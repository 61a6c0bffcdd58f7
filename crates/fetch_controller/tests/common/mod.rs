#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::anyhow;
use fetch_controller::{Args, ControllerEvent, Snapshot};
use futures::{future::BoxFuture, FutureExt};
use tokio::sync::{broadcast, oneshot};

type Reply = anyhow::Result<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooState {
    pub foo: String,
}

impl FooState {
    pub fn empty() -> Self {
        Self { foo: String::new() }
    }
}

/// What the component under test would print.
pub fn render(snapshot: &Snapshot<FooState>) -> String {
    if snapshot.loading {
        "loading".to_string()
    } else {
        snapshot.state.foo.clone()
    }
}

/// Fetches that stay pending until the test resolves them by their args.
#[derive(Clone, Default)]
pub struct Gates {
    pending: Arc<Mutex<Vec<(String, oneshot::Sender<Reply>)>>>,
}

impl Gates {
    pub fn fetcher(&self) -> impl Fn(Args) -> BoxFuture<'static, Reply> + Send + Sync + 'static {
        let pending = Arc::clone(&self.pending);
        move |args: Args| {
            let (tx, rx) = oneshot::channel();
            pending.lock().expect("gates").push((args.to_string(), tx));
            async move {
                match rx.await {
                    Ok(reply) => reply,
                    Err(_) => Err(anyhow!("gate dropped")),
                }
            }
            .boxed()
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().expect("gates").len()
    }

    /// Waits until `count` fetches have started.
    pub async fn started(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.pending() < count {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("fetches did not start in time");
    }

    pub fn resolve(&self, key: &str, reply: Reply) {
        let tx = {
            let mut pending = self.pending.lock().expect("gates");
            let idx = pending
                .iter()
                .position(|(k, _)| k == key)
                .unwrap_or_else(|| panic!("no pending fetch for `{key}`"));
            pending.remove(idx).1
        };
        tx.send(reply).expect("fetch still awaiting");
    }
}

pub async fn next_event(events: &mut broadcast::Receiver<ControllerEvent>) -> ControllerEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("no controller event in time")
        .expect("event channel open")
}

/// Lets already-woken completion tasks run to the end.
pub async fn drain() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
