mod common;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use common::{next_event, render, FooState};
use fetch_controller::{
    args, create_controller, Args, Controller, ControllerConfig, ControllerEvent, EvaluateInput,
    UpdateMeta, Value,
};
use futures::{future::BoxFuture, FutureExt};
use tokio::sync::broadcast;

/// Stand-in for a rendering component: evaluates on every cycle and waits
/// for the change signal while loading.
struct Component {
    controller: Controller<FooState, String>,
    events: broadcast::Receiver<ControllerEvent>,
}

impl Component {
    fn mount(controller: Controller<FooState, String>) -> Self {
        let events = controller.subscribe();
        Self { controller, events }
    }

    fn render(&self, args: &Args) -> String {
        render(&self.controller.evaluate(args.clone()))
    }

    /// Re-renders until "loading" is gone, like waiting for an element to be removed.
    async fn settle(&mut self, args: &Args) -> String {
        loop {
            let content = self.render(args);
            if content != "loading" {
                return content;
            }
            next_event(&mut self.events).await;
        }
    }
}

fn take_result(_: &FooState, result: String, _: &UpdateMeta<'_>) -> FooState {
    FooState { foo: result }
}

async fn do_async(args: Args) -> anyhow::Result<String> {
    match args.first() {
        Some(arg) => Ok(format!("async-result:{arg}")),
        None => Ok("async-result".to_string()),
    }
}

type Reply = BoxFuture<'static, anyhow::Result<String>>;

fn counting_fetcher(calls: &Arc<AtomicUsize>) -> impl Fn(Args) -> Reply + Send + Sync + 'static {
    let calls = Arc::clone(calls);
    move |args: Args| {
        calls.fetch_add(1, Ordering::SeqCst);
        do_async(args).boxed()
    }
}

#[tokio::test]
async fn can_show_loading_and_content() {
    async fn constant(_args: Args) -> anyhow::Result<String> {
        Ok("async-result".to_string())
    }
    let controller =
        create_controller(constant, ControllerConfig::new(FooState::empty(), take_result))
            .expect("controller");
    let mut events = controller.subscribe();

    let first = controller.evaluate(EvaluateInput::default());
    assert!(first.loading);
    assert_eq!(*first.state, FooState::empty());

    next_event(&mut events).await;
    let settled = controller.evaluate(EvaluateInput::default());
    assert!(!settled.loading);
    assert_eq!(settled.state.foo, "async-result");
}

#[tokio::test]
async fn can_use_fetcher_args() {
    let controller =
        Controller::new(do_async, ControllerConfig::new(FooState::empty(), take_result))
            .expect("controller");
    let mut component = Component::mount(controller);
    let args = args!["testarg"];

    assert_eq!(component.render(&args), "loading");
    assert_eq!(component.settle(&args).await, "async-result:testarg");
}

#[tokio::test]
async fn can_use_args_in_update() {
    let controller = Controller::new(
        do_async,
        ControllerConfig::new(
            FooState::empty(),
            |_: &FooState, _: String, meta: &UpdateMeta<'_>| FooState {
                foo: format!("fromupdate:{}", meta.args),
            },
        ),
    )
    .expect("controller");
    let mut component = Component::mount(controller);
    let args = args!["testarg"];

    assert_eq!(component.render(&args), "loading");
    assert_eq!(component.settle(&args).await, "fromupdate:testarg");
}

#[tokio::test]
async fn args_change_triggers_fetch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let controller = Controller::new(
        counting_fetcher(&calls),
        ControllerConfig::new(FooState::empty(), take_result),
    )
    .expect("controller");
    let mut component = Component::mount(controller);

    let first = args!["first"];
    assert_eq!(component.render(&first), "loading");
    assert_eq!(component.settle(&first).await, "async-result:first");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let second = args!["second"];
    assert_eq!(component.render(&second), "loading");
    assert_eq!(component.settle(&second).await, "async-result:second");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(component.controller.issued_count(), 2);
}

#[tokio::test]
async fn args_are_checked_deeply() {
    fn deep_value() -> Args {
        args![Value::record([(
            "deep",
            Value::record([("value", Value::from("value"))]),
        )])]
    }
    async fn read_deep(args: Args) -> anyhow::Result<String> {
        let value = args
            .first()
            .and_then(|v| v.get("deep").get("value").as_str().map(str::to_owned))
            .unwrap_or_default();
        Ok(format!("async-result:{value}"))
    }

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let controller = Controller::new(
        move |args: Args| {
            counter.fetch_add(1, Ordering::SeqCst);
            read_deep(args)
        },
        ControllerConfig::new(FooState::empty(), take_result),
    )
    .expect("controller");
    let mut component = Component::mount(controller);

    assert_eq!(component.render(&deep_value()), "loading");
    assert_eq!(component.settle(&deep_value()).await, "async-result:value");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Deeply the same value, freshly built.
    assert_eq!(component.render(&deep_value()), "async-result:value");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(component.controller.issued_count(), 1);
}

#[tokio::test]
async fn repeated_evaluation_with_unchanged_args_is_a_no_op() {
    let calls = Arc::new(AtomicUsize::new(0));
    let controller = Controller::new(
        counting_fetcher(&calls),
        ControllerConfig::new(FooState::empty(), take_result),
    )
    .expect("controller");
    let mut component = Component::mount(controller);
    let args = args!["same", 1, true];

    component.settle(&args).await;
    for _ in 0..10 {
        assert_eq!(component.render(&args), "async-result:same");
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(component.controller.issued_count(), 1);
}

#[tokio::test]
async fn missing_args_are_the_empty_list() {
    let calls = Arc::new(AtomicUsize::new(0));
    let controller = Controller::new(
        counting_fetcher(&calls),
        ControllerConfig::new(FooState::empty(), take_result),
    )
    .expect("controller");
    let mut events = controller.subscribe();

    controller.evaluate(EvaluateInput::default());
    next_event(&mut events).await;
    let snapshot = controller.evaluate(Args::empty());
    assert!(!snapshot.loading);
    assert_eq!(snapshot.state.foo, "async-result");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
