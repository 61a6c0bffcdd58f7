use std::future::Future;

use async_trait::async_trait;
use shared::Args;

/// The wrapped asynchronous operation.
///
/// The controller never cancels a running fetch; superseded results are
/// dropped when they arrive.
#[async_trait]
pub trait Fetcher<R>: Send + Sync {
    async fn fetch(&self, args: Args) -> anyhow::Result<R>;
}

#[async_trait]
impl<R, F, Fut> Fetcher<R> for F
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    R: Send + 'static,
{
    async fn fetch(&self, args: Args) -> anyhow::Result<R> {
        self(args).await
    }
}
