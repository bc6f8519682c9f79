use std::time::Duration;

use async_trait::async_trait;

/// Waits out the gap between two ticks of a tail run.
///
/// The executor differs per front end (tokio natively, the browser's timer
/// queue on the web), so the run only sees this trait.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `tokio::time`.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[cfg(not(target_arch = "wasm32"))]
#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
