use futures::channel::oneshot;
use futures::future::BoxFuture;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Source of timeouts for render attempts.
///
/// Kept as a capability so the pipeline works under any executor (or none).
pub trait Timer: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Sleeps on a dedicated thread and wakes the awaiting future through a channel.
///
/// Dropping the returned future (for example because the render finished first) wakes the thread
/// immediately, so no thread outlives the render it was guarding.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadTimer;

impl Timer for ThreadTimer {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        match spawn_sleeper(duration) {
            Some((future, _)) => future,
            None => {
                tracing::warn!("failed to start timeout thread; render will not be bounded");
                Box::pin(futures::future::pending())
            }
        }
    }
}

fn spawn_sleeper(duration: Duration) -> Option<(BoxFuture<'static, ()>, JoinHandle<()>)> {
    let (fire_tx, fire_rx) = oneshot::channel::<()>();
    // Never sent on: dropping the sender disconnects the channel and cancels the sleep.
    let (cancel_tx, cancel_rx) = mpsc::channel::<()>();

    let handle = std::thread::Builder::new()
        .name("render-timeout".to_string())
        .spawn(move || {
            if let Err(mpsc::RecvTimeoutError::Timeout) = cancel_rx.recv_timeout(duration) {
                let _ = fire_tx.send(());
            }
        })
        .ok()?;

    let future = Box::pin(async move {
        let _cancel = cancel_tx;
        let _ = fire_rx.await;
    });
    Some((future, handle))
}
