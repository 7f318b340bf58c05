use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings
{
    pub interval: Duration,
    pub max_backoff: Duration,
}

impl PollSettings
{
    pub fn new(interval_ms: u64, max_backoff_ms: u64) -> Self
    {
        let interval = Duration::from_millis(interval_ms.max(1));
        Self
        {
            interval,
            max_backoff: Duration::from_millis(max_backoff_ms).max(interval),
        }
    }

    /// Delay before the next tick: doubles after a failure, resets after a success.
    pub fn next_delay(&self, current: Duration, failed: bool) -> Duration
    {
        if failed
        {
            current.saturating_mul(2).min(self.max_backoff)
        }
        else
        {
            self.interval
        }
    }
}

/// Runs `tick` right away, then again after every delay, until `token` is
/// cancelled or the receiver is dropped. One result is sent per tick.
/// `failed` decides which results stretch the delay; an `Ok` may still count.
pub fn spawn_poller<T, F, Fut, P>(settings: PollSettings, token: CancellationToken, mut tick: F, failed: P) -> mpsc::Receiver<Result<T, AppError>>
where
    T: Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, AppError>> + Send + 'static,
    P: Fn(&Result<T, AppError>) -> bool + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);

    tokio::spawn(async move
    {
        // Moitié de l'intervalle : un premier échec attend un intervalle complet.
        let mut delay = settings.interval / 2;

        loop
        {
            let result = tokio::select!
            {
                _ = token.cancelled() => break,
                result = tick() => result,
            };

            delay = settings.next_delay(delay, failed(&result));

            tokio::select!
            {
                _ = token.cancelled() => break,
                sent = tx.send(result) => if sent.is_err() { break },
            }

            tokio::select!
            {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {},
            }
        }

        debug!("Poller stopped.");
    });

    rx
}
