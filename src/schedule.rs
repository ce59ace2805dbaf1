use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Run `cycle` immediately and then once per `every` until `token` is cancelled
///
/// A cycle that overruns the period delays the next one instead of queueing
/// catch-up runs. A cycle in progress is never interrupted here; it is
/// expected to watch `token` itself. Returns the number of cycles run.
pub async fn run_every<F, Fut>(every: Duration, token: CancellationToken, mut cycle: F) -> u64
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut cycles = 0;
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        cycles += 1;
        debug!("starting cycle {}", cycles);
        cycle(cycles).await;

        if token.is_cancelled() {
            break;
        }
    }

    info!("scheduler stopped after {} cycles", cycles);
    cycles
}
