use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

/// Identifies one armed tick source. Ticks carrying a token that no
/// longer matches the armed source are stale and must be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickToken(u64);

impl TickToken {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Cancellable source of one-second tick events.
///
/// At most one source is armed at a time; arming a new one replaces
/// the old. A queued tick can still arrive after its source was
/// cancelled, which is why consumers check the token.
pub trait ClockSource {
    fn schedule_repeating(&mut self, period: Duration) -> TickToken;
    fn cancel(&mut self, token: TickToken);
}

pub type TickSender = mpsc::UnboundedSender<TickToken>;
pub type TickReceiver = mpsc::UnboundedReceiver<TickToken>;

/// Tokio-backed clock: each armed source is a spawned task sending its
/// token over the channel once per period. The first tick fires a full
/// period after arming, so a restart never carries elapsed offset.
pub struct TokioClock {
    tick_tx: TickSender,
    task: Option<JoinHandle<()>>,
    next_id: u64,
}

impl TokioClock {
    pub fn new() -> (Self, TickReceiver) {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        (
            Self {
                tick_tx,
                task: None,
                next_id: 0,
            },
            tick_rx,
        )
    }

    fn abort_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl ClockSource for TokioClock {
    fn schedule_repeating(&mut self, period: Duration) -> TickToken {
        self.abort_task();
        self.next_id += 1;
        let token = TickToken::new(self.next_id);
        let tick_tx = self.tick_tx.clone();
        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                if tick_tx.send(token).is_err() {
                    break;
                }
            }
        }));
        token
    }

    fn cancel(&mut self, _token: TickToken) {
        self.abort_task();
    }
}

impl Drop for TokioClock {
    fn drop(&mut self) {
        self.abort_task();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    const PERIOD: Duration = Duration::from_secs(1);

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_arrives_after_a_full_period() {
        let (mut clock, mut tick_rx) = TokioClock::new();
        let token = clock.schedule_repeating(PERIOD);

        advance(Duration::from_millis(999)).await;
        tokio::task::yield_now().await;
        assert!(tick_rx.try_recv().is_err(), "no tick before the period elapses");

        advance(Duration::from_millis(1)).await;
        assert_eq!(tick_rx.recv().await, Some(token));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_tick_delivery() {
        let (mut clock, mut tick_rx) = TokioClock::new();
        let token = clock.schedule_repeating(PERIOD);

        advance(PERIOD).await;
        assert_eq!(tick_rx.recv().await, Some(token));

        clock.cancel(token);
        advance(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;
        assert!(tick_rx.try_recv().is_err(), "no ticks after cancel");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_restarts_from_a_full_period() {
        let (mut clock, mut tick_rx) = TokioClock::new();
        let first = clock.schedule_repeating(PERIOD);

        advance(Duration::from_millis(600)).await;
        let second = clock.schedule_repeating(PERIOD);
        assert_ne!(first, second);

        // The replaced source would have fired at the 1s mark; the new
        // one waits its own full period with no carried-over offset.
        advance(Duration::from_millis(999)).await;
        tokio::task::yield_now().await;
        assert!(
            tick_rx.try_recv().is_err(),
            "no tick until the new source's period elapses"
        );

        advance(Duration::from_millis(1)).await;
        assert_eq!(tick_rx.recv().await, Some(second));
    }
}
