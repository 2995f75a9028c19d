use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::trace;

/// Identifies one arming of a [`DebounceTimer`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DebounceTicket(pub u64);

/// A single persistent debounce handle.
///
/// At most one sleep task is scheduled at a time: arming aborts the previous
/// task before spawning the next one. Every arming also gets a fresh
/// [`DebounceTicket`]; the owner should act on a tick only if
/// [`DebounceTimer::take_if_current`] accepts it, since an aborted task may
/// already have delivered its tick.
#[derive(Debug)]
pub struct DebounceTimer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
    current: u64,
}

impl DebounceTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            current: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Cancels any pending tick and schedules `on_fire` after the delay.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm<F, Fut>(&mut self, on_fire: F) -> DebounceTicket
    where
        F: FnOnce(DebounceTicket) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.current = self.current.wrapping_add(1);
        let ticket = DebounceTicket(self.current);
        let delay = self.delay;
        let fire = on_fire(ticket);
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fire.await;
        }));
        trace!(ticket = ticket.0, delay_ms = delay.as_millis() as u64, "debounce armed");
        ticket
    }

    /// Aborts the pending tick, if any.
    ///
    /// Returns `true` if a tick was pending.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Accepts a delivered tick if it belongs to the latest arming.
    ///
    /// Accepting clears the pending state; stale tickets are rejected.
    pub fn take_if_current(&mut self, ticket: DebounceTicket) -> bool {
        if ticket.0 != self.current || self.pending.is_none() {
            return false;
        }
        self.pending = None;
        true
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::{DebounceTicket, DebounceTimer};

    fn arm_into(timer: &mut DebounceTimer, tx: &mpsc::UnboundedSender<DebounceTicket>) -> DebounceTicket {
        let tx = tx.clone();
        timer.arm(move |ticket| async move {
            let _ = tx.send(ticket);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_collapses_bursts() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = DebounceTimer::new(Duration::from_millis(300));

        arm_into(&mut timer, &tx);
        tokio::time::sleep(Duration::from_millis(100)).await;
        arm_into(&mut timer, &tx);
        tokio::time::sleep(Duration::from_millis(100)).await;
        let last = arm_into(&mut timer, &tx);

        let fired = rx.recv().await.expect("tick");
        assert_eq!(fired, last);
        assert!(timer.take_if_current(fired));
        assert!(!timer.is_pending());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_ticket_is_rejected() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut timer = DebounceTimer::new(Duration::from_millis(300));
        let first = arm_into(&mut timer, &tx);
        let second = arm_into(&mut timer, &tx);
        assert!(!timer.take_if_current(first));
        assert!(timer.take_if_current(second));
        assert!(!timer.take_if_current(second));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_tick() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = DebounceTimer::new(Duration::from_millis(50));
        arm_into(&mut timer, &tx);
        assert!(timer.cancel());
        assert!(!timer.cancel());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_err());
    }
}
