//! AutoAdvance — the carousel's interval timer.
//!
//! Two states: `Disarmed` (no list yet) and `Armed` (one live tick task).
//! The task is owned through a guard that aborts it on drop, so replacing
//! the state or dropping the timer always cancels the previous schedule.
//! Ticks carry the list identity they were scheduled for; a tick that
//! arrives after a re-arm is rejected by `accept`.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarouselTick {
    pub identity: u64,
}

/// Aborts the tick task when dropped.
#[derive(Debug)]
struct TickGuard(AbortHandle);

impl Drop for TickGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[derive(Debug)]
enum TimerState {
    Disarmed,
    Armed {
        identity: u64,
        period_start: Instant,
        _guard: TickGuard,
    },
}

#[derive(Debug)]
pub struct AutoAdvance {
    period: Duration,
    state: TimerState,
}

impl AutoAdvance {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            state: TimerState::Disarmed,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, TimerState::Armed { .. })
    }

    pub fn identity(&self) -> Option<u64> {
        match &self.state {
            TimerState::Armed { identity, .. } => Some(*identity),
            TimerState::Disarmed => None,
        }
    }

    /// Bring the timer in line with the backing list.
    ///
    /// Empty list: disarm. Same identity as the live schedule: keep it.
    /// Anything else: cancel the old schedule and start a fresh one.
    pub fn sync<M, F>(&mut self, identity: u64, len: usize, tx: &mpsc::Sender<M>, wrap: F)
    where
        M: Send + 'static,
        F: Fn(CarouselTick) -> M + Send + 'static,
    {
        if len == 0 {
            self.disarm();
            return;
        }
        if self.identity() == Some(identity) {
            return;
        }
        self.arm(identity, tx.clone(), wrap);
    }

    fn arm<M, F>(&mut self, identity: u64, tx: mpsc::Sender<M>, wrap: F)
    where
        M: Send + 'static,
        F: Fn(CarouselTick) -> M + Send + 'static,
    {
        // Cancel the old task before the new one exists.
        self.state = TimerState::Disarmed;

        let period = self.period;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(wrap(CarouselTick { identity })).await.is_err() {
                    break;
                }
            }
        })
        .abort_handle();

        debug!("auto-advance: armed for list #{} every {:?}", identity, period);
        self.state = TimerState::Armed {
            identity,
            period_start: Instant::now(),
            _guard: TickGuard(handle),
        };
    }

    pub fn disarm(&mut self) {
        if let TimerState::Armed { identity, .. } = &self.state {
            debug!("auto-advance: disarmed (list #{})", identity);
        }
        self.state = TimerState::Disarmed;
    }

    /// Should this tick advance the carousel? Restarts the progress clock
    /// when it does.
    pub fn accept(&mut self, tick: CarouselTick) -> bool {
        match &mut self.state {
            TimerState::Armed {
                identity,
                period_start,
                ..
            } if *identity == tick.identity => {
                *period_start = Instant::now();
                true
            }
            _ => false,
        }
    }

    /// Fraction of the current period already elapsed, for the progress bar.
    pub fn progress(&self) -> Option<f64> {
        match &self.state {
            TimerState::Armed { period_start, .. } => {
                let elapsed = period_start.elapsed().as_secs_f64();
                Some((elapsed / self.period.as_secs_f64()).clamp(0.0, 1.0))
            }
            TimerState::Disarmed => None,
        }
    }
}
