use crate::coordinator::HistoryCoordinator;
use crate::models::RefreshEvent;
use crate::retry::{RetryDecision, RetryMachine, RetryPolicy};
use crate::sensors::SensorFeed;
use crate::{REFRESH_HOUR, REFRESH_MINUTE};
use chrono::{DateTime, Local, NaiveTime, TimeZone};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Drives the coordinator: a refresh at start-up and every day at 00:01
/// local time, retries in between, and a rotation tick every scroll interval.
///
/// Everything runs in one `select!` loop, so refreshes and ticks never
/// overlap. A pending retry is just a deadline in that loop; shutdown drops
/// it together with the rotation timer.
pub struct HistoryScheduler {
    coordinator: HistoryCoordinator,
    retry: RetryMachine,
    scroll_interval: Duration,
    shutdown: watch::Receiver<bool>,
    events: Option<mpsc::UnboundedSender<RefreshEvent>>,
    clock: Box<dyn Fn() -> DateTime<Local> + Send + Sync>,
}

enum AttemptOutcome {
    Done(RefreshEvent),
    RetryAt(Instant),
    Shutdown,
}

impl HistoryScheduler {
    /// Create a new scheduler
    pub fn new(
        coordinator: HistoryCoordinator,
        policy: RetryPolicy,
        scroll_interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            coordinator,
            retry: RetryMachine::new(policy),
            scroll_interval,
            shutdown,
            events: None,
            clock: Box::new(Local::now),
        }
    }

    /// Use `clock` instead of the system clock to place the daily trigger
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Local> + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    /// Report the outcome of every refresh trigger on `events`
    pub fn with_events(mut self, events: mpsc::UnboundedSender<RefreshEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn feed(&self) -> SensorFeed {
        self.coordinator.feed()
    }

    /// Run until shutdown is signalled, then hand the coordinator back
    pub async fn run(mut self) -> HistoryCoordinator {
        info!(
            "Starting today-in-history scheduler (scroll every {:?}, refresh daily at {:02}:{:02})",
            self.scroll_interval, REFRESH_HOUR, REFRESH_MINUTE
        );

        let mut scroll = interval_at(Instant::now() + self.scroll_interval, self.scroll_interval);
        scroll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let (mut daily_at, mut scheduled) = self.schedule_daily(None);
        let mut retry_at = match self.attempt().await {
            AttemptOutcome::Done(event) => {
                self.emit(event);
                None
            }
            AttemptOutcome::RetryAt(at) => Some(at),
            AttemptOutcome::Shutdown => return self.stop(),
        };

        loop {
            let retry_deadline = retry_at.unwrap_or_else(Instant::now);

            tokio::select! {
                _ = self.shutdown.changed() => break,

                _ = sleep_until(daily_at) => {
                    (daily_at, scheduled) = self.schedule_daily(Some(&scheduled));
                    if self.retry.is_busy() {
                        warn!("Daily refresh trigger arrived with a retry pending; starting over");
                    }
                    self.retry.settle();
                    retry_at = None;

                    match self.attempt().await {
                        AttemptOutcome::Done(event) => self.emit(event),
                        AttemptOutcome::RetryAt(at) => retry_at = Some(at),
                        AttemptOutcome::Shutdown => break,
                    }
                }

                _ = sleep_until(retry_deadline), if retry_at.is_some() => {
                    retry_at = None;
                    match self.attempt().await {
                        AttemptOutcome::Done(event) => self.emit(event),
                        AttemptOutcome::RetryAt(at) => retry_at = Some(at),
                        AttemptOutcome::Shutdown => break,
                    }
                }

                _ = scroll.tick() => {
                    self.coordinator.rotate();
                }
            }
        }

        self.stop()
    }

    /// One fetch attempt, raced against shutdown
    async fn attempt(&mut self) -> AttemptOutcome {
        let attempt = self.retry.begin_attempt();
        let max_attempts = self.retry.policy().max_attempts();
        info!("Refreshing today-in-history data (attempt {}/{})", attempt, max_attempts);

        let result = tokio::select! {
            result = self.coordinator.refresh() => result,
            _ = self.shutdown.changed() => {
                self.retry.settle();
                self.emit(RefreshEvent::Cancelled { attempts: attempt });
                return AttemptOutcome::Shutdown;
            }
        };

        match result {
            Ok(count) => {
                let attempts = self.retry.record_success();
                self.retry.settle();
                AttemptOutcome::Done(RefreshEvent::Refreshed {
                    count,
                    attempts,
                    timestamp: Local::now(),
                })
            }
            Err(e) => match self.retry.record_failure() {
                RetryDecision::RetryAfter(delay) => {
                    warn!("Refresh attempt {} failed: {}, retrying in {:?}", attempt, e, delay);
                    AttemptOutcome::RetryAt(Instant::now() + delay)
                }
                RetryDecision::GiveUp => {
                    error!(
                        "Refresh failed after {} attempts, keeping previous data until next trigger: {}",
                        attempt, e
                    );
                    self.retry.settle();
                    AttemptOutcome::Done(RefreshEvent::RefreshFailed {
                        attempts: attempt,
                        error: e.to_string(),
                        timestamp: Local::now(),
                    })
                }
            },
        }
    }

    fn emit(&self, event: RefreshEvent) {
        debug!("Refresh event: {:?}", event);
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }

    fn stop(mut self) -> HistoryCoordinator {
        self.retry.settle();
        info!("Today-in-history scheduler stopped");
        self.coordinator
    }

    /// Place the next daily trigger after `previous` (the trigger that just
    /// fired) or after the current wall-clock time, whichever is later.
    fn schedule_daily(&self, previous: Option<&DateTime<Local>>) -> (Instant, DateTime<Local>) {
        let now = (self.clock)();
        let base = match previous {
            Some(previous) if *previous > now => *previous,
            _ => now,
        };
        let next = next_refresh_after(&base);
        let wait = (next - now).to_std().unwrap_or(Duration::from_secs(60));
        debug!("Next scheduled refresh at {}", next);
        (Instant::now() + wait, next)
    }
}

/// First daily trigger strictly after `now`, in `now`'s time zone
pub fn next_refresh_after<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let trigger = NaiveTime::from_hms_opt(REFRESH_HOUR, REFRESH_MINUTE, 0).unwrap_or(NaiveTime::MIN);
    let local_now = now.naive_local();

    let mut date = local_now.date();
    if local_now >= date.and_time(trigger) {
        date = date.succ_opt().unwrap_or(date);
    }

    // Skip forward over a trigger time that does not exist on that day (DST gap).
    for _ in 0..3 {
        if let Some(at) = now.timezone().from_local_datetime(&date.and_time(trigger)).earliest() {
            return at;
        }
        date = date.succ_opt().unwrap_or(date);
    }

    now.clone() + chrono::Duration::hours(24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_before_trigger_is_same_day() {
        let now = Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 30).unwrap();
        let next = next_refresh_after(&now);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 10, 1, 0, 1, 0).unwrap());
    }

    #[test]
    fn test_at_trigger_moves_to_next_day() {
        let now = Utc.with_ymd_and_hms(2024, 10, 1, 0, 1, 0).unwrap();
        let next = next_refresh_after(&now);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 10, 2, 0, 1, 0).unwrap());
    }

    #[test]
    fn test_after_trigger_moves_to_next_day() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 18, 30, 0).unwrap();
        let next = next_refresh_after(&now);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 1, 1, 0, 1, 0).unwrap());
    }

    #[test]
    fn test_uses_local_wall_clock() {
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 10, 1, 23, 59, 0).unwrap();
        let next = next_refresh_after(&now);
        assert_eq!(next, tz.with_ymd_and_hms(2024, 10, 2, 0, 1, 0).unwrap());
        assert_eq!(next.naive_local().time(), NaiveTime::from_hms_opt(0, 1, 0).unwrap());
    }
}
