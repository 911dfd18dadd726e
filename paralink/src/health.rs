//! Link health monitoring
//!
//! Aggregates drain outcomes into interval statistics and watches the time
//! since the last structurally valid message. The monitor never samples a
//! clock itself; callers pass the current instant, which keeps the core free
//! of a global time driver and testable against simulated time.

use paralink_driver::time::{Duration, Instant};

use crate::drain::{DrainOutcome, LinkCounters};

/// Aggregate condition worth telling the outside world about.
///
/// `Overrun` and `Desync` are surfaced immediately when recorded; `LinkDown`
/// fires once per onset and rearms only after a valid message arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HealthEvent {
    Overrun,
    Desync,
    LinkDown,
}

/// Periodic statistics snapshot for the telemetry collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatsReport {
    /// Counts since the previous report.
    pub interval: LinkCounters,
    /// Monotonic totals for the life of the link.
    pub total: LinkCounters,
}

pub struct HealthMonitor {
    stall_timeout: Duration,
    last_valid: Instant,
    link_down: bool,
    interval: LinkCounters,
}

impl HealthMonitor {
    pub fn new(stall_timeout: Duration, now: Instant) -> Self {
        Self {
            stall_timeout,
            last_valid: now,
            link_down: false,
            interval: LinkCounters::default(),
        }
    }

    /// Folds one drain outcome in. Returns the most severe condition that
    /// merits an immediate report: a desync outranks an overrun seen in the
    /// same outcome, since both mean lost messages and a realigned cursor and
    /// the desync additionally names a sustained validation failure.
    pub fn record(&mut self, outcome: &DrainOutcome, now: Instant) -> Option<HealthEvent> {
        self.interval.messages += u64::from(outcome.drained);
        self.interval.errors += u64::from(outcome.errors);

        if outcome.drained > 0 {
            self.last_valid = now;
            if self.link_down {
                self.link_down = false;
                info!("link restored");
            }
        }

        if outcome.desync {
            Some(HealthEvent::Desync)
        } else if outcome.overrun {
            Some(HealthEvent::Overrun)
        } else {
            None
        }
    }

    /// Stall check. Reports `LinkDown` exactly once per onset; the detector
    /// rearms when [`record`](Self::record) sees a valid message again.
    pub fn poll(&mut self, now: Instant) -> Option<HealthEvent> {
        let deadline = self
            .last_valid
            .checked_add(self.stall_timeout)
            .unwrap_or(Instant::MAX);
        if !self.link_down && now > deadline {
            self.link_down = true;
            warn!("link down: no valid message within the stall timeout");
            return Some(HealthEvent::LinkDown);
        }
        None
    }

    pub fn is_link_down(&self) -> bool {
        self.link_down
    }

    /// Takes the periodic report, resetting the interval counters. The caller
    /// supplies the drain loop's monotonic totals so long-term error
    /// visibility survives the interval reset.
    pub fn take_report(&mut self, total: LinkCounters) -> StatsReport {
        let interval = self.interval;
        self.interval = LinkCounters::default();
        StatsReport { interval, total }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(100);

    fn ts(ms: u64) -> Instant {
        Instant::MIN
            .checked_add(Duration::from_millis(ms))
            .unwrap_or(Instant::MAX)
    }

    fn valid_outcome(drained: u32) -> DrainOutcome {
        DrainOutcome {
            drained,
            ..DrainOutcome::default()
        }
    }

    #[test]
    fn test_link_down_once_per_onset() {
        let mut monitor = HealthMonitor::new(TIMEOUT, ts(0));

        assert_eq!(monitor.poll(ts(50)), None);
        assert_eq!(monitor.poll(ts(150)), Some(HealthEvent::LinkDown));
        // not repeated while the link stays silent
        assert_eq!(monitor.poll(ts(250)), None);
        assert_eq!(monitor.poll(ts(10_000)), None);

        // a valid message rearms the detector
        monitor.record(&valid_outcome(1), ts(10_050));
        assert!(!monitor.is_link_down());
        assert_eq!(monitor.poll(ts(10_100)), None);
        assert_eq!(monitor.poll(ts(10_200)), Some(HealthEvent::LinkDown));
    }

    #[test]
    fn test_errors_do_not_feed_the_stall_detector() {
        let mut monitor = HealthMonitor::new(TIMEOUT, ts(0));
        let errors = DrainOutcome {
            errors: 7,
            ..DrainOutcome::default()
        };
        monitor.record(&errors, ts(90));
        // corrupt traffic is not a live link
        assert_eq!(monitor.poll(ts(150)), Some(HealthEvent::LinkDown));
    }

    #[test]
    fn test_immediate_events() {
        let mut monitor = HealthMonitor::new(TIMEOUT, ts(0));

        let overrun = DrainOutcome {
            drained: 3,
            overrun: true,
            ..DrainOutcome::default()
        };
        assert_eq!(monitor.record(&overrun, ts(10)), Some(HealthEvent::Overrun));

        let desync = DrainOutcome {
            errors: 8,
            desync: true,
            ..DrainOutcome::default()
        };
        assert_eq!(monitor.record(&desync, ts(20)), Some(HealthEvent::Desync));
    }

    #[test]
    fn test_desync_outranks_overrun_in_one_outcome() {
        let mut monitor = HealthMonitor::new(TIMEOUT, ts(0));
        let both = DrainOutcome {
            errors: 8,
            overrun: true,
            desync: true,
            ..DrainOutcome::default()
        };
        assert_eq!(monitor.record(&both, ts(10)), Some(HealthEvent::Desync));
    }

    #[test]
    fn test_interval_and_total_counters() {
        let mut monitor = HealthMonitor::new(TIMEOUT, ts(0));
        monitor.record(&valid_outcome(4), ts(10));
        monitor.record(
            &DrainOutcome {
                drained: 2,
                errors: 1,
                ..DrainOutcome::default()
            },
            ts(20),
        );

        let total = LinkCounters {
            messages: 600,
            errors: 9,
        };
        let report = monitor.take_report(total);
        assert_eq!(report.interval.messages, 6);
        assert_eq!(report.interval.errors, 1);
        assert_eq!(report.total, total);

        // interval counters reset, totals are the caller's monotonic view
        let report = monitor.take_report(total);
        assert_eq!(report.interval, LinkCounters::default());
    }
}
