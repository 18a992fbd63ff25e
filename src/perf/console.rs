use super::harness::{HarnessState, PerfHarness};
use super::report::PerfReport;
use crate::core::Host;

/// Entry points the host application exposes for diagnostics
///
/// Holds the most recently registered harness; `last_report` survives across runs
/// so a finished measurement can still be inspected after a new harness is registered.
#[derive(Default)]
pub struct PerfConsole {
    current: Option<PerfHarness>,
    last_report: Option<PerfReport>,
}

impl PerfConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `harness`; the previous one's report is kept if it finished
    pub fn register(&mut self, harness: PerfHarness) {
        if let Some(report) = self.current.as_ref().and_then(PerfHarness::report) {
            self.last_report = Some(report);
        }
        self.current = Some(harness);
    }

    /// Report of the latest finished measurement
    pub fn last_report(&self) -> Option<PerfReport> {
        self.current
            .as_ref()
            .and_then(PerfHarness::report)
            .or_else(|| self.last_report.clone())
    }

    /// Force-stop a running measurement and return its report immediately
    /// Falls back to the last report when nothing is running
    pub fn stop(&mut self, host: &mut Host) -> Option<PerfReport> {
        let stopped = self.current.as_ref().and_then(|harness| harness.stop(host));
        match stopped {
            Some(report) => {
                self.last_report = Some(report.clone());
                Some(report)
            }
            None => self.last_report(),
        }
    }

    pub fn state(&self) -> Option<HarnessState> {
        self.current.as_ref().map(PerfHarness::state)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::config::HarnessConfig;
    use crate::core::ManualClock;

    #[test]
    fn test_empty_console() {
        let mut host = Host::new(Rc::new(ManualClock::new()), 60.0);
        let mut console = PerfConsole::new();

        assert!(console.last_report().is_none());
        assert!(console.stop(&mut host).is_none());
        assert!(console.state().is_none());
    }

    #[test]
    fn test_report_survives_new_registration() {
        let mut host = Host::new(Rc::new(ManualClock::new()), 60.0);
        let mut console = PerfConsole::new();

        let first = PerfHarness::new(HarnessConfig::default());
        first.start(&mut host).unwrap();
        console.register(first);
        host.run_for(500.0);
        let report = console.stop(&mut host).unwrap();

        console.register(PerfHarness::new(HarnessConfig::default()));
        assert_eq!(console.state(), Some(HarnessState::Idle));
        assert_eq!(console.last_report(), Some(report));
    }
}
