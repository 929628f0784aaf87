//! Model latency guard
//!
//! The first request triggers one timed probe rewrite. A probe slower than the
//! threshold, or one that fails, latches the guard to [`SpeedVerdict::Slow`]
//! and every later request skips the model entirely. The verdict stays
//! latched until [`SpeedGuard::rearm`] is called or the configured
//! [`ReprobePolicy`] fires.

use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Fixed text rewritten by the latency probe
pub const PROBE_TEXT: &str = "This is a test to measure AI processing speed.";

pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_secs(15);

/// Outcome of the latency probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedVerdict {
    /// No probe has run yet
    Unknown,
    /// Probe finished within the threshold
    Fast(Duration),
    /// Probe exceeded the threshold or failed
    Slow(Duration),
}

impl SpeedVerdict {
    pub fn is_slow(&self) -> bool {
        matches!(self, SpeedVerdict::Slow(_))
    }

    pub fn measured(&self) -> Option<Duration> {
        match self {
            SpeedVerdict::Unknown => None,
            SpeedVerdict::Fast(d) | SpeedVerdict::Slow(d) => Some(*d),
        }
    }
}

impl fmt::Display for SpeedVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeedVerdict::Unknown => write!(f, "unknown"),
            SpeedVerdict::Fast(d) => write!(f, "fast ({:.2}s probe)", d.as_secs_f64()),
            SpeedVerdict::Slow(d) => write!(f, "slow ({:.2}s probe)", d.as_secs_f64()),
        }
    }
}

/// When a latched verdict is re-evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReprobePolicy {
    /// Only an explicit [`SpeedGuard::rearm`] clears the verdict
    #[default]
    Never,
    /// Probe again after this many requests since the last probe
    EveryRequests(usize),
    /// Probe again once the verdict is older than this
    After(Duration),
}

#[derive(Debug)]
struct GuardState {
    verdict: SpeedVerdict,
    probed_at: Option<Instant>,
    requests_since_probe: usize,
    pinned: bool,
}

/// Latched latency guard
#[derive(Debug)]
pub struct SpeedGuard {
    threshold: Duration,
    policy: ReprobePolicy,
    state: Mutex<GuardState>,
}

impl Default for SpeedGuard {
    fn default() -> Self {
        Self::new(DEFAULT_SLOW_THRESHOLD, ReprobePolicy::Never)
    }
}

impl SpeedGuard {
    pub fn new(threshold: Duration, policy: ReprobePolicy) -> Self {
        Self {
            threshold,
            policy,
            state: Mutex::new(GuardState {
                verdict: SpeedVerdict::Unknown,
                probed_at: None,
                requests_since_probe: 0,
                pinned: false,
            }),
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn policy(&self) -> ReprobePolicy {
        self.policy
    }

    pub fn verdict(&self) -> SpeedVerdict {
        self.lock().verdict
    }

    /// Clear the verdict; the next request probes again
    pub fn rearm(&self) {
        let mut state = self.lock();
        state.verdict = SpeedVerdict::Unknown;
        state.probed_at = None;
        state.requests_since_probe = 0;
        state.pinned = false;
        log::info!("Speed guard re-armed");
    }

    /// Pin a verdict without probing. Re-probe policies are ignored until [`rearm`](Self::rearm).
    pub fn force(&self, verdict: SpeedVerdict) {
        let mut state = self.lock();
        state.verdict = verdict;
        state.probed_at = Some(Instant::now());
        state.requests_since_probe = 0;
        state.pinned = true;
    }

    /// Return the verdict for this request, running `probe` first when none
    /// is latched or the re-probe policy says the latched one is stale.
    pub fn check<F, E>(&self, probe: F) -> SpeedVerdict
    where
        F: FnOnce() -> Result<(), E>,
        E: fmt::Display,
    {
        let mut state = self.lock();

        if self.needs_probe(&state) {
            let started = Instant::now();
            let result = probe();
            let elapsed = started.elapsed();

            state.verdict = match result {
                Ok(()) if elapsed <= self.threshold => {
                    log::info!("Model probe took {:.2}s, using adaptive processing", elapsed.as_secs_f64());
                    SpeedVerdict::Fast(elapsed)
                }
                Ok(()) => {
                    log::warn!(
                        "Model probe took {:.2}s (limit {:.0}s), switching to string optimization",
                        elapsed.as_secs_f64(),
                        self.threshold.as_secs_f64()
                    );
                    SpeedVerdict::Slow(elapsed)
                }
                Err(e) => {
                    log::warn!("Model probe failed ({e}), switching to string optimization");
                    SpeedVerdict::Slow(elapsed)
                }
            };
            state.probed_at = Some(Instant::now());
            state.requests_since_probe = 0;
        }

        state.requests_since_probe += 1;
        state.verdict
    }

    fn needs_probe(&self, state: &GuardState) -> bool {
        if state.pinned {
            return false;
        }
        if state.verdict == SpeedVerdict::Unknown {
            return true;
        }
        match self.policy {
            ReprobePolicy::Never => false,
            ReprobePolicy::EveryRequests(n) => state.requests_since_probe >= n,
            ReprobePolicy::After(age) => state.probed_at.map_or(true, |at| at.elapsed() >= age),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GuardState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn ok() -> Result<(), String> {
        Ok(())
    }

    #[test]
    fn test_first_check_probes_once() {
        let guard = SpeedGuard::default();
        let probes = Cell::new(0);
        for _ in 0..3 {
            let verdict = guard.check(|| {
                probes.set(probes.get() + 1);
                ok()
            });
            assert!(matches!(verdict, SpeedVerdict::Fast(_)));
        }
        assert_eq!(probes.get(), 1);
    }

    #[test]
    fn test_slow_probe_latches() {
        let guard = SpeedGuard::new(Duration::from_millis(5), ReprobePolicy::Never);
        let verdict = guard.check(|| {
            std::thread::sleep(Duration::from_millis(20));
            ok()
        });
        assert!(verdict.is_slow());
        assert!(verdict.measured().unwrap() >= Duration::from_millis(20));

        let again = guard.check(|| -> Result<(), String> { panic!("must not probe again") });
        assert!(again.is_slow());
    }

    #[test]
    fn test_failed_probe_is_slow() {
        let guard = SpeedGuard::default();
        let verdict = guard.check(|| Err("model offline"));
        assert!(verdict.is_slow());
    }

    #[test]
    fn test_rearm_probes_again() {
        let guard = SpeedGuard::default();
        assert!(guard.check(|| Err("down")).is_slow());
        guard.rearm();
        assert_eq!(guard.verdict(), SpeedVerdict::Unknown);
        assert!(!guard.check(ok).is_slow());
    }

    #[test]
    fn test_every_requests_policy() {
        let guard = SpeedGuard::new(DEFAULT_SLOW_THRESHOLD, ReprobePolicy::EveryRequests(2));
        let probes = Cell::new(0);
        let probe = || {
            probes.set(probes.get() + 1);
            ok()
        };
        for _ in 0..5 {
            guard.check(probe);
        }
        // probes on requests 1, 3 and 5
        assert_eq!(probes.get(), 3);
    }

    #[test]
    fn test_after_policy() {
        let guard = SpeedGuard::new(DEFAULT_SLOW_THRESHOLD, ReprobePolicy::After(Duration::ZERO));
        let probes = Cell::new(0);
        guard.check(|| {
            probes.set(probes.get() + 1);
            ok()
        });
        guard.check(|| {
            probes.set(probes.get() + 1);
            ok()
        });
        assert_eq!(probes.get(), 2);
    }

    #[test]
    fn test_force_pins_verdict() {
        let guard = SpeedGuard::new(DEFAULT_SLOW_THRESHOLD, ReprobePolicy::EveryRequests(1));
        guard.force(SpeedVerdict::Slow(Duration::ZERO));
        for _ in 0..3 {
            let verdict = guard.check(|| -> Result<(), String> { panic!("pinned guard must not probe") });
            assert!(verdict.is_slow());
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(SpeedVerdict::Unknown.to_string(), "unknown");
        assert!(SpeedVerdict::Slow(Duration::from_secs(16)).to_string().starts_with("slow"));
    }
}
