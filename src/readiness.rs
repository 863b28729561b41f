//! Warm-up tracking.
//!
//! The service reports *warming* for a fixed period after start and *ready*
//! from then on. Readiness is a pure function of three values: when the
//! process started, how long warm-up lasts, and what time it is now. The
//! last one comes from a [`Clock`] so tests can pin it instead of sleeping.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of the current instant.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

/// The process's monotonic clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock stuck at one instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub Instant);

impl Clock for FixedClock {
    fn now(&self) -> Instant {
        self.0
    }
}

/// The instant the service started. Never changes after construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServiceClock {
    started: Instant,
}

impl ServiceClock {
    pub fn started_at(started: Instant) -> Self {
        Self { started }
    }

    pub fn start_now() -> Self {
        Self::started_at(Instant::now())
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    /// Time since start as seen at `now`. An instant before start counts as zero.
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }
}

/// Observable readiness state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Readiness {
    Warming,
    Ready,
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warming => "warming",
            Self::Ready => "ready",
        })
    }
}

/// Classifies the service as warming or ready.
///
/// Because [`Instant`] is monotonic, once `is_ready` has returned `true` it
/// never returns `false` again for the same model.
#[derive(Clone)]
pub struct ReadinessModel {
    clock: ServiceClock,
    ready_after: Duration,
    now: Arc<dyn Clock>,
}

impl ReadinessModel {
    /// A model driven by the system clock.
    pub fn new(clock: ServiceClock, ready_after: Duration) -> Self {
        Self::with_clock(clock, ready_after, Arc::new(SystemClock))
    }

    pub fn with_clock(clock: ServiceClock, ready_after: Duration, now: Arc<dyn Clock>) -> Self {
        Self { clock, ready_after, now }
    }

    pub fn service_clock(&self) -> ServiceClock {
        self.clock
    }

    pub fn ready_after(&self) -> Duration {
        self.ready_after
    }

    /// `true` iff at least `ready_after` has passed between start and `now`.
    pub fn is_ready_at(&self, now: Instant) -> bool {
        self.clock.elapsed_at(now) >= self.ready_after
    }

    pub fn state_at(&self, now: Instant) -> Readiness {
        if self.is_ready_at(now) { Readiness::Ready } else { Readiness::Warming }
    }

    /// Current instant according to the injected clock.
    pub fn now(&self) -> Instant {
        self.now.now()
    }

    pub fn is_ready(&self) -> bool {
        self.is_ready_at(self.now())
    }

    pub fn state(&self) -> Readiness {
        self.state_at(self.now())
    }

    /// Time since start according to the injected clock.
    pub fn uptime(&self) -> Duration {
        self.clock.elapsed_at(self.now())
    }
}

impl fmt::Debug for ReadinessModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadinessModel")
            .field("clock", &self.clock)
            .field("ready_after", &self.ready_after)
            .finish_non_exhaustive()
    }
}
