// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Poll timing policy and backoff state.

use std::time::Duration;

use rand::Rng;

/// Timing of the per-device poll loops.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use dvr_monitor::scheduler::PollPolicy;
///
/// let policy = PollPolicy::new()
///     .with_base_interval(Duration::from_secs(30))
///     .with_jitter(Duration::ZERO);
///
/// assert_eq!(policy.delay_for(4), Duration::from_secs(120));
/// assert_eq!(policy.start_offset(3), Duration::from_millis(1200));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Whether the scheduler polls at all.
    pub enabled: bool,
    /// Delay between polls of a healthy device.
    pub base_interval: Duration,
    /// Upper bound of the backoff multiplier.
    pub max_multiplier: u32,
    /// Upper bound (exclusive) of the random delay added to every wait.
    pub jitter: Duration,
    /// Start offset between consecutive devices.
    pub stagger: Duration,
}

impl PollPolicy {
    /// Default base interval.
    pub const DEFAULT_BASE_INTERVAL: Duration = Duration::from_secs(60);
    /// Default multiplier cap.
    pub const DEFAULT_MAX_MULTIPLIER: u32 = 8;
    /// Default jitter ceiling.
    pub const DEFAULT_JITTER: Duration = Duration::from_secs(1);
    /// Default stagger between devices.
    pub const DEFAULT_STAGGER: Duration = Duration::from_millis(400);

    /// Creates a policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy that never polls.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Sets the base interval.
    #[must_use]
    pub fn with_base_interval(mut self, interval: Duration) -> Self {
        self.base_interval = interval;
        self
    }

    /// Sets the multiplier cap. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_max_multiplier(mut self, max: u32) -> Self {
        self.max_multiplier = max.max(1);
        self
    }

    /// Sets the jitter ceiling.
    #[must_use]
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Sets the stagger between devices.
    #[must_use]
    pub fn with_stagger(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    /// Enables or disables polling.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Wait before the next poll at `multiplier`, without jitter.
    #[must_use]
    pub fn delay_for(&self, multiplier: u32) -> Duration {
        self.base_interval
            .saturating_mul(multiplier.clamp(1, self.max_multiplier.max(1)))
    }

    /// Wait before the next poll at `multiplier`, plus a random jitter.
    #[must_use]
    pub fn jittered_delay_for(&self, multiplier: u32) -> Duration {
        self.delay_for(multiplier) + self.sample_jitter()
    }

    /// Delay before the first poll of the device at `ordinal`.
    #[must_use]
    pub fn start_offset(&self, ordinal: usize) -> Duration {
        self.stagger
            .saturating_mul(u32::try_from(ordinal).unwrap_or(u32::MAX))
    }

    fn sample_jitter(&self) -> Duration {
        let max_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..max_ms))
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            base_interval: Self::DEFAULT_BASE_INTERVAL,
            max_multiplier: Self::DEFAULT_MAX_MULTIPLIER,
            jitter: Self::DEFAULT_JITTER,
            stagger: Self::DEFAULT_STAGGER,
        }
    }
}

/// Backoff multiplier of one device.
///
/// Starts at 1, doubles on each failure up to the cap, and snaps back to 1 on
/// any success.
///
/// # Examples
///
/// ```
/// use dvr_monitor::scheduler::Backoff;
///
/// let mut backoff = Backoff::new(8);
/// backoff.on_failure();
/// backoff.on_failure();
/// assert_eq!(backoff.multiplier(), 4);
/// backoff.on_success();
/// assert_eq!(backoff.multiplier(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    multiplier: u32,
    max: u32,
}

impl Backoff {
    /// Creates a backoff capped at `max` (at least 1).
    #[must_use]
    pub fn new(max: u32) -> Self {
        Self {
            multiplier: 1,
            max: max.max(1),
        }
    }

    /// Current multiplier, always within `1..=max`.
    #[must_use]
    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    /// Records a failed poll.
    pub fn on_failure(&mut self) {
        self.multiplier = self.multiplier.saturating_mul(2).min(self.max);
    }

    /// Records a successful poll.
    pub fn on_success(&mut self) {
        self.multiplier = 1;
    }
}
