// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The monotonic clock is an external collaborator: the host supplies one
//! reading in milliseconds (for the ≤2 Hz init read-back cadence and the
//! 500 ms ack timeout) and one in microseconds (for the 2000 µs inter-byte
//! gap).

/// A monotonic, non-decreasing source of milliseconds and microseconds.
pub trait Clock {
    /// Milliseconds since some arbitrary, fixed epoch. Must never go
    /// backwards between calls.
    fn now_millis(&self) -> u64;
    /// Microseconds since some arbitrary, fixed epoch. Must never go
    /// backwards between calls.
    fn now_micros(&self) -> u64;
}

/// A clock driven entirely by `set`, for deterministic tests.
#[cfg(test)]
pub(crate) struct FakeClock {
    millis: core::cell::Cell<u64>,
    micros: core::cell::Cell<u64>,
    auto_tick_millis: core::cell::Cell<u64>,
}

#[cfg(test)]
impl FakeClock {
    pub fn new() -> Self {
        FakeClock {
            millis: core::cell::Cell::new(0),
            micros: core::cell::Cell::new(0),
            auto_tick_millis: core::cell::Cell::new(0),
        }
    }

    pub fn advance_micros(&self, d: u64) {
        self.micros.set(self.micros.get() + d);
        self.millis.set(self.micros.get() / 1000);
    }

    pub fn advance_millis(&self, d: u64) {
        self.advance_micros(d * 1000);
    }

    /// Makes every subsequent `now_millis()` call advance the clock by
    /// `step_millis` first. Used to drive bounded-wait loops (like
    /// `TpUartLink::reset`) to completion deterministically in tests,
    /// standing in for wall-clock time actually passing.
    pub fn set_auto_tick_millis(&self, step_millis: u64) {
        self.auto_tick_millis.set(step_millis);
    }
}

#[cfg(test)]
impl Clock for FakeClock {
    fn now_millis(&self) -> u64 {
        let step = self.auto_tick_millis.get();
        if step > 0 {
            self.advance_millis(step);
        }
        self.millis.get()
    }

    fn now_micros(&self) -> u64 {
        self.micros.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_clock_is_monotonic_under_advance() {
        let clock = FakeClock::new();
        assert_eq!(clock.now_micros(), 0);
        clock.advance_micros(2001);
        assert_eq!(clock.now_micros(), 2001);
        assert_eq!(clock.now_millis(), 2);
        clock.advance_millis(500);
        assert_eq!(clock.now_millis(), 502);
    }
}
