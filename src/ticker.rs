use std::time::Duration;

/// Fixed-step accumulator that turns wall-clock time into whole ticks.
///
/// The field has no notion of time; the host feeds real elapsed time here and
/// runs `Field::step` once per returned tick.
#[derive(Clone, Debug)]
pub struct Ticker {
    step: Duration,
    max_catch_up: u32,
    accum: Duration,
}

impl Ticker {
    pub fn new(step: Duration, max_catch_up: u32) -> Self {
        Self {
            step: step.max(Duration::from_micros(100)),
            max_catch_up: max_catch_up.max(1),
            accum: Duration::ZERO,
        }
    }

    pub fn from_hz(hz: u32, max_catch_up: u32) -> Self {
        Self::new(Duration::from_secs_f64(1.0 / hz.max(1) as f64), max_catch_up)
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Ticks due after `elapsed` more real time.
    ///
    /// After a stall only `max_catch_up` ticks are returned and the rest of
    /// the backlog is dropped.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accum = self.accum.saturating_add(elapsed);
        let mut ticks = 0;
        while self.accum >= self.step {
            self.accum -= self.step;
            ticks += 1;
            if ticks == self.max_catch_up {
                if self.accum >= self.step {
                    log::debug!("dropping {:?} of simulation backlog", self.accum);
                    self.accum = Duration::ZERO;
                }
                break;
            }
        }
        ticks
    }

    pub fn clear(&mut self) {
        self.accum = Duration::ZERO;
    }
}
