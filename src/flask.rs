use crate::sim::Field;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Heating { remaining: Duration },
    Exploded,
}

/// Burner and fuse around the bubble field.
///
/// The flask decides whether the field is heated and when the run is over.
/// The field only ever sees the resulting `heating` flag. Once `Exploded`,
/// nothing steps until `reset`.
#[derive(Clone, Debug)]
pub struct Flask {
    fuse: Duration,
    phase: Phase,
}

impl Flask {
    pub fn new(fuse: Duration) -> Self {
        Self {
            fuse,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn fuse(&self) -> Duration {
        self.fuse
    }

    pub fn is_heating(&self) -> bool {
        matches!(self.phase, Phase::Heating { .. })
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.phase, Phase::Exploded)
    }

    /// 0.0 when cold, 1.0 at the moment of explosion.
    pub fn progress(&self) -> f32 {
        match self.phase {
            Phase::Idle => 0.0,
            Phase::Heating { remaining } => {
                if self.fuse.is_zero() {
                    1.0
                } else {
                    1.0 - remaining.as_secs_f32() / self.fuse.as_secs_f32()
                }
            }
            Phase::Exploded => 1.0,
        }
    }

    pub fn ignite(&mut self) {
        if self.phase == Phase::Idle {
            self.phase = Phase::Heating {
                remaining: self.fuse,
            };
            log::info!("burner on, fuse {:.1}s", self.fuse.as_secs_f32());
        }
    }

    /// Turning the burner off lets the flask cool; the next ignition starts a full fuse.
    pub fn extinguish(&mut self) {
        if self.is_heating() {
            self.phase = Phase::Idle;
            log::info!("burner off");
        }
    }

    pub fn toggle_burner(&mut self) {
        match self.phase {
            Phase::Idle => self.ignite(),
            Phase::Heating { .. } => self.extinguish(),
            Phase::Exploded => {}
        }
    }

    /// Burns `dt` off the fuse. Returns the new phase when it changed.
    pub fn advance(&mut self, dt: Duration) -> Option<Phase> {
        let Phase::Heating { remaining } = self.phase else {
            return None;
        };
        let left = remaining.saturating_sub(dt);
        if left.is_zero() {
            self.phase = Phase::Exploded;
            log::info!("flask exploded");
            Some(self.phase)
        } else {
            self.phase = Phase::Heating { remaining: left };
            None
        }
    }

    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        log::info!("flask reset");
    }

    /// Steps `field` up to `ticks` times under the current burner state,
    /// burning `dt` of fuse per tick. Stops as soon as the flask explodes.
    ///
    /// Returns the number of steps actually taken.
    pub fn drive(&mut self, field: &mut Field, ticks: u32, dt: Duration) -> u32 {
        let mut taken = 0;
        for _ in 0..ticks {
            if !self.is_running() {
                break;
            }
            field.step(self.is_heating());
            taken += 1;
            self.advance(dt);
        }
        taken
    }

    /// Back to a cold flask with freshly scattered bubbles.
    pub fn restart(&mut self, field: &mut Field) {
        self.reset();
        field.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bounds, FieldParams};

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn starts_idle_and_cold() {
        let f = Flask::new(ms(3000));
        assert_eq!(f.phase(), Phase::Idle);
        assert!(!f.is_heating());
        assert!(f.is_running());
        assert_eq!(f.progress(), 0.0);
    }

    #[test]
    fn countdown_only_runs_while_heating() {
        let mut f = Flask::new(ms(1000));
        assert_eq!(f.advance(ms(5000)), None);
        assert_eq!(f.phase(), Phase::Idle);

        f.ignite();
        assert_eq!(f.advance(ms(400)), None);
        assert_eq!(f.phase(), Phase::Heating { remaining: ms(600) });
        assert!((f.progress() - 0.4).abs() < 1e-4);
    }

    #[test]
    fn burns_through_to_exploded() {
        let mut f = Flask::new(ms(1000));
        f.ignite();
        f.advance(ms(999));
        assert_eq!(f.advance(ms(1)), Some(Phase::Exploded));
        assert!(!f.is_running());
        assert!(!f.is_heating());
        // stays put
        assert_eq!(f.advance(ms(1)), None);
        f.toggle_burner();
        assert_eq!(f.phase(), Phase::Exploded);
    }

    #[test]
    fn cooling_rearms_the_full_fuse() {
        let mut f = Flask::new(ms(1000));
        f.toggle_burner();
        f.advance(ms(700));
        f.toggle_burner();
        assert_eq!(f.phase(), Phase::Idle);
        f.toggle_burner();
        assert_eq!(f.phase(), Phase::Heating { remaining: ms(1000) });
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut f = Flask::new(ms(10));
        f.ignite();
        f.advance(ms(20));
        assert_eq!(f.phase(), Phase::Exploded);
        f.reset();
        assert_eq!(f.phase(), Phase::Idle);
        f.ignite();
        assert!(f.is_heating());
    }

    #[test]
    fn zero_fuse_explodes_on_first_advance() {
        let mut f = Flask::new(Duration::ZERO);
        f.ignite();
        assert_eq!(f.progress(), 1.0);
        assert_eq!(f.advance(Duration::ZERO), Some(Phase::Exploded));
    }

    #[test]
    fn drive_stops_stepping_at_explosion() {
        let params = FieldParams::new(3, Bounds::new(260.0, 110.0), 10.0);
        let mut field = Field::initialize(params, 5);
        let mut f = Flask::new(ms(100));

        // cold: every tick runs, no fuse burns
        assert_eq!(f.drive(&mut field, 10, ms(20)), 10);
        assert!(!field.heating());

        f.ignite();
        assert_eq!(f.drive(&mut field, 10, ms(20)), 5);
        assert!(field.heating());
        assert_eq!(f.phase(), Phase::Exploded);

        let frozen = field.bodies().to_vec();
        assert_eq!(f.drive(&mut field, 10, ms(20)), 0);
        assert_eq!(field.bodies(), &frozen[..]);

        f.restart(&mut field);
        assert_eq!(f.phase(), Phase::Idle);
        assert!(!field.heating());
        assert_eq!(field.len(), 3);
    }
}
