use crate::model::{
    Body, Bounds, FieldParams, HEAT_KICK, HEAT_MAX_SPEED, IDLE_DAMPING, IDLE_JITTER, INIT_SPEED,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Tries per body before a random start position is accepted even if it overlaps.
const PLACEMENT_ATTEMPTS: usize = 200;

/// The bubbles inside the flask plus everything needed to advance them.
///
/// A field is a plain value owned by its host: `step` is called once per tick,
/// `reset` rebuilds it from the original parameters, and the host reads
/// `positions` to draw. Nothing here knows about time or rendering.
#[derive(Clone, Debug)]
pub struct Field {
    bodies: Vec<Body>,
    params: FieldParams,
    heating: bool,
    seed: u64,
    rng: StdRng,
}

/// Entropy-seeded field with the default padding.
pub fn initialize(count: usize, bounds: Bounds, radius: f32) -> Field {
    Field::initialize(FieldParams::new(count, bounds, radius), rand::random())
}

impl Field {
    pub fn initialize(params: FieldParams, seed: u64) -> Self {
        let mut field = Self {
            bodies: Vec::with_capacity(params.count),
            params,
            heating: false,
            seed,
            rng: StdRng::seed_from_u64(seed),
        };
        field.populate();
        field
    }

    /// Field with caller-chosen bodies. `params.count` is taken from `bodies`;
    /// a later `reset` scatters that many bodies randomly.
    pub fn from_bodies(params: FieldParams, bodies: Vec<Body>, seed: u64) -> Self {
        Self {
            params: FieldParams {
                count: bodies.len(),
                ..params
            },
            bodies,
            heating: false,
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Discards the current bodies and scatters a fresh set.
    pub fn reset(&mut self) {
        self.heating = false;
        self.populate();
        log::debug!("field reset: {} bodies", self.bodies.len());
    }

    /// Advances one tick.
    pub fn step(&mut self, heating: bool) {
        self.heating = heating;
        self.update_velocities();
        self.integrate();
        self.reflect_walls();
        self.resolve_collisions();
        self.confine();
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn positions(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.bodies.iter().map(|b| (b.x, b.y))
    }

    pub fn params(&self) -> &FieldParams {
        &self.params
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn heating(&self) -> bool {
        self.heating
    }

    /// Sum of squared speeds (unit mass, no 1/2 factor).
    pub fn kinetic_energy(&self) -> f32 {
        self.bodies.iter().map(Body::speed2).sum()
    }

    fn populate(&mut self) {
        let FieldParams {
            count,
            bounds,
            radius,
            padding,
        } = self.params;
        let (x0, x1) = bounds.x_range(radius, padding);
        let (y0, y1) = bounds.y_range(radius, padding);

        self.bodies.clear();
        for _ in 0..count {
            let mut candidate = Body::new(x0, y0, radius);
            for _ in 0..PLACEMENT_ATTEMPTS {
                candidate = Body::new(
                    self.rng.gen_range(x0..=x1),
                    self.rng.gen_range(y0..=y1),
                    radius,
                );
                if !self.bodies.iter().any(|b| overlapping(b, &candidate)) {
                    break;
                }
            }
            let vx = jitter(&mut self.rng, INIT_SPEED);
            let vy = jitter(&mut self.rng, INIT_SPEED);
            self.bodies.push(candidate.with_velocity(vx, vy));
        }
    }

    fn update_velocities(&mut self) {
        let rng = &mut self.rng;
        for b in &mut self.bodies {
            if self.heating {
                b.vx = (b.vx + jitter(rng, HEAT_KICK)).clamp(-HEAT_MAX_SPEED, HEAT_MAX_SPEED);
                b.vy = (b.vy + jitter(rng, HEAT_KICK)).clamp(-HEAT_MAX_SPEED, HEAT_MAX_SPEED);
            } else {
                b.vx = b.vx * IDLE_DAMPING + jitter(rng, IDLE_JITTER);
                b.vy = b.vy * IDLE_DAMPING + jitter(rng, IDLE_JITTER);
            }
        }
    }

    fn integrate(&mut self) {
        for b in &mut self.bodies {
            b.x += b.vx;
            b.y += b.vy;
        }
    }

    fn reflect_walls(&mut self) {
        let FieldParams {
            bounds, padding, ..
        } = self.params;
        for b in &mut self.bodies {
            let (x0, x1) = bounds.x_range(b.radius, padding);
            let (y0, y1) = bounds.y_range(b.radius, padding);
            if b.x < x0 {
                b.x = x0;
                b.vx = -b.vx;
            } else if b.x > x1 {
                b.x = x1;
                b.vx = -b.vx;
            }
            if b.y < y0 {
                b.y = y0;
                b.vy = -b.vy;
            } else if b.y > y1 {
                b.y = y1;
                b.vy = -b.vy;
            }
        }
    }

    // Single pass in collection order. A pair separated early can be pushed
    // back into overlap by a later pair in the same tick.
    fn resolve_collisions(&mut self) {
        let n = self.bodies.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let (head, tail) = self.bodies.split_at_mut(j);
                collide(&mut head[i], &mut tail[0]);
            }
        }
    }

    // Positional correction can shove a body through a wall. A NaN coordinate
    // lands on the low end.
    fn confine(&mut self) {
        let FieldParams {
            bounds, padding, ..
        } = self.params;
        for b in &mut self.bodies {
            let (x0, x1) = bounds.x_range(b.radius, padding);
            let (y0, y1) = bounds.y_range(b.radius, padding);
            b.x = b.x.max(x0).min(x1);
            b.y = b.y.max(y0).min(y1);
        }
    }
}

fn jitter(rng: &mut StdRng, amp: f32) -> f32 {
    if amp > 0.0 {
        rng.gen_range(-amp..=amp)
    } else {
        0.0
    }
}

fn overlapping(a: &Body, b: &Body) -> bool {
    let (ax, ay) = a.center();
    let (bx, by) = b.center();
    let (dx, dy) = (bx - ax, by - ay);
    (dx * dx + dy * dy).sqrt() < a.radius + b.radius
}

/// Separates an overlapping pair and swaps their normal velocity components.
fn collide(a: &mut Body, b: &mut Body) {
    let (ax, ay) = a.center();
    let (bx, by) = b.center();
    let (dx, dy) = (bx - ax, by - ay);
    let dist = (dx * dx + dy * dy).sqrt();
    let min_dist = a.radius + b.radius;
    if dist >= min_dist {
        return;
    }

    // atan2(0, 0) == 0, so coincident centers separate along +x.
    let angle = dy.atan2(dx);
    let (ny, nx) = angle.sin_cos();

    let half = (min_dist - dist) * 0.5;
    a.x -= nx * half;
    a.y -= ny * half;
    b.x += nx * half;
    b.y += ny * half;

    let rel_n = (b.vx - a.vx) * nx + (b.vy - a.vy) * ny;
    if rel_n < 0.0 {
        a.vx += rel_n * nx;
        a.vy += rel_n * ny;
        b.vx -= rel_n * nx;
        b.vy -= rel_n * ny;
    }
}
