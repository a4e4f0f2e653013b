use serde::{Deserialize, Serialize};

// Idle (burner off) motion.
pub const IDLE_DAMPING: f32 = 0.98;
pub const IDLE_JITTER: f32 = 0.02;

// Burner on.
pub const HEAT_KICK: f32 = 0.5;
pub const HEAT_MAX_SPEED: f32 = 4.0;

pub const INIT_SPEED: f32 = 0.05;
pub const DEFAULT_PADDING: f32 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    /// Container-local origin of the bubble's bounding box.
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
}

impl Body {
    pub fn new(x: f32, y: f32, radius: f32) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            radius,
        }
    }

    pub fn with_velocity(mut self, vx: f32, vy: f32) -> Self {
        self.vx = vx;
        self.vy = vy;
        self
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.radius, self.y + self.radius)
    }

    pub fn speed2(&self) -> f32 {
        self.vx * self.vx + self.vy * self.vy
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Allowed range for a body's origin along x.
    ///
    /// When the container is too small for the body plus padding, or the far
    /// end is not finite, both ends collapse onto `padding` so the body is
    /// pinned in the corner. A non-finite `padding` pins at 0.
    pub fn x_range(&self, radius: f32, padding: f32) -> (f32, f32) {
        axis_range(self.width, radius, padding)
    }

    pub fn y_range(&self, radius: f32, padding: f32) -> (f32, f32) {
        axis_range(self.height, radius, padding)
    }
}

fn axis_range(extent: f32, radius: f32, padding: f32) -> (f32, f32) {
    let lo = if padding.is_finite() { padding } else { 0.0 };
    let hi = extent - 2.0 * radius - lo;
    if hi.is_finite() {
        (lo, hi.max(lo))
    } else {
        (lo, lo)
    }
}

/// Everything needed to rebuild a field from scratch on reset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldParams {
    pub count: usize,
    pub bounds: Bounds,
    pub radius: f32,
    pub padding: f32,
}

impl FieldParams {
    pub fn new(count: usize, bounds: Bounds, radius: f32) -> Self {
        Self {
            count,
            bounds,
            radius,
            padding: DEFAULT_PADDING,
        }
    }

    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }
}
