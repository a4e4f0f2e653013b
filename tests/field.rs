use bubbleflask::{Body, Bounds, Field, FieldParams, Flask, Phase, Ticker};
use std::time::Duration;

/// The flask's liquid area.
fn liquid(count: usize, radius: f32) -> FieldParams {
    FieldParams::new(count, Bounds::new(260.0, 110.0), radius).with_padding(5.0)
}

fn center_dist(a: &Body, b: &Body) -> f32 {
    let (ax, ay) = a.center();
    let (bx, by) = b.center();
    ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt()
}

fn assert_contained(field: &Field) {
    let p = field.params();
    for b in field.bodies() {
        let (x0, x1) = p.bounds.x_range(b.radius, p.padding);
        let (y0, y1) = p.bounds.y_range(b.radius, p.padding);
        assert!(b.x >= x0 && b.x <= x1, "x={} outside [{x0}, {x1}]", b.x);
        assert!(b.y >= y0 && b.y <= y1, "y={} outside [{y0}, {y1}]", b.y);
    }
}

// ==================================================================================
// Worked scenarios
// ==================================================================================

#[test]
fn overlapping_pair_is_pushed_apart() {
    let bodies = vec![Body::new(10.0, 10.0, 20.0), Body::new(15.0, 15.0, 20.0)];
    let before = center_dist(&bodies[0], &bodies[1]);
    let mut field = Field::from_bodies(liquid(2, 20.0), bodies, 1);

    field.step(false);

    let [a, b] = field.bodies() else {
        panic!("expected two bodies");
    };
    assert!(center_dist(a, b) > before + 10.0);
    // equal exchange conserves momentum; only the idle jitter (±0.02 each) is new
    assert!((a.vx + b.vx).abs() <= 0.04 + 1e-5);
    assert!((a.vy + b.vy).abs() <= 0.04 + 1e-5);
    assert_contained(&field);
}

#[test]
fn approaching_pair_swaps_normal_velocity() {
    let bodies = vec![
        Body::new(10.0, 10.0, 20.0).with_velocity(1.0, 1.0),
        Body::new(15.0, 15.0, 20.0).with_velocity(-1.0, -1.0),
    ];
    let mut field = Field::from_bodies(liquid(2, 20.0), bodies, 2);

    field.step(false);

    let (a, b) = (field.bodies()[0], field.bodies()[1]);
    // both were moving into each other along the diagonal; they now bounce back
    assert!(a.vx < 0.0 && a.vy < 0.0, "a kept closing: {a:?}");
    assert!(b.vx > 0.0 && b.vy > 0.0, "b kept closing: {b:?}");
    assert!((a.vx.abs() - 0.98).abs() < 0.15);
    assert!((b.vy.abs() - 0.98).abs() < 0.15);
    assert!((a.vx + b.vx).abs() <= 0.04 + 1e-5);
    assert!(center_dist(&a, &b) > 20.0);
}

#[test]
fn wall_bounce_damps_before_reflecting() {
    let bodies = vec![Body::new(0.0, 55.0, 20.0).with_velocity(-3.0, 0.0)];
    let mut field = Field::from_bodies(liquid(1, 20.0), bodies, 3);

    field.step(false);

    let b = field.bodies()[0];
    assert_eq!(b.x, 5.0);
    assert!((b.vx - 3.0 * 0.98).abs() <= 0.02 + 1e-5, "vx={}", b.vx);
    assert!((b.y - 55.0).abs() <= 0.02 + 1e-5);
}

#[test]
fn right_and_bottom_walls_reflect_too() {
    let bodies = vec![Body::new(214.0, 64.0, 20.0).with_velocity(3.0, 3.0)];
    let mut field = Field::from_bodies(liquid(1, 20.0), bodies, 4);
    field.step(false);
    let b = field.bodies()[0];
    assert_eq!((b.x, b.y), (215.0, 65.0));
    assert!(b.vx < 0.0 && b.vy < 0.0);
}

// ==================================================================================
// Invariants over many ticks
// ==================================================================================

#[test]
fn cluster_settles_without_overlap() {
    let bodies = vec![
        Body::new(490.0, 490.0, 10.0),
        Body::new(495.0, 492.0, 10.0),
        Body::new(500.0, 488.0, 10.0),
    ];
    let params = FieldParams::new(3, Bounds::new(1000.0, 1000.0), 10.0);
    let mut field = Field::from_bodies(params, bodies, 5);

    for _ in 0..200 {
        field.step(false);
    }

    let b = field.bodies();
    for i in 0..b.len() {
        for j in (i + 1)..b.len() {
            let d = center_dist(&b[i], &b[j]);
            assert!(d >= 20.0 - 0.5, "bodies {i} and {j} still overlap: {d}");
        }
    }
}

#[test]
fn idle_damping_drains_a_lone_body() {
    let bodies = vec![Body::new(5000.0, 5000.0, 10.0).with_velocity(1.0, 1.0)];
    let params = FieldParams::new(1, Bounds::new(10_000.0, 10_000.0), 10.0);
    let mut field = Field::from_bodies(params, bodies, 6);
    let start = field.kinetic_energy();

    for _ in 0..100 {
        field.step(false);
    }
    assert!(field.kinetic_energy() < start * 0.5);
}

#[test]
fn cooling_down_after_heat_loses_energy() {
    let mut field = Field::initialize(liquid(5, 10.0), 7);
    for _ in 0..200 {
        field.step(true);
    }
    let hot = field.kinetic_energy();
    for _ in 0..300 {
        field.step(false);
    }
    assert!(field.kinetic_energy() < hot);
}

#[test]
fn idle_motion_does_not_grow() {
    let mut field = Field::initialize(liquid(5, 10.0), 8);
    for _ in 0..1000 {
        field.step(false);
        assert_contained(&field);
    }
    assert!(field.kinetic_energy() < 0.5);
}

#[test]
fn lone_heated_body_never_exceeds_speed_cap() {
    let mut field = Field::initialize(liquid(1, 10.0), 9);
    for _ in 0..500 {
        field.step(true);
        let b = field.bodies()[0];
        assert!(b.vx.abs() <= 4.0 && b.vy.abs() <= 4.0);
        assert_contained(&field);
    }
}

#[test]
fn degenerate_container_pins_bodies_in_corner() {
    let params = FieldParams::new(3, Bounds::new(0.0, 0.0), 20.0).with_padding(5.0);
    let mut field = Field::initialize(params, 10);
    for b in field.bodies() {
        assert_eq!((b.x, b.y), (5.0, 5.0));
    }
    for _ in 0..20 {
        field.step(true);
    }
    for (x, y) in field.positions() {
        assert_eq!((x, y), (5.0, 5.0));
    }
}

#[test]
fn non_finite_container_never_panics() {
    let odd = [
        FieldParams::new(2, Bounds::new(f32::INFINITY, 110.0), 10.0),
        FieldParams::new(2, Bounds::new(260.0, f32::NAN), 10.0),
        FieldParams::new(2, Bounds::new(260.0, 110.0), 10.0).with_padding(f32::NAN),
        FieldParams::new(2, Bounds::new(f32::NEG_INFINITY, 110.0), 10.0)
            .with_padding(f32::INFINITY),
    ];
    for (i, params) in odd.into_iter().enumerate() {
        let mut field = Field::initialize(params, i as u64);
        for heating in [true, false, true] {
            field.step(heating);
        }
        field.reset();
        field.step(true);
        assert_eq!(field.len(), 2);
        for (x, y) in field.positions() {
            assert!(x.is_finite() && y.is_finite(), "case {i}: ({x}, {y})");
        }
        assert_contained(&field);
    }
}

#[test]
fn free_initialize_uses_default_padding() {
    let field = bubbleflask::sim::initialize(4, Bounds::new(260.0, 110.0), 10.0);
    assert_eq!(field.len(), 4);
    assert_eq!(field.params().padding, 5.0);
    assert_contained(&field);
}

// ==================================================================================
// Driving the field the way the host does
// ==================================================================================

#[test]
fn ticker_and_flask_run_a_full_game() {
    let mut field = Field::initialize(liquid(6, 12.0), 11);
    let mut flask = Flask::new(Duration::from_millis(500));
    let mut ticker = Ticker::from_hz(60, 8);

    // a few cold frames
    for _ in 0..10 {
        let n = ticker.advance(Duration::from_millis(16));
        flask.drive(&mut field, n, ticker.step());
    }
    assert_eq!(flask.phase(), Phase::Idle);

    flask.ignite();
    let mut frames = 0;
    while flask.is_running() {
        let n = ticker.advance(Duration::from_millis(16));
        flask.drive(&mut field, n, ticker.step());
        assert_contained(&field);
        frames += 1;
        assert!(frames < 1000, "fuse never ran out");
    }
    assert_eq!(flask.phase(), Phase::Exploded);

    flask.restart(&mut field);
    assert_eq!(flask.phase(), Phase::Idle);
    assert_eq!(field.len(), 6);
    assert_contained(&field);
}
