//! Bubbles in a flask: a small box of circular bodies with elastic collisions,
//! a burner that excites them, and a fuse that ends the run.
//!
//! - [`sim::Field`] owns the bodies and advances them one tick at a time
//! - [`flask::Flask`] is the burner/fuse state machine that drives `heating`
//! - [`ticker::Ticker`] turns wall-clock time into fixed ticks
//! - [`config::Settings`] holds the tunables loaded from disk

pub mod config;
pub mod flask;
pub mod model;
pub mod sim;
pub mod ticker;

pub use flask::{Flask, Phase};
pub use model::{Body, Bounds, FieldParams};
pub use sim::Field;
pub use ticker::Ticker;
