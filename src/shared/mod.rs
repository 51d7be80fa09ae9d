//! Types shared between the dispatcher, the focus tracker and the geometry engine.

pub mod window_state;

pub use window_state::Geometry;
