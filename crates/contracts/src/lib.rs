//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the temporal
//! calibration workspace. Business crates depend only on this crate, never on
//! each other's internals.
//!
//! ## Time Model
//! - Timestamps are integer nanoseconds (`Timestamp = i64`) on the clock of the
//!   producing sensor
//! - Durations handed to the estimator (noise densities, sampling periods,
//!   reported shifts) are `f64` seconds

mod alignment;
mod blueprint;
mod error;
mod frame;
mod imu;
mod time;
mod time_alignment_config;
mod tracking;

pub use alignment::*;
pub use blueprint::*;
pub use error::*;
pub use frame::*;
pub use imu::*;
pub use time::*;
pub use time_alignment_config::*;
pub use tracking::*;
