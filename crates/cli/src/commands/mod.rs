//! Command implementations.

mod run;
mod simulate;
mod validate;

pub use run::run_calibration;
pub use simulate::run_simulate;
pub use validate::run_validate;
