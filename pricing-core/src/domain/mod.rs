pub mod interval;
pub mod reading;

pub use interval::Interval;
pub use reading::{MeterReading, Reading};
