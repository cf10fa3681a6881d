pub mod interval;
pub mod test_utils;

pub use interval::*;
