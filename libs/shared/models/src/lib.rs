pub mod appointment;
pub mod calendar;
pub mod error;
pub mod time;

pub use appointment::*;
pub use calendar::*;
pub use error::AppError;
