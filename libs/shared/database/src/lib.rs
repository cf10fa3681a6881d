pub mod collaborators;
pub mod rest;

pub use collaborators::{
    AppointmentCommands, AppointmentFormatter, AppointmentQuery, DefaultAppointmentFormatter,
    ProviderScheduleSource,
};
pub use rest::RestClient;
