pub mod appointments;
pub mod conflict;
pub mod drag_drop;
pub mod reschedule;
pub mod status;

pub use appointments::AppointmentService;
pub use conflict::{check_for_conflicts, find_conflicts};
pub use drag_drop::{DragDropSession, DragState};
pub use reschedule::RescheduleValidator;
pub use status::{valid_transitions, validate_status_transition};
