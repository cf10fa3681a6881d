pub mod availability;
pub mod engine;
pub mod schedule_cache;

pub use availability::{AvailabilityService, DaySlots, SlotLengths};
pub use engine::{SlotAvailabilityEngine, SlotCheckRequest, SlotRequest};
pub use schedule_cache::{ProviderScheduleCache, ScheduleLookup};
