pub mod calendar;
pub mod columns;
pub mod day_view;
pub mod layout;
pub mod month_view;
pub mod range;
pub mod time_grid;
pub mod week_view;

pub use calendar::CalendarService;
pub use layout::{inject_into_slots, position_events, resolve_columns, slot_boundary};
pub use range::{
    generate_day_slots, generate_month_grid, generate_week_range, month_bounds, normalize_day_of_week,
};
pub use time_grid::TimeGrid;
