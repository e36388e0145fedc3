//! Calendar-interchange (.ics) export.

mod generate;

pub use generate::{RETREAT_LOCATION, activity_ics, day_ics, full_ics};
