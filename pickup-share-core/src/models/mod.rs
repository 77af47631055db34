mod assignee;
mod day;
mod schedule;

pub use assignee::{Assignee, Roster};
pub use day::{DaySlot, Duty};
pub use schedule::{DayAssignment, Edit, Schedule, Totals};
