pub mod availability;
pub mod habit;
pub mod layout;
pub mod recurrence;
pub mod session;
pub mod streak;
pub mod timeblock;

pub use crate::habit::{Frequency, Habit, InvalidRecurrence, MonthlyType};
pub use crate::layout::{BlockStyle, LayoutConfig};
pub use crate::session::Session;
pub use crate::streak::{Completion, StreakStats};
pub use crate::timeblock::TimeBlock;
