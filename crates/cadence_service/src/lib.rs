pub mod service;

pub use crate::service::{ScheduleService, ScheduleServiceBuilder, WeekView};
