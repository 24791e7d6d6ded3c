pub mod control_task;
pub mod hall_task;
pub mod range_task;
pub mod stop_task;
pub mod telemetry_task;
