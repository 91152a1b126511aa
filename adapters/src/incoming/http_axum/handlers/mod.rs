pub mod credits;
pub mod generate;
pub mod health;
pub mod task_status;
