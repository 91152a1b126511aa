pub mod credits;
pub mod generation;
