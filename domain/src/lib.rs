pub mod credits;
pub mod error;
pub mod generation;
pub mod user;
