pub mod polling;
pub mod registry;
pub mod service;
