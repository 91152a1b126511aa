pub mod projection;
pub mod service;
