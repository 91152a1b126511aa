pub mod dto;
pub mod error_mapper;
pub mod extract;
pub mod handlers;
pub mod routes;

#[cfg(feature = "docs")]
pub mod docs;
