pub mod content_generator;
pub mod credit_store;
pub mod image_provider;
