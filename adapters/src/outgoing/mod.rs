pub mod http_reqwest;
pub mod memory;
pub mod postgres_sqlx;
