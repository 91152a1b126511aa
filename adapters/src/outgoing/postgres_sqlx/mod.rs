pub mod credit_store_postgres;
