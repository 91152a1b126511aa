pub mod credit_store_memory;
