pub mod in_memory;
pub mod redis_idempotency_store;
pub mod redis_lock_store;
