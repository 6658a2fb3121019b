//! Streaming session state management
//!
//! A session carries the decoder's opaque state and the phrases accumulated
//! so far across many independent HTTP calls. This module provides:
//! - the `SessionStore` contract with mandatory TTL expiry
//! - `MemoryStore` (single-process) and `RedisStore` (horizontal) backends
//! - `SessionController`, which routes audio chunks through the segmenter
//!   and decoder and owns accumulation and finalize deduplication

mod controller;
mod memory;
mod redis;
mod store;

pub use controller::SessionController;
pub use memory::MemoryStore;
pub use redis::RedisStore;
pub use store::{SessionRecord, SessionStore};
