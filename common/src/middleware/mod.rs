//! Middleware components for all services.

pub mod no_cache;
pub mod request_id;

// Re-export commonly used types
pub use no_cache::no_cache_middleware;
pub use request_id::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
