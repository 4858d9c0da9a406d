pub mod rate_limit;
pub mod tracing;

pub use self::rate_limit::{IpRateLimiter, create_ip_rate_limiter, ip_rate_limit_middleware};
pub use self::tracing::{REQUEST_ID_HEADER, http_trace_layer, request_id_middleware};
