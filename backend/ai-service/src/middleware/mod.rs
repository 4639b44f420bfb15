pub mod jwt_auth;
pub mod logging;
pub mod metrics;

pub use jwt_auth::{Claims, JwtAuth};
pub use logging::{CorrelationId, RequestLogging, CORRELATION_HEADER};
pub use metrics::MetricsMiddleware;
