//! Class enrollment marketplace backend.
//!
//! The [`domain`] owns role checks and the enrollment commit; [`inbound`]
//! exposes them over HTTP and [`outbound`] binds the ports to PostgreSQL,
//! in-memory stores and the payment provider.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// OpenAPI document served by Swagger UI in debug builds.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
