//! HTTP middleware stack for the site.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. `TraceLayer` (request spans)
//! 3. Request ID (reuse or generate, expose to handlers)
//! 4. Security headers (CSP from configuration, framing, sniffing)
//! 5. Error pages (render marked error responses)
//! 6. Panic catcher (panicking handlers become error pages)

pub mod error_pages;
pub mod request_id;
pub mod security_headers;

pub use error_pages::{error_pages_middleware, handle_panic};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use security_headers::{content_security_policy, security_headers_middleware};
