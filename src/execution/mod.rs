//! Transport and error classification.

mod errors;
mod http;

pub use errors::{classify_http_error, retry_after_secs};
pub use http::{HttpTransport, build_headers};
