//! Blocking HTTP transport.
//!
//! The pipeline only needs three request shapes: a buffered GET for the API,
//! a streaming GET for the accelerator archive, and a ranged redirect probe.
//! They sit behind [`Transport`] so the provisioner and resolver can be driven
//! by fakes in tests; [`CurlTransport`] is the libcurl implementation.

mod easy;
#[cfg(test)]
pub(crate) mod fake;

pub use easy::CurlTransport;

use std::collections::HashMap;
use std::io::Write;

/// Extra request headers (`Name` -> `value`).
pub type Headers = HashMap<String, String>;

/// Status and buffered body of a GET.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u32,
    pub body: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error(transparent)]
    Curl(#[from] ::curl::Error),
    /// Writing the response body to the sink failed.
    #[error("write response body: {0}")]
    Sink(#[source] std::io::Error),
}

pub trait Transport {
    /// GET `url`, following redirects, and buffer the body.
    fn get(&self, url: &str, headers: &Headers) -> Result<Response, TransportError>;

    /// GET `url`, following redirects, streaming the body into `sink`.
    /// Returns the final status code.
    fn download(
        &self,
        url: &str,
        headers: &Headers,
        sink: &mut dyn Write,
    ) -> Result<u32, TransportError>;

    /// GET `url` with `Range: bytes=0-0`, following at most `max_redirects`
    /// redirects, and return the last URL reached. Response bodies are not
    /// transferred beyond the first chunk.
    fn probe_redirect(
        &self,
        url: &str,
        headers: &Headers,
        max_redirects: u32,
    ) -> Result<String, TransportError>;
}

/// Headers carrying only a User-Agent.
pub fn user_agent_headers(user_agent: &str) -> Headers {
    let mut headers = Headers::new();
    headers.insert("User-Agent".to_string(), user_agent.to_string());
    headers
}
