//! Scripted in-memory transport for unit tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;

use super::{Headers, Response, Transport, TransportError};

const CURLE_COULDNT_CONNECT: u8 = 7;

/// Answers requests from exact-URL tables and records every call.
#[derive(Debug, Default)]
pub(crate) struct FakeTransport {
    pub gets: HashMap<String, Response>,
    pub downloads: HashMap<String, Response>,
    pub redirects: HashMap<String, String>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeTransport {
    pub fn with_get(mut self, url: &str, status: u32, body: &str) -> Self {
        self.gets.insert(
            url.to_string(),
            Response {
                status,
                body: body.as_bytes().to_vec(),
            },
        );
        self
    }

    pub fn with_download(mut self, url: &str, status: u32, body: Vec<u8>) -> Self {
        self.downloads
            .insert(url.to_string(), Response { status, body });
        self
    }

    pub fn with_redirect(mut self, url: &str, final_url: &str) -> Self {
        self.redirects.insert(url.to_string(), final_url.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    fn record(&self, kind: &str, url: &str) {
        self.calls.borrow_mut().push(format!("{} {}", kind, url));
    }
}

fn unreachable_host() -> TransportError {
    TransportError::Curl(curl::Error::new(CURLE_COULDNT_CONNECT.into()))
}

impl Transport for FakeTransport {
    fn get(&self, url: &str, _headers: &Headers) -> Result<Response, TransportError> {
        self.record("GET", url);
        self.gets.get(url).cloned().ok_or_else(unreachable_host)
    }

    fn download(
        &self,
        url: &str,
        _headers: &Headers,
        sink: &mut dyn Write,
    ) -> Result<u32, TransportError> {
        self.record("DOWNLOAD", url);
        let response = self.downloads.get(url).ok_or_else(unreachable_host)?;
        sink.write_all(&response.body)
            .map_err(TransportError::Sink)?;
        Ok(response.status)
    }

    fn probe_redirect(
        &self,
        url: &str,
        _headers: &Headers,
        _max_redirects: u32,
    ) -> Result<String, TransportError> {
        self.record("PROBE", url);
        self.redirects.get(url).cloned().ok_or_else(unreachable_host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_url_is_a_connect_failure() {
        let transport = FakeTransport::default();
        match transport.get("http://nowhere.example/", &Headers::new()) {
            Err(TransportError::Curl(e)) => assert!(e.is_couldnt_connect()),
            other => panic!("expected connect failure, got {:?}", other),
        }
        assert_eq!(transport.call_count(), 1);
    }
}
