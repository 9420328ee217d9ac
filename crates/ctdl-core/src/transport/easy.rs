//! libcurl easy-handle implementation of [`Transport`].

use std::io::Write;
use std::time::Duration;

use curl::easy::{Easy, List};

use super::{Headers, Response, Transport, TransportError};

/// Blocking transport; one easy handle per request.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    connect_timeout: Duration,
    /// Hard limit for API calls and the probe.
    request_timeout: Duration,
    /// Hard limit for archive downloads.
    download_timeout: Duration,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            request_timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(3600),
        }
    }
}

impl CurlTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn easy(&self, url: &str, headers: &Headers) -> Result<Easy, curl::Error> {
        let mut easy = Easy::new();
        easy.url(url)?;
        easy.connect_timeout(self.connect_timeout)?;

        // Build curl list for custom headers (e.g. "Name: value").
        let mut list = List::new();
        for (k, v) in headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        if !headers.is_empty() {
            easy.http_headers(list)?;
        }
        Ok(easy)
    }
}

impl Transport for CurlTransport {
    fn get(&self, url: &str, headers: &Headers) -> Result<Response, TransportError> {
        let mut easy = self.easy(url, headers)?;
        easy.follow_location(true)?;
        easy.timeout(self.request_timeout)?;

        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        tracing::debug!(url, status, bytes = body.len(), "GET complete");
        Ok(Response { status, body })
    }

    fn download(
        &self,
        url: &str,
        headers: &Headers,
        sink: &mut dyn Write,
    ) -> Result<u32, TransportError> {
        let mut easy = self.easy(url, headers)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        // Abort if throughput drops below 1 KiB/s for 60s.
        easy.low_speed_limit(1024)?;
        easy.low_speed_time(Duration::from_secs(60))?;
        easy.timeout(self.download_timeout)?;

        let mut written = 0u64;
        let mut sink_error: Option<std::io::Error> = None;
        let perform_result = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match sink.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    sink_error = Some(e);
                    Ok(0) // abort transfer
                }
            })?;
            transfer.perform()
        };
        if let Err(e) = perform_result {
            if e.is_write_error() {
                if let Some(io_err) = sink_error.take() {
                    return Err(TransportError::Sink(io_err));
                }
            }
            return Err(TransportError::Curl(e));
        }
        sink.flush().map_err(TransportError::Sink)?;

        let status = easy.response_code()?;
        tracing::debug!(url, status, bytes = written, "download complete");
        Ok(status)
    }

    fn probe_redirect(
        &self,
        url: &str,
        headers: &Headers,
        max_redirects: u32,
    ) -> Result<String, TransportError> {
        let mut easy = self.easy(url, headers)?;
        easy.follow_location(true)?;
        easy.max_redirections(max_redirects)?;
        easy.range("0-0")?;
        easy.timeout(self.request_timeout)?;

        let mut got_body = false;
        let perform_result = {
            let mut transfer = easy.transfer();
            // Stop at the first body chunk: servers that ignore Range would
            // otherwise stream the whole file.
            transfer.write_function(|_data| {
                got_body = true;
                Ok(0)
            })?;
            transfer.perform()
        };
        match perform_result {
            Ok(()) => {}
            Err(e) if e.is_write_error() && got_body => {}
            Err(e) if e.is_too_many_redirects() => {
                tracing::debug!(url, max_redirects, "redirect cap reached, using last URL");
            }
            Err(e) => return Err(TransportError::Curl(e)),
        }

        let final_url = easy
            .effective_url()?
            .map(str::to_string)
            .unwrap_or_else(|| url.to_string());
        tracing::debug!(url, final_url = %final_url, "redirect probe complete");
        Ok(final_url)
    }
}
