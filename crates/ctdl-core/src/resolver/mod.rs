//! Link resolution: `ctfile://<id>` to a download URL and a filename.
//!
//! One API call maps the id to a file key; the download URL built from it is
//! then probed with a one-byte ranged GET whose redirect chain ends at the
//! content URL carrying the real filename. The accelerator later receives the
//! unresolved download URL and follows the redirects itself.

mod filename;

pub use filename::{filename_from_redirect, local_filename, DEFAULT_FILENAME};

use serde::Deserialize;
use url::form_urlencoded::byte_serialize;

use crate::config::CtdlConfig;
use crate::error::{Error, Result};
use crate::transport::{user_agent_headers, Transport};

/// Prefix every link argument must carry.
pub const LINK_SCHEME: &str = "ctfile://";

/// Download target produced from a link id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub file_key: String,
    /// `<api>/download?xtlink=<id>&file_id=<key>`, before any redirect.
    pub download_url: String,
    /// Decoded `downname` of the final URL, or [`DEFAULT_FILENAME`].
    pub filename: String,
}

/// One element of the `download_info` response.
#[derive(Debug, Deserialize)]
struct DownloadInfo {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Strips [`LINK_SCHEME`] from a user-supplied link and returns the id.
pub fn parse_link(input: &str) -> Result<&str> {
    match input.trim().strip_prefix(LINK_SCHEME) {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(Error::BadInput {
            input: input.to_string(),
            scheme: LINK_SCHEME,
        }),
    }
}

fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

pub struct LinkResolver<'a, T: Transport + ?Sized> {
    transport: &'a T,
    api_base: String,
    user_agent: String,
    max_redirects: u32,
}

impl<'a, T: Transport + ?Sized> LinkResolver<'a, T> {
    pub fn new(
        transport: &'a T,
        api_base: impl Into<String>,
        user_agent: impl Into<String>,
        max_redirects: u32,
    ) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self {
            transport,
            api_base,
            user_agent: user_agent.into(),
            max_redirects,
        }
    }

    pub fn from_config(transport: &'a T, cfg: &CtdlConfig) -> Self {
        Self::new(
            transport,
            cfg.api_base.clone(),
            cfg.user_agent.clone(),
            cfg.max_redirects,
        )
    }

    pub fn info_url(&self, id: &str) -> String {
        format!("{}/download_info?xtlink={}", self.api_base, encode(id))
    }

    pub fn download_url(&self, id: &str, key: &str) -> String {
        format!(
            "{}/download?xtlink={}&file_id={}",
            self.api_base,
            encode(id),
            encode(key)
        )
    }

    /// Validates `link` and resolves it. Malformed links fail before any request.
    pub fn resolve(&self, link: &str) -> Result<ResolvedLink> {
        let id = parse_link(link)?;
        self.resolve_id(id)
    }

    /// Resolves an id that has already had its scheme stripped.
    pub fn resolve_id(&self, id: &str) -> Result<ResolvedLink> {
        let headers = user_agent_headers(&self.user_agent);

        let info_url = self.info_url(id);
        let response =
            self.transport
                .get(&info_url, &headers)
                .map_err(|source| Error::ApiTransport {
                    url: info_url.clone(),
                    source,
                })?;
        let infos: Vec<DownloadInfo> =
            serde_json::from_slice(&response.body).map_err(|source| Error::ApiParse {
                url: info_url.clone(),
                status: response.status,
                source,
            })?;

        let (file_key, name) = match infos.into_iter().next() {
            Some(DownloadInfo {
                key: Some(key),
                name,
            }) if !key.is_empty() => (key, name),
            _ => {
                return Err(Error::NotFound(format!(
                    "no file available for link id {}",
                    id
                )))
            }
        };
        tracing::debug!(id, file_key = %file_key, name = ?name, "download info resolved");

        let download_url = self.download_url(id, &file_key);
        let final_url = self
            .transport
            .probe_redirect(&download_url, &headers, self.max_redirects)
            .map_err(|source| Error::ApiTransport {
                url: download_url.clone(),
                source,
            })?;
        let filename = filename_from_redirect(&final_url);
        tracing::info!(%download_url, %filename, "link resolved");

        Ok(ResolvedLink {
            file_key,
            download_url,
            filename,
        })
    }
}
