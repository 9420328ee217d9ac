//! Core of the `ctdl` downloader: accelerator provisioning, link resolution
//! and the pipeline that ties them to an aria2c run.

pub mod accelerator;
pub mod archive;
pub mod checksum;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod platform;
pub mod provision;
pub mod resolver;
pub mod transport;

pub use error::{Error, ErrorKind, Result};
