//! Remote splat generation.
//!
//! Delegates the heavy reconstruction stage to a remote job service
//! through a polling protocol:
//!
//! ```text
//! upload(video) ─▶ start_job(asset) ─▶ poll every 2 s ─▶ download ─▶ persist
//!                    └──────────── 180 s hard deadline ────────────┘
//! ```
//!
//! Failures collapse onto the stable [`FailReason`] codes; the
//! not-configured client keeps the whole path testable offline.

mod client;
mod generate;
mod http;

pub use client::{JobStatus, NotConfiguredRemoteJobClient, RemoteJobClient, RemoteJobClientError};
pub use generate::{FailReason, GenerateResult, RemoteGenerator};
pub use http::HttpRemoteJobClient;
