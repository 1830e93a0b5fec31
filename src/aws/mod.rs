//! AWS API interaction module
//!
//! This module provides the plumbing needed to talk to AWS JSON-protocol
//! services: configuration and credentials from the standard AWS provider
//! chains, Signature Version 4 signing, and an HTTP client that turns
//! service failures into structured [`error::ApiError`] values.
//!
//! # Module Structure
//!
//! - [`auth`] - Region, endpoint and cached credentials via `aws-config`
//! - [`error`] - Raw failures as reported by the transport or the service
//! - [`http`] - JSON 1.1 protocol client
//! - [`sigv4`] - Request signing via `aws-sigv4`
//!
//! # Example
//!
//! ```ignore
//! use mohua::aws::{auth, http::AwsHttpClient};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let resolved = auth::load(Some("default"), Some("us-east-1")).await;
//!     let http = AwsHttpClient::new(
//!         "sagemaker",
//!         "SageMaker",
//!         &resolved.region,
//!         resolved.endpoint_url.as_deref(),
//!         resolved.credentials,
//!     )?;
//!     let out: serde_json::Value = http.call("ListDomains", &serde_json::json!({})).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod error;
pub mod http;
pub mod sigv4;
