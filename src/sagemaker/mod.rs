//! SageMaker resource inventory
//!
//! The resilient listing core. A [`Client`] owns one connection and runs each
//! query under a [`Retrier`](crate::retry::Retrier), classifying failures
//! with an [`ErrorClassifier`]. Callers that print errors route them through
//! an [`ErrorTracker`] so sustained failures are reported once.
//!
//! # Architecture
//!
//! - [`api`] - The remote surface ([`SageMakerApi`]) and its HTTP implementation
//! - [`types`] - Wire models with explicit optional fields
//! - [`errors`] - Error taxonomy and classification
//! - [`tracker`] - Repeated-error suppression
//! - [`client`] - Query orchestration and normalization into [`ResourceRecord`]s
//!
//! # Example
//!
//! ```ignore
//! use mohua::sagemaker::{Client, ClientOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! async fn list() -> anyhow::Result<()> {
//!     let client = Client::new(ClientOptions::default()).await?;
//!     let cancel = CancellationToken::new();
//!     if client.validate_configuration(&cancel).await? {
//!         let endpoints = client.list_endpoints(&cancel).await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod errors;
pub mod tracker;
pub mod types;

pub use api::SageMakerApi;
pub use client::{Client, ClientOptions, ResourceKind, ResourceRecord};
pub use errors::{AwsErrorClassifier, ClassifiedError, ErrorClassifier};
pub use tracker::{ErrorTracker, TrackedError};
