//! mohua - inventory of active SageMaker compute
//!
//! The library holds the resilient listing core: the AWS transport in [`aws`],
//! the retry policy in [`retry`], and the SageMaker orchestrator with its error
//! classifier and noise suppressor in [`sagemaker`]. The `mohua` binary is a
//! thin command-line collaborator on top of it.

pub mod aws;
pub mod config;
pub mod retry;
pub mod sagemaker;

/// Version injected at compile time via MOHUA_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("MOHUA_VERSION") {
    Some(v) => v,
    None => "dev",
};
