//! AWS Authentication
//!
//! Region, credentials and endpoint settings come from the standard AWS
//! provider chains in `aws-config` (environment, shared config and
//! credentials files, SSO, EC2 instance metadata). Resolved credentials are
//! cached here until shortly before they expire.

use super::error::ApiError;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_types::region::Region;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

pub use aws_credential_types::Credentials;

/// Refresh cached credentials this long before they actually expire
const CREDENTIAL_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Provider name reported for fixed credentials
const STATIC_PROVIDER_NAME: &str = "mohua-static";

/// Check if credentials can still be used for a request
fn is_fresh(credentials: &Credentials) -> bool {
    match credentials.expiry() {
        Some(expiry) => SystemTime::now() + CREDENTIAL_EXPIRY_BUFFER < expiry,
        None => true,
    }
}

/// AWS credentials holder with caching
#[derive(Clone)]
pub struct AwsCredentials {
    provider: Option<SharedCredentialsProvider>,
    cache: Arc<RwLock<Option<Credentials>>>,
}

impl AwsCredentials {
    /// Resolve through `provider` lazily, on first use
    pub fn from_provider(provider: Option<SharedCredentialsProvider>) -> Self {
        Self {
            provider,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Fixed credentials, no resolution
    pub fn from_static(credentials: Credentials) -> Self {
        Self::from_provider(Some(SharedCredentialsProvider::new(credentials)))
    }

    /// Fixed access key pair without a session token
    pub fn from_keys(access_key_id: &str, secret_access_key: &str) -> Self {
        Self::from_static(Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            STATIC_PROVIDER_NAME,
        ))
    }

    /// Get credentials for signing a request.
    ///
    /// Concurrent callers that find the cache empty wait for one resolution
    /// instead of each walking the provider chain.
    pub async fn get(&self) -> Result<Credentials, ApiError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|c| is_fresh(c)) {
                return Ok(cached.clone());
            }
        }

        let mut cache = self.cache.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(cached) = cache.as_ref().filter(|c| is_fresh(c)) {
            return Ok(cached.clone());
        }

        let provider = self.provider.as_ref().ok_or_else(|| {
            ApiError::Credentials("no valid credential sources found".to_string())
        })?;

        tracing::debug!("Resolving AWS credentials");
        let credentials = provider.provide_credentials().await.map_err(|e| {
            ApiError::Credentials(format!("failed to load credentials: {}", DisplayErrorContext(&e)))
        })?;

        *cache = Some(credentials.clone());
        Ok(credentials)
    }
}

/// Settings resolved once per connection
pub struct ResolvedConfig {
    /// Empty when no provider yielded a region
    pub region: String,
    /// Endpoint override from `AWS_ENDPOINT_URL` or the profile
    pub endpoint_url: Option<String>,
    pub credentials: AwsCredentials,
}

/// Load region, endpoint and credentials the way the AWS CLI does.
///
/// An explicit region wins over the provider chain. `profile` selects a
/// named profile; otherwise `AWS_PROFILE` or `default` applies.
pub async fn load(profile: Option<&str>, region: Option<&str>) -> ResolvedConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(profile) = profile.filter(|p| !p.trim().is_empty()) {
        loader = loader.profile_name(profile);
    }
    if let Some(region) = region.filter(|r| !r.trim().is_empty()) {
        loader = loader.region(Region::new(region.to_string()));
    }

    let sdk_config = loader.load().await;

    ResolvedConfig {
        region: sdk_config
            .region()
            .map(|r| r.as_ref().to_string())
            .unwrap_or_default(),
        endpoint_url: sdk_config.endpoint_url().map(str::to_string),
        credentials: AwsCredentials::from_provider(sdk_config.credentials_provider()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_credential_types::provider::error::CredentialsError;
    use aws_credential_types::provider::future;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Counts resolutions; hands out credentials valid for `valid_for`
    #[derive(Debug)]
    struct CountingProvider {
        calls: Arc<AtomicU32>,
        valid_for: Option<Duration>,
    }

    impl ProvideCredentials for CountingProvider {
        fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
        where
            Self: 'a,
        {
            let calls = self.calls.clone();
            let expiry = self.valid_for.map(|d| SystemTime::now() + d);
            future::ProvideCredentials::new(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(Credentials::new("AKIDCOUNTED", "secret", None, expiry, "counting"))
            })
        }
    }

    #[derive(Debug)]
    struct NoRoleProvider;

    impl ProvideCredentials for NoRoleProvider {
        fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
        where
            Self: 'a,
        {
            future::ProvideCredentials::ready(Err(CredentialsError::not_loaded(
                "no EC2 IMDS role found",
            )))
        }
    }

    fn counting(valid_for: Option<Duration>) -> (AwsCredentials, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let provider = CountingProvider {
            calls: calls.clone(),
            valid_for,
        };
        (
            AwsCredentials::from_provider(Some(SharedCredentialsProvider::new(provider))),
            calls,
        )
    }

    #[tokio::test]
    async fn test_static_credentials() {
        let creds = AwsCredentials::from_keys("AKIDSTATIC", "secret");
        let resolved = creds.get().await.unwrap();
        assert_eq!(resolved.access_key_id(), "AKIDSTATIC");
        assert!(resolved.session_token().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_first_use_resolves_once() {
        let (creds, calls) = counting(None);

        let (a, b, c) = tokio::join!(creds.get(), creds.get(), creds.get());
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        creds.get().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expiring_credentials_are_refreshed() {
        let (creds, calls) = counting(Some(Duration::from_secs(30)));
        creds.get().await.unwrap();
        creds.get().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let (creds, calls) = counting(Some(Duration::from_secs(3600)));
        creds.get().await.unwrap();
        creds.get().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_keeps_source_text() {
        let creds = AwsCredentials::from_provider(Some(SharedCredentialsProvider::new(NoRoleProvider)));
        let err = creds.get().await.unwrap_err();
        assert!(matches!(err, ApiError::Credentials(_)));
        assert!(err.to_string().contains("no EC2 IMDS role found"), "{err}");
    }

    #[tokio::test]
    async fn test_missing_provider() {
        let err = AwsCredentials::from_provider(None).get().await.unwrap_err();
        assert!(err.to_string().contains("no valid credential sources"));
    }

    #[tokio::test]
    async fn test_explicit_region_wins() {
        let resolved = load(None, Some("ap-south-1")).await;
        assert_eq!(resolved.region, "ap-south-1");
    }
}
