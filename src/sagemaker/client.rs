//! SageMaker Client
//!
//! Owns one configured connection and exposes one independent, retried
//! query per resource kind plus a cheap configuration probe. Every listing
//! keeps only in-service entries and maps them to a uniform
//! [`ResourceRecord`].

use super::api::{SageMakerApi, SIGNING_NAME, TARGET_PREFIX};
use super::errors::{AwsErrorClassifier, ClassifiedError, ErrorClassifier};
use super::types::{
    AppDetails, EndpointSummary, ListAppsInput, ListDomainsInput, ListEndpointsInput,
    ListNotebookInstancesInput, NotebookInstanceSummary, APP_TYPE_JUPYTER_LAB,
    APP_TYPE_JUPYTER_SERVER, STATUS_IN_SERVICE,
};
use crate::aws::auth;
use crate::aws::error::ApiError;
use crate::aws::http::AwsHttpClient;
use crate::retry::{Retrier, RetryConfig};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Instance type shown when the listing does not carry one
pub const UNKNOWN_INSTANCE_TYPE: &str = "unknown";

/// Endpoint summaries carry no instance count; an in-service endpoint runs at least one
const ENDPOINT_DEFAULT_INSTANCE_COUNT: u32 = 1;

/// Upper bound on pages fetched for one listing
pub const MAX_PAGES: usize = 1000;

pub const STUDIO_CLASSIC_LABEL: &str = "Old Studio (JupyterServer)";
pub const STUDIO_LAB_LABEL: &str = "New Studio (JupyterLab)";
pub const STUDIO_UNKNOWN_LABEL: &str = "Unknown Studio";

/// Uniform record for any resource kind
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    pub name: String,
    pub status: String,
    pub instance_type: String,
    pub instance_count: u32,
    pub creation_time: DateTime<Utc>,
    pub volume_size: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user_profile: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub app_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub space_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub studio_type: String,
}

/// The kinds of compute the inventory covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Endpoint,
    Notebook,
    StudioApp,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [Self::Endpoint, Self::Notebook, Self::StudioApp];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Endpoint => "Endpoints",
            Self::Notebook => "Notebook Instances",
            Self::StudioApp => "Studio Apps",
        }
    }
}

/// Construction-time inputs
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Explicit region; otherwise resolved from the environment
    pub region: Option<String>,
    /// Named profile for credentials and config lookups
    pub profile: Option<String>,
    /// Endpoint override (e.g. a local mock)
    pub endpoint_url: Option<String>,
    /// Retry policy; the shared default when unset
    pub retry: Option<RetryConfig>,
}

/// Resource query orchestrator. Cheap to clone, safe to share.
#[derive(Clone)]
pub struct Client {
    api: Arc<dyn SageMakerApi>,
    classifier: Arc<dyn ErrorClassifier>,
    retry: RetryConfig,
    region: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("region", &self.region)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a new client talking to SageMaker over HTTP
    pub async fn new(options: ClientOptions) -> Result<Self> {
        let resolved = auth::load(options.profile.as_deref(), options.region.as_deref()).await;
        let region = resolved.region;
        if region.is_empty() {
            tracing::warn!("No AWS region configured");
        } else {
            tracing::info!("Using AWS region: {}", region);
        }

        let endpoint_url = options.endpoint_url.clone().or(resolved.endpoint_url);
        let http = AwsHttpClient::new(
            SIGNING_NAME,
            TARGET_PREFIX,
            &region,
            endpoint_url.as_deref(),
            resolved.credentials,
        )
        .context("Failed to initialize SageMaker client")?;

        let mut client = Self::from_api(Arc::new(http), region);
        if let Some(retry) = options.retry {
            retry.validate().context("Invalid retry configuration")?;
            client.retry = retry;
        }
        Ok(client)
    }

    /// Build on any [`SageMakerApi`] implementation
    pub fn from_api(api: Arc<dyn SageMakerApi>, region: impl Into<String>) -> Self {
        Self {
            api,
            classifier: Arc::new(AwsErrorClassifier),
            retry: RetryConfig::default(),
            region: region.into(),
        }
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Region used for the connection; empty if none could be resolved
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Probe whether the credentials and permissions are usable.
    ///
    /// An authentication failure is a normal outcome here and yields
    /// `Ok(false)`; any other failure is returned as the error.
    pub async fn validate_configuration(
        &self,
        cancel: &CancellationToken,
    ) -> Result<bool, ClassifiedError> {
        let api = self.api.as_ref();
        let probe = self
            .call(cancel, || {
                api.list_domains(ListDomainsInput {
                    max_results: Some(1),
                    next_token: None,
                })
            })
            .await;

        match probe {
            Ok(_) => Ok(true),
            Err(err) if err.is_authentication() => {
                tracing::warn!(
                    "AWS configuration not usable: {} ({})",
                    err,
                    err.hint().unwrap_or_default()
                );
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// In-service inference endpoints
    pub async fn list_endpoints(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResourceRecord>, ClassifiedError> {
        let api = self.api.as_ref();
        let endpoints = self
            .paginate(cancel, |next_token| async move {
                let output = api
                    .list_endpoints(ListEndpointsInput {
                        next_token,
                        ..Default::default()
                    })
                    .await?;
                Ok::<_, ApiError>((output.endpoints, output.next_token))
            })
            .await?;

        let records = endpoint_records(&endpoints);
        tracing::debug!("{} of {} endpoints in service", records.len(), endpoints.len());
        Ok(records)
    }

    /// In-service notebook instances
    pub async fn list_notebooks(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResourceRecord>, ClassifiedError> {
        let api = self.api.as_ref();
        let notebooks = self
            .paginate(cancel, |next_token| async move {
                let output = api
                    .list_notebook_instances(ListNotebookInstancesInput {
                        next_token,
                        ..Default::default()
                    })
                    .await?;
                Ok::<_, ApiError>((output.notebook_instances, output.next_token))
            })
            .await?;

        let records = notebook_records(&notebooks);
        tracing::debug!("{} of {} notebooks in service", records.len(), notebooks.len());
        Ok(records)
    }

    /// In-service Studio apps
    pub async fn list_studio_apps(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResourceRecord>, ClassifiedError> {
        let api = self.api.as_ref();
        let apps = self
            .paginate(cancel, |next_token| async move {
                let output = api
                    .list_apps(ListAppsInput {
                        next_token,
                        ..Default::default()
                    })
                    .await?;
                Ok::<_, ApiError>((output.apps, output.next_token))
            })
            .await?;

        let records = studio_app_records(&apps);
        tracing::debug!("{} of {} studio apps in service", records.len(), apps.len());
        Ok(records)
    }

    /// Dispatch to the listing for `kind`
    pub async fn list(
        &self,
        kind: ResourceKind,
        cancel: &CancellationToken,
    ) -> Result<Vec<ResourceRecord>, ClassifiedError> {
        match kind {
            ResourceKind::Endpoint => self.list_endpoints(cancel).await,
            ResourceKind::Notebook => self.list_notebooks(cancel).await,
            ResourceKind::StudioApp => self.list_studio_apps(cancel).await,
        }
    }

    /// Run one request under the retry policy, classifying its failures
    async fn call<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut request: F,
    ) -> Result<T, ClassifiedError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let classifier = self.classifier.as_ref();
        Retrier::new(self.retry)
            .run(cancel, || {
                let pending = request();
                async move { pending.await.map_err(|e| classifier.classify(e)) }
            })
            .await
    }

    /// Follow `NextToken` until exhausted; each page is retried on its own.
    ///
    /// A token seen before, or more than [`MAX_PAGES`] pages, ends the
    /// listing with a permanent error.
    async fn paginate<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut fetch_page: F,
    ) -> Result<Vec<T>, ClassifiedError>
    where
        F: FnMut(Option<String>) -> Fut,
        Fut: Future<Output = Result<(Vec<T>, Option<String>), ApiError>>,
    {
        let mut items = Vec::new();
        let mut seen = HashSet::new();
        let mut next_token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let token = next_token.take();
            let (page, next) = self.call(cancel, || fetch_page(token.clone())).await?;
            items.extend(page);

            let Some(next) = next.filter(|t| !t.is_empty()) else {
                return Ok(items);
            };
            if !seen.insert(next.clone()) {
                tracing::error!("Pagination token {:?} repeated", next);
                return Err(ClassifiedError::Permanent {
                    code: None,
                    message: "pagination token repeated, listing would never end".to_string(),
                });
            }
            next_token = Some(next);
        }

        tracing::error!("Listing exceeded {} pages", MAX_PAGES);
        Err(ClassifiedError::Permanent {
            code: None,
            message: format!("listing exceeded {} pages", MAX_PAGES),
        })
    }
}

// =========================================================================
// Normalization
// =========================================================================

fn is_active(status: Option<&str>) -> bool {
    status == Some(STATUS_IN_SERVICE)
}

fn usable_name(name: Option<&str>) -> Option<String> {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

fn instance_type_or_unknown(instance_type: Option<&str>) -> String {
    instance_type
        .filter(|t| !t.is_empty())
        .unwrap_or(UNKNOWN_INSTANCE_TYPE)
        .to_string()
}

/// Human label for a Studio app's runtime flavor
pub fn studio_type(app_type: Option<&str>) -> &'static str {
    match app_type {
        Some(APP_TYPE_JUPYTER_SERVER) => STUDIO_CLASSIC_LABEL,
        Some(APP_TYPE_JUPYTER_LAB) => STUDIO_LAB_LABEL,
        _ => STUDIO_UNKNOWN_LABEL,
    }
}

/// Keep in-service endpoints with a name, in received order
pub fn endpoint_records(endpoints: &[EndpointSummary]) -> Vec<ResourceRecord> {
    endpoints
        .iter()
        .filter(|e| is_active(e.endpoint_status.as_deref()))
        .filter_map(|e| {
            Some(ResourceRecord {
                name: usable_name(e.endpoint_name.as_deref())?,
                status: STATUS_IN_SERVICE.to_string(),
                instance_type: UNKNOWN_INSTANCE_TYPE.to_string(),
                instance_count: ENDPOINT_DEFAULT_INSTANCE_COUNT,
                creation_time: e.creation_time.unwrap_or_default(),
                ..Default::default()
            })
        })
        .collect()
}

/// Keep in-service notebook instances with a name, in received order
pub fn notebook_records(notebooks: &[NotebookInstanceSummary]) -> Vec<ResourceRecord> {
    notebooks
        .iter()
        .filter(|n| is_active(n.notebook_instance_status.as_deref()))
        .filter_map(|n| {
            Some(ResourceRecord {
                name: usable_name(n.notebook_instance_name.as_deref())?,
                status: STATUS_IN_SERVICE.to_string(),
                instance_type: instance_type_or_unknown(n.instance_type.as_deref()),
                creation_time: n.creation_time.unwrap_or_default(),
                ..Default::default()
            })
        })
        .collect()
}

/// Keep in-service Studio apps with a name, in received order
pub fn studio_app_records(apps: &[AppDetails]) -> Vec<ResourceRecord> {
    apps.iter()
        .filter(|a| is_active(a.status.as_deref()))
        .filter_map(|a| {
            let instance_type = a
                .resource_spec
                .as_ref()
                .and_then(|spec| spec.instance_type.as_deref());

            Some(ResourceRecord {
                name: usable_name(a.app_name.as_deref())?,
                status: STATUS_IN_SERVICE.to_string(),
                instance_type: instance_type_or_unknown(instance_type),
                creation_time: a.creation_time.unwrap_or_default(),
                user_profile: a.user_profile_name.clone().unwrap_or_default(),
                app_type: a.app_type.clone().unwrap_or_default(),
                space_name: a.space_name.clone().unwrap_or_default(),
                studio_type: studio_type(a.app_type.as_deref()).to_string(),
                ..Default::default()
            })
        })
        .collect()
}
