//! The remote SageMaker surface the inventory depends on.

use super::types::{
    ListAppsInput, ListAppsOutput, ListDomainsInput, ListDomainsOutput, ListEndpointsInput,
    ListEndpointsOutput, ListNotebookInstancesInput, ListNotebookInstancesOutput,
};
use crate::aws::error::ApiError;
use crate::aws::http::AwsHttpClient;
use async_trait::async_trait;

/// Service name used for signing and endpoint resolution
pub const SIGNING_NAME: &str = "sagemaker";

/// Prefix of the `X-Amz-Target` header
pub const TARGET_PREFIX: &str = "SageMaker";

/// Read-only list operations. Implemented over HTTP in production and by
/// mocks in tests.
#[async_trait]
pub trait SageMakerApi: Send + Sync {
    async fn list_apps(&self, input: ListAppsInput) -> Result<ListAppsOutput, ApiError>;

    async fn list_endpoints(
        &self,
        input: ListEndpointsInput,
    ) -> Result<ListEndpointsOutput, ApiError>;

    async fn list_notebook_instances(
        &self,
        input: ListNotebookInstancesInput,
    ) -> Result<ListNotebookInstancesOutput, ApiError>;

    async fn list_domains(&self, input: ListDomainsInput) -> Result<ListDomainsOutput, ApiError>;
}

#[async_trait]
impl SageMakerApi for AwsHttpClient {
    async fn list_apps(&self, input: ListAppsInput) -> Result<ListAppsOutput, ApiError> {
        self.call("ListApps", &input).await
    }

    async fn list_endpoints(
        &self,
        input: ListEndpointsInput,
    ) -> Result<ListEndpointsOutput, ApiError> {
        self.call("ListEndpoints", &input).await
    }

    async fn list_notebook_instances(
        &self,
        input: ListNotebookInstancesInput,
    ) -> Result<ListNotebookInstancesOutput, ApiError> {
        self.call("ListNotebookInstances", &input).await
    }

    async fn list_domains(&self, input: ListDomainsInput) -> Result<ListDomainsOutput, ApiError> {
        self.call("ListDomains", &input).await
    }
}
