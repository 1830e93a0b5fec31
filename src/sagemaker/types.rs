//! SageMaker wire models
//!
//! Only the fields the inventory reads. Every field the service may omit
//! is an `Option`, and mapping to a record decides the default.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status value shared by every kind for "running and billable"
pub const STATUS_IN_SERVICE: &str = "InService";

pub const APP_TYPE_JUPYTER_SERVER: &str = "JupyterServer";
pub const APP_TYPE_JUPYTER_LAB: &str = "JupyterLab";

// =========================================================================
// Inputs
// =========================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListAppsInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListEndpointsInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListNotebookInstancesInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListDomainsInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

// =========================================================================
// Outputs
// =========================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceSpec {
    #[serde(default)]
    pub instance_type: Option<String>,
    #[serde(default)]
    pub sage_maker_image_arn: Option<String>,
    #[serde(default)]
    pub lifecycle_config_arn: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppDetails {
    #[serde(default)]
    pub domain_id: Option<String>,
    #[serde(default)]
    pub user_profile_name: Option<String>,
    #[serde(default)]
    pub space_name: Option<String>,
    #[serde(default)]
    pub app_type: Option<String>,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, with = "epoch_seconds")]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resource_spec: Option<ResourceSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListAppsOutput {
    #[serde(default)]
    pub apps: Vec<AppDetails>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndpointSummary {
    #[serde(default)]
    pub endpoint_name: Option<String>,
    #[serde(default)]
    pub endpoint_arn: Option<String>,
    #[serde(default)]
    pub endpoint_status: Option<String>,
    #[serde(default, with = "epoch_seconds")]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(default, with = "epoch_seconds")]
    pub last_modified_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListEndpointsOutput {
    #[serde(default)]
    pub endpoints: Vec<EndpointSummary>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotebookInstanceSummary {
    #[serde(default)]
    pub notebook_instance_name: Option<String>,
    #[serde(default)]
    pub notebook_instance_arn: Option<String>,
    #[serde(default)]
    pub notebook_instance_status: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub instance_type: Option<String>,
    #[serde(default, with = "epoch_seconds")]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(default, with = "epoch_seconds")]
    pub last_modified_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListNotebookInstancesOutput {
    #[serde(default)]
    pub notebook_instances: Vec<NotebookInstanceSummary>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DomainDetails {
    #[serde(default)]
    pub domain_arn: Option<String>,
    #[serde(default)]
    pub domain_id: Option<String>,
    #[serde(default)]
    pub domain_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, with = "epoch_seconds")]
    pub creation_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListDomainsOutput {
    #[serde(default)]
    pub domains: Vec<DomainDetails>,
    #[serde(default)]
    pub next_token: Option<String>,
}

/// JSON 1.1 timestamps: epoch seconds, possibly fractional
pub mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_f64(ts.timestamp_millis() as f64 / 1000.0),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(seconds) = Option::<f64>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let millis = (seconds * 1000.0).round() as i64;
        DateTime::from_timestamp_millis(millis)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {}", seconds)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_apps_output_tolerates_missing_fields() {
        let output: ListAppsOutput = serde_json::from_value(json!({
            "Apps": [
                {"Status": "InService", "AppType": "JupyterServer"},
                {
                    "AppName": "default",
                    "AppType": "JupyterLab",
                    "Status": "InService",
                    "SpaceName": "team-space",
                    "CreationTime": 1700000000.5,
                    "ResourceSpec": {"InstanceType": "ml.t3.medium"}
                }
            ],
            "NextToken": "abc"
        }))
        .unwrap();

        assert_eq!(output.apps.len(), 2);
        assert!(output.apps[0].app_name.is_none());
        assert!(output.apps[0].creation_time.is_none());
        assert!(output.apps[0].resource_spec.is_none());

        let app = &output.apps[1];
        assert_eq!(app.space_name.as_deref(), Some("team-space"));
        assert_eq!(
            app.creation_time.unwrap().timestamp_millis(),
            1_700_000_000_500
        );
        assert_eq!(
            app.resource_spec.as_ref().unwrap().instance_type.as_deref(),
            Some("ml.t3.medium")
        );
        assert_eq!(output.next_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_empty_output_decodes() {
        let output: ListEndpointsOutput = serde_json::from_str("{}").unwrap();
        assert!(output.endpoints.is_empty());
        assert!(output.next_token.is_none());
    }

    #[test]
    fn test_null_timestamp_decodes_as_none() {
        let summary: EndpointSummary =
            serde_json::from_value(json!({"EndpointName": "e", "CreationTime": null})).unwrap();
        assert!(summary.creation_time.is_none());
    }

    #[test]
    fn test_input_omits_unset_fields() {
        let input = ListDomainsInput {
            max_results: Some(1),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&input).unwrap(), json!({"MaxResults": 1}));
        assert_eq!(
            serde_json::to_value(ListAppsInput::default()).unwrap(),
            json!({})
        );
    }
}
