//! Client for the split v1 API generation
//!
//! Queries and deletes go to the operations service; cancellations and
//! deployments go to the gateway service. Keys are integers on the wire
//! and are rendered as decimal strings at this boundary. v1 problem
//! documents carry no machine-readable code, so the delete precondition is
//! recognized by its documented message.

use crate::http::{base, Http};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flowctl_engine::{ClientError, FlowClient};
use flowctl_types::{
    ChangeStatus, DefinitionFilter, DeployResource, FlowDefinition, FlowInstance, FlowKey,
    FlowState, InstanceFilter,
};
use serde::{Deserialize, Serialize};

/// Page size used when listing the direct children of an instance.
const CHILD_PAGE_SIZE: i32 = 1000;

/// Exact detail string the v1 operations service returns when a delete is
/// refused for a non-terminal instance. v1 offers no error code, so this
/// is the only signal; if the backend ever rewords it the match breaks.
const WRONG_STATE_DETAIL: &str =
    "flow instance needs to be in one of the states [COMPLETED, CANCELED]";

pub struct V1Client {
    http: Http,
    gateway_url: String,
    ops_url: String,
    tenant: String,
}

impl V1Client {
    pub fn new(http: Http, gateway_url: &str, ops_url: &str, tenant: &str) -> Self {
        Self {
            http,
            gateway_url: base(gateway_url),
            ops_url: base(ops_url),
            tenant: tenant.to_string(),
        }
    }

    fn ops(&self, tail: &str) -> String {
        format!("{}/v1/{tail}", self.ops_url)
    }

    fn gateway(&self, tail: &str) -> String {
        format!("{}/v1/{tail}", self.gateway_url)
    }
}

fn numeric_key(key: &FlowKey) -> Result<i64, ClientError> {
    key.as_str().parse().map_err(|_| ClientError::Malformed {
        message: format!("v1 keys are numeric, got {:?}", key.as_str()),
    })
}

/// Promote the documented wrong-state 400 to the distinguished kind.
fn refine_delete_error(err: ClientError) -> ClientError {
    match err {
        ClientError::Api { status: 400, message } if message.contains(WRONG_STATE_DETAIL) => {
            ClientError::InvalidState { message }
        }
        other => other,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstanceDto {
    key: i64,
    definition_id: String,
    #[serde(default)]
    definition_key: Option<i64>,
    #[serde(default)]
    version: Option<i32>,
    #[serde(default)]
    version_tag: Option<String>,
    state: String,
    #[serde(default)]
    incident: bool,
    #[serde(default)]
    parent_key: Option<i64>,
    #[serde(default)]
    tenant_id: String,
    #[serde(default)]
    start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    end_date: Option<DateTime<Utc>>,
}

impl TryFrom<InstanceDto> for FlowInstance {
    type Error = ClientError;

    fn try_from(dto: InstanceDto) -> Result<Self, ClientError> {
        Ok(FlowInstance {
            key: FlowKey::from(dto.key),
            definition_id: dto.definition_id,
            definition_key: dto.definition_key.map(FlowKey::from),
            version: dto.version,
            version_tag: dto.version_tag,
            state: parse_state(&dto.state)?,
            incident: dto.incident,
            // v1 reports 0 for instances without a parent
            parent_key: dto.parent_key.filter(|k| *k != 0).map(FlowKey::from),
            tenant: dto.tenant_id,
            start_time: dto.start_date,
            end_time: dto.end_date,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefinitionDto {
    key: i64,
    definition_id: String,
    #[serde(default)]
    name: Option<String>,
    version: i32,
    #[serde(default)]
    version_tag: Option<String>,
    #[serde(default)]
    tenant_id: String,
}

impl From<DefinitionDto> for FlowDefinition {
    fn from(dto: DefinitionDto) -> Self {
        FlowDefinition {
            key: FlowKey::from(dto.key),
            definition_id: dto.definition_id,
            name: dto.name,
            version: dto.version,
            version_tag: dto.version_tag,
            tenant: dto.tenant_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<F: Serialize> {
    filter: F,
    size: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InstanceFilterDto {
    tenant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    definition_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_key: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DefinitionFilterDto {
    tenant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    definition_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_tag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    deleted: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeploymentRequest {
    tenant_id: String,
    resources: Vec<ResourceDto>,
}

#[derive(Debug, Serialize)]
struct ResourceDto {
    name: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct DeploymentResponse {
    #[serde(default = "Vec::new")]
    deployments: Vec<DefinitionDto>,
}

fn parse_state(raw: &str) -> Result<FlowState, ClientError> {
    raw.parse().map_err(|_| ClientError::Malformed {
        message: format!("unknown instance state {raw:?}"),
    })
}

#[async_trait]
impl FlowClient for V1Client {
    async fn fetch_instance(&self, key: &FlowKey) -> Result<FlowInstance, ClientError> {
        let key = numeric_key(key)?;
        let dto: InstanceDto = self
            .http
            .get_json(self.ops(&format!("flow-instances/{key}")))
            .await?;
        dto.try_into()
    }

    // thin wrapper: v1 has no state-only route either
    async fn fetch_state(&self, key: &FlowKey) -> Result<FlowState, ClientError> {
        Ok(self.fetch_instance(key).await?.state)
    }

    async fn fetch_children(&self, parent: &FlowKey) -> Result<Vec<FlowInstance>, ClientError> {
        let filter = InstanceFilter {
            parent_key: Some(parent.clone()),
            ..Default::default()
        };
        self.search_instances(&filter, CHILD_PAGE_SIZE).await
    }

    async fn cancel(&self, key: &FlowKey) -> Result<(), ClientError> {
        let key = numeric_key(key)?;
        self.http
            .post_unit(
                self.gateway(&format!("flow-instances/{key}/cancel")),
                &serde_json::json!({}),
            )
            .await
    }

    async fn delete(&self, key: &FlowKey) -> Result<ChangeStatus, ClientError> {
        let key = numeric_key(key)?;
        let response: DeleteResponse = self
            .http
            .delete_json(self.ops(&format!("flow-instances/{key}")))
            .await
            .map_err(refine_delete_error)?;
        Ok(ChangeStatus {
            deleted: response.deleted,
            message: response.message,
        })
    }

    async fn search_instances(
        &self,
        filter: &InstanceFilter,
        size: i32,
    ) -> Result<Vec<FlowInstance>, ClientError> {
        let parent_key = filter
            .parent_key
            .as_ref()
            .map(numeric_key)
            .transpose()?;
        let body = SearchRequest {
            filter: InstanceFilterDto {
                tenant_id: self.tenant.clone(),
                definition_id: filter.definition_id.clone(),
                version: filter.version,
                version_tag: filter.version_tag.clone(),
                state: filter.state.map(|s| s.to_string()),
                parent_key,
            },
            size,
        };
        let response: SearchResponse<InstanceDto> = self
            .http
            .post_json(self.ops("flow-instances/search"), &body)
            .await?;
        response.items.into_iter().map(TryInto::try_into).collect()
    }

    async fn fetch_definition(&self, key: &FlowKey) -> Result<FlowDefinition, ClientError> {
        let key = numeric_key(key)?;
        let dto: DefinitionDto = self
            .http
            .get_json(self.ops(&format!("flow-definitions/{key}")))
            .await?;
        Ok(dto.into())
    }

    async fn search_definitions(
        &self,
        filter: &DefinitionFilter,
        size: i32,
    ) -> Result<Vec<FlowDefinition>, ClientError> {
        let body = SearchRequest {
            filter: DefinitionFilterDto {
                tenant_id: self.tenant.clone(),
                definition_id: filter.definition_id.clone(),
                version: filter.version,
                version_tag: filter.version_tag.clone(),
            },
            size,
        };
        let response: SearchResponse<DefinitionDto> = self
            .http
            .post_json(self.ops("flow-definitions/search"), &body)
            .await?;
        Ok(response.items.into_iter().map(Into::into).collect())
    }

    async fn deploy_definitions(
        &self,
        tenant: &str,
        resources: &[DeployResource],
    ) -> Result<Vec<FlowDefinition>, ClientError> {
        use base64::Engine as _;
        let body = DeploymentRequest {
            tenant_id: tenant.to_string(),
            resources: resources
                .iter()
                .map(|r| ResourceDto {
                    name: r.name.clone(),
                    content: base64::engine::general_purpose::STANDARD.encode(&r.content),
                })
                .collect(),
        };
        let response: DeploymentResponse = self
            .http
            .post_json(self.gateway("deployments"), &body)
            .await?;
        Ok(response.deployments.into_iter().map(Into::into).collect())
    }
}
