//! Client for the unified v2 API generation
//!
//! One service hosts every route; keys are strings on the wire and error
//! responses are problem documents with a machine-readable `code` field,
//! so classification needs no message matching.

use crate::http::{base, Http};
use async_trait::async_trait;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use flowctl_engine::{ClientError, FlowClient};
use flowctl_types::{
    ChangeStatus, DefinitionFilter, DeployResource, FlowDefinition, FlowInstance, FlowKey,
    FlowState, InstanceFilter,
};
use serde::{Deserialize, Serialize};

/// Page size used when listing the direct children of an instance.
const CHILD_PAGE_SIZE: i32 = 1000;

pub struct V2Client {
    http: Http,
    base_url: String,
    tenant: String,
}

impl V2Client {
    pub fn new(http: Http, base_url: &str, tenant: &str) -> Self {
        Self {
            http,
            base_url: base(base_url),
            tenant: tenant.to_string(),
        }
    }

    fn route(&self, tail: &str) -> String {
        format!("{}/v2/{tail}", self.base_url)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstanceDto {
    flow_instance_key: String,
    flow_definition_id: String,
    #[serde(default)]
    flow_definition_key: Option<String>,
    #[serde(default)]
    version: Option<i32>,
    #[serde(default)]
    version_tag: Option<String>,
    state: String,
    #[serde(default)]
    has_incident: bool,
    #[serde(default)]
    parent_flow_instance_key: Option<String>,
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
            key: FlowKey::new(dto.flow_instance_key),
            definition_id: dto.flow_definition_id,
            definition_key: dto.flow_definition_key.map(FlowKey::new),
            version: dto.version,
            version_tag: dto.version_tag,
            state: parse_state(&dto.state)?,
            incident: dto.has_incident,
            parent_key: dto.parent_flow_instance_key.map(FlowKey::new),
            tenant: dto.tenant_id,
            start_time: dto.start_date,
            end_time: dto.end_date,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefinitionDto {
    flow_definition_key: String,
    flow_definition_id: String,
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
            key: FlowKey::new(dto.flow_definition_key),
            definition_id: dto.flow_definition_id,
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
    flow_definition_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_flow_instance_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DefinitionFilterDto {
    tenant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    flow_definition_id: Option<String>,
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
#[serde(rename_all = "camelCase")]
struct DeleteResponse {
    deleted_records: i64,
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
impl FlowClient for V2Client {
    async fn fetch_instance(&self, key: &FlowKey) -> Result<FlowInstance, ClientError> {
        let dto: InstanceDto = self
            .http
            .get_json(self.route(&format!("flow-instances/{key}")))
            .await?;
        dto.try_into()
    }

    // thin wrapper: v2 has no state-only route
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
        self.http
            .post_unit(
                self.route(&format!("flow-instances/{key}/cancellation")),
                &serde_json::json!({}),
            )
            .await
    }

    async fn delete(&self, key: &FlowKey) -> Result<ChangeStatus, ClientError> {
        let response: DeleteResponse = self
            .http
            .delete_json(self.route(&format!("flow-instances/{key}")))
            .await?;
        Ok(ChangeStatus {
            deleted: response.deleted_records,
            message: response.message,
        })
    }

    async fn search_instances(
        &self,
        filter: &InstanceFilter,
        size: i32,
    ) -> Result<Vec<FlowInstance>, ClientError> {
        let body = SearchRequest {
            filter: InstanceFilterDto {
                tenant_id: self.tenant.clone(),
                flow_definition_id: filter.definition_id.clone(),
                version: filter.version,
                version_tag: filter.version_tag.clone(),
                state: filter.state.map(|s| s.to_string()),
                parent_flow_instance_key: filter.parent_key.as_ref().map(|k| k.to_string()),
            },
            size,
        };
        let response: SearchResponse<InstanceDto> = self
            .http
            .post_json(self.route("flow-instances/search"), &body)
            .await?;
        response.items.into_iter().map(TryInto::try_into).collect()
    }

    async fn fetch_definition(&self, key: &FlowKey) -> Result<FlowDefinition, ClientError> {
        let dto: DefinitionDto = self
            .http
            .get_json(self.route(&format!("flow-definitions/{key}")))
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
                flow_definition_id: filter.definition_id.clone(),
                version: filter.version,
                version_tag: filter.version_tag.clone(),
            },
            size,
        };
        let response: SearchResponse<DefinitionDto> = self
            .http
            .post_json(self.route("flow-definitions/search"), &body)
            .await?;
        Ok(response.items.into_iter().map(Into::into).collect())
    }

    async fn deploy_definitions(
        &self,
        tenant: &str,
        resources: &[DeployResource],
    ) -> Result<Vec<FlowDefinition>, ClientError> {
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
        let response: DeploymentResponse =
            self.http.post_json(self.route("deployments"), &body).await?;
        Ok(response.deployments.into_iter().map(Into::into).collect())
    }
}
