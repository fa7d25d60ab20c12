//! Query commands for instances and definitions

use crate::error::CliResult;
use crate::output::{self, OutputFormat};
use clap::Subcommand;
use flowctl_engine::{filter_orphans, FlowClient};
use flowctl_types::{DefinitionFilter, FlowDefinition, FlowInstance, FlowKey, InstanceFilter};
use serde::Serialize;
use tabled::Tabled;

use super::parse_state;
use flowctl_types::FlowState;

/// Get subcommands
#[derive(Subcommand)]
pub enum GetCommands {
    /// Get one flow instance by key
    #[command(alias = "i")]
    Instance {
        /// Instance key
        key: String,
    },

    /// List flow instances
    #[command(alias = "is")]
    Instances {
        /// Filter by definition id
        #[arg(long)]
        definition: Option<String>,

        /// Filter by definition version
        #[arg(long)]
        version: Option<i32>,

        /// Filter by definition version tag
        #[arg(long)]
        version_tag: Option<String>,

        /// Filter by state (active, completed, canceled, terminated, all)
        #[arg(long, value_parser = parse_state)]
        state: Option<FlowState>,

        /// Filter by parent instance key
        #[arg(long)]
        parent: Option<String>,

        /// Keep only instances whose parent no longer exists
        #[arg(long)]
        orphans_only: bool,

        /// Maximum number of results
        #[arg(long, default_value = "100")]
        size: i32,
    },

    /// Get one flow definition by key
    #[command(alias = "d")]
    Definition {
        /// Definition key
        key: String,
    },

    /// List flow definitions
    #[command(alias = "ds")]
    Definitions {
        /// Filter by definition id
        #[arg(long)]
        definition: Option<String>,

        /// Filter by version
        #[arg(long)]
        version: Option<i32>,

        /// Filter by version tag
        #[arg(long)]
        version_tag: Option<String>,

        /// Maximum number of results
        #[arg(long, default_value = "100")]
        size: i32,
    },
}

/// Table row for instance display
#[derive(Debug, Serialize, Tabled)]
struct InstanceRow {
    key: String,
    definition: String,
    version: String,
    state: String,
    incident: String,
    parent: String,
    started: String,
}

impl From<FlowInstance> for InstanceRow {
    fn from(instance: FlowInstance) -> Self {
        Self {
            key: instance.key.to_string(),
            definition: instance.definition_id,
            version: instance
                .version
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string()),
            state: instance.state.to_string(),
            incident: if instance.incident { "yes" } else { "" }.to_string(),
            parent: instance
                .parent_key
                .map(|k| k.to_string())
                .unwrap_or_else(|| "-".to_string()),
            started: instance
                .start_time
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Table row for definition display
#[derive(Debug, Serialize, Tabled)]
struct DefinitionRow {
    key: String,
    definition: String,
    name: String,
    version: i32,
    tag: String,
}

impl From<FlowDefinition> for DefinitionRow {
    fn from(definition: FlowDefinition) -> Self {
        Self {
            key: definition.key.to_string(),
            definition: definition.definition_id,
            name: definition.name.unwrap_or_else(|| "-".to_string()),
            version: definition.version,
            tag: definition.version_tag.unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Execute a get command
pub async fn execute(
    command: GetCommands,
    client: &dyn FlowClient,
    format: OutputFormat,
) -> CliResult<()> {
    match command {
        GetCommands::Instance { key } => {
            let instance = client.fetch_instance(&FlowKey::new(key)).await?;
            output::print_single(&instance, format);
            Ok(())
        }

        GetCommands::Instances {
            definition,
            version,
            version_tag,
            state,
            parent,
            orphans_only,
            size,
        } => {
            let filter = InstanceFilter {
                definition_id: definition,
                version,
                version_tag,
                state,
                parent_key: parent.map(FlowKey::new),
            };
            let mut instances = client.search_instances(&filter, size).await?;
            if orphans_only {
                instances = filter_orphans(client, &instances).await?;
            }
            let rows: Vec<InstanceRow> = instances.into_iter().map(InstanceRow::from).collect();
            output::print_output(rows, format);
            Ok(())
        }

        GetCommands::Definition { key } => {
            let definition = client.fetch_definition(&FlowKey::new(key)).await?;
            output::print_single(&definition, format);
            Ok(())
        }

        GetCommands::Definitions {
            definition,
            version,
            version_tag,
            size,
        } => {
            let filter = DefinitionFilter {
                definition_id: definition,
                version,
                version_tag,
            };
            let definitions = client.search_definitions(&filter, size).await?;
            let rows: Vec<DefinitionRow> =
                definitions.into_iter().map(DefinitionRow::from).collect();
            output::print_output(rows, format);
            Ok(())
        }
    }
}
