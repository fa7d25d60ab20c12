//! Deploy command

use crate::error::{CliError, CliResult};
use crate::output::{self, print_success, OutputFormat};
use clap::Args;
use flowctl_engine::FlowClient;
use flowctl_types::DeployResource;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;
use tracing::debug;

/// Deploy flow definition resources
#[derive(Args)]
pub struct DeployArgs {
    /// Paths to definition resource files (repeatable)
    #[arg(short, long = "file", required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Serialize, Tabled)]
struct DeployedRow {
    key: String,
    definition: String,
    version: i32,
}

/// Execute the deploy command
pub async fn execute(
    args: DeployArgs,
    client: &dyn FlowClient,
    tenant: &str,
    format: OutputFormat,
) -> CliResult<()> {
    let mut resources = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                CliError::InvalidInput(format!("{} is not a valid file path", path.display()))
            })?
            .to_string();
        let content = std::fs::read(path)?;
        resources.push(DeployResource { name, content });
    }

    debug!(count = resources.len(), %tenant, "deploying definition resources");
    let deployed = client.deploy_definitions(tenant, &resources).await?;
    print_success(&format!(
        "deployed {} definition(s) to tenant {tenant}",
        deployed.len()
    ));

    let rows: Vec<DeployedRow> = deployed
        .into_iter()
        .map(|d| DeployedRow {
            key: d.key.to_string(),
            definition: d.definition_id,
            version: d.version,
        })
        .collect();
    output::print_output(rows, format);
    Ok(())
}
