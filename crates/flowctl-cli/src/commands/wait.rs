//! Wait command

use crate::error::{CliError, CliResult};
use crate::output::print_success;
use clap::Subcommand;
use flowctl_engine::{wait_for_state, FlowClient};
use flowctl_types::{BackoffPolicy, FlowKey, FlowState};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use super::{parse_state, BackoffArgs};

/// Wait subcommands
#[derive(Subcommand)]
pub enum WaitCommands {
    /// Wait for a flow instance to reach one of the given states
    #[command(alias = "i")]
    Instance {
        /// Instance key
        key: String,

        /// Acceptable states (active, completed, canceled, terminated,
        /// absent); repeatable or comma-separated
        #[arg(short, long, value_parser = parse_state, value_delimiter = ',', required = true)]
        state: Vec<FlowState>,

        #[command(flatten)]
        backoff: BackoffArgs,
    },
}

/// Execute a wait command
pub async fn execute(
    command: WaitCommands,
    client: &dyn FlowClient,
    base_policy: &BackoffPolicy,
) -> CliResult<()> {
    match command {
        WaitCommands::Instance {
            key,
            state,
            backoff,
        } => {
            // the wildcard never reaches the engine
            if state.contains(&FlowState::All) {
                return Err(CliError::InvalidInput(
                    "cannot wait for the ALL wildcard; name concrete states".to_string(),
                ));
            }

            let policy = backoff.apply(base_policy);
            let key = FlowKey::new(key);
            let states = state
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", ");

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap(),
            );
            spinner.enable_steady_tick(Duration::from_millis(120));
            spinner.set_message(format!("waiting for instance {key} to reach [{states}]"));

            let result = wait_for_state(client, &key, &state, &policy).await;
            spinner.finish_and_clear();

            let reached = result?;
            print_success(&format!("instance {key} reached state {reached}"));
            Ok(())
        }
    }
}
