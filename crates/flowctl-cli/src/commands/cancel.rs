//! Cancel command

use crate::error::CliResult;
use crate::output::{print_info, print_success};
use clap::Subcommand;
use flowctl_engine::{cancel_if_not_terminal, CancelOutcome, FlowClient};
use flowctl_types::FlowKey;

/// Cancel subcommands
#[derive(Subcommand)]
pub enum CancelCommands {
    /// Cancel a flow instance by key
    #[command(alias = "i")]
    Instance {
        /// Instance key
        key: String,

        /// Send the cancel request without checking the current state first
        #[arg(long)]
        no_state_check: bool,
    },
}

/// Execute a cancel command
pub async fn execute(command: CancelCommands, client: &dyn FlowClient) -> CliResult<()> {
    match command {
        CancelCommands::Instance {
            key,
            no_state_check,
        } => {
            let key = FlowKey::new(key);
            match cancel_if_not_terminal(client, &key, no_state_check).await? {
                CancelOutcome::Submitted => {
                    print_success(&format!("cancellation submitted for instance {key}"));
                }
                CancelOutcome::AlreadyTerminal { state } => {
                    print_info(&format!(
                        "instance {key} is already in state {state}, nothing to cancel"
                    ));
                }
            }
            Ok(())
        }
    }
}
