//! Delete command

use crate::error::CliResult;
use crate::output::{print_error, print_success};
use clap::Subcommand;
use flowctl_engine::{delete_with_cancel, FlowClient};
use flowctl_types::{BackoffPolicy, FlowKey};

use super::BackoffArgs;

/// Delete subcommands
#[derive(Subcommand)]
pub enum DeleteCommands {
    /// Delete a flow instance by key
    #[command(alias = "i")]
    Instance {
        /// Instance key
        key: String,

        /// Cancel the instance first if the engine refuses to delete it
        #[arg(long)]
        with_cancel: bool,

        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,

        #[command(flatten)]
        backoff: BackoffArgs,
    },
}

/// Execute a delete command
pub async fn execute(
    command: DeleteCommands,
    client: &dyn FlowClient,
    base_policy: &BackoffPolicy,
) -> CliResult<()> {
    match command {
        DeleteCommands::Instance {
            key,
            with_cancel,
            yes,
            backoff,
        } => {
            if !yes {
                let prompt = if with_cancel {
                    format!("Delete instance {key}? A running instance will be canceled first.")
                } else {
                    format!("Delete instance {key}?")
                };
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(prompt)
                    .default(false)
                    .interact()
                    .unwrap_or(false);
                if !confirm {
                    print_error("Aborted");
                    return Ok(());
                }
            }

            let policy = backoff.apply(base_policy);
            let key = FlowKey::new(key);
            let status = delete_with_cancel(client, &key, with_cancel, &policy).await?;
            print_success(&format!("deleted instance {key} ({status})"));
            Ok(())
        }
    }
}
