//! Walk command - lineage traversal views

use crate::error::CliResult;
use crate::output::OutputFormat;
use clap::{Subcommand, ValueEnum};
use flowctl_engine::{ancestry, descendants, family, FlowClient, Subtree};
use flowctl_types::{FlowInstance, FlowKey};
use std::collections::{HashMap, HashSet};

/// Walk subcommands
#[derive(Subcommand)]
pub enum WalkCommands {
    /// Traverse the parent/child graph starting from an instance
    #[command(alias = "i")]
    Instance {
        /// Start walking from this instance key
        key: String,

        /// Walk direction
        #[arg(long, value_enum, default_value_t = WalkMode::Ancestors)]
        mode: WalkMode,

        /// Only print the keys of the visited instances
        #[arg(long)]
        keys_only: bool,
    },
}

/// Which part of the lineage to reconstruct
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum WalkMode {
    /// Walk upward to the hierarchy root
    Ancestors,
    /// Walk the subtree below the instance
    Children,
    /// The whole tree containing the instance
    Family,
}

/// Execute a walk command
pub async fn execute(
    command: WalkCommands,
    client: &dyn FlowClient,
    format: OutputFormat,
) -> CliResult<()> {
    let WalkCommands::Instance {
        key,
        mode,
        keys_only,
    } = command;
    let start = FlowKey::new(key);

    match mode {
        WalkMode::Ancestors => {
            let walk = ancestry(client, &start).await?;
            render_flat(&walk.path, &walk.chain, keys_only, format)?;
        }
        WalkMode::Children => {
            let subtree = descendants(client, &start).await?;
            render_subtree(&subtree, keys_only, format)?;
        }
        WalkMode::Family => {
            let subtree = family(client, &start).await?;
            render_subtree(&subtree, keys_only, format)?;
        }
    }
    Ok(())
}

fn render_flat(
    path: &[FlowKey],
    chain: &HashMap<FlowKey, FlowInstance>,
    keys_only: bool,
    format: OutputFormat,
) -> CliResult<()> {
    if keys_only {
        return render_keys(path, format);
    }
    match format {
        OutputFormat::Table => {
            for (depth, key) in path.iter().enumerate() {
                let root_marker = if depth + 1 == path.len() { " (root)" } else { "" };
                let line = describe(key, chain);
                if depth == 0 {
                    println!("{line}{root_marker}");
                } else {
                    println!("{}└─ {line}{root_marker}", "   ".repeat(depth - 1));
                }
            }
        }
        _ => {
            let nodes: Vec<&FlowInstance> = path.iter().filter_map(|k| chain.get(k)).collect();
            crate::output::print_single(&nodes, format);
        }
    }
    Ok(())
}

fn render_subtree(subtree: &Subtree, keys_only: bool, format: OutputFormat) -> CliResult<()> {
    if keys_only {
        return render_keys(&subtree.keys, format);
    }
    match format {
        OutputFormat::Table => {
            if let Some(root) = subtree.keys.first() {
                println!("{}", describe(root, &subtree.chain));
                let mut rendered = HashSet::new();
                rendered.insert(root.clone());
                render_branch(root, subtree, "", &mut rendered);
            }
        }
        _ => {
            let nodes: Vec<&FlowInstance> = subtree
                .keys
                .iter()
                .filter_map(|k| subtree.chain.get(k))
                .collect();
            crate::output::print_single(&nodes, format);
        }
    }
    Ok(())
}

fn render_branch(
    parent: &FlowKey,
    subtree: &Subtree,
    prefix: &str,
    rendered: &mut HashSet<FlowKey>,
) {
    let Some(children) = subtree.edges.get(parent) else {
        return;
    };
    for (index, child) in children.iter().enumerate() {
        let last = index + 1 == children.len();
        let connector = if last { "└── " } else { "├── " };
        println!("{prefix}{connector}{}", describe(child, &subtree.chain));
        // stop on anything already printed; the remote data may repeat nodes
        if rendered.insert(child.clone()) {
            let extension = if last { "    " } else { "│   " };
            render_branch(child, subtree, &format!("{prefix}{extension}"), rendered);
        }
    }
}

fn render_keys(keys: &[FlowKey], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table => {
            for key in keys {
                println!("{key}");
            }
        }
        _ => crate::output::print_single(&keys, format),
    }
    Ok(())
}

fn describe(key: &FlowKey, chain: &HashMap<FlowKey, FlowInstance>) -> String {
    match chain.get(key) {
        Some(node) => {
            let incident = if node.incident { " !" } else { "" };
            format!("{key} [{}{incident}] {}", node.state, node.definition_id)
        }
        None => key.to_string(),
    }
}
