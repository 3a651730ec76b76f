use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use cloudback_provider::Result;
use cloudback_provider::client::CloudbackClient;
use cloudback_provider::config::{self, ConfigDoc};
use cloudback_provider::executor;
use cloudback_provider::logging::{self, LogFormat};
use cloudback_provider::planner;
use cloudback_provider::resource::BackupDefinitionResource;
use cloudback_provider::state;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to the state file
    #[arg(long, global = true, default_value = "cloudback.state.json")]
    state: PathBuf,
    /// Log output format (stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the changes needed to reach the declared definitions
    Plan {
        /// Path to a definitions TOML
        config: PathBuf,
    },
    /// Compute the plan and apply it
    Apply {
        /// Path to a definitions TOML
        config: PathBuf,
    },
    /// Re-read remote settings for every managed definition
    Refresh {
        /// Path to a definitions TOML
        config: PathBuf,
    },
    /// Adopt an existing remote definition into state
    Import {
        /// Path to a definitions TOML
        config: PathBuf,
        /// Local name to store the definition under
        name: String,
        /// platform/account/repository or platform/account/subject_type/subject_name
        id: String,
    },
    /// Disable managed definitions and drop them from state
    Destroy {
        /// Path to a definitions TOML
        config: PathBuf,
        /// Only destroy this definition
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the state file
    Show,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    logging::init(args.log_format, "info")?;

    match args.cmd {
        Command::Plan { config } => cmd_plan(&config, &args.state),
        Command::Apply { config } => cmd_apply(&config, &args.state),
        Command::Refresh { config } => cmd_refresh(&config, &args.state),
        Command::Import { config, name, id } => cmd_import(&config, &args.state, &name, &id),
        Command::Destroy { config, name } => cmd_destroy(&config, &args.state, name.as_deref()),
        Command::Show => cmd_show(&args.state),
    }
}

fn resource_for(doc: &ConfigDoc) -> Result<BackupDefinitionResource<CloudbackClient>> {
    let settings = doc.provider()?.resolve()?;
    tracing::debug!(endpoint = %settings.endpoint, "configured cloudback client");
    let client = CloudbackClient::new(&settings.endpoint, &settings.api_key, settings.timeout)?;
    Ok(BackupDefinitionResource::new(client))
}

fn cmd_plan(config_path: &Path, state_path: &Path) -> Result<()> {
    let doc = config::load(config_path)?;
    let state = state::load(state_path)?;
    let plan = planner::plan(&doc.definitions()?, &state)?;
    print!("{}", plan.to_text()?);
    Ok(())
}

fn cmd_apply(config_path: &Path, state_path: &Path) -> Result<()> {
    let doc = config::load(config_path)?;
    let mut state = state::load(state_path)?;
    let plan = planner::plan(&doc.definitions()?, &state)?;
    if plan.is_empty() {
        println!("No changes.");
        return Ok(());
    }
    print!("{}", plan.to_text()?);
    let resource = resource_for(&doc)?;
    let report = executor::apply(&resource, &plan, &mut state, state_path)?;
    println!(
        "Apply complete: {} created, {} updated, {} replaced, {} deleted.",
        report.created, report.updated, report.replaced, report.deleted
    );
    Ok(())
}

fn cmd_refresh(config_path: &Path, state_path: &Path) -> Result<()> {
    let doc = config::load(config_path)?;
    let mut state = state::load(state_path)?;
    let resource = resource_for(&doc)?;
    let n = executor::refresh(&resource, &mut state, state_path)?;
    println!("Refreshed {n} definition(s).");
    Ok(())
}

fn cmd_import(config_path: &Path, state_path: &Path, name: &str, id: &str) -> Result<()> {
    let doc = config::load(config_path)?;
    let mut state = state::load(state_path)?;
    let resource = resource_for(&doc)?;
    executor::import(&resource, &mut state, state_path, name, id)?;
    println!("Imported {id} as '{name}'.");
    Ok(())
}

fn cmd_destroy(config_path: &Path, state_path: &Path, name: Option<&str>) -> Result<()> {
    let doc = config::load(config_path)?;
    let mut state = state::load(state_path)?;
    let resource = resource_for(&doc)?;
    let n = executor::destroy(&resource, &mut state, state_path, name)?;
    println!("Disabled {n} definition(s).");
    Ok(())
}

fn cmd_show(state_path: &Path) -> Result<()> {
    let state = state::load(state_path)?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}
