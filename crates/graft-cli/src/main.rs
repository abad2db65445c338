//! Demonstration of the namespace collision this repository is about.
//!
//! Two extensions both want to live under `azurefunctions.agents`:
//! `durable-extension` at `azurefunctions.agents.durable` and
//! `agent-framework` at `azurefunctions.agents.framework`. Registered
//! exclusive (the default), the second one fails with a conflict naming both
//! parties and the shared prefix; registered `--shared`, both coexist and
//! both symbols resolve.

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;

use graft_registry::{
    BindMode, Contributor, ContributorId, NsPath, Registry, RegistryError, RegistryResult,
    ResolvePolicy,
};

/// Symbol values in the demo are plain callables, like the one-line
/// functions the colliding packages actually export.
type DemoFn = fn() -> &'static str;

fn start_durable_task() -> &'static str {
    "durable task started"
}

fn start_agent() -> &'static str {
    "agent started"
}

const DURABLE_PATH: &str = "azurefunctions.agents.durable";
const FRAMEWORK_PATH: &str = "azurefunctions.agents.framework";

#[derive(Parser)]
#[command(name = "graft", version, about = "Deterministic namespace assembly demo")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register both extensions and show what happens.
    Demo {
        /// Register both contributors as shared instead of exclusive.
        #[arg(long)]
        shared: bool,

        /// Duplicate-symbol policy.
        #[arg(long, value_enum, default_value_t = PolicyArg::FirstWins)]
        policy: PolicyArg,

        /// Emit a JSON report instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Resolve a dotted symbol path against the shared demo registry.
    Resolve {
        /// e.g. azurefunctions.agents.durable.start_durable_task
        path: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    FirstWins,
    LastWins,
    ErrorOnConflict,
}

impl std::fmt::Display for PolicyArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", ResolvePolicy::from(*self))
    }
}

impl From<PolicyArg> for ResolvePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::FirstWins => Self::FirstWins,
            PolicyArg::LastWins => Self::LastWins,
            PolicyArg::ErrorOnConflict => Self::ErrorOnConflict,
        }
    }
}

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();
    let cli = Cli::parse();
    let code = match dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal: {e:?}");
            2
        }
    };
    std::process::exit(code);
}

fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Demo {
            shared,
            policy,
            json,
        } => run_demo(shared, policy.into(), json),
        Commands::Resolve { path } => run_resolve(&path),
    }
}

fn durable_extension(mode: BindMode) -> RegistryResult<Contributor<DemoFn>> {
    Ok(Contributor::new(
        ContributorId::new("durable-extension", "1.0.0")?,
        NsPath::parse(DURABLE_PATH)?,
        mode,
    )
    .with_symbol("start_durable_task", start_durable_task as DemoFn))
}

fn agent_framework(mode: BindMode) -> RegistryResult<Contributor<DemoFn>> {
    Ok(Contributor::new(
        ContributorId::new("agent-framework", "1.0.0")?,
        NsPath::parse(FRAMEWORK_PATH)?,
        mode,
    )
    .with_symbol("start_agent", start_agent as DemoFn))
}

/// The registry the `resolve` subcommand looks things up in: both
/// extensions registered shared, the configuration that actually works.
fn shared_demo_registry() -> RegistryResult<Registry<DemoFn>> {
    let mut registry = Registry::new();
    registry.register(durable_extension(BindMode::Shared)?)?;
    registry.register(agent_framework(BindMode::Shared)?)?;
    Ok(registry)
}

fn run_demo(shared: bool, policy: ResolvePolicy, json: bool) -> anyhow::Result<i32> {
    let mode = if shared {
        BindMode::Shared
    } else {
        BindMode::Exclusive
    };
    let mut registry: Registry<DemoFn> = Registry::with_policy(policy);

    let durable = durable_extension(mode)?;
    let first_id = durable.id().clone();
    registry.register(durable)?;
    if !json {
        println!("registered {first_id} at {DURABLE_PATH} ({mode})");
    }

    let framework = agent_framework(mode)?;
    let second_id = framework.id().clone();
    match registry.register(framework) {
        Ok(_) => {
            if !json {
                println!("registered {second_id} at {FRAMEWORK_PATH} ({mode})");
            }
            let symbols = [
                format!("{DURABLE_PATH}.start_durable_task"),
                format!("{FRAMEWORK_PATH}.start_agent"),
            ];
            let mut resolved = Vec::new();
            for path in &symbols {
                let hit = registry.resolve(path)?;
                let output = (hit.value)();
                if json {
                    resolved.push(json!({
                        "path": path,
                        "owner": hit.owner.to_string(),
                        "output": output,
                    }));
                } else {
                    println!("{path} -> {output:?} (from {})", hit.owner);
                }
            }
            if json {
                println!(
                    "{}",
                    json!({
                        "mode": mode.to_string(),
                        "policy": policy.to_string(),
                        "symbols": resolved,
                    })
                );
            }
            Ok(0)
        }
        Err(err) => {
            if json {
                println!(
                    "{}",
                    json!({
                        "mode": mode.to_string(),
                        "policy": policy.to_string(),
                        "error": {
                            "kind": error_kind(&err),
                            "message": err.to_string(),
                            "exit_code": err.exit_code(),
                        },
                    })
                );
            } else {
                eprintln!("error: {err}");
            }
            Ok(err.exit_code())
        }
    }
}

fn run_resolve(path: &str) -> anyhow::Result<i32> {
    let registry = shared_demo_registry()?;
    match registry.resolve(path) {
        Ok(hit) => {
            println!("{path} -> {:?} (from {})", (hit.value)(), hit.owner);
            Ok(0)
        }
        Err(err) => {
            eprintln!("error: {err}");
            Ok(err.exit_code())
        }
    }
}

fn error_kind(err: &RegistryError) -> &'static str {
    match err {
        RegistryError::NamespaceConflict { .. } => "namespace-conflict",
        RegistryError::DuplicateSymbol { .. } => "duplicate-symbol",
        RegistryError::SymbolNotFound { .. } => "symbol-not-found",
        RegistryError::AmbiguousSymbol { .. } => "ambiguous-symbol",
        RegistryError::InvalidPath { .. } => "invalid-path",
        RegistryError::InvalidContributor { .. } => "invalid-contributor",
        RegistryError::ContributorMismatch { .. } => "contributor-mismatch",
    }
}
