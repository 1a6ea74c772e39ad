//! Command line front end for the graph explorer.
//!
//! ```text
//! graph-cli [--workspace ID] <command> [--key value]...
//! graph-cli [--workspace ID] context
//! graph-cli plugins
//! graph-cli [--workspace ID]    # read command lines from stdin
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use graph_explorer::commands::CommandArgs;
use graph_explorer::config::AppConfig;
use graph_explorer::context::{GraphContextFactory, WorkspaceSession};
use graph_explorer::handlers::{CommandOutcome, CommandProcessor};
use graph_explorer::infrastructure::{FileGraphRepository, GraphRepository, JsonWorkspaceRepository};
use graph_explorer::plugins::PluginRegistry;
use graph_explorer::telemetry;
use graph_explorer::workspaces::WorkspaceService;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "graph-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Explore graphs through workspaces, filters and visualizers")]
#[command(after_help = r#"EXAMPLES:
  graph-cli create-workspace --name People --data-source-id json_file_data_source \
      --config '{"path": "people.json"}'
  graph-cli -w 2 filter --field born --operator lt --value 1900
  graph-cli -w 2 context

Without a command, lines are read from stdin and run in one session."#)]
struct Cli {
    /// Workspace to select before running the command
    #[arg(short, long, global = true)]
    workspace: Option<String>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// List the registered data sources and visualizers
    Plugins,
    /// Print the session snapshot with the rendered view
    Context,
    /// Any processor command, e.g. `create-node --id 1 --data '{}'`
    #[command(external_subcommand)]
    Run(Vec<String>),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let config = AppConfig::from_env()?;
    telemetry::init(&config.log_filter);
    let cli = Cli::parse();

    let plugins = Arc::new(PluginRegistry::with_builtins());
    if matches!(cli.command, Some(CliCommand::Plugins)) {
        println!("{}", list_plugins(&plugins)?);
        return Ok(ExitCode::SUCCESS);
    }

    let (processor, graphs) = open(&config, plugins.clone()).await?;
    let code = run(&processor, &plugins, cli).await;
    graphs.close().await.context("failed to close graph store")?;
    code
}

async fn run(processor: &CommandProcessor, plugins: &PluginRegistry, cli: Cli) -> Result<ExitCode> {
    if cli.command.is_some() {
        let outcome = dispatch(processor, plugins, cli).await?;
        println!("{outcome}");
        return Ok(exit_code(&outcome));
    }
    if let Some(id) = cli.workspace {
        let outcome = select_workspace(processor, id).await;
        if !outcome.success {
            bail!(outcome.message);
        }
    }
    shell(processor, plugins).await
}

async fn open(
    config: &AppConfig,
    plugins: Arc<PluginRegistry>,
) -> Result<(CommandProcessor, Arc<dyn GraphRepository>)> {
    let policy = config.io_policy();
    let graphs: Arc<dyn GraphRepository> = Arc::new(FileGraphRepository::new(&config.graph_store_dir));
    let workspaces = WorkspaceService::new(
        Arc::new(JsonWorkspaceRepository::new(&config.workspace_db_path)),
        graphs.clone(),
        policy,
    );
    let factory = GraphContextFactory::new(plugins, workspaces.clone(), graphs.clone(), policy);
    let session = WorkspaceSession::open(workspaces, factory)
        .await
        .context("failed to open workspace session")?;
    info!(
        workspaces = %config.workspace_db_path.display(),
        graphs = %config.graph_store_dir.display(),
        "Session ready"
    );
    Ok((CommandProcessor::new(Arc::new(session)), graphs))
}

/// Read command lines from stdin until EOF
async fn shell(processor: &CommandProcessor, plugins: &PluginRegistry) -> Result<ExitCode> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut failures = 0usize;
    while let Some(line) = lines.next_line().await? {
        let words = match split_words(&line) {
            Ok(words) if words.is_empty() => continue,
            Ok(words) => words,
            Err(err) => {
                eprintln!("{err}");
                failures += 1;
                continue;
            }
        };
        let cli = match Cli::try_parse_from(std::iter::once("graph-cli".to_string()).chain(words)) {
            Ok(cli) => cli,
            Err(err) => {
                err.print()?;
                if err.use_stderr() {
                    failures += 1;
                }
                continue;
            }
        };
        match dispatch(processor, plugins, cli).await {
            Ok(outcome) => {
                println!("{outcome}");
                if !outcome.success {
                    failures += 1;
                }
            }
            Err(err) => {
                eprintln!("{err:#}");
                failures += 1;
            }
        }
    }
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Run one parsed command line
async fn dispatch(processor: &CommandProcessor, plugins: &PluginRegistry, cli: Cli) -> Result<CommandOutcome> {
    if let Some(id) = cli.workspace {
        let outcome = select_workspace(processor, id).await;
        if !outcome.success || cli.command.is_none() {
            return Ok(outcome);
        }
    }
    match cli.command {
        Some(CliCommand::Plugins) => Ok(CommandOutcome::ok(list_plugins(plugins)?)),
        Some(CliCommand::Context) => {
            let snapshot = processor.get_context().await?;
            Ok(CommandOutcome::ok(serde_json::to_string_pretty(&snapshot)?))
        }
        Some(CliCommand::Run(words)) => {
            let Some((name, rest)) = words.split_first() else {
                bail!("missing command name");
            };
            let args = parse_args(rest)?;
            Ok(processor.execute(name, &args).await)
        }
        None => bail!("missing command"),
    }
}

async fn select_workspace(processor: &CommandProcessor, id: String) -> CommandOutcome {
    let mut args = CommandArgs::new();
    args.insert("workspace_id".to_string(), serde_json::Value::String(id));
    processor.execute("select-workspace", &args).await
}

fn list_plugins(plugins: &PluginRegistry) -> Result<String> {
    let listing = serde_json::json!({
        "data_sources": plugins.data_sources(),
        "visualizers": plugins.visualizers(),
    });
    Ok(serde_json::to_string_pretty(&listing)?)
}

/// Trailing `--key value` pairs of a processor command; dashes in keys become underscores
fn parse_args(words: &[String]) -> Result<CommandArgs> {
    let mut args = CommandArgs::new();
    let mut iter = words.iter();
    while let Some(word) = iter.next() {
        let Some(key) = word.strip_prefix("--") else {
            bail!("expected --key, found '{word}'");
        };
        let value = iter
            .next()
            .with_context(|| format!("missing value for --{key}"))?;
        args.insert(key.replace('-', "_"), serde_json::Value::String(value.clone()));
    }
    Ok(args)
}

/// Whitespace split honouring single and double quotes
fn split_words(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_word = false;

    for ch in line.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_word = true;
            }
            None if ch.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(ch);
                in_word = true;
            }
        }
    }
    if quote.is_some() {
        bail!("unterminated quote in '{line}'");
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn exit_code(outcome: &CommandOutcome) -> ExitCode {
    if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
