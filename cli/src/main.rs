use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use command_manual_core::{CommandManual, SubcommandManual};
use command_manual_db::{BotConfig, ManualCatalogue};
use command_manual_dispatch::{PrefixStore, slash_command_data};
use command_manual_sqlite::{SqlitePool, SqlitePrefixStore};
use command_manual_syntax::{
    RawArguments, SubcommandMatch, SyntaxMatcher, check, command_regex, determination_tag, expand,
    first_matching_subcommand, render,
};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "manual-tool")]
#[command(about = "Lint, preview and test bot command manuals")]
struct Cli {
    /// Bot configuration file (YAML). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load declaration files and report every rejected manual.
    Lint(LintArgs),
    /// Print manuals the way the `commands` command shows them.
    Render(RenderArgs),
    /// Print every concrete syntax a manual accepts.
    Expand(ExpandArgs),
    /// Find the command and subcommand a message calls, with raw arguments.
    Match(MessageArgs),
    /// Like `match`, then validate the arguments against their constraints.
    Check(MessageArgs),
    /// Print slash-command registration data as JSON.
    Slash(SlashArgs),
    /// Read or change stored guild prefixes.
    Prefix(PrefixArgs),
}

#[derive(Debug, Args)]
struct ManualSources {
    /// Declaration files or directories. Falls back to `manuals` in the config.
    #[arg(long = "manuals")]
    manuals: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct LintArgs {
    #[command(flatten)]
    sources: ManualSources,
}

#[derive(Debug, Args)]
struct RenderArgs {
    #[command(flatten)]
    sources: ManualSources,
    /// Only render this command.
    #[arg(long)]
    command: Option<String>,
    /// Prefix to render with (default: the configured global prefix).
    #[arg(long)]
    prefix: Option<String>,
}

#[derive(Debug, Args)]
struct ExpandArgs {
    #[command(flatten)]
    sources: ManualSources,
    /// Command to expand.
    command: String,
    /// Only expand this subcommand.
    #[arg(long)]
    subcommand: Option<String>,
    #[arg(long)]
    prefix: Option<String>,
}

#[derive(Debug, Args)]
struct MessageArgs {
    #[command(flatten)]
    sources: ManualSources,
    /// Message text, as a user would send it.
    message: String,
    #[arg(long)]
    prefix: Option<String>,
}

#[derive(Debug, Args)]
struct SlashArgs {
    #[command(flatten)]
    sources: ManualSources,
    /// Only print this command.
    #[arg(long)]
    command: Option<String>,
}

#[derive(Debug, Args)]
struct PrefixArgs {
    #[command(subcommand)]
    operation: PrefixOperation,
}

#[derive(Debug, Subcommand)]
enum PrefixOperation {
    /// Show the prefix a guild uses.
    Get(GuildArgs),
    /// Store a local prefix for a guild.
    Set(PrefixSetArgs),
    /// Remove a guild's local prefix.
    Clear(GuildArgs),
    /// List every stored prefix.
    List,
}

#[derive(Debug, Args)]
struct GuildArgs {
    /// Guild (server) ID.
    #[arg(long)]
    guild: u64,
}

#[derive(Debug, Args)]
struct PrefixSetArgs {
    #[arg(long)]
    guild: u64,
    /// New prefix. Must be non-empty and contain no whitespace.
    prefix: String,
}

fn main() {
    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| {
        init_logging(&config);
        match cli.command {
            Command::Lint(args) => run_lint(&config, args),
            Command::Render(args) => run_render(&config, args),
            Command::Expand(args) => run_expand(&config, args),
            Command::Match(args) => run_match(&config, args),
            Command::Check(args) => run_check(&config, args),
            Command::Slash(args) => run_slash(&config, args),
            Command::Prefix(args) => run_prefix(&config, args),
        }
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<BotConfig, String> {
    let Some(path) = path else {
        return Ok(BotConfig::default());
    };
    let config = BotConfig::load(path)
        .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?;
    config
        .validate()
        .map_err(|e| format!("Invalid config '{}': {e}", path.display()))?;
    Ok(config)
}

/// `RUST_LOG` wins; otherwise the config's debug categories on top of `warn`.
fn init_logging(config: &BotConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_directives()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn manual_sources(config: &BotConfig, sources: &ManualSources) -> Result<Vec<PathBuf>, String> {
    if !sources.manuals.is_empty() {
        return Ok(sources.manuals.clone());
    }
    if config.manuals.is_empty() {
        return Err("no manual sources (pass --manuals or set `manuals` in the config)".to_string());
    }
    Ok(config.manuals.clone())
}

fn open_source(path: &Path) -> Result<ManualCatalogue, String> {
    let catalogue = if path.is_dir() {
        ManualCatalogue::from_dir(path)
    } else {
        ManualCatalogue::from_file(path)
    };
    catalogue.map_err(|e| format!("Failed to load manuals from '{}': {e}", path.display()))
}

/// Loads the first source that can be read, like the bot does at startup.
fn load_catalogue(config: &BotConfig, sources: &ManualSources) -> Result<ManualCatalogue, String> {
    let mut builder = ManualCatalogue::builder();
    for source in manual_sources(config, sources)? {
        builder = if source.is_dir() {
            builder.from_dir(source)
        } else {
            builder.from_file(source)
        };
    }
    let catalogue = builder
        .build()
        .map_err(|e| format!("Failed to load manuals: {e}"))?;
    debug!(
        commands = catalogue.len(),
        rejected = catalogue.rejected().len(),
        "catalogue loaded"
    );
    Ok(catalogue)
}

fn find_manual<'c>(catalogue: &'c ManualCatalogue, name: &str) -> Result<&'c CommandManual, String> {
    catalogue
        .get(name)
        .ok_or_else(|| format!("no command named '{name}'"))
}

fn run_lint(config: &BotConfig, args: LintArgs) -> Result<(), String> {
    let mut accepted = 0;
    let mut rejected = 0;
    for source in manual_sources(config, &args.sources)? {
        let catalogue = open_source(&source)?;
        for entry in catalogue.entries() {
            println!("ok        {} (module {})", entry.manual.name(), entry.module);
        }
        for rejection in catalogue.rejected() {
            println!("rejected  {rejection}");
        }
        accepted += catalogue.len();
        rejected += catalogue.rejected().len();
    }

    println!("{accepted} accepted, {rejected} rejected");
    if rejected > 0 {
        return Err(format!("{rejected} declaration(s) rejected"));
    }
    Ok(())
}

fn run_render(config: &BotConfig, args: RenderArgs) -> Result<(), String> {
    let catalogue = load_catalogue(config, &args.sources)?;
    let prefix = args.prefix.as_deref().unwrap_or(&config.global_prefix);

    let rendered: Vec<String> = match &args.command {
        Some(name) => vec![render(find_manual(&catalogue, name)?, prefix)],
        None => catalogue
            .entries()
            .iter()
            .map(|entry| render(&entry.manual, prefix))
            .collect(),
    };
    println!("{}", rendered.join("\n\n"));
    Ok(())
}

fn run_expand(config: &BotConfig, args: ExpandArgs) -> Result<(), String> {
    let catalogue = load_catalogue(config, &args.sources)?;
    let prefix = args.prefix.as_deref().unwrap_or(&config.global_prefix);
    let manual = find_manual(&catalogue, &args.command)?;

    let syntaxes: Vec<&SubcommandManual> = match (manual, &args.subcommand) {
        (CommandManual::Multifaceted(parent), Some(name)) => vec![
            parent
                .find_subcommand(name)
                .ok_or_else(|| format!("'{}' has no subcommand '{name}'", args.command))?,
        ],
        (CommandManual::Simple(_), Some(_)) => {
            return Err(format!("'{}' has no subcommands", args.command));
        }
        (manual, None) => manual.syntaxes(),
    };

    for syntax in syntaxes {
        let lines = expand(syntax, &syntax.syntax, prefix)
            .map_err(|e| format!("'{}' has a broken template: {e}", syntax.name))?;
        for line in lines {
            println!("{line}");
        }
    }
    Ok(())
}

/// A message resolved down to one syntax.
struct Call<'c> {
    manual: &'c CommandManual,
    syntax: &'c SubcommandManual,
    arguments: RawArguments,
}

impl Call<'_> {
    fn subcommand(&self) -> Option<&str> {
        match self.manual {
            CommandManual::Simple(_) => None,
            CommandManual::Multifaceted(_) => Some(&self.syntax.name),
        }
    }
}

fn resolve_call<'c>(
    catalogue: &'c ManualCatalogue,
    prefix: &str,
    message: &str,
) -> Result<Call<'c>, String> {
    let manual = catalogue
        .entries()
        .iter()
        .map(|entry| &entry.manual)
        .find(|manual| {
            command_regex(manual.name(), prefix).is_ok_and(|regex| regex.is_match(message))
        })
        .ok_or_else(|| format!("'{message}' does not call any command with prefix '{prefix}'"))?;

    match manual {
        CommandManual::Simple(simple) => {
            let matcher = SyntaxMatcher::compile(simple, prefix)
                .map_err(|e| format!("'{}' has a broken template: {e}", simple.name))?;
            let arguments = matcher
                .extract(message)
                .ok_or_else(|| format!("message did not match the syntax of {}", simple.name))?;
            Ok(Call {
                manual,
                syntax: simple,
                arguments,
            })
        }
        CommandManual::Multifaceted(parent) => {
            match first_matching_subcommand(parent, prefix, message) {
                SubcommandMatch::Matched {
                    subcommand,
                    arguments,
                } => Ok(Call {
                    manual,
                    syntax: subcommand,
                    arguments,
                }),
                SubcommandMatch::NoMatch {
                    attempted: Some(subcommand),
                    ..
                } => Err(format!(
                    "message did not match the syntax of subcommand {} of {}",
                    subcommand.name, parent.name
                )),
                SubcommandMatch::NoMatch { attempted: None, .. } => Err(format!(
                    "message had no matching subcommands of {}",
                    parent.name
                )),
            }
        }
    }
}

fn print_json(value: &serde_json::Value) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize output: {e}"))?;
    println!("{text}");
    Ok(())
}

fn run_match(config: &BotConfig, args: MessageArgs) -> Result<(), String> {
    let catalogue = load_catalogue(config, &args.sources)?;
    let prefix = args.prefix.as_deref().unwrap_or(&config.global_prefix);
    let call = resolve_call(&catalogue, prefix, &args.message)?;
    let tag = determination_tag(call.syntax, prefix)
        .map_err(|e| format!("'{}' has a broken template: {e}", call.syntax.name))?;

    print_json(&json!({
        "command": call.manual.name(),
        "subcommand": call.subcommand(),
        "tag": tag,
        "arguments": call.arguments,
    }))
}

fn run_check(config: &BotConfig, args: MessageArgs) -> Result<(), String> {
    let catalogue = load_catalogue(config, &args.sources)?;
    let prefix = args.prefix.as_deref().unwrap_or(&config.global_prefix);
    let call = resolve_call(&catalogue, prefix, &args.message)?;

    let validated = check(call.syntax, &call.arguments).map_err(|failure| {
        format!(
            "message did not have the proper arguments:\n{}",
            failure
                .information
                .iter()
                .map(|reason| format!("  {reason}."))
                .collect::<Vec<_>>()
                .join("\n")
        )
    })?;

    print_json(&json!({
        "command": call.manual.name(),
        "subcommand": call.subcommand(),
        "arguments": validated,
    }))
}

fn run_slash(config: &BotConfig, args: SlashArgs) -> Result<(), String> {
    let catalogue = load_catalogue(config, &args.sources)?;
    let data = match &args.command {
        Some(name) => vec![slash_command_data(find_manual(&catalogue, name)?)],
        None => catalogue
            .entries()
            .iter()
            .map(|entry| slash_command_data(&entry.manual))
            .collect(),
    };
    let value = serde_json::to_value(data).map_err(|e| format!("Failed to serialize output: {e}"))?;
    print_json(&value)
}

fn open_prefix_store(config: &BotConfig) -> Result<SqlitePrefixStore, String> {
    let database = &config.database;
    let pool = SqlitePool::from_config(database)
        .map_err(|e| format!("Failed to open database '{}': {e}", database.path.display()))?;
    let store = SqlitePrefixStore::new(Arc::new(pool), database.table_prefix.as_str())
        .map_err(|e| format!("Failed to initialize prefix store: {e}"))?;
    store
        .migrate()
        .map_err(|e| format!("Migration up failed: {e}"))?;
    Ok(store)
}

fn run_prefix(config: &BotConfig, args: PrefixArgs) -> Result<(), String> {
    let store = open_prefix_store(config)?;
    match args.operation {
        PrefixOperation::Get(a) => {
            match store.get_prefix(a.guild).map_err(|e| e.to_string())? {
                Some(prefix) => println!("{prefix}"),
                None => println!("{} (global)", config.global_prefix),
            }
        }
        PrefixOperation::Set(a) => {
            if a.prefix == config.global_prefix {
                return Err(format!(
                    "'{}' is already the global prefix; use `prefix clear` instead",
                    a.prefix
                ));
            }
            store
                .set_prefix(a.guild, &a.prefix)
                .map_err(|e| e.to_string())?;
            println!("Prefix for guild {} set to '{}'.", a.guild, a.prefix);
        }
        PrefixOperation::Clear(a) => {
            if store.clear_prefix(a.guild).map_err(|e| e.to_string())? {
                println!("Prefix for guild {} cleared.", a.guild);
            } else {
                println!("Guild {} had no local prefix.", a.guild);
            }
        }
        PrefixOperation::List => {
            for (guild, prefix) in store.list().map_err(|e| e.to_string())? {
                println!("{guild}\t{prefix}");
            }
        }
    }
    Ok(())
}
