use std::path::{Path, PathBuf};
use std::sync::Once;

static TRACE_INIT: Once = Once::new();
const DEFAULT_TRACE_FILTER: &str = "wrena::resolver=debug,wrena::workspace=debug,wrena::index=info,wrena_cli=info";

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use wrena_core::{
    AnalyzerConfig, CompletionKind, LineContext, SourceUnit, SymbolIndex, Workspace, analyze_line, parse_source,
    resolver::ResolveReport, token::Tokenizer,
};

mod repl;

/// Identity the bundled core library listing is registered under.
pub(crate) const CORE_IDENTITY: &str = "<core>";
pub(crate) const CORE_SOURCE: &str = include_str!("core.wren");

#[derive(Debug, Parser)]
#[command(
    name = "wrena",
    author,
    version,
    about = "Wren source analysis: symbols, signatures and cursor context"
)]
struct CliArgs {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options shared by commands that build a workspace.
#[derive(Debug, Clone, Default, clap::Args)]
struct WorkspaceArgs {
    /// Extra directory to search for imports (repeatable)
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    include: Vec<PathBuf>,
    /// Config file to use instead of the nearest `wrena.toml`
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Don't register the core library listing
    #[arg(long)]
    no_core: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve files and their imports, then print the symbol index.
    Index {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        workspace: WorkspaceArgs,
        /// Print the index as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print every signature declared for a method name.
    Signature {
        #[arg(value_name = "NAME")]
        name: String,
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        workspace: WorkspaceArgs,
    },
    /// Analyze one line of text as if the cursor were at `--column`.
    Line {
        #[arg(value_name = "TEXT")]
        text: String,
        /// Cursor column (defaults to the end of the line)
        #[arg(long)]
        column: Option<usize>,
    },
    /// Dump the token stream of a file.
    Tokens {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Parse a file and report the first syntax error.
    Check {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn read_file_content(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file '{}'", path.display()))
}

fn env_toggle_enabled(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }
    !(trimmed.eq_ignore_ascii_case("0") || trimmed.eq_ignore_ascii_case("false") || trimmed.eq_ignore_ascii_case("off"))
}

fn filter_expr_from(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("1")
        || trimmed.eq_ignore_ascii_case("true")
        || trimmed.eq_ignore_ascii_case("on")
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn maybe_init_tracing() {
    let raw = match std::env::var("WRENA_LOG").or_else(|_| std::env::var("RUST_LOG")) {
        Ok(value) => value,
        Err(_) => return,
    };

    if !env_toggle_enabled(&raw) {
        return;
    }

    TRACE_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::fmt;

        let builder = fmt().with_writer(std::io::stderr);

        let builder = match filter_expr_from(&raw).and_then(|expr| EnvFilter::try_new(expr).ok()) {
            Some(filter) => builder.with_env_filter(filter),
            None => builder.with_env_filter(DEFAULT_TRACE_FILTER),
        };

        let _ = builder.try_init();
    });
}

/// Config file (explicit or discovered), then `WRENA_PATH`, then `-I` flags.
fn build_config(args: &WorkspaceArgs, cwd: &Path) -> anyhow::Result<AnalyzerConfig> {
    let mut config = match args.config.as_deref() {
        Some(path) => AnalyzerConfig::load(path)?,
        None => match AnalyzerConfig::discover(cwd) {
            Some(path) => {
                tracing::debug!(target: "wrena_cli", path = %path.display(), "using discovered config");
                AnalyzerConfig::load(&path)?
            }
            None => AnalyzerConfig::default(),
        },
    };
    config.merge_env();
    for dir in &args.include {
        config.add_search_path(dir.clone());
    }
    Ok(config)
}

fn kind_label(kind: CompletionKind) -> &'static str {
    match kind {
        CompletionKind::Class => "class",
        CompletionKind::Method => "method",
        CompletionKind::Function => "function",
        CompletionKind::Variable => "variable",
        CompletionKind::Field => "field",
    }
}

fn report_warnings(report: &ResolveReport) {
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
}

/// Builds a workspace over `files`, resolving each file's imports.
async fn load_workspace(files: &[PathBuf], args: &WorkspaceArgs) -> anyhow::Result<Workspace> {
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let workspace = Workspace::new(build_config(args, &cwd)?);

    if !args.no_core {
        workspace
            .seed(SourceUnit::new(CORE_IDENTITY, CORE_SOURCE))
            .context("core library listing does not parse")?;
    }

    for file in files {
        let text = read_file_content(file)?;
        let identity = file.to_string_lossy();
        let report = workspace
            .document_changed(&identity, &text)
            .await
            .with_context(|| format!("{} does not parse", file.display()))?;
        report_warnings(&report);
    }
    Ok(workspace)
}

pub(crate) fn render_index(index: &SymbolIndex) -> String {
    let mut out = String::new();
    out.push_str("completions:\n");
    for completion in index.completions() {
        out.push_str(&format!("  {} ({})\n", completion.name, kind_label(completion.kind)));
    }
    out.push_str("signatures:\n");
    for signature in index.signatures() {
        out.push_str(&format!("  {}  [{}]\n", signature.label, signature.source));
    }
    for file in index.files() {
        if file.variables.is_empty() {
            continue;
        }
        out.push_str(&format!("variables in {}:\n", file.identity));
        for variable in &file.variables {
            out.push_str(&format!("  {} ({})\n", variable.name, kind_label(variable.kind)));
        }
    }
    for error in index.walk_errors() {
        out.push_str(&format!("skipped: {}\n", error));
    }
    out
}

#[derive(Debug, Serialize)]
pub(crate) struct LineReport<'a> {
    #[serde(flatten)]
    context: &'a LineContext,
    call_target: Option<&'a str>,
}

pub(crate) fn render_line(context: &LineContext) -> anyhow::Result<String> {
    let report = LineReport {
        context,
        call_target: context.call_target(),
    };
    Ok(serde_json::to_string(&report)?)
}

fn run_tokens(path: &Path) -> anyhow::Result<()> {
    let text = read_file_content(path)?;
    let tokens = Tokenizer::tokenize(&text).with_context(|| format!("{} does not tokenize", path.display()))?;
    for token in tokens {
        println!("{}:{} {:?} {}", token.line, token.column, token.kind, token.describe());
    }
    Ok(())
}

fn run_check(path: &Path) -> anyhow::Result<()> {
    let text = read_file_content(path)?;
    if let Err(err) = parse_source(&text) {
        eprintln!("{}: {}", path.display(), err);
        std::process::exit(1);
    }
    println!("{}: ok", path.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    maybe_init_tracing();

    let CliArgs { command } = CliArgs::parse();

    // No args: enter REPL
    let Some(command) = command else {
        return repl::run();
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    match command {
        Commands::Index { files, workspace, json } => {
            let ws = runtime.block_on(load_workspace(&files, &workspace))?;
            let index = ws.index();
            if json {
                println!("{}", serde_json::to_string_pretty(&*index)?);
            } else {
                print!("{}", render_index(&index));
            }
        }
        Commands::Signature { name, files, workspace } => {
            let ws = runtime.block_on(load_workspace(&files, &workspace))?;
            let signatures = ws.signatures(&name);
            if signatures.is_empty() {
                eprintln!("no signatures for '{}'", name);
                std::process::exit(1);
            }
            for signature in signatures {
                println!("{}  [{}]", signature.label, signature.source);
            }
        }
        Commands::Line { text, column } => {
            let column = column.unwrap_or_else(|| text.chars().count());
            println!("{}", render_line(&analyze_line(&text, column))?);
        }
        Commands::Tokens { file } => run_tokens(&file)?,
        Commands::Check { file } => run_check(&file)?,
    }

    Ok(())
}
