use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};

use doc_analyzer_lib::services::export::{to_csv, to_json, to_markdown};
use doc_analyzer_lib::services::highlight::{extract_highlight_patterns, highlight_text};
use doc_analyzer_lib::services::{
    extract_text, normalize_text, AppConfig, ConfigStore, ProviderKind,
};
use doc_analyzer_lib::{init_logging, AnalysisMode, AnalysisOrchestrator};

#[derive(Parser, Debug)]
#[command(
    name = "analyze_doc",
    version,
    about = "Analyze a PDF or DOCX business document",
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Document to analyze (.pdf or .docx)
    #[arg(required = true)]
    path: Option<PathBuf>,

    /// Summary, Key Points, Risk Analysis, Opportunities, Sentiment or Full Report
    #[arg(short, long, default_value = "Full Report")]
    mode: AnalysisMode,

    /// Model provider as `name[:model]`; overrides the configured default
    #[arg(short, long, env = "DOCANALYZER_PROVIDER")]
    provider: Option<String>,

    /// Use the rule-based analyzers only
    #[arg(long)]
    no_model: bool,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Markdown)]
    format: OutputFormat,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Also write the source text as HTML with key phrases highlighted
    #[arg(long, value_name = "HTML_PATH")]
    highlight: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage provider API keys and endpoints in the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Store an API key for a provider
    SetKey { provider: String, key: String },
    /// Remove a stored API key
    DeleteKey { provider: String },
    /// Point a provider at a custom endpoint URL
    SetUrl { provider: String, url: String },
    /// Print the config file location and configured providers
    Show,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Json,
    Csv,
    Markdown,
}

fn load_config() -> AppConfig {
    let Some(store) = ConfigStore::open_default() else {
        return AppConfig::default();
    };
    store.load().unwrap_or_else(|e| {
        warn!(
            "[CLI] Ignoring unreadable config {}: {}",
            store.config_file().display(),
            e
        );
        AppConfig::default()
    })
}

/// Apply one config action; every write goes through `ConfigStore::save`,
/// which backs up the previous file first.
fn run_config(store: &ConfigStore, action: &ConfigAction) -> anyhow::Result<String> {
    match action {
        ConfigAction::SetKey { provider, key } => {
            let kind = ProviderKind::from_name(provider)?;
            let key = key.trim();
            anyhow::ensure!(!key.is_empty(), "API key must not be empty");
            store.set_api_key(kind.name(), key)?;
            Ok(format!("Saved {} API key to {}", kind.name(), store.config_file().display()))
        }
        ConfigAction::DeleteKey { provider } => {
            let kind = ProviderKind::from_name(provider)?;
            store.delete_api_key(kind.name())?;
            Ok(format!("Removed {} API key", kind.name()))
        }
        ConfigAction::SetUrl { provider, url } => {
            let kind = ProviderKind::from_name(provider)?;
            let url = url.trim();
            anyhow::ensure!(
                url.starts_with("http://") || url.starts_with("https://"),
                "URL must start with http:// or https://"
            );
            store.set_provider_url(kind.name(), url)?;
            Ok(format!("{} requests now go to {}", kind.name(), url))
        }
        ConfigAction::Show => {
            let config = store.load()?;
            let mut lines = vec![
                format!("Config file: {}", store.config_file().display()),
                format!(
                    "Default provider: {}",
                    config.default_provider.as_deref().unwrap_or("(auto)")
                ),
            ];
            for kind in ProviderKind::PREFERENCE {
                let key = if config.api_keys.contains_key(kind.name()) { "set" } else { "not set" };
                let url = config
                    .providers
                    .get(kind.name())
                    .and_then(|p| p.base_url.as_deref())
                    .unwrap_or("(default)");
                lines.push(format!("{}: key {}, url {}", kind.name(), key, url));
            }
            Ok(lines.join("\n"))
        }
    }
}

fn highlight_page(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Highlighted document</title></head>\n<body>\n<div style=\"white-space: pre-wrap; font-family: sans-serif;\">{}</div>\n</body>\n</html>\n",
        body
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging();

    if let Some(Command::Config { action }) = &cli.command {
        let store = ConfigStore::open_default()
            .context("no config directory available on this platform")?;
        println!("{}", run_config(&store, action)?);
        return Ok(ExitCode::SUCCESS);
    }
    let Some(path) = cli.path.as_deref() else {
        eprintln!("A document path is required.");
        return Ok(ExitCode::FAILURE);
    };

    let document = match extract_text(path) {
        Ok(doc) => doc,
        Err(e) => {
            error!("[CLI] {}", e);
            eprintln!("Failed to extract text from the document.");
            return Ok(ExitCode::FAILURE);
        }
    };
    let text = normalize_text(&document.text);

    let mut config = load_config();
    if cli.no_model {
        config.analysis.use_models = false;
    }
    if let Some(provider) = cli.provider.as_deref() {
        config.default_provider = Some(provider.to_string());
        config.analysis.sentiment_provider = Some(provider.to_string());
        config.analysis.summary_provider = Some(provider.to_string());
    }

    let orchestrator = AnalysisOrchestrator::from_config(&config);
    info!(
        "[CLI] {} ({} chars, {:?}) mode={}",
        path.display(),
        text.chars().count(),
        document.kind,
        cli.mode
    );

    let result = orchestrator.analyze(&text, cli.mode).await;

    let rendered = match cli.format {
        OutputFormat::Json => to_json(&result),
        OutputFormat::Csv => to_csv(&result),
        OutputFormat::Markdown => to_markdown(&result, cli.mode),
    };

    match &cli.out {
        Some(out_path) => {
            std::fs::write(out_path, &rendered)
                .with_context(|| format!("write report to {}", out_path.display()))?;
            println!("Wrote report: {}", out_path.display());
        }
        None => print!("{}", rendered),
    }

    if let Some(html_path) = &cli.highlight {
        let patterns = extract_highlight_patterns(&result);
        let page = highlight_page(&highlight_text(&text, &patterns));
        std::fs::write(html_path, page)
            .with_context(|| format!("write highlight page to {}", html_path.display()))?;
        println!("Wrote highlights: {}", html_path.display());
    }

    Ok(ExitCode::SUCCESS)
}
