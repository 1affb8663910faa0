use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use paper_scout::backend::{categories_or_default, HttpBackend, SearchBackend};
use paper_scout::citations::render_summary;
use paper_scout::config::{
    find_config_file, get_config, load_config, save_config, user_config_path, Config,
    LoggingConfig,
};
use paper_scout::models::{PaperRecord, SearchQuery};
use paper_scout::overview::{OverviewController, OverviewError, SummaryState};
use paper_scout::utils::{format_citation, format_insights, CitationStyle, StructuredCitation};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Paper Scout - search academic papers, read AI overviews and relay paper insights
#[derive(Parser, Debug)]
#[command(name = "paper-scout")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search academic papers and read AI overviews with linked citations", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Search backend base URL (overrides configuration)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Request timeout in seconds (overrides configuration)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

/// Citation formats for a paper
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum CiteFormat {
    Apa,
    Bibtex,
}

impl From<CiteFormat> for CitationStyle {
    fn from(format: CiteFormat) -> Self {
        match format {
            CiteFormat::Apa => CitationStyle::Apa,
            CiteFormat::Bibtex => CitationStyle::Bibtex,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for papers by query string
    #[command(alias = "s")]
    Search {
        /// Search query string
        query: String,

        /// Maximum number of results
        #[arg(long, short = 'n', default_value_t = 10)]
        limit: usize,

        /// Result offset for pagination
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Weight of semantic similarity (0.0-1.0)
        #[arg(long, requires = "text_weight")]
        semantic_weight: Option<f64>,

        /// Weight of full-text relevance (0.0-1.0)
        #[arg(long, requires = "semantic_weight")]
        text_weight: Option<f64>,

        /// Author filter
        #[arg(long)]
        author: Option<String>,

        /// Category filter (e.g. cs.LG)
        #[arg(long)]
        category: Option<String>,

        /// Year filter
        #[arg(long)]
        year: Option<String>,
    },

    /// List papers by an author
    Author {
        /// Author name
        name: String,

        #[arg(long, short = 'n', default_value_t = 10)]
        limit: usize,

        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Look up papers by DOI
    Doi {
        /// Digital Object Identifier
        doi: String,
    },

    /// Show a single paper
    Paper {
        /// Paper identifier (e.g. 2502.05707)
        id: String,

        /// Print a citation instead of the paper
        #[arg(long, value_enum)]
        cite: Option<CiteFormat>,
    },

    /// List available categories
    Categories,

    /// Suggest query completions
    Autocomplete {
        /// Query prefix
        prefix: String,

        #[arg(long, short = 'n', default_value_t = 5)]
        limit: usize,
    },

    /// Generate the AI overview for a query, retrying on failure
    #[command(alias = "o")]
    Overview {
        /// Search query string
        query: String,

        /// Print markdown with paper links instead of plain text
        #[arg(long)]
        markdown: bool,
    },

    /// Generate AI insights for a paper
    Insights {
        /// Paper identifier
        paper_id: String,

        /// Print the insights exactly as generated
        #[arg(long)]
        raw: bool,
    },

    /// Run the insights relay HTTP server
    Serve {
        /// Listen address (overrides configuration)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Show the effective configuration, or write a default config file
    Config {
        /// Write the configuration to a file instead of printing it
        #[arg(long)]
        init: bool,

        /// Target file for --init (defaults to the user config directory)
        #[arg(long, requires = "init")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long, requires = "init")]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from file if specified or found in default locations
    let mut config = if let Some(config_path) = &cli.config {
        load_config(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else if let Some(config_path) = find_config_file() {
        load_config(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        get_config().context("Failed to read configuration from environment")?
    };

    init_logging(&config.logging, cli.verbose, cli.quiet);

    if let Some(base_url) = &cli.base_url {
        config.backend.base_url = base_url.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.backend.timeout_seconds = timeout;
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    if let Commands::Config { init, path, force } = &command {
        return run_config(&config, *init, path.clone(), *force, cli.quiet);
    }

    let backend: Arc<dyn SearchBackend> = Arc::new(
        HttpBackend::from_config(&config.backend).context("Failed to create backend client")?,
    );
    tracing::debug!("Using search backend at {}", config.backend.base_url);

    let format = resolve_format(cli.output);

    match command {
        Commands::Search {
            query,
            limit,
            offset,
            semantic_weight,
            text_weight,
            author,
            category,
            year,
        } => {
            let mut search_query = SearchQuery::new(&query).limit(limit).offset(offset);
            if let (Some(semantic), Some(text)) = (semantic_weight, text_weight) {
                search_query = search_query.weights(semantic, text);
            }
            search_query.author = author;
            search_query.category = category;
            search_query.year = year;

            let response = backend.search(&search_query).await?;
            if !cli.quiet {
                eprintln!(
                    "Found {} papers (showing {})",
                    response.total,
                    response.results.len()
                );
            }
            output_papers(&response.results, format)?;
        }

        Commands::Author {
            name,
            limit,
            offset,
        } => {
            let response = backend.search_by_author(&name, limit, offset).await?;
            output_papers(&response.results, format)?;
        }

        Commands::Doi { doi } => {
            let response = backend.search_by_doi(&doi).await?;
            if response.is_empty() && !cli.quiet {
                eprintln!("No papers found for DOI {}", doi);
            }
            output_papers(&response.results, format)?;
        }

        Commands::Paper { id, cite } => {
            let paper = backend.get_paper_by_id(&id).await?;
            match (cite, format) {
                (Some(style), OutputFormat::Json) => {
                    let citation = StructuredCitation::new(&paper, style.into());
                    println!("{}", serde_json::to_string_pretty(&citation)?);
                }
                (Some(style), _) => println!("{}", format_citation(&paper, style.into())),
                (None, OutputFormat::Json) => {
                    println!("{}", serde_json::to_string_pretty(&paper)?)
                }
                (None, _) => output_paper_detail(&paper),
            }
        }

        Commands::Categories => {
            let categories = categories_or_default(backend.get_categories().await);
            output_strings(&categories, "Category", format)?;
        }

        Commands::Autocomplete { prefix, limit } => {
            let suggestions = backend.get_autocomplete(&prefix, limit).await;
            output_strings(&suggestions, "Suggestion", format)?;
        }

        Commands::Overview { query, markdown } => {
            let controller = OverviewController::new(backend, config.overview.retry_policy());
            let states = controller.subscribe();
            controller.set_query(Some(&query));

            let outcome = tokio::select! {
                outcome = controller.wait_for_outcome() => outcome,
                () = report_progress(states, cli.quiet) => Err(OverviewError::Inactive),
            };

            let summary = outcome?;
            output_summary(&query, &summary, markdown, format)?;
        }

        Commands::Insights { paper_id, raw } => {
            let response = backend.generate_insights(&paper_id).await?;
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else if raw {
                println!("{}", response.insights);
            } else {
                println!("{}", format_insights(&response.insights));
            }
        }

        Commands::Serve { bind } => {
            let mut relay = config.relay.clone();
            if let Some(bind) = bind {
                relay.bind = bind;
            }
            if !cli.quiet {
                eprintln!("Starting insights relay on http://{}", relay.bind);
            }
            paper_scout::relay::serve(&relay, backend)
                .await
                .context("Insights relay failed")?;
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}

/// Filter directive for the crate, from flags first and configuration second
fn log_filter(configured: &str, verbose: u8, quiet: bool) -> String {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => configured,
            1 => "debug",
            _ => "trace",
        }
    };
    format!("paper_scout={}", level)
}

fn init_logging(logging: &LoggingConfig, verbose: u8, quiet: bool) {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| log_filter(&logging.level, verbose, quiet)),
    );

    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.is_json() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn run_config(
    config: &Config,
    init: bool,
    path: Option<PathBuf>,
    force: bool,
    quiet: bool,
) -> Result<()> {
    if !init {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let path = path
        .or_else(user_config_path)
        .context("No config directory available; pass --path")?;
    save_config(config, &path, force)?;
    if !quiet {
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}

/// Print retry progress to stderr until the sender goes away
async fn report_progress(mut states: watch::Receiver<SummaryState>, quiet: bool) {
    while states.changed().await.is_ok() {
        if quiet {
            continue;
        }
        let state = states.borrow_and_update().clone();
        match state {
            SummaryState::Failed {
                message,
                attempt,
                retry_in: Some(delay),
            } => eprintln!(
                "Summary request failed ({}); retry {} in {}s",
                message,
                attempt + 1,
                delay.as_secs_f32()
            ),
            SummaryState::Loading { attempt } if attempt > 0 => {
                eprintln!("Retrying summary (attempt {})...", attempt + 1)
            }
            _ => {}
        }
    }
    std::future::pending::<()>().await;
}

fn resolve_format(format: OutputFormat) -> OutputFormat {
    if format == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        format
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

fn output_papers(papers: &[PaperRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(papers)?);
        }
        OutputFormat::Plain => {
            for paper in papers {
                let authors = paper.author_list().join(", ");
                println!("{} - {} ({})", paper.title, authors, paper.id);
                println!("  Link: {}", paper.path());
                if let Some(doi) = paper.doi() {
                    println!("  DOI: {}", doi);
                }
                if let Some(ref passage) = paper.passage {
                    println!("  {}", truncate(passage, 160));
                }
                println!();
            }
        }
        OutputFormat::Table | OutputFormat::Auto => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["ID", "Title", "Authors", "Year", "Score"]);

            for paper in papers {
                table.add_row(vec![
                    Cell::new(&paper.id),
                    Cell::new(truncate(&paper.title, 50)).add_attribute(Attribute::Bold),
                    Cell::new(truncate(&paper.author_list().join(", "), 30)),
                    Cell::new(paper.year().unwrap_or_default()),
                    Cell::new(format!("{:.2}", paper.score)),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

fn output_paper_detail(paper: &PaperRecord) {
    println!("{}", paper.title);
    println!("  ID: {}", paper.id);
    let authors = paper.author_list();
    if !authors.is_empty() {
        println!("  Authors: {}", authors.join(", "));
    }
    let categories = paper.category_list();
    if !categories.is_empty() {
        println!("  Categories: {}", categories.join(", "));
    }
    if let Some(year) = paper.year() {
        println!("  Year: {}", year);
    }
    if let Some(doi) = paper.doi() {
        println!("  DOI: {}", doi);
    }
    println!("  Link: {}", paper.path());
    if !paper.content.is_empty() {
        println!();
        println!("{}", paper.content);
    }
}

fn output_strings(items: &[String], header: &str, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
        OutputFormat::Plain => {
            for item in items {
                println!("{}", item);
            }
        }
        OutputFormat::Table | OutputFormat::Auto => {
            let mut table = comfy_table::Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec![header]);
            for item in items {
                table.add_row(vec![item]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

fn output_summary(query: &str, summary: &str, markdown: bool, format: OutputFormat) -> Result<()> {
    let rendered = render_summary(summary);

    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "query": query,
                "summary": summary,
                "segments": rendered.segments,
                "references": rendered.references,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        _ if markdown => println!("{}", rendered.to_markdown()),
        OutputFormat::Plain => println!("{}", rendered.to_plain()),
        OutputFormat::Table | OutputFormat::Auto => {
            let plain_only = paper_scout::citations::RenderedSummary {
                segments: rendered.segments.clone(),
                references: Vec::new(),
            };
            println!("{}", plain_only.to_plain());

            if !rendered.references.is_empty() {
                let mut table = comfy_table::Table::new();
                table.load_preset(comfy_table::presets::UTF8_FULL);
                table.set_header(vec!["#", "Paper", "Link"]);
                for reference in &rendered.references {
                    table.add_row(vec![
                        reference.index.to_string(),
                        reference.id.clone(),
                        reference.path(),
                    ]);
                }
                println!();
                println!("{table}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_version() {
        let version = env!("CARGO_PKG_VERSION");
        let parts: Vec<&str> = version.split('.').collect();
        assert!(parts.len() >= 2);
        assert!(parts[0].parse::<u32>().is_ok());
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["paper-scout"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert_eq!(cli.output, OutputFormat::Auto);
        assert_eq!(cli.timeout, None);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["paper-scout", "-v"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["paper-scout", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_output_format() {
        let cli = Cli::parse_from(["paper-scout", "-o", "json"]);
        assert_eq!(cli.output, OutputFormat::Json);

        let cli = Cli::parse_from(["paper-scout", "--output", "table"]);
        assert_eq!(cli.output, OutputFormat::Table);
    }

    #[test]
    fn test_cli_global_overrides() {
        let cli = Cli::parse_from([
            "paper-scout",
            "categories",
            "--base-url",
            "http://search:9000",
            "--timeout",
            "5",
        ]);
        assert_eq!(cli.base_url.as_deref(), Some("http://search:9000"));
        assert_eq!(cli.timeout, Some(5));
    }

    #[test]
    fn test_cli_search_command() {
        let cli = Cli::parse_from([
            "paper-scout",
            "search",
            "neural networks",
            "--limit",
            "25",
            "--semantic-weight",
            "0.7",
            "--text-weight",
            "0.3",
            "--category",
            "cs.LG",
        ]);
        match cli.command {
            Some(Commands::Search {
                query,
                limit,
                semantic_weight,
                category,
                ..
            }) => {
                assert_eq!(query, "neural networks");
                assert_eq!(limit, 25);
                assert_eq!(semantic_weight, Some(0.7));
                assert_eq!(category.as_deref(), Some("cs.LG"));
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_weights_must_be_paired() {
        let result = Cli::try_parse_from(["paper-scout", "search", "q", "--semantic-weight", "0.5"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_paper_cite() {
        let cli = Cli::parse_from(["paper-scout", "paper", "2502.05707", "--cite", "bibtex"]);
        match cli.command {
            Some(Commands::Paper { id, cite }) => {
                assert_eq!(id, "2502.05707");
                assert_eq!(cite, Some(CiteFormat::Bibtex));
            }
            _ => panic!("Expected Paper command"),
        }
    }

    #[test]
    fn test_cli_overview_command() {
        let cli = Cli::parse_from(["paper-scout", "o", "diffusion models", "--markdown"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Overview { markdown: true, .. })
        ));
    }

    #[test]
    fn test_cli_serve_command() {
        let cli = Cli::parse_from(["paper-scout", "serve", "--bind", "0.0.0.0:8080"]);
        match cli.command {
            Some(Commands::Serve { bind }) => assert_eq!(bind.as_deref(), Some("0.0.0.0:8080")),
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_config_path_requires_init() {
        assert!(Cli::try_parse_from(["paper-scout", "config", "--path", "x.toml"]).is_err());
        assert!(Cli::try_parse_from(["paper-scout", "config", "--init", "--path", "x.toml"]).is_ok());
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(log_filter("info", 0, false), "paper_scout=info");
        assert_eq!(log_filter("warn", 1, false), "paper_scout=debug");
        assert_eq!(log_filter("info", 3, false), "paper_scout=trace");
        assert_eq!(log_filter("debug", 2, true), "paper_scout=error");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Ünïcödé title here", 8), "Ünïcö...");
    }
}
