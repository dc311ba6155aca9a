//! CLI binary for prodify.
//!
//! A thin shim over the library crate: maps flags onto `AppConfig`, runs one
//! operation and prints the result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use prodify::pipeline::product::ExtractorTable;
use prodify::sites::slug::{is_valid_slug, slugify};
use prodify::{
    generate_site_with_progress, scrape_page, summarize_product, write_site_dir, AppConfig,
    AppState, GenerationProgressCallback, ProgressCallback, Stage,
};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner with one log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Generating");
        bar.set_message("starting…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        let msg = match stage {
            Stage::Fetch => "fetching product page…",
            Stage::Extract => "extracting product details…",
            Stage::Generate => "writing copy with the model…",
            Stage::Render => "assembling HTML…",
        };
        self.bar.set_message(msg);
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<9} {}",
            green("✓"),
            stage.label(),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!("  {} {:<9} {}", red("✗"), stage.label(), red(&msg)));
        self.bar.finish_and_clear();
    }

    fn on_generation_complete(&self, slug: &str, total_ms: u64) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} generated in {}ms",
            green("✔"),
            bold(slug),
            total_ms
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start the API + public page server
  PRODIFY_API_TOKENS=dev-token:me prodify serve --store sites.json

  # See what the scraper extracts
  prodify scrape https://www.amazon.com/dp/B0EXAMPLE --json

  # Generate a site into ./site (index.html + styles.css)
  prodify generate https://shop.example/p/42 -o site

  # Check a slug before publishing
  prodify check-slug my-product

ENVIRONMENT VARIABLES:
  GOOGLE_API_KEY          Gemini API key (default backend)
  PRODIFY_MODEL           Model ID (default gemini-2.5-flash)
  PRODIFY_LLM_PROVIDER    Use an edgequake-llm provider instead (openai, anthropic, ollama)
  PRODIFY_PUBLIC_URL      Base URL of published pages
  PRODIFY_MAIN_DOMAIN     Domain whose subdomains map to slugs
  PRODIFY_API_TOKENS      Bearer tokens, token:user_id,…
  PRODIFY_STORE_PATH      JSON file for published sites
  RUST_LOG                Overrides the log filter
"#;

/// Turn product pages into published affiliate micro-sites.
#[derive(Parser, Debug)]
#[command(
    name = "prodify",
    version,
    about = "Turn product pages into published affiliate micro-sites",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PRODIFY_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PRODIFY_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server.
    Serve(ServeArgs),
    /// Fetch a page and print the extracted fields.
    Scrape {
        url: String,
        /// Print JSON instead of a summary table.
        #[arg(long)]
        json: bool,
    },
    /// Fetch a product page and print the product summary as JSON.
    Summarize { url: String },
    /// Generate a site for a product page.
    Generate(GenerateArgs),
    /// Validate a slug and suggest a valid one.
    CheckSlug { slug: String },
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to bind.
    #[arg(long, env = "PRODIFY_BIND")]
    bind: Option<SocketAddr>,

    /// JSON file holding published sites (in-memory when absent).
    #[arg(long, env = "PRODIFY_STORE_PATH")]
    store: Option<PathBuf>,

    /// Public base URL used in publish responses.
    #[arg(long, env = "PRODIFY_PUBLIC_URL")]
    public_url: Option<String>,

    /// Main domain for subdomain routing.
    #[arg(long, env = "PRODIFY_MAIN_DOMAIN")]
    main_domain: Option<String>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    url: String,

    /// Write index.html and styles.css into this directory.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the full generation output as JSON.
    #[arg(long)]
    json: bool,

    /// Model ID.
    #[arg(long, env = "PRODIFY_MODEL")]
    model: Option<String>,

    /// edgequake-llm provider name (openai, anthropic, ollama, …).
    #[arg(long, env = "PRODIFY_LLM_PROVIDER")]
    provider: Option<String>,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "PRODIFY_TEMPERATURE")]
    temperature: Option<f32>,

    /// Text file with a custom instruction preamble.
    #[arg(long)]
    system_prompt: Option<PathBuf>,

    /// Disable the spinner.
    #[arg(long)]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives enough feedback during `generate`; keep library
    // logs at error level there unless -v is passed.
    let spinner_active = matches!(
        &cli.command,
        Command::Generate(args) if !args.no_progress && !args.json
    ) && !cli.quiet;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || spinner_active {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    match cli.command {
        Command::Serve(args) => serve(args, config).await,
        Command::Scrape { url, json } => scrape(&url, json, &config).await,
        Command::Summarize { url } => {
            let summary = summarize_product(&url, &config)
                .await
                .context("Failed to summarise product")?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Command::Generate(args) => generate(args, config, spinner_active, cli.quiet).await,
        Command::CheckSlug { slug } => check_slug(&slug),
    }
}

async fn serve(args: ServeArgs, config: AppConfig) -> Result<()> {
    let mut builder = config.into_builder();
    if let Some(bind) = args.bind {
        builder = builder.bind_addr(bind);
    }
    if let Some(store) = args.store {
        builder = builder.store_path(store);
    }
    if let Some(url) = args.public_url {
        builder = builder.public_base_url(url);
    }
    if let Some(domain) = args.main_domain {
        builder = builder.main_domain(domain);
    }
    let config = builder.build().context("Invalid server configuration")?;

    let state = AppState::from_config(config)
        .await
        .context("Failed to initialise server state")?;
    prodify::serve(state).await.context("Server failed")?;
    Ok(())
}

async fn scrape(url: &str, json: bool, config: &AppConfig) -> Result<()> {
    let data = scrape_page(url, config)
        .await
        .with_context(|| format!("Failed to scrape {url}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!("URL:          {}", data.url);
    println!("Title:        {}", data.title);
    println!("Description:  {}", data.meta_description);
    println!("Headings:     {}", data.headings.len());
    for h in data.headings.iter().take(5) {
        println!("  - {h}");
    }
    println!("Paragraphs:   {}", data.paragraphs.len());
    println!("Images:       {}", data.images.len());
    for img in data.images.iter().take(5) {
        println!("  - {}", img.src);
    }
    println!(
        "Extractors:   {}",
        ExtractorTable::default().names().join(" → ")
    );
    Ok(())
}

async fn generate(args: GenerateArgs, config: AppConfig, spinner: bool, quiet: bool) -> Result<()> {
    let system_prompt = if let Some(ref path) = args.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = config.into_builder();
    if let Some(model) = args.model {
        builder = builder.model(model);
    }
    if let Some(provider) = args.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(t) = args.temperature {
        builder = builder.temperature(t);
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }
    let config = builder.build().context("Invalid configuration")?;

    let progress: ProgressCallback = if spinner {
        CliProgressCallback::new()
    } else {
        Arc::new(prodify::NoopProgressCallback)
    };

    let output = generate_site_with_progress(&args.url, &config, progress)
        .await
        .context("Generation failed")?;

    if let Some(ref dir) = args.output {
        write_site_dir(&output.site, dir)
            .await
            .with_context(|| format!("Failed to write site to {}", dir.display()))?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if args.output.is_none() {
        println!("{}", output.site.html);
    }

    if !quiet && !args.json {
        eprintln!(
            "   {}  {} sections  {} tokens in / {} tokens out  {}ms",
            bold(&format!("/{}", output.site.slug)),
            output.content.sections.len(),
            dim(&output.stats.input_tokens.to_string()),
            dim(&output.stats.output_tokens.to_string()),
            output.stats.total_duration_ms,
        );
        if let Some(ref dir) = args.output {
            eprintln!("   → {}", bold(&dir.display().to_string()));
        }
    }
    Ok(())
}

fn check_slug(slug: &str) -> Result<()> {
    if is_valid_slug(slug) {
        println!("{} '{}' is a valid slug", green("✔"), slug);
        return Ok(());
    }
    let suggestion = slugify(slug);
    if suggestion.is_empty() {
        anyhow::bail!("'{slug}' is not a valid slug (lowercase letters, digits, single hyphens)");
    }
    anyhow::bail!("'{slug}' is not a valid slug; try '{suggestion}'")
}
