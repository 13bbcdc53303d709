use anyhow::{Context as AnyhowContext, Result};
use casedesk_engine::{CaseDesk, DashboardConfig};
use casedesk_gateway::{MemoryGateway, SheetGateway, SheetsApiConfig, SheetsApiGateway};
use casedesk_protocol::serialize_json;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

mod http_api;
mod server;
mod server_security;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serialize_json(value)?
    };
    print_stdout(&text)
}

#[derive(Parser)]
#[command(name = "casedesk")]
#[command(about = "Case-tracking dashboard over a spreadsheet store", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// TOML configuration file
    #[arg(long, global = true, env = "CASEDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Read sheets from a JSON fixture instead of the Sheets API
    #[arg(long, global = true, env = "CASEDESK_FIXTURE")]
    fixture: Option<PathBuf>,

    /// Spreadsheet id (overrides the config file)
    #[arg(long, global = true, env = "CASEDESK_SPREADSHEET_ID")]
    spreadsheet_id: Option<String>,

    /// OAuth access token for the Sheets API
    #[arg(long, global = true, env = "CASEDESK_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Seconds between bulk cache resets (overrides the config file)
    #[arg(long, global = true, env = "CASEDESK_CACHE_INTERVAL_SECS")]
    cache_interval_secs: Option<u64>,

    /// Records per dashboard page (overrides the config file)
    #[arg(long, global = true)]
    page_size: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard JSON API over HTTP
    Serve(ServeArgs),

    /// Print one dashboard page as JSON
    View(ViewArgs),

    /// Report whether a case id already exists in any sheet
    #[command(name = "check-case")]
    CheckCase(CheckCaseArgs),

    /// List the configured sheet keys
    Sheets,
}

#[derive(Args)]
struct ServeArgs {
    /// Bind address, e.g. 127.0.0.1:5000
    #[arg(long, default_value = "127.0.0.1:5000")]
    bind: String,

    /// Allow binding to non-loopback addresses (requires --auth-token)
    #[arg(long)]
    public: bool,

    /// Require Authorization: Bearer <token> on all requests (env: CASEDESK_AUTH_TOKEN)
    #[arg(long)]
    auth_token: Option<String>,
}

#[derive(Args)]
struct ViewArgs {
    /// Sheet key, or "Main" for every sheet (default: configured default sheet)
    #[arg(long)]
    sheet: Option<String>,

    /// Case-insensitive substring filter
    #[arg(long, default_value = "")]
    search: String,

    /// 1-indexed page
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct CheckCaseArgs {
    /// Case identifier to look for
    case_id: String,
}

#[derive(Serialize)]
struct CheckCaseOutput<'a> {
    case_id: &'a str,
    duplicate: bool,
}

pub async fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = resolve_config(&cli)?;
    let gateway = build_gateway(&cli, &config)?;
    let desk = Arc::new(CaseDesk::new(config, gateway)?);

    match cli.command {
        Commands::Serve(args) => serve(args, desk).await?,
        Commands::View(args) => {
            let sheet = args
                .sheet
                .unwrap_or_else(|| desk.config().default_sheet.clone());
            let view = desk.dashboard_view(&sheet, &args.search, args.page).await?;
            print_json(&view, args.pretty)?;
        }
        Commands::CheckCase(args) => {
            let duplicate = desk.is_duplicate(&args.case_id).await?;
            print_json(
                &CheckCaseOutput {
                    case_id: &args.case_id,
                    duplicate,
                },
                false,
            )?;
        }
        Commands::Sheets => print_json(&desk.sheet_keys(), false)?,
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<DashboardConfig> {
    let mut config = match &cli.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };
    if let Some(id) = &cli.spreadsheet_id {
        config.spreadsheet_id = id.clone();
    }
    if let Some(secs) = cli.cache_interval_secs {
        config.cache_interval_secs = secs;
    }
    if let Some(page_size) = cli.page_size {
        config.page_size = page_size;
    }
    config.validate()?;
    Ok(config)
}

fn build_gateway(cli: &Cli, config: &DashboardConfig) -> Result<Arc<dyn SheetGateway>> {
    if let Some(path) = &cli.fixture {
        let gateway = MemoryGateway::from_fixture_path(path)
            .with_context(|| format!("Failed to load fixture {}", path.display()))?;
        log::info!("Serving sheets from fixture {}", path.display());
        return Ok(Arc::new(gateway));
    }

    if config.spreadsheet_id.trim().is_empty() {
        anyhow::bail!(
            "No spreadsheet configured: set --spreadsheet-id (or CASEDESK_SPREADSHEET_ID), or pass --fixture"
        );
    }
    let access_token = cli.access_token.clone().ok_or_else(|| {
        anyhow::anyhow!("The Sheets API needs --access-token (or CASEDESK_ACCESS_TOKEN)")
    })?;
    let gateway = SheetsApiGateway::new(SheetsApiConfig {
        base_url: config.api_base_url.clone(),
        spreadsheet_id: config.spreadsheet_id.clone(),
        access_token,
        timeout: config.request_timeout(),
    })?;
    Ok(Arc::new(gateway))
}

async fn serve(args: ServeArgs, desk: Arc<CaseDesk>) -> Result<()> {
    let auth_token = server_security::AuthToken::resolve(args.auth_token.as_deref())?;
    let addrs =
        server_security::guarded_bind_addrs(&args.bind, args.public, auth_token.as_ref()).await?;

    let state = Arc::new(server::AppState {
        desk,
        auth_token,
    });
    let app = server::router(state.clone());

    let listener = tokio::net::TcpListener::bind(addrs.as_slice()).await?;
    let local_addr = listener.local_addr()?;
    let base_url = format!("http://{local_addr}");

    print_stdout(&format!("Serving dashboard: {base_url}/"))?;
    print_stdout(&format!("Health endpoint: {base_url}/health"))?;
    if state.auth_token.is_some() {
        print_stdout("Auth enabled: add header 'Authorization: Bearer $CASEDESK_AUTH_TOKEN'")?;
    }
    print_stdout(&format!("Try: curl '{base_url}/?sheet=Main&page=1'"))?;

    axum::serve(listener, app).await?;
    Ok(())
}
