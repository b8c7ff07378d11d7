use std::{fs::OpenOptions, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{
    EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt,
};

use budget_rollup::{
    AppState, ColumnPin, GeminiClient, PaginationConfig, SchemaConfig, SheetSource, SourceConfig,
    SourceLocation, Summarizer, build_router, graceful_shutdown,
};

/// The web server for the team budget rollup dashboard.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The allocations table: a CSV export URL, a CSV file, or a workbook
    /// file with an optional sheet name, e.g. `budget.xlsx#예산`.
    #[arg(long, env = "ALLOCATIONS_SOURCE")]
    allocations: SourceLocation,

    /// The expenses table, in the same forms as `--allocations`.
    #[arg(long, env = "EXPENSES_SOURCE")]
    expenses: SourceLocation,

    /// How long fetched tables are reused before they are fetched again.
    #[arg(long, env = "CACHE_TTL_SECS", default_value_t = 60)]
    cache_ttl_secs: u64,

    /// How long to wait for a spreadsheet download.
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 30)]
    fetch_timeout_secs: u64,

    /// The year to report on. Defaults to the current year in `--timezone`.
    #[arg(long, env = "REPORT_YEAR")]
    year: Option<i32>,

    /// The local timezone as a canonical timezone name, e.g. "Asia/Seoul".
    #[arg(long, env = "TIMEZONE", default_value = "Etc/UTC")]
    timezone: String,

    /// Read a column from an exact header, e.g. `--column team=부서`.
    /// May be given more than once.
    #[arg(long = "column", value_name = "FIELD=HEADER")]
    columns: Vec<ColumnPin>,

    /// The Gemini model used for AI summaries.
    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-1.5-flash")]
    gemini_model: String,

    /// The API key for AI summaries. Summaries are disabled without it.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// The port to serve the dashboard from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let fetch_timeout = Duration::from_secs(args.fetch_timeout_secs);

    let source = SheetSource::new(
        SourceConfig {
            allocations: args.allocations,
            expenses: args.expenses,
        },
        fetch_timeout,
    )
    .expect("Could not create the data source.");

    let summarizer = match args.gemini_api_key.filter(|key| !key.trim().is_empty()) {
        Some(api_key) => {
            let client = GeminiClient::new(api_key, args.gemini_model.clone(), fetch_timeout)
                .expect("Could not create the AI summary client.");
            tracing::info!("AI summaries enabled with model {}", args.gemini_model);
            Some(Arc::new(client) as Arc<dyn Summarizer>)
        }
        None => {
            tracing::warn!("GEMINI_API_KEY is not set, AI summaries are disabled");
            None
        }
    };

    let state = AppState::new(
        Arc::new(source),
        Duration::from_secs(args.cache_ttl_secs),
        SchemaConfig::with_pins(args.columns),
        summarizer,
        args.year,
        &args.timezone,
        PaginationConfig::default(),
    )
    .expect("Invalid server configuration.");

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    tracing::info!("HTTP server listening on http://{}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .unwrap();
}

fn setup_logging() {
    let stdout_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(stdout_filter);

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .with_filter(filter::LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
