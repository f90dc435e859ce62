use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use dorkscope::api::HttpSearchApi;
use dorkscope::charts::ChartJsBackend;
use dorkscope::config::CONFIG;
use dorkscope::controller::SearchController;
use dorkscope::dashboard::DashboardUpdater;
use dorkscope::data_models::SearchType;
use dorkscope::events::{App, UiEvent};
use dorkscope::export::{EXPORT_HISTORY_PATH, ExportFormat, results_export_path};
use dorkscope::form::{FormFields, detect_search_type};
use dorkscope::history::HistoryFilter;
use dorkscope::view::Page;

#[derive(Parser, Debug)]
#[command(name = "dorkscope", about = "Terminal front end for the OSINT search API")]
struct Cli {
    /// Base url of the search backend.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Server-rendered page to start from; its csrf-token meta tag is used.
    #[arg(long, global = true)]
    page: Option<PathBuf>,

    /// Print the page as plain text instead of HTML.
    #[arg(long, global = true)]
    text: bool,

    /// Write the page here instead of stdout.
    #[arg(long, short, global = true)]
    out: Option<PathBuf>,

    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a full search and render the results page.
    Search(SearchArgs),
    /// Run a quick search and render the five-result preview.
    Quick {
        query: String,
        #[arg(long = "type", default_value = "general")]
        search_type: String,
    },
    /// Fetch dashboard stats and charts.
    Dashboard,
    /// Filter and sort a saved history page.
    History(HistoryArgs),
    /// Guess the search type of a value.
    Detect { value: String },
    /// Print the export url for the history or a search.
    Export {
        /// Search id; omit to export the history.
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        format: Option<ExportFormat>,
    },
}

#[derive(Args, Debug)]
struct SearchArgs {
    query: String,
    /// Search type; auto-detected from the query when omitted.
    #[arg(long = "type")]
    search_type: Option<String>,
    #[arg(long)]
    dorking: bool,
    /// Dork category, may be repeated. Implies --dorking.
    #[arg(long = "dork")]
    dork_categories: Vec<String>,
    #[arg(long, default_value = "50")]
    max_results: String,
    #[arg(long, default_value = "")]
    language: String,
    #[arg(long, default_value = "")]
    date_range: String,
    #[arg(long, default_value = "")]
    risk_filter: String,
}

#[derive(Args, Debug)]
struct HistoryArgs {
    file: PathBuf,
    #[arg(long = "type", default_value = "")]
    search_type: String,
    #[arg(long, default_value = "")]
    status: String,
    #[arg(long, default_value = "")]
    days: String,
    #[arg(long, default_value = "")]
    query: String,
    /// Column index to sort by.
    #[arg(long)]
    sort: Option<usize>,
    #[arg(long)]
    select_all: bool,
}

impl SearchArgs {
    fn to_fields(&self) -> FormFields {
        let search_type = self.search_type.clone().unwrap_or_else(|| {
            detect_search_type(&self.query)
                .unwrap_or_default()
                .to_string()
        });
        let dorking = self.dorking || !self.dork_categories.is_empty();
        FormFields {
            query: self.query.clone(),
            search_type,
            enable_dorking: dorking.then(|| "on".to_string()),
            dork_categories: self.dork_categories.clone(),
            max_results: self.max_results.clone(),
            language: self.language.clone(),
            date_range: self.date_range.clone(),
            risk_filter: self.risk_filter.clone(),
        }
    }
}

type CliApp = App<HttpSearchApi, Page, ChartJsBackend>;

fn build_app(cli: &Cli) -> Result<(CliApp, tokio::sync::mpsc::UnboundedReceiver<UiEvent>)> {
    let page = match &cli.page {
        Some(path) => {
            let html = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read page template {}", path.display()))?;
            Page::from_template(&html)
        }
        None => Page::default(),
    };
    let csrf_token = page.csrf_token().or_else(|| CONFIG.csrf_token.clone());
    let api_url = cli.api_url.clone().unwrap_or_else(|| CONFIG.api_url.clone());
    let api = HttpSearchApi::new(&api_url, csrf_token).context("Failed to create api client")?;

    let controller = SearchController::new(api, page, CONFIG.controller_settings());
    let dashboard = DashboardUpdater::new(ChartJsBackend::new());
    let (app, rx) = App::new(controller, dashboard);
    app.initialize(CONFIG.theme.as_deref(), false);
    Ok((app, rx))
}

async fn drive(
    app: &CliApp,
    rx: tokio::sync::mpsc::UnboundedReceiver<UiEvent>,
    events: Vec<UiEvent>,
) -> Result<()> {
    let tx = app.sender();
    for event in events {
        tx.send(event).context("event loop closed")?;
    }
    tx.send(UiEvent::Close).context("event loop closed")?;
    app.run(rx).await;
    Ok(())
}

fn emit(cli: &Cli, app: &CliApp) -> Result<()> {
    let page = app.controller().view();
    for (kind, message) in page.notifications() {
        eprintln!("[{}] {}", kind.as_str(), message);
    }

    let output = if cli.text {
        page.to_text(100)?
    } else {
        page.to_html(&app.dashboard().charts().backend().render_scripts())
    };
    match &cli.out {
        Some(path) => std::fs::write(path, output)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{output}"),
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber (handles both tracing and log crate)
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Command::Detect { value } => {
            match detect_search_type(value) {
                Some(kind) => println!("{kind}"),
                None => println!("unknown"),
            }
            return Ok(());
        }
        Command::Export { id, format } => {
            let path = match id {
                Some(id) => results_export_path(id, *format),
                None => EXPORT_HISTORY_PATH.to_string(),
            };
            let api_url = cli.api_url.clone().unwrap_or_else(|| CONFIG.api_url.clone());
            let api = HttpSearchApi::new(&api_url, None)?;
            println!("{}", api.endpoint(&path)?);
            return Ok(());
        }
        _ => {}
    }

    let (app, rx) = build_app(&cli)?;
    let events = match &cli.command {
        Command::Search(args) => vec![UiEvent::Submit(args.to_fields())],
        Command::Quick { query, search_type } => vec![UiEvent::QuickSearch {
            query: query.clone(),
            search_type: SearchType::from(search_type.as_str()),
        }],
        Command::Dashboard => vec![UiEvent::RefreshDashboard],
        Command::History(args) => {
            let html = std::fs::read_to_string(&args.file)
                .with_context(|| format!("Failed to read {}", args.file.display()))?;
            let rows = app.load_history(&html)?;
            log::info!("loaded {rows} history rows");
            let mut events = vec![UiEvent::FilterHistory(HistoryFilter::from_inputs(
                &args.search_type,
                &args.status,
                &args.days,
                &args.query,
            ))];
            if let Some(column) = args.sort {
                events.push(UiEvent::SortHistory(column));
            }
            if args.select_all {
                events.push(UiEvent::ToggleSelectAll(true));
            }
            events
        }
        Command::Detect { .. } | Command::Export { .. } => Vec::new(),
    };

    drive(&app, rx, events).await?;
    emit(&cli, &app)
}
