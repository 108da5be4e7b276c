use anyhow::{anyhow, Context, Result};
use chrono::{Local, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use content_registry::chart::ChartMetric;
use content_registry::chart_export::write_chart_bundle;
use content_registry::config::{Overrides, Settings};
use content_registry::fetch::FeedClient;
use content_registry::models::{DateRange, FilterState, RecordDate, SourceFilter};
use content_registry::normalize::Normalizer;
use content_registry::render::{render_chart_text, render_table_text};
use content_registry::sort::{sort_records, SortKey, SortOrder};
use content_registry::Dashboard;

/// Content registry - multi-source content analytics
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Backend base URL (overrides CONTENT_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Case-insensitive title search
    #[arg(long)]
    search: Option<String>,

    /// Source filter: all, telegram, vk, youtube, rutube, habr
    #[arg(long, default_value = "all")]
    source: String,

    /// Range start, DD-MM-YYYY (needs --to)
    #[arg(long)]
    from: Option<String>,

    /// Range end, DD-MM-YYYY (needs --from)
    #[arg(long)]
    to: Option<String>,

    /// Table sort key: date, views, likes, reposts, sentiment
    #[arg(long)]
    sort: Option<String>,

    /// Sort descending
    #[arg(long)]
    desc: bool,

    /// Chart metric: all, views, likes, reposts
    #[arg(long, default_value = "all")]
    metric: String,

    /// Write chart.json, table.json and index.json here
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Save the backend CSV export (default name content-registry-YYYY-MM-DD.csv)
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    export_csv: Option<String>,

    /// Question for the analytics assistant
    #[arg(long)]
    ask: Option<String>,

    /// IANA zone for epoch-millisecond dates (overrides CONTENT_TZ)
    #[arg(long)]
    tz: Option<String>,

    /// Feed page size (overrides CONTENT_FEED_LIMIT)
    #[arg(long)]
    limit: Option<usize>,
}

fn parse_day(flag: &str, raw: Option<&str>) -> Result<Option<chrono::NaiveDate>> {
    raw.map(|s| {
        RecordDate::parse(s)
            .map(|d| d.date())
            .ok_or_else(|| anyhow!("--{} expects DD-MM-YYYY, got '{}'", flag, s))
    })
    .transpose()
}

fn build_filters(args: &Args) -> Result<FilterState> {
    let start = parse_day("from", args.from.as_deref())?;
    let end = parse_day("to", args.to.as_deref())?;
    let date_range = DateRange::from_bounds(start, end);
    if date_range.is_none() && (start.is_some() || end.is_some()) {
        warn!("Date range ignored - both --from and --to are required");
    }

    Ok(FilterState::default()
        .with_search(args.search.clone().unwrap_or_default())
        .with_source(SourceFilter::parse(&args.source))
        .with_date_range(date_range))
}

fn export_path(raw: &str, settings: &Settings) -> PathBuf {
    if !raw.trim().is_empty() {
        return PathBuf::from(raw);
    }
    let today = match settings.timezone {
        Some(tz) => Utc::now().with_timezone(&tz).date_naive(),
        None => Local::now().date_naive(),
    };
    PathBuf::from(format!("content-registry-{}.csv", today.format("%Y-%m-%d")))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    info!("Starting content_registry");

    let args = Args::parse();

    let settings = Settings::resolve(&Overrides {
        api_url: args.api_url.clone(),
        feed_limit: args.limit,
        timezone: args.tz.clone(),
    })?;
    let filters = build_filters(&args)?;
    let metric = ChartMetric::parse(&args.metric)
        .ok_or_else(|| anyhow!("unknown chart metric '{}'", args.metric))?;
    let sort_key = match args.sort.as_deref() {
        Some(raw) => Some(SortKey::parse(raw).ok_or_else(|| anyhow!("unknown sort key '{}'", raw))?),
        None => None,
    };
    let order = if args.desc {
        SortOrder::Descending
    } else {
        SortOrder::Ascending
    };

    info!(
        "Settings - data_url={}, feed_limit={}, timezone={}",
        settings.endpoints.data,
        settings.feed_limit,
        settings.timezone.map(|tz| tz.name().to_string()).unwrap_or_else(|| "local".into())
    );
    debug!("Filters - {:?}, metric={:?}, sort={:?} {:?}", filters, metric, sort_key, order);

    let client = FeedClient::new(&settings)?;
    let normalizer = match settings.timezone {
        Some(tz) => Normalizer::with_timezone(tz),
        None => Normalizer::new(),
    };

    let mut dashboard = Dashboard::new();
    dashboard.set_filters(filters);
    dashboard.set_chart_metric(metric);
    dashboard.refresh(&client, &normalizer).await;

    let view = dashboard.view();
    let table = match sort_key {
        Some(key) => sort_records(&view.filtered, key, order),
        None => view.filtered.clone(),
    };
    print!("{}", render_table_text(&table));
    println!();
    print!("{}", render_chart_text(&view.chart, dashboard.chart_metric()));

    if let Some(ref dir) = args.out_dir {
        // local disk failures are reported, not fatal
        match write_chart_bundle(dir, &view, dashboard.filters(), dashboard.chart_metric()) {
            Ok(()) => info!("Chart bundle written - dir={}", dir.display()),
            Err(e) => warn!("Chart bundle not written - {:#}", e),
        }
    }

    if let Some(ref raw) = args.export_csv {
        if let Some(bytes) = dashboard.export_csv(&client).await {
            let path = export_path(raw, &settings);
            match std::fs::write(&path, &bytes).with_context(|| format!("write {}", path.display())) {
                Ok(()) => info!("CSV saved - path={}, bytes={}", path.display(), bytes.len()),
                Err(e) => warn!("CSV not saved - {:#}", e),
            }
        }
    }

    if let Some(ref question) = args.ask {
        if let Some(answer) = dashboard.ask(&client, question).await {
            println!();
            println!("{}", answer);
        }
    }

    let errors = dashboard.take_notices().iter().filter(|n| n.is_error()).count();
    if errors > 0 {
        debug!("Session finished with {} error notice(s)", errors);
    }
    Ok(())
}
