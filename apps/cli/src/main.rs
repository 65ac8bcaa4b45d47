#![deny(warnings)]

//! Headless CLI: runs the mining graph and reprocessing rollups over a
//! dataset file or seeded demo data and prints the results.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use ledger_core::ItemId;
use ledger_econ::RollupRow;
use ledger_runtime::{Dataset, LedgerConfig, MiningGraphSession, ReprocessingSession};
use ledger_series::{MiningMetric, QuickDate};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    data: Option<PathBuf>,
    config: Option<PathBuf>,
    metric: Option<String>,
    from: Option<String>,
    to: Option<String>,
    quick: Option<String>,
    reprocess: Vec<String>,
    demo: bool,
    seed: Option<u64>,
    json: bool,
    version: bool,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--data" => args.data = it.next().map(PathBuf::from),
            "--config" => args.config = it.next().map(PathBuf::from),
            "--metric" => args.metric = it.next(),
            "--from" => args.from = it.next(),
            "--to" => args.to = it.next(),
            "--quick" => args.quick = it.next(),
            "--reprocess" => {
                if let Some(ids) = it.next() {
                    args.reprocess
                        .extend(ids.split(',').map(|s| s.trim().to_string()));
                }
            }
            "--demo" => args.demo = true,
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--json" => args.json = true,
            "--version" => args.version = true,
            _ => {}
        }
    }
    args
}

fn parse_day(flag: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            // chrono is built without `std`, so its ParseError is not a std error.
            s.parse::<NaiveDate>()
                .map_err(|e| anyhow!("{flag} expects YYYY-MM-DD, got {s:?}: {e}"))
        })
        .transpose()
}

fn load_dataset(args: &Args) -> Result<Dataset> {
    match &args.data {
        Some(path) if !args.demo => Dataset::load(path)
            .with_context(|| format!("loading dataset {}", path.display())),
        _ => {
            let seed = args.seed.unwrap_or(42);
            let start = NaiveDate::from_ymd_opt(2023, 1, 1).context("demo start date")?;
            info!(seed, "using demo dataset");
            Ok(Dataset::demo(seed, start, 90))
        }
    }
}

fn print_series(graph: &MiningGraphSession) {
    let series = graph.series();
    let metric = graph.metric();
    println!("Mining graph | {} | {} series", metric, series.len());
    for s in series.iter() {
        println!(
            "  {:<28} points: {:>4} | max: {:>22} | total: {:>24}",
            graph.labels().label(&s.key),
            s.len(),
            metric.format(s.max),
            metric.format(s.total)
        );
    }
    for entry in graph.view().status {
        println!("  [status] {}: {}", entry.label, entry.formatted);
    }
}

fn print_rows(rows: &[RollupRow]) {
    println!("Reprocessed | {} rows", rows.len());
    for row in rows {
        match row {
            RollupRow::SourceTotal(t) => println!(
                "  {} (#{}) | sell: {} | reprocessed: {} | difference: {}",
                t.name,
                t.source,
                t.sell_price,
                t.value,
                t.value_difference()
            ),
            RollupRow::Material(m) => println!(
                "    {:<20} x{:>8} (max {:>8}) @ {} = {}",
                m.name,
                m.quantity,
                m.quantity_max,
                m.unit_price,
                m.value()
            ),
            RollupRow::GrandTotal(g) => println!(
                "  Grand Total | sell: {} | reprocessed: {} | difference: {}",
                g.sell_price,
                g.value,
                g.value_difference()
            ),
            RollupRow::GrandMaterial(g) => println!(
                "    {:<20} x{:>8} (max {:>8}) = {}",
                g.name, g.quantity, g.quantity_max, g.value
            ),
        }
    }
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    if args.version {
        println!(
            "mining-ledger {} ({} {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }
    info!(?args, "starting CLI");

    let cfg = match &args.config {
        Some(path) => LedgerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => LedgerConfig::default(),
    };
    let data = load_dataset(&args)?;

    let mut graph = MiningGraphSession::from_config(&cfg);
    if let Some(metric) = &args.metric {
        graph.set_metric(metric.parse::<MiningMetric>()?);
    }
    let (cfg_from, cfg_to) = graph.days();
    let from = parse_day("--from", args.from.as_deref())?.or(cfg_from);
    let to = parse_day("--to", args.to.as_deref())?.or(cfg_to);
    graph.set_days(from, to);
    if let Some(quick) = &args.quick {
        // Without a clock, "today" is the latest day in the ledger.
        let today = data
            .mining
            .iter()
            .map(|e| e.date.date())
            .max()
            .context("--quick needs at least one mining event")?;
        graph.apply_quick(quick.parse::<QuickDate>()?, today);
    }
    graph.refresh(&data.mining, &data.items);

    let mut reprocessing = ReprocessingSession::new(cfg.reprocess.clone())?;
    for id in &args.reprocess {
        match id.parse::<u32>() {
            Ok(id) => reprocessing.add([ItemId(id)]),
            Err(_) => bail!("--reprocess expects comma separated type ids, got {id:?}"),
        }
    }
    let rows = reprocessing.refresh(&data.items, &data.prices);

    if args.json {
        let series = graph.series();
        let out = serde_json::json!({
            "metric": graph.metric(),
            "series": series.as_slice(),
            "view": graph.view(),
            "reprocessed": rows.as_slice(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_series(&graph);
    if !reprocessing.sources().is_empty() {
        print_rows(&rows);
    }
    Ok(())
}
