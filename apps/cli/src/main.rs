#![deny(warnings)]

//! Headless runner: load a scenario, simulate N quarters, persist the reports.

use anyhow::{Context, Result};
use persistence::{default_reports_dir, ReportStore};
use sim_runtime::{ScenarioConfig, Simulation};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_SCENARIO: &str = "assets/scenarios/turnaround.yaml";
const DEFAULT_QUARTERS: u32 = 4;

struct Args {
    scenario: PathBuf,
    quarters: u32,
    out: PathBuf,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        scenario: PathBuf::from(DEFAULT_SCENARIO),
        quarters: DEFAULT_QUARTERS,
        out: PathBuf::from(default_reports_dir()),
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--scenario" => {
                args.scenario = it.next().context("--scenario needs a path")?.into();
            }
            "--quarters" => {
                let n = it.next().context("--quarters needs a number")?;
                args.quarters = n
                    .parse()
                    .with_context(|| format!("--quarters: `{n}` is not a number"))?;
            }
            "--out" => {
                args.out = it.next().context("--out needs a directory")?.into();
            }
            other => anyhow::bail!(
                "unknown argument `{other}`\nusage: turnaround [--scenario PATH] [--quarters N] [--out DIR]"
            ),
        }
    }
    Ok(args)
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_args()?;
    info!(
        git_sha = env!("GIT_SHA"),
        scenario = %args.scenario.display(),
        quarters = args.quarters,
        out = %args.out.display(),
        "starting turnaround"
    );

    let config = ScenarioConfig::from_path(&args.scenario)
        .with_context(|| format!("loading scenario {}", args.scenario.display()))?;
    let name = config.name.clone();
    let schedule = config.schedule.clone();
    let mut sim = Simulation::new(config).context("initializing simulation")?;
    let store = ReportStore::open(&args.out)?;

    println!("Scenario: {name}");
    // Saved per quarter: an abort keeps the reports of committed quarters.
    for _ in 0..args.quarters {
        let quarter = sim.calendar().current();
        let report = sim
            .advance_scheduled(&schedule)
            .with_context(|| format!("simulating {quarter}"))?;
        store.save(&report.quarter, &report)?;
        let summary = &report.financial_summary;
        println!(
            "{} | margin: {}% | ROIC: {}% | cash burn: ${}/day | routes flown: {} | active aircraft: {}",
            report.quarter,
            summary.operating_margin.round_dp(2),
            summary.roic.round_dp(2),
            summary.cash_burn_rate.round_dp(2),
            report.route_performance.route_count(),
            report.fleet_status.active_aircraft,
        );
    }
    println!(
        "Cash: ${} | reports written to {}",
        sim.ledger().cash().round_dp(2),
        store.dir().display()
    );

    Ok(())
}
