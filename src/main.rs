use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use fieldsim::{
    logging::{init_logging, LogFormat},
    mission::RunStatistics,
    scenario::ScenarioLoader,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Field robot simulator")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/cane_field.yaml")]
    scenario: PathBuf,

    /// Override tick count (uses scenario default when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Log level or filter directive; RUST_LOG takes precedence
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// Print the tick bundle as one JSON line every N ticks
    #[arg(long)]
    report_every: Option<u64>,
}

#[derive(Serialize)]
struct RobotTotals {
    robot_id: String,
    #[serde(flatten)]
    statistics: RunStatistics,
    efficiency_ha_per_kwh: f64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| scenario.logging.level.clone());
    let format = cli.log_format.unwrap_or(scenario.logging.format);
    init_logging(&level, format)?;

    let ticks = scenario.ticks(cli.ticks);
    let mut engine = scenario.build_engine(cli.seed)?;

    let report_every = cli.report_every.filter(|n| *n > 0);
    let mut report_error = None;
    engine.run_with_hook(ticks, |summary| {
        if report_error.is_some() {
            return;
        }
        if let Some(every) = report_every {
            if summary.tick % every == 0 {
                match serde_json::to_string(summary) {
                    Ok(line) => println!("{line}"),
                    Err(err) => report_error = Some(err),
                }
            }
        }
    });
    if let Some(err) = report_error {
        return Err(err).context("Failed to serialise tick report");
    }

    let totals: Vec<RobotTotals> = engine
        .statistics()
        .into_iter()
        .map(|(robot_id, statistics)| RobotTotals {
            robot_id,
            efficiency_ha_per_kwh: statistics.efficiency_ha_per_kwh(),
            statistics,
        })
        .collect();
    println!(
        "Scenario '{}' completed for {} ticks, simulated clock {}",
        scenario.name,
        ticks,
        engine.environment().clock()
    );
    println!("{}", serde_json::to_string_pretty(&totals)?);
    Ok(())
}
