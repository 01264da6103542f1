use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use log::{info, warn};
use solar_transfer_sim::config::load_simulation;
use solar_transfer_sim::export::{CsvRecordSink, DiscardSink, RecordSink, write_json};
use solar_transfer_sim::physics::time::seconds_to_days;
use solar_transfer_sim::simulation::Simulation;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Headless N-body simulation with Lambert-planned probe launches"
)]
struct Cli {
    /// Simulation manifest (TOML or YAML)
    #[arg(long)]
    config: PathBuf,

    /// Number of ticks to run
    #[arg(long, conflicts_with = "days")]
    ticks: Option<u64>,

    /// Simulated days to run instead of a tick count
    #[arg(long)]
    days: Option<f64>,

    /// Directory for per-body record CSVs (overrides the manifest)
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON file for step diagnostics (overrides the manifest)
    #[arg(long)]
    diagnostics: Option<PathBuf>,

    /// Arm the mission at start-up
    #[arg(long, default_value_t = false)]
    arm: bool,

    /// Stop after this many consecutive faulted ticks
    #[arg(long, default_value_t = 10)]
    max_faults: u32,

    /// Print the coplanar circular Hohmann estimate between origin and target
    #[arg(long, default_value_t = false)]
    hohmann: bool,
}

const DEFAULT_TICKS: u64 = 1_000;

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = load_simulation(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let mut simulation = Simulation::from_config(&config)?;
    if cli.arm {
        match simulation.mission_mut() {
            Some(mission) => mission.arm(),
            None => warn!("--arm given but the manifest defines no mission"),
        }
    }

    let records_dir = cli.output.clone().or_else(|| config.output.records_dir.clone());
    let mut sink: Box<dyn RecordSink> = match &records_dir {
        Some(dir) => Box::new(CsvRecordSink::new(dir)?),
        None => Box::new(DiscardSink),
    };

    let mut iterations: u64 = 0;
    let mut consecutive_faults: u32 = 0;
    loop {
        let done = match (cli.ticks, cli.days) {
            (_, Some(days)) => simulation.clock().simulated_days() >= days,
            (Some(ticks), None) => iterations >= ticks,
            (None, None) => iterations >= DEFAULT_TICKS,
        };
        if done {
            break;
        }
        iterations += 1;

        let faulted = match simulation.tick(sink.as_mut()) {
            Ok(report) => {
                if report.launched {
                    info!("probe launched on {}", simulation.clock().date_label());
                }
                report.mission_fault.is_some()
            }
            Err(err) => {
                warn!("tick {iterations} failed: {err}");
                true
            }
        };
        consecutive_faults = if faulted { consecutive_faults + 1 } else { 0 };
        if consecutive_faults >= cli.max_faults.max(1) {
            sink.flush()?;
            bail!("stopping after {consecutive_faults} consecutive faulted ticks");
        }
    }
    sink.flush()?;

    if let Some(path) = cli.diagnostics.clone().or_else(|| config.output.diagnostics.clone()) {
        write_json(&path, simulation.diagnostics())
            .with_context(|| format!("writing diagnostics to {}", path.display()))?;
    }

    print_summary(&simulation);

    if cli.hohmann {
        match simulation.mission() {
            Some(mission) => match mission.hohmann_reference(simulation.system())? {
                Some(h) => println!(
                    "Hohmann est.   : Δv_total = {:.3} km/s (dv1={:.3}, dv2={:.3}), TOF = {:.2} days (configured {:.2})",
                    h.dv_total_m_s / 1_000.0,
                    h.dv1_m_s / 1_000.0,
                    h.dv2_m_s / 1_000.0,
                    seconds_to_days(h.tof_seconds),
                    mission.settings().duration_days
                ),
                None => println!("Hohmann est.   : unavailable for the current geometry"),
            },
            None => println!("Hohmann est.   : no mission configured"),
        }
    }

    Ok(())
}

fn print_summary(simulation: &Simulation) {
    let clock = simulation.clock();
    let diagnostics = simulation.diagnostics();

    println!("=== Simulation Summary ===");
    println!("Ticks          : {}", simulation.ticks());
    println!(
        "Simulated time : {:.3} days ({:.5} yr)",
        clock.simulated_days(),
        clock.simulated_years()
    );
    println!("End date       : {}", clock.date_label());
    if let (Some(mean), Some(min), Some(max)) =
        (diagnostics.mean_dt(), diagnostics.min_dt(), diagnostics.max_dt())
    {
        println!(
            "Steps          : {} accepted, {} rejected, dt mean {:.1} s (min {:.1}, max {:.1})",
            diagnostics.accepted(),
            diagnostics.rejections,
            mean,
            min,
            max
        );
    }
    match simulation.mission() {
        Some(mission) => {
            println!("Mission        : {}", mission.state());
            if let Some(transfer) = mission.transfer() {
                println!(
                    "Transfer       : TOF = {:.2} days (requested {:.2}), {} period wraps",
                    seconds_to_days(transfer.corrected_duration_s),
                    mission.settings().duration_days,
                    transfer.interpolation.wraps
                );
            }
            if let Some(probe) = mission.probe() {
                println!(
                    "Probe          : {:.2} days flown",
                    seconds_to_days(probe.mission_time())
                );
            }
        }
        None => println!("Mission        : none"),
    }
}
