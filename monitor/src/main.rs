use anyhow::Context;
use app::config::MonitorConfig;
use app::runner::{DeviceSource, Runner};
use clap::Parser;
use fatiguecore::video::PlayerCommand;
use generator::device::SimulatorConfig;
use generator::lines::LineFormat;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;

mod app;
mod generator;
mod gui_bridge;

#[derive(Parser)]
#[command(author, version, about = "Driver-fatigue monitor host")]
struct Args {
    /// Load the monitor config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Serial device the detector board is attached to
    #[arg(long, default_value = "/dev/ttyUSB0")]
    port: String,
    #[arg(long, default_value_t = 115_200)]
    baud: u32,
    /// Address of the HTTP status bridge
    #[arg(long, default_value = "127.0.0.1:9000")]
    bind: SocketAddr,
    /// Replace the serial link with a synthetic detector board
    #[arg(long, default_value_t = false)]
    simulate: bool,
    #[arg(long, value_enum, default_value_t = LineFormat::Json)]
    format: LineFormat,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Milliseconds between simulated detections
    #[arg(long, default_value_t = 100)]
    interval_ms: u64,
    /// Player program launched with the stream locator
    #[arg(long)]
    player: Option<String>,
    /// Start playback as soon as a stream locator arrives
    #[arg(long, default_value_t = false)]
    autoplay: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = if let Some(path) = args.config {
        MonitorConfig::load(path)?
    } else {
        MonitorConfig::from_args(args.port, args.baud, args.bind)
    };
    if let Some(program) = args.player {
        config.player = Some(PlayerCommand {
            program,
            args: Vec::new(),
        });
    }
    config.autoplay |= args.autoplay;
    config.validate()?;

    let source = if args.simulate {
        DeviceSource::Simulated(SimulatorConfig {
            format: args.format,
            seed: args.seed,
            interval_ms: args.interval_ms,
            ..Default::default()
        })
    } else {
        DeviceSource::Serial
    };

    let runner = Runner::new(config);
    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating monitor runtime")?;

    let summary = runtime.block_on(runner.run(source, async {
        if let Err(err) = signal::ctrl_c().await {
            log::error!("awaiting Ctrl+C failed: {}", err);
        }
    }))?;

    println!(
        "Monitor stopped -> lines {}, decode errors {}, commands {}, alarms {}, alarm active {}",
        summary.metrics.lines_received,
        summary.metrics.decode_errors,
        summary.metrics.commands_sent,
        summary.metrics.alarms_raised,
        summary.final_status.alarm_active
    );

    Ok(())
}
