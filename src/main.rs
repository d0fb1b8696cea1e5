use breakshot::bridge::BilliardsBridge;
use breakshot::config::BridgeConfig;
use breakshot::shot::{AimPoint, BallLayout, DpadOffset, ShotParameters, ShotReport};
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(
    name = "breakshot",
    about = "Reproduce Wii Play billiards break shots through the emulator pipes"
)]
struct Cli {
    /// Configuration file, defaults to ~/.config/breakshot/config.toml
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the ball layout the game generates for a seed
    Layout {
        #[arg(long, value_parser = parse_seed)]
        seed: u32,
    },
    /// Generate the layout for a seed, play the break and print the outcome
    Shoot {
        #[arg(long, value_parser = parse_seed)]
        seed: u32,
        /// Pointer position, both components in [0, 1]
        #[arg(long, num_args = 2, required = true, value_names = ["X", "Y"], allow_negative_numbers = true)]
        aim: Vec<f64>,
        /// Cue offset in D-pad taps, rounded to whole taps
        #[arg(long, num_args = 2, value_names = ["DX", "DZ"], allow_negative_numbers = true, default_values_t = [0.0, 0.0])]
        dpad: Vec<f64>,
    },
    /// Write the default configuration file if none exists
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(BridgeConfig::default_path);

    match cli.command {
        Command::InitConfig => {
            if BridgeConfig::ensure_default_config(&config_path).await? {
                println!("Wrote {}", config_path.display());
            } else {
                println!("{} already exists", config_path.display());
            }
        }
        Command::Layout { seed } => {
            let mut bridge = connect(&config_path).await?;
            let layout = bridge.get_coords_for_seed_retrying(seed).await?;
            print_layout(seed, &layout, cli.json)?;
        }
        Command::Shoot { seed, aim, dpad } => {
            let parameters = ShotParameters {
                aim: AimPoint {
                    x: aim[0],
                    y: aim[1],
                },
                dpad: DpadOffset::from_components(dpad[0], dpad[1]),
            };
            if !(0.0..=1.0).contains(&parameters.aim.x) || !(0.0..=1.0).contains(&parameters.aim.y)
            {
                return Err(eyre!("Aim components must lie in [0, 1]"));
            }

            let mut bridge = connect(&config_path).await?;
            let layout = bridge.get_coords_for_seed_retrying(seed).await?;
            let result = bridge.shoot_retrying(&layout, &parameters).await?;
            let report = ShotReport::new(seed, parameters, layout, result);
            print_report(&report, cli.json)?;
        }
    }
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

// Logs go to stderr so that stdout only carries results.
fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();
}

async fn connect(config_path: &std::path::Path) -> Result<BilliardsBridge> {
    let config = BridgeConfig::load_or_default(config_path).await?;
    info!("Connecting to pipes in {}", config.pipes.dir.display());
    BilliardsBridge::connect(&config)
        .await
        .map_err(|e| eyre!("Failed to connect to the emulator: {}", e))
}

fn parse_seed(value: &str) -> Result<u32, String> {
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("invalid seed `{}`: {}", value, e))
}

fn print_layout(seed: u32, layout: &BallLayout, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(layout)?);
        return Ok(());
    }
    println!("Seed {:08x}", seed);
    for (index, ball) in layout.balls.iter().enumerate() {
        println!("  ball {}: x {:>10.6}  z {:>10.6}", index + 1, ball.x, ball.z);
    }
    Ok(())
}

fn print_report(report: &ShotReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    println!(
        "Seed {:08x}, aim ({:.4}, {:.4}), dpad ({}, {}), recorded {}",
        report.seed,
        report.parameters.aim.x,
        report.parameters.aim.y,
        report.parameters.dpad.x,
        report.parameters.dpad.z,
        report.recorded_at.format("%Y-%m-%d %H:%M:%S")
    );
    for (index, ball) in report.result.balls.iter().enumerate() {
        let state = if ball.sunk { "sunk" } else { "on table" };
        println!(
            "  ball {}: x {:>10.6}  y {:>10.6}  z {:>10.6}  {}",
            index + 1,
            ball.x,
            ball.y,
            ball.z,
            state
        );
    }
    println!("{} of 9 balls sunk", report.sunk_count);
    Ok(())
}
