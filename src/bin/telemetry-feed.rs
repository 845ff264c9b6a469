//! Headless telemetry feed
//!
//! Drives a viewport on an offscreen surface and prints one JSON snapshot
//! per simulator tick.
//!
//! Usage:
//!   telemetry-feed [--preset sensor_panel|dashboard|field_robot] [--seed <u64>] [--ticks <n>] [--pretty]
//!   telemetry-feed --field [--seed <u64>] [--ticks <n>]

use anyhow::{bail, Context, Result};
use std::time::Duration;
use terrabot_view::scene::Layout;
use terrabot_view::telemetry::TelemetryPreset;
use terrabot_view::viewport::{HeadlessProvider, SurfaceSize, Viewport, ViewportOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Frame time of the field simulator
const FIELD_FRAME: Duration = Duration::from_millis(16);

fn print_usage() {
    println!("TerraBot telemetry feed");
    println!();
    println!("Usage:");
    println!("  telemetry-feed [--preset <name>] [--seed <u64>] [--ticks <n>] [--pretty]");
    println!("  telemetry-feed --field [--seed <u64>] [--ticks <n>] [--pretty]");
    println!();
    println!("Presets: sensor_panel (default), dashboard, field_robot");
    println!("--field drives the field simulator instead and adds position and LiDAR ring");
}

#[derive(Debug)]
struct Args {
    preset: TelemetryPreset,
    field: bool,
    seed: u64,
    ticks: u64,
    pretty: bool,
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i + 1)
        .map(String::as_str)
        .with_context(|| format!("{flag} needs a value"))
}

/// `None` when help was requested
fn parse_args(args: &[String]) -> Result<Option<Args>> {
    let mut parsed = Args {
        preset: TelemetryPreset::SensorPanel,
        field: false,
        seed: ViewportOptions::default().seed,
        ticks: 10,
        pretty: false,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(None),
            "--preset" => {
                parsed.preset = value(args, i, "--preset")?
                    .parse()
                    .map_err(anyhow::Error::msg)?;
                i += 2;
            }
            "--seed" => {
                parsed.seed = value(args, i, "--seed")?.parse().context("invalid --seed")?;
                i += 2;
            }
            "--ticks" => {
                parsed.ticks = value(args, i, "--ticks")?
                    .parse()
                    .context("invalid --ticks")?;
                i += 2;
            }
            "--field" => {
                parsed.field = true;
                i += 1;
            }
            "--pretty" => {
                parsed.pretty = true;
                i += 1;
            }
            other => bail!("unknown argument {other:?}"),
        }
    }
    Ok(Some(parsed))
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let options = ViewportOptions {
        layout: if args.field {
            Layout::FieldRobot
        } else {
            Layout::CadRobot
        },
        telemetry: (!args.field).then_some(args.preset),
        seed: args.seed,
        autostart: true,
        ..Default::default()
    };

    let mut provider = HeadlessProvider::new();
    let mut viewport = Viewport::initialize(&mut provider, SurfaceSize::new(640, 480), &options)?;

    // One frame per tick
    let dt = viewport
        .telemetry()
        .map_or(FIELD_FRAME, |telemetry| telemetry.interval());

    for _ in 0..args.ticks {
        viewport.frame(dt);
        if let Some(field) = viewport.field() {
            print_json(&field.snapshot(), args.pretty)?;
        } else if let Some(telemetry) = viewport.telemetry() {
            print_json(&telemetry.snapshot(), args.pretty)?;
        }
    }

    let stats = viewport.stats();
    tracing::info!(
        "{} frames presented, {} telemetry ticks",
        stats.presented,
        stats.telemetry_ticks
    );
    viewport.dispose();
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    match parse_args(&raw)? {
        Some(args) => run(&args),
        None => {
            print_usage();
            Ok(())
        }
    }
}
