use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use trail_core::{validate_itinerary, DayDistance, Itinerary, ValidationReport};
use trail_planner::{HeadlessSurface, MapRouteLifecycleController, PlannerConfig, RoutingOutcome};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "trailmap", author, version, about, long_about = None)]
struct Args {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Route every day of an itinerary and validate the result
    Route {
        itinerary: PathBuf,

        /// Comma-separated provider chain (brouter, openroute, osrm)
        #[arg(long)]
        providers: Option<String>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check declared day distances and loop closure without routing
    Validate { itinerary: PathBuf },
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("trail_planner=debug".parse()?);
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

fn load(path: &Path) -> Result<Itinerary> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Itinerary::from_json(&raw).with_context(|| format!("parsing {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json)?;

    match args.command {
        Command::Route {
            itinerary,
            providers,
            json,
        } => route(&itinerary, providers.as_deref(), json).await,
        Command::Validate { itinerary } => {
            let itinerary = load(&itinerary)?;
            let declared: Vec<DayDistance> = itinerary
                .days
                .iter()
                .filter_map(|day| {
                    day.declared_distance_km.map(|distance_km| DayDistance {
                        day_index: day.day_index,
                        distance_km,
                    })
                })
                .collect();
            let report = validate_itinerary(&itinerary, &declared);
            print_report(&report);
            if !report.is_valid {
                anyhow::bail!("itinerary failed validation");
            }
            Ok(())
        }
    }
}

async fn route(path: &Path, providers: Option<&str>, json: bool) -> Result<()> {
    let itinerary = load(path)?;
    let mut config = PlannerConfig::from_env();
    if let Some(list) = providers {
        config = config.with_provider_list(list)?;
    }

    let surface = Arc::new(HeadlessSurface::new().with_control_client(config.http_client()?));
    let controller = MapRouteLifecycleController::from_config(&surface, &config)?;
    tracing::info!(
        "Routing {} days with {}",
        itinerary.days.len(),
        controller.coordinator().provider_names().join(" -> ")
    );
    surface.set_ready(true);

    let outcome = controller
        .show_itinerary(&itinerary)
        .await
        .context("routing pass ended before producing a result")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn print_outcome(outcome: &RoutingOutcome) {
    for summary in &outcome.summaries {
        println!(
            "Day {}: {:.1}km via {}",
            summary.day, summary.distance_km, summary.provider
        );
    }
    for day_index in &outcome.unrouted_days {
        println!("Day {}: no route found", day_index + 1);
    }
    if !outcome.routes.is_empty() {
        println!("Total: {:.1}km", outcome.total_distance_km());
    }
    print_report(&outcome.report);
}

fn print_report(report: &ValidationReport) {
    for error in &report.errors {
        println!("ERROR: {}", error.message);
    }
    for warning in &report.warnings {
        println!("WARNING: {}", warning.message);
    }
    if report.is_empty() {
        println!("Route passes all checks");
    }
}
