//! Starplot - command-line front end
//!
//! CLI commands:
//! - list: Plot a catalog and list the stars on screen
//! - transits: Find transits within a distance band
//! - path: Build a route from an encoded path and save it
//! - route: Chart a route star by star and save it
//! - routes: Replot the saved routes of the dataset
//! - distances: Distances from one star to all others
//! - labels: Label placement for a camera view

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use starplot::config::{Config, Environment, TransitBand};
use starplot::labels::Camera;
use starplot::logging;
use starplot::model::{Catalog, StarDisplayRecord, StarId};
use starplot::persistence::{JsonRouteStore, MemoryStore, Persistence};
use starplot::renderer::{RecordingRenderer, Renderer};
use starplot::{AppState, Command};

#[derive(Parser)]
#[command(name = "starplot")]
#[command(about = "Plot stellar neighborhoods, chart routes and find transits")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to starplot.yaml config
    #[arg(short, long, default_value = "starplot.yaml")]
    config: PathBuf,

    /// Catalog to plot (YAML or JSON)
    #[arg(short = 'k', long, default_value = "demos/local_stars.yaml")]
    catalog: PathBuf,

    /// Center the plot on this star instead of the catalog's center
    #[arg(long)]
    center: Option<String>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List plotted stars
    List,

    /// Find transits between nearby stars
    Transits {
        /// Lower bound in light-years
        #[arg(long, default_value = "0")]
        min: f64,

        /// Upper bound in light-years (defaults to the first configured band)
        #[arg(long)]
        max: Option<f64>,
    },

    /// Build a route from an encoded path such as "[Sol,Alpha Centauri A]"
    Path {
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        /// Path name used in the route name
        #[arg(long, default_value = "1")]
        name: String,

        /// Encoded path
        #[arg(long)]
        path: String,
    },

    /// Chart a route through the named stars, in order
    Route {
        /// Route name
        #[arg(long, default_value = "Route")]
        name: String,

        #[arg(required = true, num_args = 2..)]
        stars: Vec<String>,
    },

    /// Replot the routes saved for this dataset
    Routes,

    /// Distances from one star to every other plotted star
    Distances {
        star: String,
    },

    /// Place labels for a camera view
    Labels {
        #[arg(long, default_value = "0")]
        yaw: f64,

        #[arg(long, default_value = "0")]
        pitch: f64,

        #[arg(long, default_value = "1")]
        zoom: f64,

        /// Also label transits up to this distance
        #[arg(long)]
        transits: Option<f64>,
    },
}

fn main() -> anyhow::Result<()> {
    let env = Environment::load();
    logging::init_logging(&env.log_dir)?;
    tracing::info!("Starplot starting up");

    let cli = Cli::parse();
    tracing::debug!("CLI args parsed: config={:?} catalog={:?}", cli.config, cli.catalog);

    let config = if cli.config.exists() {
        tracing::info!("Loading config from {:?}", cli.config);
        Config::load(&cli.config)?
    } else {
        tracing::warn!("Config file not found: {:?}, using defaults", cli.config);
        Config::default()
    };

    let mut catalog = Catalog::load(&cli.catalog)?;
    if let Some(center) = cli.center.clone() {
        catalog.center = Some(center);
    }
    if let Some(dataset) = env.dataset.clone() {
        catalog.dataset = dataset;
    }

    match &cli.command {
        Commands::List => {
            let state = plot(config, catalog, MemoryStore::new())?;
            list_stars(&state, cli.json)?;
        }

        Commands::Transits { min, max } => {
            let upper = max.unwrap_or_else(|| config.transit_bands()[0].upper);
            let band = TransitBand {
                lower: *min,
                upper,
                ..config.transit_bands()[0].clone()
            };
            let mut state = plot(config, catalog, MemoryStore::new())?;
            state.dispatch(Command::FindTransits { band })?;
            list_transits(&state, cli.json)?;
        }

        Commands::Path { from, to, name, path } => {
            let store = JsonRouteStore::open(&env.data_dir)?;
            let route_settings = config.routes.clone();
            let mut state = plot(config, catalog, store)?;
            state.dispatch(Command::BuildPath {
                source: from.clone(),
                destination: to.clone(),
                path_name: name.clone(),
                color: route_settings.color,
                line_width: route_settings.line_width,
                encoded_path: path.clone(),
            })?;
            print_saved_route(&state, cli.json)?;
        }

        Commands::Route { name, stars } => {
            let store = JsonRouteStore::open(&env.data_dir)?;
            let route_settings = config.routes.clone();
            let mut state = plot(config, catalog, store)?;

            let ids = stars
                .iter()
                .map(|star| star_id(&state, star))
                .collect::<anyhow::Result<Vec<StarId>>>()?;
            let (origin, rest) = ids.split_first().ok_or_else(|| anyhow::anyhow!("no stars given"))?;
            let (last, middle) = rest.split_last().ok_or_else(|| anyhow::anyhow!("a route needs two stars"))?;

            state.dispatch(Command::StartRoute {
                origin: origin.clone(),
                name: name.clone(),
                color: route_settings.color,
                line_width: route_settings.line_width,
            })?;
            for id in middle {
                state.dispatch(Command::ContinueRoute { id: id.clone() })?;
            }
            state.dispatch(Command::FinishRoute { id: last.clone() })?;
            print_saved_route(&state, cli.json)?;
        }

        Commands::Routes => {
            let store = JsonRouteStore::open(&env.data_dir)?;
            let saved = store.routes(&catalog.dataset);
            let mut state = plot(config, catalog, store)?;
            state.dispatch(Command::PlotRoutes { routes: saved.clone() })?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(state.plotted_routes())?);
            } else {
                println!(
                    "Routes in '{}': {} saved, {} plottable",
                    state.dataset(),
                    saved.len(),
                    state.plotted_routes().len()
                );
                for route in state.plotted_routes() {
                    println!("  - {} ({} stars, {:.2}ly)", route.name, route.route_list.len(), route.total_length);
                }
            }
        }

        Commands::Distances { star } => {
            let state = plot(config, catalog, MemoryStore::new())?;
            let id = star_id(&state, star)?;
            let report = state.distance_report(&id)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Distances from {} ({}):", star, report.len());
                for entry in report {
                    println!("  {:>8.2}ly  {} [{}]", entry.distance, entry.name, entry.id);
                }
            }
        }

        Commands::Labels {
            yaw,
            pitch,
            zoom,
            transits,
        } => {
            let band = config.transit_bands()[0].clone();
            let mut state = plot(config, catalog, MemoryStore::new())?;
            if let Some(max) = transits {
                state.dispatch(Command::FindTransits {
                    band: TransitBand {
                        lower: 0.0,
                        upper: *max,
                        ..band
                    },
                })?;
            }
            state.dispatch(Command::UpdateView {
                camera: Camera {
                    yaw: *yaw,
                    pitch: *pitch,
                    zoom: *zoom,
                    ..Camera::default()
                },
            })?;

            let labels = &state.renderer().labels;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(labels)?);
            } else {
                let viewport = state.renderer().viewport();
                println!("Labels ({}) in {}x{}:", labels.len(), viewport.width, viewport.height);
                for label in labels {
                    println!("  ({:>7.1}, {:>7.1})  {}", label.x, label.y, label.text);
                }
            }
        }
    }

    Ok(())
}

/// Plot the catalog into a fresh state
fn plot<P: Persistence>(
    config: Config,
    catalog: Catalog,
    store: P,
) -> anyhow::Result<AppState<RecordingRenderer, P>> {
    let mut state = AppState::new(config, RecordingRenderer::default(), store);
    state.dispatch(Command::Plot { catalog })?;
    Ok(state)
}

/// Resolve a star by display name, falling back to its id
fn star_id<P: Persistence>(state: &AppState<RecordingRenderer, P>, star: &str) -> anyhow::Result<StarId> {
    let registry = state.registry();
    registry
        .find_by_name(star)
        .or_else(|| registry.find(&StarId::from(star)))
        .map(|record| record.id.clone())
        .ok_or_else(|| anyhow::anyhow!("{} is not plotted", star))
}

fn list_stars<P: Persistence>(state: &AppState<RecordingRenderer, P>, json: bool) -> anyhow::Result<()> {
    let stars: Vec<StarDisplayRecord> = state.registry().snapshot();
    let rejections = state.registry().rejections();

    if json {
        let data = serde_json::json!({
            "dataset": state.dataset(),
            "plot": state.last_plot(),
            "stars": stars,
            "rejected": rejections.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!("Stars in '{}' ({}):", state.dataset(), stars.len());
    if let Some(summary) = state.last_plot() {
        println!("  grid every {}ly, scale {:.4}", summary.scale_increment, summary.scale_factor);
    }
    println!();
    for star in &stars {
        let [x, y, z] = star.actual_coordinates;
        println!("  - {} [{}] ({:.2}, {:.2}, {:.2})", star.name, star.id, x, y, z);
    }
    for rejection in rejections {
        println!("  [SKIP] {}", rejection);
    }
    Ok(())
}

fn list_transits<P: Persistence>(state: &AppState<RecordingRenderer, P>, json: bool) -> anyhow::Result<()> {
    let transits = state.transits().transits();
    if json {
        println!("{}", serde_json::to_string_pretty(transits)?);
        return Ok(());
    }

    println!("Transits ({}):", transits.len());
    for transit in transits {
        println!("  {}", transit.hover_text());
    }
    Ok(())
}

fn print_saved_route<P: Persistence>(state: &AppState<RecordingRenderer, P>, json: bool) -> anyhow::Result<()> {
    let route = state
        .plotted_routes()
        .last()
        .ok_or_else(|| anyhow::anyhow!("no route was charted"))?;
    if json {
        println!("{}", serde_json::to_string_pretty(route)?);
    } else {
        println!(
            "Saved '{}' to dataset '{}': {} stars, {:.2}ly",
            route.name,
            state.dataset(),
            route.route_list.len(),
            route.total_length
        );
    }
    Ok(())
}
