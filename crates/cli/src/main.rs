use anyhow::{anyhow, Context};
use config::{Config, File};
use hexfog::{
    classify_method, is_within_region, timed, CellId, ExplorationStats,
    FogConfig, FogRenderer, FrameKind, GeoPoint, HexGrid, MercatorView,
    PixelSize, Resolution, Snapshot, SpatialIndex, SvgHost, SvgSurface,
};
use log::{info, warn, LevelFilter};
use serde::Serialize;
use simple_logger::SimpleLogger;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    process,
    time::Instant,
};
use structopt::StructOpt;
use strum::{Display, EnumString};

/// CLI for exploring the hex grid and rendering exploration fog
#[derive(Debug, StructOpt)]
#[structopt(name = "hexfog")]
struct Opt {
    /// Path to a config file that overrides the default fog config. Any
    /// field not in the file keeps its default. Supported formats: JSON, TOML
    #[structopt(short, long)]
    config: Option<PathBuf>,

    /// The format to print results in: text or json
    #[structopt(short, long, default_value = "text")]
    format: OutputFormat,

    /// The logging level to use. See
    /// https://docs.rs/log/0.4.11/log/enum.LevelFilter.html for options
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Find the cell containing a coordinate
    Cell {
        #[structopt(long, allow_hyphen_values = true)]
        lat: f64,
        #[structopt(long, allow_hyphen_values = true)]
        lng: f64,
        /// Grid resolution (0-15). Defaults to the configured resolution
        #[structopt(short, long)]
        resolution: Option<u8>,
    },

    /// List the cells around a cell
    Neighbors {
        cell: String,
        /// Number of grid steps to go out
        #[structopt(short, long, default_value = "1")]
        distance: u32,
        /// Only list cells exactly `distance` steps away, instead of every
        /// cell within that distance
        #[structopt(long)]
        ring: bool,
    },

    /// List the (approximate) set of cells covering a lat/lng box
    Bbox {
        #[structopt(long, allow_hyphen_values = true)]
        min_lat: f64,
        #[structopt(long, allow_hyphen_values = true)]
        max_lat: f64,
        #[structopt(long, allow_hyphen_values = true)]
        min_lng: f64,
        #[structopt(long, allow_hyphen_values = true)]
        max_lng: f64,
    },

    /// Estimate distance and area from visit counts
    Stats {
        /// Total number of cell visits
        #[structopt(long)]
        visits: u64,
        /// Number of unique cells visited
        #[structopt(long)]
        unique: u64,
    },

    /// Classify a movement speed
    Classify {
        /// Speed, in miles per hour
        speed_mph: f64,
    },

    /// Render the fog for a snapshot of explored cells, as an SVG
    Render {
        /// Explored-areas JSON response to render
        #[structopt(short, long)]
        snapshot: PathBuf,
        #[structopt(long, allow_hyphen_values = true)]
        lat: f64,
        #[structopt(long, allow_hyphen_values = true)]
        lng: f64,
        #[structopt(short, long, default_value = "16")]
        zoom: u8,
        #[structopt(long, default_value = "800")]
        width: u32,
        #[structopt(long, default_value = "600")]
        height: u32,
        /// File to write the SVG to
        #[structopt(short, long)]
        output: PathBuf,
    },

    /// Print the full effective config, in TOML
    ShowConfig,
}

/// Different formats for printing results
#[derive(Copy, Clone, Debug, Display, EnumString, PartialEq)]
#[strum(serialize_all = "snake_case")]
enum OutputFormat {
    /// One value per line
    Text,
    /// A single JSON value
    Json,
}

/// Everything we know about a single cell
#[derive(Debug, Serialize)]
struct CellInfo {
    cell: CellId,
    center: GeoPoint,
    boundary: Vec<GeoPoint>,
    in_deployment_region: bool,
}

fn load_config(config_path: Option<&Path>) -> anyhow::Result<FogConfig> {
    let config_path = match config_path {
        Some(config_path) => config_path,
        None => return Ok(FogConfig::default()),
    };

    let mut settings = Config::new();
    let config_path = config_path.to_str().ok_or_else(|| {
        anyhow!("invalid character in path {:?}", config_path)
    })?;
    settings
        .merge(File::with_name(config_path))
        .context("error reading config file")?;
    settings.try_into().context("error reading config")
}

/// Print a list of cells in the requested format
fn print_cells<'a>(
    format: OutputFormat,
    cells: impl IntoIterator<Item = &'a CellId>,
) -> anyhow::Result<()> {
    let cells: Vec<&CellId> = cells.into_iter().collect();
    match format {
        OutputFormat::Text => {
            for cell in cells {
                println!("{}", cell);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&cells)?);
        }
    }
    Ok(())
}

/// Render a snapshot into an SVG file
fn render(
    grid: HexGrid,
    config: &FogConfig,
    snapshot_path: &Path,
    map: &MercatorView,
    output_path: &Path,
) -> anyhow::Result<()> {
    let json = fs::read_to_string(snapshot_path).with_context(|| {
        format!("error reading snapshot file {:?}", snapshot_path)
    })?;
    let snapshot = Snapshot::from_json(&json)?;
    if let Some(stats) = &snapshot.stats {
        info!(
            "Snapshot has {} unique cells over {} visits ({:.2} km)",
            stats.unique_cells,
            stats.total_visits,
            stats.distance_km()
        );
    }
    let index = SpatialIndex::new(snapshot.records, &grid);

    let mut renderer =
        FogRenderer::attach(&mut SvgHost, map, index, grid, config)?;
    match renderer.frame(map, Instant::now()) {
        Some(report) => match report.kind {
            FrameKind::Holes { .. } => {
                info!("Drew {} explored cells", report.cells.len())
            }
            FrameKind::Solid => info!("Drew solid fog"),
        },
        None => warn!("Nothing was drawn"),
    }

    let document = renderer
        .surface()
        .map(SvgSurface::to_document)
        .ok_or_else(|| anyhow!("fog surface was released before export"))?;
    timed!(
        format!("Writing SVG to {:?}", output_path),
        log::Level::Info,
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(output_path)
                .with_context(|| {
                    format!("error opening output file {:?}", output_path)
                })?;
            file.write_all(document.to_string().as_bytes())
                .with_context(|| {
                    format!("error writing to file {:?}", output_path)
                })?;
        }
    );
    Ok(())
}

/// Run the CLI with some options
fn run(opt: Opt) -> anyhow::Result<()> {
    SimpleLogger::new().with_level(opt.log_level).init()?;

    let config = load_config(opt.config.as_deref())?;
    let grid = config.grid().context("invalid config")?;
    let format = opt.format;

    match opt.command {
        Command::Cell {
            lat,
            lng,
            resolution,
        } => {
            let resolution = match resolution {
                Some(resolution) => Resolution::try_from(resolution)?,
                None => grid.resolution(),
            };
            let cell = grid.coord_to_cell(GeoPoint::new(lat, lng), resolution)?;
            let info = CellInfo {
                center: grid.cell_to_center(&cell),
                boundary: grid.cell_to_boundary(&cell),
                in_deployment_region: is_within_region(&GeoPoint::new(
                    lat, lng,
                )),
                cell,
            };
            match format {
                OutputFormat::Text => println!("{}", info.cell),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&info)?)
                }
            }
        }
        Command::Neighbors {
            cell,
            distance,
            ring,
        } => {
            let cell = CellId::new(cell);
            // Fail loudly here, the grid would just give back nothing
            cell.to_index()?;
            let cells = if ring {
                grid.ring_at(&cell, distance)
            } else {
                grid.disk_within(&cell, distance)
            };
            print_cells(format, &cells)?;
        }
        Command::Bbox {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        } => {
            let cells = grid.cells_in_bounding_box(
                min_lat,
                max_lat,
                min_lng,
                max_lng,
                grid.resolution(),
            );
            if cells.is_empty() {
                warn!("No cells found, is the box valid?");
            }
            print_cells(format, &cells)?;
        }
        Command::Stats { visits, unique } => {
            let stats = ExplorationStats::from_counts(visits, unique);
            match format {
                OutputFormat::Text => {
                    println!("Visits: {}", stats.total_visits);
                    println!("Unique cells: {}", stats.unique_cells);
                    println!(
                        "Distance: {:.2} km ({:.2} mi)",
                        stats.distance_km(),
                        stats.distance_miles()
                    );
                    println!("Area: {:.4} km²", stats.area_km2());
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&stats)?)
                }
            }
        }
        Command::Classify { speed_mph } => {
            println!("{}", classify_method(speed_mph));
        }
        Command::Render {
            snapshot,
            lat,
            lng,
            zoom,
            width,
            height,
            output,
        } => {
            let map = MercatorView::new(
                GeoPoint::new(lat, lng),
                zoom,
                PixelSize::new(width, height),
            );
            render(grid, &config, &snapshot, &map, &output)?;
        }
        Command::ShowConfig => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn main() {
    let exit_code = match run(Opt::from_args()) {
        Ok(_) => 0,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            1
        }
    };
    process::exit(exit_code);
}
