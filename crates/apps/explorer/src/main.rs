mod error;
mod headless;
mod logging;
mod session;
mod settings;

use clap::{ArgAction, Parser, Subcommand};
use foundation::{BoundingRegion, Coordinate};
use geosearch::ReqwestClient;
use overlay::{FixedPosition, GeoLocator, OverlayConfig};
use tracing::info;

use crate::error::CliError;
use crate::settings::ConfigArgs;

#[derive(Parser, Debug)]
#[command(author, version, about = "Nearby encyclopedia articles on a map, from the terminal")]
struct Args {
    /// Increase log detail (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    settings: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch articles around the center of a bounding box and print them as JSON
    Nearby {
        /// South-west corner as LAT,LON
        #[arg(long, allow_hyphen_values = true)]
        south_west: Coordinate,

        /// North-east corner as LAT,LON
        #[arg(long, allow_hyphen_values = true)]
        north_east: Coordinate,
    },

    /// Print autocomplete suggestions for a search query
    Suggest { query: String },

    /// Print the coordinate of an article
    Resolve { title: String },

    /// Print the device location
    Locate,

    /// Interactive session driving the map overlay from stdin
    Session,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    if let Err(e) = run(args).await {
        e.exit();
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    logging::init(args.verbose)?;
    let config = args.settings.resolve()?;
    let location = args.settings.location;
    let client = ReqwestClient::new()?;
    info!(language = %config.language, host = %config.host, "explorer starting");

    match args.command {
        Command::Nearby {
            south_west,
            north_east,
        } => nearby(&config, client, BoundingRegion::new(south_west, north_east)).await,
        Command::Suggest { query } => suggest(&config, client, &query).await,
        Command::Resolve { title } => resolve(&config, client, &title).await,
        Command::Locate => locate(&config, location).await,
        Command::Session => session::run(config, client, location).await,
    }
}

async fn nearby(
    config: &OverlayConfig,
    client: ReqwestClient,
    region: BoundingRegion,
) -> Result<(), CliError> {
    let articles = config
        .article_fetcher(client)
        .fetch_articles_near(region, &config.language)
        .await?;
    println!("{}", serde_json::to_string_pretty(&articles)?);
    Ok(())
}

async fn suggest(config: &OverlayConfig, client: ReqwestClient, query: &str) -> Result<(), CliError> {
    let suggestions = config
        .suggestion_fetcher(client)
        .suggest(query, &config.language)
        .await?;
    if suggestions.is_empty() {
        info!(query, "no suggestions");
    }
    for s in suggestions {
        println!("{}\t{}\t{}", s.title, s.description, s.external_link);
    }
    Ok(())
}

async fn resolve(config: &OverlayConfig, client: ReqwestClient, title: &str) -> Result<(), CliError> {
    let at = config
        .suggestion_fetcher(client)
        .resolve_coordinate(title, &config.language)
        .await?;
    println!("{at}");
    Ok(())
}

async fn locate(config: &OverlayConfig, location: Option<Coordinate>) -> Result<(), CliError> {
    let at = GeoLocator::new(location.map(FixedPosition))
        .with_timeout(config.location_timeout())
        .locate()
        .await?;
    println!("{at}");
    Ok(())
}
