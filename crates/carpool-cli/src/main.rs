use std::sync::Arc;

use carpool_core::{Address, AppConfig, SearchQuery};
use carpool_db::PgOfferStore;
use carpool_geocoder::{GeocoderConfig, NominatimClient};
use carpool_search::SearchService;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "carpool-cli")]
#[command(about = "Carpool board command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Run a proximity search and print the result as JSON
    Search {
        /// Postal code to search around
        #[arg(long)]
        zip: String,
        /// City to search around
        #[arg(long)]
        city: String,
        /// Radius in km (1-100, default 5); 0 disables the distance filter
        #[arg(long)]
        radius: Option<i64>,
    },
    /// Print address suggestions for a free-text query as JSON
    Suggest {
        /// At least three characters
        query: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("carpool-cli: pass --help to list commands");
        return Ok(());
    };

    let config = carpool_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match command {
        Commands::Migrate => run_migrate(&config).await,
        Commands::Search { zip, city, radius } => run_search(&config, &zip, &city, radius).await,
        Commands::Suggest { query } => run_suggest(&config, &query).await,
    }
}

async fn run_migrate(config: &AppConfig) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    let applied = carpool_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations complete");
    println!("applied {applied} migration(s)");
    Ok(())
}

async fn run_search(
    config: &AppConfig,
    zip: &str,
    city: &str,
    radius: Option<i64>,
) -> anyhow::Result<()> {
    let query = build_query(zip, city, radius)?;

    let pool = connect(config).await?;
    let geocoder = NominatimClient::new(&GeocoderConfig::from_app_config(config))?;
    let service = SearchService::new(Arc::new(geocoder), PgOfferStore::new(pool));
    let result = service.search(&query).await?;
    tracing::info!(
        strategy = %result.strategy,
        results = result.offers.len(),
        "search complete"
    );

    let output = serde_json::json!({
        "strategy": result.strategy,
        "searchParams": {
            "zip_code": query.address().zip_code,
            "city": query.address().city,
            "radius": query.radius_km(),
        },
        "searchCoordinates": result.coordinates,
        "rideOffers": result.offers,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run_suggest(config: &AppConfig, query: &str) -> anyhow::Result<()> {
    let geocoder = NominatimClient::new(&GeocoderConfig::from_app_config(config))?;
    let suggestions = geocoder.suggest(query).await?;
    tracing::debug!(count = suggestions.len(), "suggestions received");
    println!("{}", serde_json::to_string_pretty(&suggestions)?);
    Ok(())
}

/// `--radius 0` skips validation and asks for a text-only search.
fn build_query(zip: &str, city: &str, radius: Option<i64>) -> anyhow::Result<SearchQuery> {
    if radius == Some(0) {
        return Ok(SearchQuery::without_radius(Address::new(
            zip.trim(),
            city.trim(),
        )));
    }
    Ok(SearchQuery::new(zip, city, radius)?)
}

async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = carpool_db::PoolConfig::from_app_config(config);
    Ok(carpool_db::connect_pool(&config.database_url, pool_config).await?)
}

#[cfg(test)]
mod tests;
