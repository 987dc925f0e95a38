//! Block Pricing CLI
//!
//! Loads a fixture set, allocates block prices across the cart and prints the
//! priced cart.

use std::{io, path::PathBuf};

use block_pricing::{
    config::AllocationConfig, fixtures::Fixture, hooks::PricingHooks, summary::CartSummary,
};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "block-pricing", about = "Block pricing demo", long_about = None)]
struct Cli {
    /// Fixture set to load from the fixtures directory
    #[arg(long, default_value = "hoodies")]
    fixture: String,

    /// Directory holding `catalogs/`, `carts/` and `configs/`
    #[arg(long, default_value = "./fixtures")]
    fixtures_dir: PathBuf,

    /// Allocation config file; defaults to the fixture set's config
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let cli = Cli::parse();

    let mut fixture = Fixture::with_base_path(&cli.fixtures_dir);
    fixture.load_catalog(&cli.fixture)?.load_cart(&cli.fixture)?;

    let config = match &cli.config {
        Some(path) => AllocationConfig::from_path(path)?,
        None => {
            fixture.load_config(&cli.fixture)?;
            fixture.config()?.clone()
        }
    };

    let mut cart = fixture.cart()?;
    let hooks = PricingHooks::new(&config, fixture.catalog());
    let allocation = hooks.on_cart_loaded(&mut cart)?;

    info!(
        fixture = %cli.fixture,
        lines = cart.len(),
        adjusted_units = allocation.adjusted_units,
        "Cart priced"
    );

    CartSummary::from_cart(&cart, fixture.catalog())?.write_to(io::stdout().lock())?;

    Ok(())
}

fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_err| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(true)
                .with_writer(io::stderr),
        )
        .with(filter)
        .try_init()?;

    Ok(())
}
