use std::path::PathBuf;

use clap::Args;
use tiercart::{uuids::ProductUuid, variations::VariationKey};
use tiercart_app::domain::catalog::{FixtureCatalog, ProductCatalog};

#[derive(Debug, Args)]
pub(crate) struct QuoteArgs {
    /// Product catalog fixture (YAML)
    #[arg(long, env = "TIERCART_CATALOG_PATH")]
    catalog: PathBuf,

    /// Product UUID
    #[arg(long)]
    product: ProductUuid,

    /// Quantity to price
    #[arg(long, default_value_t = 1)]
    quantity: u32,

    /// Variant identifier
    #[arg(long)]
    variant: Option<String>,
}

pub(crate) async fn run(args: QuoteArgs) -> Result<(), String> {
    let catalog = FixtureCatalog::from_path(&args.catalog)
        .map_err(|error| format!("failed to load catalog: {error}"))?;

    let product = catalog
        .get_product(args.product)
        .await
        .map_err(|error| error.to_string())?;

    let key = args.variant.map_or(VariationKey::Base, VariationKey::Variant);
    let unit = product.pricing.unit_price_for(&key, args.quantity);

    println!("{} ({})", product.name, product.supplier_name);

    for tier in product.pricing.schedule.tiers() {
        let range = match tier.max_qty() {
            Some(max) => format!("{}-{max}", tier.min_qty()),
            None => format!("{}+", tier.min_qty()),
        };

        println!("  {range:>10}  {}", tier.price());
    }

    println!("unit price at {}: {unit}", args.quantity);

    Ok(())
}
