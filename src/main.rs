use anyhow::Context;
use chrono::Utc;
use housing_search::{
    encoding, logging, sample, Amenity, CanonicalFilter, Category, Domain, JsonFileContextStore,
    Listing, PageRequest, SearchConfig, SearchEngine, SortKey,
};
use std::sync::Arc;
use tracing::info;

fn print_listings(listings: &[Listing]) {
    for (i, listing) in listings.iter().enumerate() {
        let price = listing
            .price
            .map(|p| format!("€{}", p))
            .unwrap_or_else(|| "price on request".to_string());
        println!("{}. {} ({})", i + 1, listing.title, price);
        println!(
            "   {} · {} bed · {} m²",
            listing.property_type.as_deref().unwrap_or("-"),
            listing.bedrooms.unwrap_or(0),
            listing.size.built.unwrap_or(0.0)
        );
        if let Some(town) = &listing.town {
            println!("   Town: {}", town);
        }
        println!("   ID: {} [{}]", listing.id, listing.source_id);
        if !listing.features.is_empty() {
            println!("   Features: {}", listing.features.join(", "));
        }
        println!();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging("info");

    info!("🏠 Housing Search - federated listing demo");
    info!("==========================================");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "housing-search.toml".to_string());
    let config = SearchConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path))?;

    let mut builder = SearchEngine::builder(config)
        .context_store(Arc::new(JsonFileContextStore::new("search_context")));
    for source in sample::demo_sources(Utc::now()) {
        builder = builder.source(source);
    }
    let engine = builder.build();

    // Sale: Marbella and Estepona, two bedrooms or more, with a pool
    let filter = CanonicalFilter::new()
        .with_location("Marbella")
        .with_location("Estepona")
        .with_bedrooms_at_least(2)
        .with_amenity(Amenity::Pool);
    info!("Shareable query: ?{}", encoding::to_query_string(&filter));

    let page = engine
        .search(Domain::Sale, &filter, SortKey::PriceAsc, PageRequest::new(1, 10))
        .await?;
    info!(
        "\n✅ Sale page 1: {} of {} listings\n",
        page.items.len(),
        page.total_count
    );
    print_listings(&page.items);

    // Step through the result set the way a detail view would
    for listing in &page.items {
        let neighbors = engine.navigate(&listing.id, Domain::Sale).await?;
        println!(
            "   {} <- {} -> {}",
            neighbors.previous.as_deref().unwrap_or("·"),
            listing.id,
            neighbors.next.as_deref().unwrap_or("·")
        );
    }
    println!();

    let rentals = engine
        .search(
            Domain::Rental,
            &CanonicalFilter::new().with_category(Category::Apartment),
            SortKey::RecentlyUpdated,
            PageRequest::first(),
        )
        .await?;
    info!("\n✅ Rental apartments: {}\n", rentals.total_count);
    print_listings(&rentals.items);

    let map = engine
        .search_all(Domain::Sale, &CanonicalFilter::new(), SortKey::RecentlyUpdated)
        .await?;
    let pins = map.iter().filter(|l| l.coordinates.is_some()).count();
    info!("🗺️  Map view: {} sale listings, {} with coordinates", map.len(), pins);

    let json = serde_json::to_string_pretty(&map)?;
    tokio::fs::write("search_results.json", json).await?;
    info!("💾 Saved map results to search_results.json");

    Ok(())
}
