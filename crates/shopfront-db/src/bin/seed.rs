//! # Seed Data Generator
//!
//! Populates a development database with one demo store, its catalog and a
//! few discounts around today's date, then prints the priced listing.
//!
//! ## Usage
//! ```bash
//! # Seed ./shopfront.db (or $SHOPFRONT_DB_PATH)
//! cargo run -p shopfront-db --bin seed
//!
//! # Choose the database and store slug
//! cargo run -p shopfront-db --bin seed -- --db ./data/dev.db --store corner-shop
//!
//! # More logging
//! RUST_LOG=shopfront_db=debug cargo run -p shopfront-db --bin seed
//! ```
//!
//! ## Generated Data
//! - Categories: Fruit, Vegetables, Staples, Dairy
//! - Per-kg products (apples, rice, ...) and per-unit products (eggs, milk, ...)
//! - A product discount and a category discount active today, and one that
//!   already ended

use chrono::Days;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use shopfront_core::{today, DiscountRate, DiscountTarget, LineRequest, NewDiscount, NewProduct, ShippingRef, Weight};
use shopfront_db::{Database, DbConfig};

/// `(category, [(slug, name, per_kg_cents, per_unit_cents, unit_label)])`
type CatalogEntry = (&'static str, &'static str, Option<i64>, Option<i64>, Option<&'static str>);

const CATALOG: &[(&str, &[CatalogEntry])] = &[
    (
        "Fruit",
        &[
            ("red-apples", "Red Apples", Some(320), None, None),
            ("bananas", "Bananas", Some(180), None, None),
            ("alphonso-mango", "Alphonso Mango", None, Some(10_000), Some("box of 6")),
            ("pineapple", "Pineapple", None, Some(450), Some("piece")),
        ],
    ),
    (
        "Vegetables",
        &[
            ("tomatoes", "Tomatoes", Some(240), None, None),
            ("potatoes", "Potatoes", Some(120), None, None),
            ("coriander", "Coriander", None, Some(60), Some("bunch")),
        ],
    ),
    (
        "Staples",
        &[
            ("basmati-rice", "Basmati Rice", Some(4_000), None, None),
            ("red-lentils", "Red Lentils", Some(1_450), None, None),
            ("sunflower-oil", "Sunflower Oil", None, Some(899), Some("1 L bottle")),
        ],
    ),
    (
        "Dairy",
        &[
            ("eggs", "Free-range Eggs", None, Some(1_000), Some("dozen")),
            ("whole-milk", "Whole Milk", None, Some(129), Some("1 L")),
            ("paneer", "Paneer", Some(2_200), None, None),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();

    let mut config = DbConfig::from_env()?;
    let mut store_slug = String::from("green-grocer");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--store" | "-s" => {
                if i + 1 < args.len() {
                    store_slug = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shopfront Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>      Database file path (default: $SHOPFRONT_DB_PATH or ./shopfront.db)");
                println!("  -s, --store <SLUG>   Store slug to create (default: green-grocer)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let db = Database::new(config).await?;

    if db.stores().get_by_slug(&store_slug).await?.is_some() {
        warn!(store_slug = %store_slug, "Store already exists, skipping seed");
        return Ok(());
    }

    let store = db.stores().create(&store_slug, "Green Grocer").await?;
    info!(store_id = %store.id, store_slug = %store.store_slug, "Created store");

    let day = today();
    let mut first_product_id = None;
    let mut dairy_id = None;

    for (category_name, products) in CATALOG {
        let category = db.categories().create(&store.id, category_name).await?;
        if *category_name == "Dairy" {
            dairy_id = Some(category.id.clone());
        }

        for (slug, name, per_kg, per_unit, unit_label) in products.iter() {
            let product = db
                .products()
                .insert(
                    &store.id,
                    NewProduct {
                        category_id: category.id.clone(),
                        slug: slug.to_string(),
                        name: name.to_string(),
                        description: None,
                        price_per_kg_cents: *per_kg,
                        price_per_unit_cents: *per_unit,
                        unit_label: unit_label.map(str::to_string),
                    },
                )
                .await?;
            first_product_id.get_or_insert(product.id);
        }

        info!(category = %category_name, products = products.len(), "Seeded category");
    }

    let mut discounts = Vec::new();
    if let Some(product_id) = first_product_id {
        discounts.push(NewDiscount {
            target: DiscountTarget::Product(product_id.clone()),
            rate: DiscountRate::from_bps(2_000),
            start_date: day - Days::new(3),
            end_date: day + Days::new(7),
        });
        discounts.push(NewDiscount {
            target: DiscountTarget::Product(product_id),
            rate: DiscountRate::from_bps(5_000),
            start_date: day - Days::new(30),
            end_date: day - Days::new(1),
        });
    }
    if let Some(category_id) = dairy_id {
        discounts.push(NewDiscount {
            target: DiscountTarget::Category(category_id),
            rate: DiscountRate::from_bps(1_250),
            start_date: day,
            end_date: day + Days::new(14),
        });
    }
    for discount in discounts {
        let created = db.discounts().create(&store.id, discount).await?;
        info!(discount_id = %created.id, rate = %created.rate, end_date = %created.end_date, "Created discount");
    }

    let listing = db.storefront().listing(&store_slug, day).await?;
    println!("{}", serde_json::to_string_pretty(&listing)?);

    let placed = db
        .orders()
        .place_order(
            &store.id,
            &[
                LineRequest::by_weight("red-apples", Weight::from_grams(1_500)),
                LineRequest::by_quantity("eggs", 2),
            ],
            &ShippingRef {
                customer_name: Some("Demo Shopper".to_string()),
                ..ShippingRef::default()
            },
            day,
        )
        .await?;

    let stats = db.stats().for_tenant(&store.id, day).await?;
    info!(
        order_id = %placed.order.id,
        total = %placed.order.total(),
        products = stats.product_count,
        pending_orders = stats.pending_orders,
        "Seed complete"
    );

    Ok(())
}
