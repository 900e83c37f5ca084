//! Inventory Tracker - SQLite-backed product store with a web UI
//!
//! Keeps a single products table, serves a list/editor page over HTTP, and
//! records sale/shipment quantity adjustments against it.

use clap::Parser;
use inventory_tracker::contract::StoreContract;
use inventory_tracker::product::NewProduct;
use inventory_tracker::store::ProductStore;
use std::path::PathBuf;

/// Product inventory tracker - list, edit, and adjust stock over a web UI
#[derive(Parser, Debug)]
#[command(name = "inventory_tracker")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, default_value_t = default_db_path())]
    database: String,

    /// Port for the web UI
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Insert the demo product on startup
    #[arg(long, default_value_t = false)]
    seed: bool,

    /// Print every product as JSON and exit
    #[arg(long, default_value_t = false)]
    dump: bool,
}

/// Returns the default database path: ~/.local/share/inventory_tracker/inventory.db
fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("inventory_tracker")
        .join("inventory.db")
        .to_string_lossy()
        .to_string()
}

/// The demo row behind `--seed`
fn demo_product() -> NewProduct {
    NewProduct {
        name: "Jump Rope".to_string(),
        supplier: "Big 5 Sporting Goods".to_string(),
        price: 13.99,
        quantity: 33,
        image: None,
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let db_path = PathBuf::from(&args.database);

    log::info!("Starting inventory_tracker...");
    log::info!("Database path: {}", db_path.display());

    let store = match ProductStore::open(&db_path) {
        Ok(store) => store,
        Err(e) => {
            log::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    if args.seed {
        match store.insert(&demo_product()) {
            Ok(id) => log::info!("Seeded demo product with id {}", id),
            Err(e) => log::error!("Failed to seed demo product: {}", e),
        }
    }

    if args.dump {
        dump_products(&store).await;
        return;
    }

    let contract = StoreContract::default();
    if let Err(e) = inventory_tracker::web::serve(store, contract, args.port).await {
        log::error!("Web server error: {}", e);
        std::process::exit(1);
    }
}

/// Prints the full product list as pretty JSON on stdout.
async fn dump_products(store: &ProductStore) {
    let products = match store.spawn_query_all().await {
        Ok(Ok(products)) => products,
        Ok(Err(e)) => {
            log::error!("Failed to query products: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            log::error!("Query task failed: {}", e);
            std::process::exit(1);
        }
    };
    match serde_json::to_string_pretty(&products) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Failed to serialize products: {}", e);
            std::process::exit(1);
        }
    }
}
