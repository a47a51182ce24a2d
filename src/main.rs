// src/main.rs
//! pack-optimizer: deterministic 3D bin-packing service for order fulfillment
//!
//! Packs each order's products into the smallest sequence of boxes from a
//! fixed reference catalog, using a first-fit-decreasing heuristic with
//! guillotine-split free space and optional axis rotation.

mod api;
mod config;
mod dimensions;
mod model;
mod optimizer;

use config::AppConfig;
use model::BoxCatalog;

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();

    println!("🚀 Packing Service starting...");
    api::start_api_server(app_config.api, app_config.engine, BoxCatalog::reference()).await;
}
