//! Inventory Tracker - Product Store & Web UI
//!
//! A single-table product store backed by SQLite, addressed through
//! collection/item URIs, with sale/shipment/reorder quantity rules and a
//! small web UI host on top.

pub mod contract;
pub mod error;
pub mod product;
pub mod quantity;
pub mod store;
pub mod web;

pub use contract::{ProductUri, StoreContract};
pub use error::{InventoryError, Result};
pub use product::{NewProduct, Product, ProductPatch, ProductSummary};
pub use store::{ProductStore, StoreChange};
