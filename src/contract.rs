//! Contract for the products table and its addressing scheme.
//!
//! One place for the table name, column names, and the URI forms external
//! callers use to address the full collection or a single row by id.

use crate::error::{InventoryError, Result};

/// Name of the database table for products
pub const TABLE_NAME: &str = "products";

/// Path segment appended to the base URI for product resources
pub const PATH_PRODUCTS: &str = "products";

/// The column name for the primary key identifier of a product
pub const COLUMN_ID: &str = "id";

/// The column name for the name of the product
pub const COLUMN_NAME: &str = "name";

/// The column name for the unit price of the product
pub const COLUMN_PRICE: &str = "price";

/// The column name for the quantity in stock
pub const COLUMN_QUANTITY: &str = "quantity";

/// The column name for the supplier of the product
pub const COLUMN_SUPPLIER: &str = "supplier";

/// The column name for the reference to an externally stored picture
pub const COLUMN_IMAGE: &str = "image";

/// SQL statement for creating the products table.
///
/// `AUTOINCREMENT` keeps ids of deleted rows from being handed out again,
/// so an id addresses the same product for its whole lifetime.
pub fn create_table() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (
            {} INTEGER PRIMARY KEY AUTOINCREMENT,
            {} TEXT NOT NULL,
            {} REAL NOT NULL DEFAULT 0,
            {} INTEGER NOT NULL DEFAULT 0,
            {} TEXT NOT NULL,
            {} TEXT
        );",
        TABLE_NAME,
        COLUMN_ID,
        COLUMN_NAME,
        COLUMN_PRICE,
        COLUMN_QUANTITY,
        COLUMN_SUPPLIER,
        COLUMN_IMAGE
    )
}

/// A parsed product address: the whole collection or one row by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductUri {
    /// Address of the full product collection
    Collection,
    /// Address of a single product row
    Item(i64),
}

/// Addressing configuration for the store, built once at startup.
///
/// Owns the scheme and authority that all product URIs share, and translates
/// between URI strings and [`ProductUri`] values. Appending an id to the
/// collection URI and parsing the result yields that id back unchanged.
#[derive(Debug, Clone)]
pub struct StoreContract {
    scheme: String,
    authority: String,
}

impl Default for StoreContract {
    fn default() -> Self {
        Self::new("content", "inventory.local")
    }
}

impl StoreContract {
    pub fn new(scheme: impl Into<String>, authority: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            authority: authority.into(),
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// URI addressing the full product collection
    pub fn collection_uri(&self) -> String {
        format!("{}://{}/{}", self.scheme, self.authority, PATH_PRODUCTS)
    }

    /// URI addressing one product row by id
    pub fn item_uri(&self, id: i64) -> String {
        format!("{}/{}", self.collection_uri(), id)
    }

    /// URI string for an already-parsed address
    pub fn uri(&self, target: &ProductUri) -> String {
        match target {
            ProductUri::Collection => self.collection_uri(),
            ProductUri::Item(id) => self.item_uri(*id),
        }
    }

    /// Parses a URI into a product address.
    ///
    /// Accepts exactly the two shapes this contract produces; anything else
    /// (wrong scheme or authority, extra segments, a negative or non-numeric
    /// id) is an invalid argument.
    pub fn parse(&self, uri: &str) -> Result<ProductUri> {
        let collection = self.collection_uri();
        let rest = uri.strip_prefix(&collection).ok_or_else(|| {
            InventoryError::InvalidArgument(format!(
                "unknown URI {uri}, expected {collection} or {collection}/{{id}}"
            ))
        })?;

        if rest.is_empty() {
            return Ok(ProductUri::Collection);
        }

        let id_segment = rest.strip_prefix('/').ok_or_else(|| {
            InventoryError::InvalidArgument(format!("unknown URI {uri}"))
        })?;
        let id: i64 = id_segment.parse().map_err(|_| {
            InventoryError::InvalidArgument(format!(
                "URI {uri} does not end in a product id"
            ))
        })?;
        if id < 0 {
            return Err(InventoryError::InvalidArgument(format!(
                "product id in {uri} must be non-negative"
            )));
        }
        Ok(ProductUri::Item(id))
    }

    /// MIME-style tag describing the shape of the addressed resource.
    ///
    /// Collections are a directory of product items, single rows one item.
    /// The tags carry no behavior; they only describe responses to callers.
    pub fn content_type(&self, target: &ProductUri) -> String {
        match target {
            ProductUri::Collection => {
                format!("vnd.inventory.dir/{}/{}", self.authority, PATH_PRODUCTS)
            }
            ProductUri::Item(_) => {
                format!("vnd.inventory.item/{}/{}", self.authority, PATH_PRODUCTS)
            }
        }
    }
}
