//! SQLite-backed product store.
//!
//! Uses parameterized queries exclusively (no SQL string concatenation of
//! values). Every mutation either fully applies to its single target row or
//! not at all, and publishes a change notification after it lands.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension, ToSql};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::contract;
use crate::error::{InventoryError, Result};
use crate::product::{normalize_image, NewProduct, Product, ProductPatch, ProductSummary};

/// The resource a mutation touched, as published to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    /// The collection as a whole changed (insert, bulk clear)
    Collection,
    /// A single row changed
    Item(i64),
}

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(&contract::create_table())?;
    log::info!("Database schema initialized");
    Ok(())
}

const PRODUCT_COLUMNS: &str = "id, name, price, quantity, supplier, image";

fn product_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
        quantity: row.get(3)?,
        supplier: row.get(4)?,
        image: row.get(5)?,
    })
}

/// Durable CRUD over the products table.
///
/// The store is the sole owner of the table; writes are serialized by the
/// shared connection and SQLite's own locking. Clones share the connection
/// and the change channel.
#[derive(Clone)]
pub struct ProductStore {
    db: Arc<Mutex<Connection>>,
    changes: watch::Sender<StoreChange>,
}

impl ProductStore {
    /// Wraps an open connection, initialising the schema if needed.
    pub fn new(db: Arc<Mutex<Connection>>) -> Result<Self> {
        {
            let conn = db.lock().unwrap();
            init_schema(&conn)?;
        }
        let (changes, _) = watch::channel(StoreChange::Collection);
        Ok(Self { db, changes })
    }

    /// Opens (or creates) the database file and initialises the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        log::info!("Product DB: {}", path.display());
        let conn = Connection::open(path)?;
        Self::new(Arc::new(Mutex::new(conn)))
    }

    /// In-memory store, used in tests and demos.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::new(Arc::new(Mutex::new(conn)))
    }

    /// Subscribes to change notifications.
    ///
    /// The channel only keeps the most recent change; a live view re-queries
    /// on every notification rather than replaying history.
    pub fn subscribe(&self) -> watch::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    fn notify(&self, change: StoreChange) {
        // send_replace never blocks and does not care whether anyone listens
        self.changes.send_replace(change);
    }

    /// Inserts a new product and returns its assigned id.
    pub fn insert(&self, product: &NewProduct) -> Result<i64> {
        let id = {
            let conn = self.db.lock().unwrap();
            conn.execute(
                "INSERT INTO products (name, price, quantity, supplier, image)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    product.name,
                    product.price,
                    product.quantity,
                    product.supplier,
                    normalize_image(product.image.as_deref()),
                ],
            )?;
            conn.last_insert_rowid()
        };
        log::debug!("Inserted product {} ({})", id, product.name);
        self.notify(StoreChange::Collection);
        Ok(id)
    }

    /// Returns every row in insertion order.
    ///
    /// Each call takes a fresh snapshot of current state; nothing keeps the
    /// result up to date afterwards.
    pub fn query_all(&self) -> Result<Vec<Product>> {
        let conn = self.db.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"
        ))?;
        let rows = stmt
            .query_map([], product_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Returns the list-screen projection of every row, in insertion order.
    pub fn list_summaries(&self) -> Result<Vec<ProductSummary>> {
        let conn = self.db.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, price, quantity, image FROM products ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ProductSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    price: row.get(2)?,
                    quantity: row.get(3)?,
                    image: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Returns the row with the given id, or `None` if it is absent.
    pub fn query_by_id(&self, id: i64) -> Result<Option<Product>> {
        let conn = self.db.lock().unwrap();
        let product = conn
            .query_row(
                &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"),
                params![id],
                product_from_row,
            )
            .optional()?;
        Ok(product)
    }

    /// Rewrites the columns named by the patch on the row with the given id.
    ///
    /// Returns the affected-row count (0 or 1); 0 means the id matched
    /// nothing and is not an error. A patch naming no column at all is
    /// rejected before the database is touched.
    pub fn update(&self, id: i64, patch: &ProductPatch) -> Result<usize> {
        if patch.is_empty() {
            return Err(InventoryError::InvalidArgument(
                "update patch names no columns".to_string(),
            ));
        }

        let mut assignments: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();
        if let Some(name) = &patch.name {
            assignments.push(format!("{} = ?", contract::COLUMN_NAME));
            values.push(Box::new(name.clone()));
        }
        if let Some(price) = patch.price {
            assignments.push(format!("{} = ?", contract::COLUMN_PRICE));
            values.push(Box::new(price));
        }
        if let Some(quantity) = patch.quantity {
            assignments.push(format!("{} = ?", contract::COLUMN_QUANTITY));
            values.push(Box::new(quantity));
        }
        if let Some(supplier) = &patch.supplier {
            assignments.push(format!("{} = ?", contract::COLUMN_SUPPLIER));
            values.push(Box::new(supplier.clone()));
        }
        if let Some(image) = &patch.image {
            assignments.push(format!("{} = ?", contract::COLUMN_IMAGE));
            values.push(Box::new(normalize_image(Some(image))));
        }
        values.push(Box::new(id));

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            contract::TABLE_NAME,
            assignments.join(", "),
            contract::COLUMN_ID
        );

        let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let affected = {
            let conn = self.db.lock().unwrap();
            conn.execute(&sql, &params[..])?
        };
        if affected > 0 {
            log::debug!("Updated product {}", id);
            self.notify(StoreChange::Item(id));
        }
        Ok(affected)
    }

    /// Reads the current quantity of a row and writes the value computed by
    /// `f`, inside a single transaction so the read-then-write pair cannot
    /// interleave with another writer.
    ///
    /// Returns the affected-row count: 0 when the id matches nothing.
    pub fn adjust_quantity<F>(&self, id: i64, f: F) -> Result<usize>
    where
        F: FnOnce(i64) -> i64,
    {
        let affected = {
            let mut conn = self.db.lock().unwrap();
            let tx = conn.transaction()?;
            let current: Option<i64> = tx
                .query_row(
                    "SELECT quantity FROM products WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;
            let affected = match current {
                Some(quantity) => tx.execute(
                    "UPDATE products SET quantity = ?1 WHERE id = ?2",
                    params![f(quantity), id],
                )?,
                None => 0,
            };
            tx.commit()?;
            affected
        };
        if affected > 0 {
            self.notify(StoreChange::Item(id));
        }
        Ok(affected)
    }

    /// Removes the row with the given id. Returns the affected-row count.
    pub fn delete(&self, id: i64) -> Result<usize> {
        let affected = {
            let conn = self.db.lock().unwrap();
            conn.execute("DELETE FROM products WHERE id = ?1", params![id])?
        };
        if affected > 0 {
            log::debug!("Deleted product {}", id);
            self.notify(StoreChange::Item(id));
        }
        Ok(affected)
    }

    /// Removes every row. Returns the affected-row count.
    ///
    /// Confirmation is the caller's responsibility; there is no undo.
    pub fn delete_all(&self) -> Result<usize> {
        let affected = {
            let conn = self.db.lock().unwrap();
            conn.execute("DELETE FROM products", [])?
        };
        log::info!("{} rows deleted from product database", affected);
        self.notify(StoreChange::Collection);
        Ok(affected)
    }

    /// Runs [`Self::query_all`] on the blocking pool.
    ///
    /// The caller owns the handle: aborting or dropping it discards the
    /// result without touching store state.
    pub fn spawn_query_all(&self) -> JoinHandle<Result<Vec<Product>>> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.query_all())
    }

    /// Runs [`Self::query_by_id`] on the blocking pool.
    pub fn spawn_query_by_id(&self, id: i64) -> JoinHandle<Result<Option<Product>>> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.query_by_id(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> ProductStore {
        ProductStore::open_in_memory().unwrap()
    }

    fn make_product(name: &str, quantity: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            supplier: "Acme Wholesale".to_string(),
            price: 9.99,
            quantity,
            image: None,
        }
    }

    #[test]
    fn init_schema_creates_table() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='products'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn insert_returns_id_and_query_round_trips() {
        let store = test_store();
        let id = store
            .insert(&NewProduct {
                name: "Jump Rope".to_string(),
                supplier: "Big 5 Sporting Goods".to_string(),
                price: 13.99,
                quantity: 33,
                image: None,
            })
            .unwrap();
        assert_eq!(id, 1);

        let product = store.query_by_id(id).unwrap().unwrap();
        assert_eq!(product.name, "Jump Rope");
        assert_eq!(product.supplier, "Big 5 Sporting Goods");
        assert!((product.price - 13.99).abs() < f64::EPSILON);
        assert_eq!(product.quantity, 33);
        assert!(product.image.is_none());
    }

    #[test]
    fn insert_applies_defaults() {
        let store = test_store();
        let id = store
            .insert(&NewProduct {
                name: "Rope".to_string(),
                supplier: "Big 5".to_string(),
                price: 0.0,
                quantity: 0,
                image: Some("   ".to_string()),
            })
            .unwrap();

        let product = store.query_by_id(id).unwrap().unwrap();
        assert_eq!(product.price, 0.0);
        assert_eq!(product.quantity, 0);
        assert!(product.image.is_none(), "blank image must be stored as NULL");
    }

    #[test]
    fn ids_are_never_reused() {
        let store = test_store();
        let first = store.insert(&make_product("A", 1)).unwrap();
        assert_eq!(store.delete(first).unwrap(), 1);
        let second = store.insert(&make_product("B", 1)).unwrap();
        assert!(second > first, "deleted id {first} must not be handed out again");
    }

    #[test]
    fn query_all_in_insertion_order() {
        let store = test_store();
        store.insert(&make_product("First", 1)).unwrap();
        store.insert(&make_product("Second", 2)).unwrap();
        store.insert(&make_product("Third", 3)).unwrap();

        let names: Vec<String> = store
            .query_all()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn query_all_is_a_snapshot() {
        let store = test_store();
        store.insert(&make_product("Early", 1)).unwrap();
        let snapshot = store.query_all().unwrap();
        store.insert(&make_product("Late", 1)).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.query_all().unwrap().len(), 2);
    }

    #[test]
    fn list_summaries_projects_list_columns() {
        let store = test_store();
        let id = store
            .insert(&NewProduct {
                name: "Kettlebell".to_string(),
                supplier: "Acme Wholesale".to_string(),
                price: 25.0,
                quantity: 4,
                image: Some("file:///pictures/kettlebell.png".to_string()),
            })
            .unwrap();

        let summaries = store.list_summaries().unwrap();
        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!(summary.id, id);
        assert_eq!(summary.name, "Kettlebell");
        assert_eq!(summary.quantity, 4);
        assert_eq!(
            summary.image.as_deref(),
            Some("file:///pictures/kettlebell.png")
        );
    }

    #[test]
    fn query_by_id_absent_is_none() {
        let store = test_store();
        assert!(store.query_by_id(999).unwrap().is_none());
    }

    #[test]
    fn update_changes_only_named_columns() {
        let store = test_store();
        let id = store.insert(&make_product("Rope", 33)).unwrap();

        let affected = store
            .update(
                id,
                &ProductPatch {
                    quantity: Some(5),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(affected, 1);

        let product = store.query_by_id(id).unwrap().unwrap();
        assert_eq!(product.quantity, 5);
        assert_eq!(product.name, "Rope");
        assert_eq!(product.supplier, "Acme Wholesale");
        assert!((product.price - 9.99).abs() < f64::EPSILON);
    }

    #[test]
    fn update_full_row() {
        let store = test_store();
        let id = store.insert(&make_product("Old", 1)).unwrap();

        let affected = store
            .update(
                id,
                &ProductPatch {
                    name: Some("New".to_string()),
                    price: Some(1.5),
                    quantity: Some(7),
                    supplier: Some("Other Supplier".to_string()),
                    image: Some("file:///new.png".to_string()),
                },
            )
            .unwrap();
        assert_eq!(affected, 1);

        let product = store.query_by_id(id).unwrap().unwrap();
        assert_eq!(product.name, "New");
        assert_eq!(product.quantity, 7);
        assert_eq!(product.supplier, "Other Supplier");
        assert_eq!(product.image.as_deref(), Some("file:///new.png"));
    }

    #[test]
    fn update_clears_image_with_blank_string() {
        let store = test_store();
        let id = store
            .insert(&NewProduct {
                image: Some("file:///old.png".to_string()),
                ..make_product("Rope", 1)
            })
            .unwrap();

        store
            .update(
                id,
                &ProductPatch {
                    image: Some(String::new()),
                    ..Default::default()
                },
            )
            .unwrap();
        let product = store.query_by_id(id).unwrap().unwrap();
        assert!(product.image.is_none());
    }

    #[test]
    fn update_nonexistent_id_affects_nothing() {
        let store = test_store();
        let affected = store
            .update(
                999,
                &ProductPatch {
                    quantity: Some(5),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(affected, 0);
        assert!(store.query_all().unwrap().is_empty(), "no row may be created");
    }

    #[test]
    fn update_empty_patch_is_rejected() {
        let store = test_store();
        let id = store.insert(&make_product("Rope", 1)).unwrap();
        let err = store.update(id, &ProductPatch::default()).unwrap_err();
        assert!(matches!(err, InventoryError::InvalidArgument(_)));
    }

    #[test]
    fn delete_and_delete_all() {
        let store = test_store();
        let id = store.insert(&make_product("Rope", 1)).unwrap();
        store.insert(&make_product("Ball", 2)).unwrap();

        assert_eq!(store.delete(id).unwrap(), 1);
        assert_eq!(store.delete(id).unwrap(), 0);

        store.insert(&make_product("Bat", 3)).unwrap();
        assert_eq!(store.delete_all().unwrap(), 2);
        assert!(store.query_all().unwrap().is_empty());
    }

    #[test]
    fn adjust_quantity_reads_and_writes_in_one_call() {
        let store = test_store();
        let id = store.insert(&make_product("Rope", 10)).unwrap();

        assert_eq!(store.adjust_quantity(id, |q| q - 3).unwrap(), 1);
        assert_eq!(store.query_by_id(id).unwrap().unwrap().quantity, 7);

        assert_eq!(store.adjust_quantity(999, |q| q).unwrap(), 0);
    }

    #[test]
    fn mutations_notify_subscribers() {
        let store = test_store();
        let mut rx = store.subscribe();

        let id = store.insert(&make_product("Rope", 1)).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), StoreChange::Collection);

        store
            .update(
                id,
                &ProductPatch {
                    quantity: Some(9),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(*rx.borrow_and_update(), StoreChange::Item(id));

        store.delete(id).unwrap();
        assert_eq!(*rx.borrow_and_update(), StoreChange::Item(id));

        store.delete_all().unwrap();
        assert_eq!(*rx.borrow_and_update(), StoreChange::Collection);
    }

    #[test]
    fn failed_mutations_do_not_notify() {
        let store = test_store();
        store.insert(&make_product("Rope", 1)).unwrap();
        let mut rx = store.subscribe();

        // Affects zero rows: nothing changed, nothing to announce
        store.delete(999).unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn store_survives_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("inventory.db");

        let id = {
            let store = ProductStore::open(&path).unwrap();
            store.insert(&make_product("Durable", 2)).unwrap()
        };

        let store = ProductStore::open(&path).unwrap();
        let product = store.query_by_id(id).unwrap().unwrap();
        assert_eq!(product.name, "Durable");
    }

    #[tokio::test]
    async fn spawned_queries_resolve_off_the_caller() {
        let store = test_store();
        store.insert(&make_product("Rope", 1)).unwrap();

        let all = store.spawn_query_all().await.unwrap().unwrap();
        assert_eq!(all.len(), 1);

        let one = store.spawn_query_by_id(all[0].id).await.unwrap().unwrap();
        assert_eq!(one.unwrap().name, "Rope");
    }

    #[tokio::test]
    async fn aborted_query_leaves_store_usable() {
        let store = test_store();
        store.insert(&make_product("Rope", 1)).unwrap();

        let handle = store.spawn_query_all();
        handle.abort();
        // The task may have finished before the abort landed; either way the
        // result is simply discarded and the store keeps working.
        let _ = handle.await;

        assert_eq!(store.query_all().unwrap().len(), 1);
    }
}
