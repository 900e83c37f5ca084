//! Sale, shipment, and reorder rules for product quantities.
//!
//! The pure computations live here next to the wrappers that issue the
//! corresponding single-row update. Reordering never touches the stored
//! quantity; it only composes a message for the outgoing mail channel.

use serde::Serialize;

use crate::error::{InventoryError, Result};
use crate::product::{format_price, Product};
use crate::store::ProductStore;

fn ensure_non_negative(what: &str, count: i64) -> Result<()> {
    if count < 0 {
        return Err(InventoryError::InvalidArgument(format!(
            "{what} count must be non-negative, got {count}"
        )));
    }
    Ok(())
}

/// New quantity after selling `sold` units.
///
/// An oversell clamps at zero rather than failing; the caller asked to sell
/// more than is on the shelf, and the shelf is now empty.
pub fn sale(quantity: i64, sold: i64) -> Result<i64> {
    ensure_non_negative("sold", sold)?;
    Ok((quantity - sold).max(0))
}

/// New quantity after receiving `received` units from a shipment.
pub fn shipment_received(quantity: i64, received: i64) -> Result<i64> {
    ensure_non_negative("received", received)?;
    Ok(quantity.saturating_add(received))
}

/// One-tap sale: decrement by exactly one while stock remains.
pub fn quick_sale(quantity: i64) -> i64 {
    if quantity > 0 {
        quantity - 1
    } else {
        quantity
    }
}

/// Composed reorder request for the external mail channel
#[derive(Debug, Clone, Serialize)]
pub struct OrderMessage {
    pub subject: String,
    pub body: String,
    /// `mailto:` URL carrying the subject and body, for a mail client
    pub mailto: String,
}

/// Builds the order mail asking the supplier for `requested` more units.
///
/// Read-only with respect to the store: the product's quantity only changes
/// later, when the shipment actually arrives.
pub fn order_message(product: &Product, requested: i64) -> Result<OrderMessage> {
    if requested <= 0 {
        return Err(InventoryError::InvalidArgument(format!(
            "requested count must be positive, got {requested}"
        )));
    }
    let subject = format!("Order of {}", product.name);
    let body = format!(
        "{},\n\nI would like to order: \n\n{} {} at a unit price of ${}.\n\nThank you!",
        product.supplier,
        requested,
        product.name,
        format_price(product.price)
    );
    let mailto = format!(
        "mailto:?subject={}&body={}",
        urlencoding::encode(&subject),
        urlencoding::encode(&body)
    );
    Ok(OrderMessage {
        subject,
        body,
        mailto,
    })
}

/// Records a sale of `sold` units against the row, clamping at zero.
///
/// Returns the affected-row count: 0 when the id matches nothing.
pub fn record_sale(store: &ProductStore, id: i64, sold: i64) -> Result<usize> {
    ensure_non_negative("sold", sold)?;
    store.adjust_quantity(id, |quantity| (quantity - sold).max(0))
}

/// Records a received shipment of `received` units against the row.
pub fn record_shipment(store: &ProductStore, id: i64, received: i64) -> Result<usize> {
    ensure_non_negative("received", received)?;
    store.adjust_quantity(id, |quantity| quantity.saturating_add(received))
}

/// Records the one-tap "sold one" action against the row.
///
/// The single-row update is issued even when the quantity is already zero;
/// the write is then a no-op on the value.
pub fn record_quick_sale(store: &ProductStore, id: i64) -> Result<usize> {
    store.adjust_quantity(id, quick_sale)
}
