//! Collection catalog
//!
//! Maps resolved days onto the day-collections that exist in the store.
//! Handles are rebuilt for every query, so the catalog always reflects
//! the store's current collection listing.

mod catalog;
mod handle;

pub use catalog::{CollectionCatalog, ResolvedCollections};
pub use handle::{CollectionHandle, CollectionRef};
