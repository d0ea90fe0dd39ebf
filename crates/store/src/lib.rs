//! Catalog store for shelfd.
//!
//! A flat collection of [`Book`] records held in memory and persisted as a
//! JSON snapshot on each mutation. Single-writer durability only; the store
//! is meant to sit behind the catalog service of one admin process.

pub mod catalog;
pub mod error;
pub mod model;

pub use catalog::CatalogStore;
pub use error::StoreError;
pub use model::{Book, BookFilter, BookPatch, BookStatus, NewBook, SortOrder};
