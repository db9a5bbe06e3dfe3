//! Book-cataloging shelves
//!
//! The cataloging API has no identifiers that survive edits, so shelved
//! books are matched against local ones by fuzzy title comparison.

mod adapter;
mod client;

pub use adapter::BooksAdapter;
pub use client::{BooksClient, ShelfBook};
