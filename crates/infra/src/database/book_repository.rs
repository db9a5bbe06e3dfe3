//! Shelved books. Rows carry a local id because upstream ids are unreliable.

use std::sync::Arc;

use almanac_core::sources::BookStore;
use almanac_domain::{AlmanacError, Book, Result as DomainResult};
use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::Row;
use tokio::task;
use uuid::Uuid;

use super::manager::DbManager;
use super::sql::{conversion_error, map_storage_error, now_millis, parse_date};
use crate::errors::map_join_error;

pub struct SqliteBookRepository {
    db: Arc<DbManager>,
}

impl SqliteBookRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookStore for SqliteBookRepository {
    async fn all(&self) -> DomainResult<Vec<Book>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<Vec<Book>> {
            let conn = db.get_connection()?;
            conn.query_all(
                "SELECT id, title, author, shelf, rating, date_read FROM books ORDER BY title",
                &[],
                map_book_row,
            )
            .map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn insert(&self, book: &Book) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let book = book.clone();
        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.exec(
                "INSERT INTO books (id, title, author, shelf, rating, date_read, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                &[
                    &book.id.to_string(),
                    &book.title,
                    &book.author,
                    &book.shelf,
                    &book.rating,
                    &book.date_read.map(|date| date.to_string()),
                    &now_millis(),
                ],
            )
            .map(|_| ())
            .map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update(&self, book: &Book) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let book = book.clone();
        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let changed = conn
                .exec(
                    "UPDATE books SET title = ?2, author = ?3, shelf = ?4, rating = ?5,
                        date_read = ?6, updated_at = ?7
                     WHERE id = ?1",
                    &[
                        &book.id.to_string(),
                        &book.title,
                        &book.author,
                        &book.shelf,
                        &book.rating,
                        &book.date_read.map(|date| date.to_string()),
                        &now_millis(),
                    ],
                )
                .map_err(map_storage_error)?;
            if changed == 0 {
                return Err(AlmanacError::NotFound(format!("book {}", book.id)));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_book_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    let id_raw: String = row.get(0)?;
    let rating = row
        .get::<_, Option<i64>>(4)?
        .map(|value| u8::try_from(value).map_err(|err| conversion_error(4, Type::Integer, err)))
        .transpose()?;
    Ok(Book {
        id: Uuid::parse_str(&id_raw).map_err(|err| conversion_error(0, Type::Text, err))?,
        title: row.get(1)?,
        author: row.get(2)?,
        shelf: row.get(3)?,
        rating,
        date_read: row.get::<_, Option<String>>(5)?.map(|raw| parse_date(&raw, 5)).transpose()?,
    })
}
