use std::sync::Arc;

use almanac_core::sources::BookStore;
use almanac_core::{FetchedItems, FuzzyMatcher, SourceAdapter};
use almanac_domain::config::BooksConfig;
use almanac_domain::constants::SOURCE_BOOKS;
use almanac_domain::{Book, ItemOutcome, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use super::client::{BooksClient, ShelfBook};
use crate::http::HttpClient;

/// Shelf sync deduplicated by fuzzy title match.
///
/// Local books are loaded once per run and kept current as items are
/// applied, so a book listed twice upstream is only created once.
pub struct BooksAdapter {
    client: BooksClient,
    store: Arc<dyn BookStore>,
    shelves: Vec<String>,
    matcher: FuzzyMatcher,
    local: Mutex<Vec<Book>>,
}

impl BooksAdapter {
    pub fn new(config: &BooksConfig, http: HttpClient, store: Arc<dyn BookStore>) -> Self {
        Self {
            client: BooksClient::new(config, http),
            store,
            shelves: config.shelves.clone(),
            matcher: FuzzyMatcher::default(),
            local: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_matcher(mut self, matcher: FuzzyMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Stored book this shelf entry refers to, if any.
    ///
    /// Authors must agree when both sides name one.
    fn find_match(&self, item: &ShelfBook) -> Option<Book> {
        let local = self.local.lock();
        let candidates: Vec<&Book> = local
            .iter()
            .filter(|book| match (&book.author, &item.author) {
                (Some(stored), Some(fetched)) => self.matcher.is_match(stored, fetched),
                _ => true,
            })
            .collect();

        self.matcher
            .find_best(&item.title, &candidates, |book| book.title.as_str())
            .map(|(book, rule)| {
                debug!(title = %item.title, stored = %book.title, ?rule, "matched shelved book");
                (*book).clone()
            })
    }

    fn remember(&self, book: Book) {
        let mut local = self.local.lock();
        match local.iter_mut().find(|stored| stored.id == book.id) {
            Some(stored) => *stored = book,
            None => local.push(book),
        }
    }
}

fn apply(item: &ShelfBook, id: Option<uuid::Uuid>) -> Book {
    let mut book = Book::new(item.title.clone(), item.author.clone(), item.shelf.clone());
    if let Some(id) = id {
        book.id = id;
    }
    book.rating = item.rating.filter(|rating| *rating > 0);
    book.date_read = item.read_at;
    book
}

#[async_trait]
impl SourceAdapter for BooksAdapter {
    type Item = ShelfBook;

    fn source_type(&self) -> &str {
        SOURCE_BOOKS
    }

    async fn fetch_items(&self) -> Result<FetchedItems<ShelfBook>> {
        *self.local.lock() = self.store.all().await?;

        let mut books = Vec::new();
        for shelf in &self.shelves {
            books.extend(self.client.shelf(shelf).await?);
        }
        Ok(FetchedItems::Sized(books))
    }

    async fn process_item(&self, item: &ShelfBook) -> Result<ItemOutcome> {
        match self.find_match(item) {
            Some(stored) => {
                let mut fetched = apply(item, Some(stored.id));
                // Keep the locally stored spelling of the title.
                fetched.title = stored.title.clone();
                if !fetched.differs_from(&stored) {
                    return Ok(ItemOutcome::Skipped);
                }
                self.store.update(&fetched).await?;
                self.remember(fetched);
                Ok(ItemOutcome::Updated)
            }
            None => {
                let book = apply(item, None);
                self.store.insert(&book).await?;
                self.remember(book);
                Ok(ItemOutcome::Created)
            }
        }
    }

    fn describe_item(&self, item: &ShelfBook, _ordinal: u64) -> String {
        match &item.author {
            Some(author) => format!("{} by {author}", item.title),
            None => item.title.clone(),
        }
    }
}
