use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Book, BookFilter, BookPatch, NewBook, SortOrder};

/// The catalog store: an owned in-memory map of books persisted as a JSON
/// snapshot. Every successful mutation rewrites the snapshot atomically
/// (temp file + rename); a failed rewrite rolls the in-memory change back.
pub struct CatalogStore {
    path: PathBuf,
    books: RwLock<BTreeMap<Uuid, Book>>,
}

impl CatalogStore {
    /// Open the store at `path`, loading an existing snapshot if present.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut books = BTreeMap::new();
        if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            let records: Vec<Book> = serde_json::from_str(&raw)?;
            for book in records {
                books.insert(book.id, book);
            }
            tracing::info!(path = %path.display(), count = books.len(), "catalog snapshot loaded");
        } else {
            tracing::info!(path = %path.display(), "starting with an empty catalog");
        }

        Ok(Self {
            path,
            books: RwLock::new(books),
        })
    }

    /// Create a book, assigning a fresh id and timestamps.
    pub fn create(&self, new: NewBook) -> Result<Book, StoreError> {
        validate_required("title", &new.title)?;
        validate_required("author", &new.author)?;

        let now = OffsetDateTime::now_utc();
        let book = Book {
            id: Uuid::now_v7(),
            title: new.title.trim().to_string(),
            author: new.author.trim().to_string(),
            isbn: new.isbn.filter(|isbn| !isbn.trim().is_empty()),
            category: new.category.trim().to_string(),
            status: Default::default(),
            added_at: now,
            updated_at: now,
        };

        let mut books = self.write_lock();
        books.insert(book.id, book.clone());
        if let Err(err) = persist(&self.path, &books) {
            books.remove(&book.id);
            return Err(err);
        }

        tracing::debug!(id = %book.id, title = %book.title, "book created");
        Ok(book)
    }

    /// Fetch a book by id.
    pub fn get(&self, id: Uuid) -> Result<Book, StoreError> {
        self.read_lock()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    /// Apply a partial update. An unknown id leaves the store untouched.
    pub fn update(&self, id: Uuid, patch: BookPatch) -> Result<Book, StoreError> {
        if let Some(title) = &patch.title {
            validate_required("title", title)?;
        }
        if let Some(author) = &patch.author {
            validate_required("author", author)?;
        }

        let mut books = self.write_lock();
        let previous = books.get(&id).cloned().ok_or(StoreError::NotFound(id))?;

        let mut book = previous.clone();
        if let Some(title) = patch.title {
            book.title = title.trim().to_string();
        }
        if let Some(author) = patch.author {
            book.author = author.trim().to_string();
        }
        if let Some(isbn) = patch.isbn {
            book.isbn = if isbn.trim().is_empty() {
                None
            } else {
                Some(isbn.trim().to_string())
            };
        }
        if let Some(category) = patch.category {
            book.category = category.trim().to_string();
        }
        if let Some(status) = patch.status {
            book.status = status;
        }
        book.updated_at = OffsetDateTime::now_utc();

        books.insert(id, book.clone());
        if let Err(err) = persist(&self.path, &books) {
            books.insert(id, previous);
            return Err(err);
        }

        tracing::debug!(id = %id, "book updated");
        Ok(book)
    }

    /// Remove a book by id.
    pub fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut books = self.write_lock();
        let removed = books.remove(&id).ok_or(StoreError::NotFound(id))?;

        if let Err(err) = persist(&self.path, &books) {
            books.insert(id, removed);
            return Err(err);
        }

        tracing::debug!(id = %id, "book deleted");
        Ok(())
    }

    /// List books matching `filter`, sorted per its sort order.
    pub fn list(&self, filter: &BookFilter) -> Vec<Book> {
        let books = self.read_lock();
        let mut matched: Vec<Book> = books
            .values()
            .filter(|book| filter.matches(book))
            .cloned()
            .collect();

        match filter.sort {
            SortOrder::NewestFirst => {
                matched.sort_by(|a, b| b.added_at.cmp(&a.added_at).then(a.id.cmp(&b.id)));
            }
            SortOrder::OldestFirst => {
                matched.sort_by(|a, b| a.added_at.cmp(&b.added_at).then(a.id.cmp(&b.id)));
            }
            SortOrder::Title => {
                matched.sort_by(|a, b| {
                    a.title
                        .to_lowercase()
                        .cmp(&b.title.to_lowercase())
                        .then(a.id.cmp(&b.id))
                });
            }
            SortOrder::Author => {
                matched.sort_by(|a, b| {
                    a.author
                        .to_lowercase()
                        .cmp(&b.author.to_lowercase())
                        .then(a.id.cmp(&b.id))
                });
            }
        }

        matched
    }

    /// Number of books in the catalog.
    pub fn count(&self) -> usize {
        self.read_lock().len()
    }

    fn read_lock(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<Uuid, Book>> {
        self.books.read().unwrap_or_else(|poison| poison.into_inner())
    }

    fn write_lock(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<Uuid, Book>> {
        self.books
            .write()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

fn validate_required(field: &str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!(
            "{field} must not be blank"
        )));
    }
    Ok(())
}

fn persist(path: &Path, books: &BTreeMap<Uuid, Book>) -> Result<(), StoreError> {
    let records: Vec<&Book> = books.values().collect();
    let raw = serde_json::to_vec_pretty(&records)?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, raw)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
