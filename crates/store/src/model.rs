use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Circulation status of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    #[default]
    Available,
    Issued,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "available",
            BookStatus::Issued => "issued",
        }
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(BookStatus::Available),
            "issued" => Ok(BookStatus::Issued),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// A catalog record. `id` is assigned at creation and never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier for the book
    pub id: Uuid,
    /// Title of the book
    pub title: String,
    /// Author of the book
    pub author: String,
    /// Optional ISBN
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    /// Shelving category
    pub category: String,
    /// Circulation status
    #[serde(default)]
    pub status: BookStatus,
    /// When the record was created
    #[serde(with = "time::serde::rfc3339")]
    pub added_at: OffsetDateTime,
    /// When the record was last mutated
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Input for creating a book. Title and author must be non-blank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub isbn: Option<String>,
    pub category: String,
}

/// Partial update applied to an existing book. `None` fields are untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<BookStatus>,
}

impl BookPatch {
    /// Shorthand for a patch that only flips circulation status.
    pub fn status(status: BookStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Listing order. Newest-first matches the original admin view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
    Title,
    Author,
}

/// Filter applied by `list`. All present criteria must match.
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    /// Case-insensitive substring over title, author, and category.
    pub query: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
    /// Exact status match.
    pub status: Option<BookStatus>,
    pub sort: SortOrder,
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(query) = &self.query {
            let needle = query.to_lowercase();
            let hit = book.title.to_lowercase().contains(&needle)
                || book.author.to_lowercase().contains(&needle)
                || book.category.to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !book.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if book.status != status {
                return false;
            }
        }
        true
    }
}
