//! Book listing model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Genres offered when listing a book
pub const BOOK_GENRES: &[&str] = &[
    "Fiction",
    "Non-Fiction",
    "Science Fiction",
    "Mystery",
    "Romance",
    "Biography",
    "History",
    "Science",
    "Technology",
    "Poetry",
    "Drama",
    "Horror",
    "Fantasy",
];

/// Physical condition of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BookCondition {
    /// Never read
    New,
    /// Read once, no marks
    #[serde(rename = "Like New")]
    LikeNew,
    /// Minor wear
    #[serde(rename = "Very Good")]
    VeryGood,
    /// Visible wear
    #[default]
    Good,
    /// Heavy wear, still readable
    Fair,
}

impl BookCondition {
    /// All conditions, best first
    pub const fn all() -> &'static [Self] {
        &[
            Self::New,
            Self::LikeNew,
            Self::VeryGood,
            Self::Good,
            Self::Fair,
        ]
    }

    /// Display label (matches the stored value)
    pub const fn label(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::LikeNew => "Like New",
            Self::VeryGood => "Very Good",
            Self::Good => "Good",
            Self::Fair => "Fair",
        }
    }

    /// Parse from a label, case-insensitive
    pub fn from_label(s: &str) -> Option<Self> {
        let wanted = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
    }

    /// Next condition in the selector (wraps)
    pub fn next(&self) -> Self {
        let all = Self::all();
        let idx = all.iter().position(|c| c == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }
}

impl std::fmt::Display for BookCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Exchange status of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    /// Open for exchange requests
    #[default]
    Available,
    /// Part of an exchange in progress
    Pending,
    /// Already swapped
    Exchanged,
}

impl BookStatus {
    /// Value used in filters and storage
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Pending => "pending",
            Self::Exchanged => "exchanged",
        }
    }

    /// Capitalised label for cards
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Pending => "Pending",
            Self::Exchanged => "Exchanged",
        }
    }
}

/// A book listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier
    pub id: Uuid,
    /// Owning profile
    pub owner_id: Uuid,
    /// Title
    pub title: String,
    /// Author
    pub author: String,
    /// Genre (free text, usually one of [`BOOK_GENRES`])
    pub genre: String,
    /// Physical condition
    pub condition: BookCondition,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Exchange status
    pub status: BookStatus,
    /// When the listing was created
    pub created_at: DateTime<Utc>,
    /// When the listing was last updated
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub page_count: Option<i32>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub views: Option<i64>,
    #[serde(default)]
    pub favorite_count: Option<i64>,
}

impl Book {
    /// Whether the given profile owns this listing
    pub fn is_owned_by(&self, profile_id: Uuid) -> bool {
        self.owner_id == profile_id
    }

    /// Whether a viewer may request an exchange for this book
    pub fn can_be_requested_by(&self, viewer: Uuid) -> bool {
        !self.is_owned_by(viewer) && self.status == BookStatus::Available
    }

    /// "Title by Author" label used by selectors
    pub fn title_and_author(&self) -> String {
        format!("{} by {}", self.title, self.author)
    }

    /// Listing date for cards
    pub fn listed_on(&self) -> String {
        self.created_at.format("%Y-%m-%d").to_string()
    }
}

/// Row inserted when listing a book
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBook {
    pub owner_id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub condition: BookCondition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: BookStatus,
    pub language: String,
}

impl NewBook {
    /// Build a new available listing with the default language
    pub fn new(
        owner_id: Uuid,
        title: &str,
        author: &str,
        genre: &str,
        condition: BookCondition,
        description: Option<String>,
    ) -> Self {
        Self {
            owner_id,
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.to_string(),
            condition,
            description,
            status: BookStatus::Available,
            language: "English".to_string(),
        }
    }

    /// Materialise into a full row (used by the in-memory backend)
    pub fn into_book(self, id: Uuid) -> Book {
        let now = Utc::now();
        Book {
            id,
            owner_id: self.owner_id,
            title: self.title,
            author: self.author,
            genre: self.genre,
            condition: self.condition,
            description: self.description,
            status: self.status,
            created_at: now,
            updated_at: now,
            cover_url: None,
            isbn: None,
            language: Some(self.language),
            publication_year: None,
            publisher: None,
            page_count: None,
            tags: None,
            views: Some(0),
            favorite_count: Some(0),
        }
    }
}

/// Partial book update (only set fields are sent)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<BookCondition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BookStatus>,
}

impl BookUpdate {
    /// Apply this update to a book in place
    pub fn apply_to(&self, book: &mut Book) {
        if let Some(title) = &self.title {
            book.title.clone_from(title);
        }
        if let Some(author) = &self.author {
            book.author.clone_from(author);
        }
        if let Some(genre) = &self.genre {
            book.genre.clone_from(genre);
        }
        if let Some(condition) = self.condition {
            book.condition = condition;
        }
        if let Some(description) = &self.description {
            book.description = Some(description.clone());
        }
        if let Some(status) = self.status {
            book.status = status;
        }
        book.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(owner: Uuid) -> Book {
        NewBook::new(owner, "Dune", "Frank Herbert", "Science Fiction", BookCondition::Good, None)
            .into_book(Uuid::new_v4())
    }

    #[test]
    fn test_condition_wire_names() {
        let json = serde_json::to_string(&BookCondition::LikeNew).unwrap();
        assert_eq!(json, "\"Like New\"");
        let parsed: BookCondition = serde_json::from_str("\"Very Good\"").unwrap();
        assert_eq!(parsed, BookCondition::VeryGood);
    }

    #[test]
    fn test_condition_from_label() {
        assert_eq!(BookCondition::from_label("like new"), Some(BookCondition::LikeNew));
        assert_eq!(BookCondition::from_label(" Fair "), Some(BookCondition::Fair));
        assert_eq!(BookCondition::from_label("mint"), None);
    }

    #[test]
    fn test_condition_next_wraps() {
        assert_eq!(BookCondition::Fair.next(), BookCondition::New);
        assert_eq!(BookCondition::New.next(), BookCondition::LikeNew);
    }

    #[test]
    fn test_new_book_defaults() {
        let owner = Uuid::new_v4();
        let book = sample(owner);
        assert_eq!(book.status, BookStatus::Available);
        assert_eq!(book.language.as_deref(), Some("English"));
        assert!(book.is_owned_by(owner));
    }

    #[test]
    fn test_owner_cannot_request_own_book() {
        let owner = Uuid::new_v4();
        let mut book = sample(owner);
        assert!(!book.can_be_requested_by(owner));
        assert!(book.can_be_requested_by(Uuid::new_v4()));
        book.status = BookStatus::Pending;
        assert!(!book.can_be_requested_by(Uuid::new_v4()));
    }

    #[test]
    fn test_new_book_serializes_without_missing_description() {
        let book = NewBook::new(Uuid::nil(), "T", "A", "Drama", BookCondition::New, None);
        let json = serde_json::to_value(&book).unwrap();
        assert!(json.get("description").is_none());
        assert_eq!(json["status"], "available");
        assert_eq!(json["condition"], "New");
    }
}
