//! The signed-in user's own listings

use uuid::Uuid;

use crate::error::BackendError;
use crate::models::{BOOK_GENRES, Book, BookCondition, BookUpdate, NewBook};
use crate::session::SessionStore;

use super::{FormError, PageError, connect, optional, required};

/// Input field of the book form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookField {
    #[default]
    Title,
    Author,
    Genre,
    Condition,
    Description,
}

impl BookField {
    pub const ALL: &'static [Self] = &[
        Self::Title,
        Self::Author,
        Self::Genre,
        Self::Condition,
        Self::Description,
    ];

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Author => "Author",
            Self::Genre => "Genre",
            Self::Condition => "Condition",
            Self::Description => "Description",
        }
    }

    /// Whether the field is picked from a fixed list rather than typed
    pub const fn is_choice(&self) -> bool {
        matches!(self, Self::Genre | Self::Condition)
    }
}

/// Add/edit form for a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookForm {
    /// Listing being edited, `None` when adding
    pub editing: Option<Uuid>,
    pub focus: BookField,
    pub title: String,
    pub author: String,
    pub genre: String,
    /// Unset until the user picks one
    pub condition: Option<BookCondition>,
    pub description: String,
}

impl BookForm {
    /// Form pre-filled from an existing listing
    pub fn edit(book: &Book) -> Self {
        Self {
            editing: Some(book.id),
            focus: BookField::Title,
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone(),
            condition: Some(book.condition),
            description: book.description.clone().unwrap_or_default(),
        }
    }

    pub const fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    pub fn focus_next(&mut self) {
        let idx = BookField::ALL.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = BookField::ALL[(idx + 1) % BookField::ALL.len()];
    }

    pub fn focus_prev(&mut self) {
        let all = BookField::ALL;
        let idx = all.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = all[(idx + all.len() - 1) % all.len()];
    }

    /// Text of the focused field, `None` for choice fields
    pub fn focused_text(&mut self) -> Option<&mut String> {
        match self.focus {
            BookField::Title => Some(&mut self.title),
            BookField::Author => Some(&mut self.author),
            BookField::Description => Some(&mut self.description),
            BookField::Genre | BookField::Condition => None,
        }
    }

    /// Step the focused choice field through its options
    pub fn cycle_choice(&mut self) {
        match self.focus {
            BookField::Genre => {
                let idx = BOOK_GENRES.iter().position(|g| *g == self.genre);
                let next = idx.map_or(0, |i| (i + 1) % BOOK_GENRES.len());
                self.genre = BOOK_GENRES[next].to_string();
            }
            BookField::Condition => {
                self.condition = Some(self.condition.map_or(BookCondition::New, |c| c.next()));
            }
            _ => {}
        }
    }

    fn validated(&self) -> Result<(String, String, String, BookCondition), FormError> {
        let title = required(&self.title, "title")?;
        let author = required(&self.author, "author")?;
        let genre = required(&self.genre, "genre")?;
        let condition = self.condition.ok_or(FormError::Required("condition"))?;
        Ok((title, author, genre, condition))
    }

    /// Row to insert for a new listing
    pub fn to_new_book(&self, owner: Uuid) -> Result<NewBook, FormError> {
        let (title, author, genre, condition) = self.validated()?;
        Ok(NewBook::new(
            owner,
            &title,
            &author,
            &genre,
            condition,
            optional(&self.description),
        ))
    }

    /// Patch for an existing listing
    pub fn to_update(&self) -> Result<BookUpdate, FormError> {
        let (title, author, genre, condition) = self.validated()?;
        Ok(BookUpdate {
            title: Some(title),
            author: Some(author),
            genre: Some(genre),
            condition: Some(condition),
            description: Some(self.description.trim().to_string()),
            status: None,
        })
    }
}

/// Condition from its label as typed on the command line
pub fn parse_condition(label: &str) -> Result<BookCondition, FormError> {
    BookCondition::from_label(label).ok_or_else(|| FormError::UnknownCondition(label.trim().to_string()))
}

/// Fetch the user's books in every status. Failures are logged and yield an empty list.
pub async fn load(store: &mut SessionStore) -> Vec<Book> {
    let result = async {
        let owner = store.user_id().ok_or(BackendError::NotSignedIn)?;
        let (backend, session) = connect(store).await?;
        backend.books_by_owner(&session, owner, None).await
    }
    .await;

    result.unwrap_or_else(|e| {
        tracing::error!("Error fetching books: {e}");
        Vec::new()
    })
}

/// Insert or patch the listing described by the form
pub async fn submit(store: &mut SessionStore, form: &BookForm) -> Result<Book, PageError> {
    let owner = store.user_id().ok_or(BackendError::NotSignedIn)?;
    let (backend, session) = connect(store).await?;

    let book = if let Some(id) = form.editing {
        let update = form.to_update()?;
        backend.update_book(&session, id, &update).await?
    } else {
        let row = form.to_new_book(owner)?;
        backend.insert_book(&session, &row).await?
    };
    tracing::info!(book_id = %book.id, title = %book.title, "Saved book");
    Ok(book)
}

/// Remove a listing
pub async fn delete(store: &mut SessionStore, id: Uuid) -> Result<(), PageError> {
    let (backend, session) = connect(store).await?;
    backend.delete_book(&session, id).await?;
    tracing::info!(book_id = %id, "Deleted book");
    Ok(())
}
