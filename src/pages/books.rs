//! Browse view: every available book, filtered locally

use crate::filter::{self, BookFilter};
use crate::models::Book;
use crate::session::SessionStore;

use super::connect;

/// Loaded books plus the filter and selection applied to them
#[derive(Debug, Clone, Default)]
pub struct BooksView {
    pub books: Vec<Book>,
    pub filter: BookFilter,
    /// Index into [`visible`](Self::visible)
    pub selected: usize,
}

impl BooksView {
    pub fn new(books: Vec<Book>) -> Self {
        Self {
            books,
            ..Self::default()
        }
    }

    /// Books passing the current filter
    pub fn visible(&self) -> Vec<&Book> {
        self.filter.apply(&self.books)
    }

    pub fn genres(&self) -> Vec<String> {
        filter::genres(&self.books)
    }

    pub fn count_label(&self) -> String {
        filter::count_label(self.visible().len())
    }

    pub fn selected_book(&self) -> Option<&Book> {
        self.visible().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let len = self.visible().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn push_search(&mut self, c: char) {
        self.filter.search.push(c);
        self.clamp();
    }

    pub fn pop_search(&mut self) {
        self.filter.search.pop();
        self.clamp();
    }

    pub fn cycle_genre(&mut self, forward: bool) {
        let genres = self.genres();
        self.filter.cycle_genre(&genres, forward);
        self.clamp();
    }

    fn clamp(&mut self) {
        let len = self.visible().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }
}

/// Fetch all available books. Failures are logged and yield an empty list.
pub async fn load(store: &mut SessionStore) -> Vec<Book> {
    let result = async {
        let (backend, session) = connect(store).await?;
        backend.available_books(&session).await
    }
    .await;

    match result {
        Ok(books) => {
            tracing::debug!(count = books.len(), "Loaded available books");
            books
        }
        Err(e) => {
            tracing::error!("Error fetching books: {e}");
            Vec::new()
        }
    }
}
