//! In-memory book filtering for the browse view

use crate::models::Book;

/// Search term plus optional genre
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// Case-insensitive substring over title or author
    pub search: String,
    /// Exact genre, `None` for all genres
    pub genre: Option<String>,
}

impl BookFilter {
    pub fn matches_search(&self, book: &Book) -> bool {
        let needle = self.search.to_lowercase();
        needle.is_empty()
            || book.title.to_lowercase().contains(&needle)
            || book.author.to_lowercase().contains(&needle)
    }

    pub fn matches_genre(&self, book: &Book) -> bool {
        self.genre.as_ref().is_none_or(|g| &book.genre == g)
    }

    pub fn matches(&self, book: &Book) -> bool {
        self.matches_search(book) && self.matches_genre(book)
    }

    /// Books passing both predicates, in their original order
    pub fn apply<'a>(&self, books: &'a [Book]) -> Vec<&'a Book> {
        books.iter().filter(|b| self.matches(b)).collect()
    }

    /// Step the genre selection through `None` and each known genre
    pub fn cycle_genre(&mut self, genres: &[String], forward: bool) {
        if genres.is_empty() {
            self.genre = None;
            return;
        }
        let current = self
            .genre
            .as_ref()
            .and_then(|g| genres.iter().position(|x| x == g));
        // Slot 0 is "all genres"
        let slots = genres.len() + 1;
        let slot = current.map_or(0, |i| i + 1);
        let next = if forward {
            (slot + 1) % slots
        } else {
            (slot + slots - 1) % slots
        };
        self.genre = next.checked_sub(1).map(|i| genres[i].clone());
    }
}

/// Distinct genres of the loaded books, in first-seen order
pub fn genres(books: &[Book]) -> Vec<String> {
    let mut seen = Vec::new();
    for book in books {
        if !seen.contains(&book.genre) {
            seen.push(book.genre.clone());
        }
    }
    seen
}

/// "1 book available" / "N books available"
pub fn count_label(count: usize) -> String {
    let noun = if count == 1 { "book" } else { "books" };
    format!("{count} {noun} available")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookCondition, NewBook};
    use uuid::Uuid;

    fn book(title: &str, author: &str, genre: &str) -> Book {
        NewBook::new(Uuid::new_v4(), title, author, genre, BookCondition::Good, None)
            .into_book(Uuid::new_v4())
    }

    fn shelf() -> Vec<Book> {
        vec![
            book("Dune", "Frank Herbert", "Science Fiction"),
            book("Emma", "Jane Austen", "Romance"),
            book("Persuasion", "Jane Austen", "Romance"),
            book("The Left Hand of Darkness", "Ursula K. Le Guin", "Science Fiction"),
            book("Gone Girl", "Gillian Flynn", "Mystery"),
        ]
    }

    fn titles(books: &[&Book]) -> Vec<String> {
        books.iter().map(|b| b.title.clone()).collect()
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_and_author() {
        let books = shelf();
        let filter = BookFilter {
            search: "AUSTEN".to_string(),
            genre: None,
        };
        assert_eq!(titles(&filter.apply(&books)), vec!["Emma", "Persuasion"]);

        let filter = BookFilter {
            search: "dun".to_string(),
            genre: None,
        };
        assert_eq!(titles(&filter.apply(&books)), vec!["Dune"]);
    }

    #[test]
    fn test_genre_is_exact() {
        let books = shelf();
        let filter = BookFilter {
            search: String::new(),
            genre: Some("Science".to_string()),
        };
        assert!(filter.apply(&books).is_empty());
    }

    #[test]
    fn test_predicate_order_does_not_matter() {
        let books = shelf();
        let filter = BookFilter {
            search: "an".to_string(),
            genre: Some("Science Fiction".to_string()),
        };

        let search_then_genre: Vec<&Book> = books
            .iter()
            .filter(|b| filter.matches_search(b))
            .filter(|b| filter.matches_genre(b))
            .collect();
        let genre_then_search: Vec<&Book> = books
            .iter()
            .filter(|b| filter.matches_genre(b))
            .filter(|b| filter.matches_search(b))
            .collect();

        assert_eq!(search_then_genre, genre_then_search);
        assert_eq!(search_then_genre, filter.apply(&books));
        assert_eq!(titles(&search_then_genre), vec!["Dune", "The Left Hand of Darkness"]);
    }

    #[test]
    fn test_genres_first_seen_order() {
        assert_eq!(
            genres(&shelf()),
            vec!["Science Fiction", "Romance", "Mystery"]
        );
    }

    #[test]
    fn test_cycle_genre() {
        let genres = genres(&shelf());
        let mut filter = BookFilter::default();
        filter.cycle_genre(&genres, true);
        assert_eq!(filter.genre.as_deref(), Some("Science Fiction"));
        filter.cycle_genre(&genres, false);
        assert_eq!(filter.genre, None);
        filter.cycle_genre(&genres, false);
        assert_eq!(filter.genre.as_deref(), Some("Mystery"));
        filter.cycle_genre(&genres, true);
        assert_eq!(filter.genre, None);
    }

    #[test]
    fn test_count_label() {
        assert_eq!(count_label(1), "1 book available");
        assert_eq!(count_label(0), "0 books available");
        assert_eq!(count_label(12), "12 books available");
    }
}
