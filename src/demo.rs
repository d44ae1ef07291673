//! Demo data for `bookswap demo`
//!
//! Seeds an in-memory backend with a few readers, their shelves and some
//! exchange requests, then signs in as the first reader.

use anyhow::Result;
use std::sync::Arc;

use crate::api::{Backend, InMemoryBackend};
use crate::exchange;
use crate::models::{Book, BookCondition, ExchangeStatus, NewBook, NewProfile};
use crate::session::{SessionStore, SessionVault};

/// Account the demo signs in with
pub const DEMO_EMAIL: &str = "alice@bookswap.demo";
pub const DEMO_PASSWORD: &str = "bookswap";

struct Shelf {
    email: &'static str,
    username: &'static str,
    books: &'static [(&'static str, &'static str, &'static str, BookCondition, &'static str)],
}

const SHELVES: &[Shelf] = &[
    Shelf {
        email: DEMO_EMAIL,
        username: "alice",
        books: &[
            ("Dune", "Frank Herbert", "Science Fiction", BookCondition::VeryGood, "Paperback, a few dog-ears."),
            ("Persuasion", "Jane Austen", "Romance", BookCondition::Good, ""),
            ("The Name of the Rose", "Umberto Eco", "Mystery", BookCondition::LikeNew, "Read once."),
        ],
    },
    Shelf {
        email: "bob@bookswap.demo",
        username: "bob",
        books: &[
            ("Neuromancer", "William Gibson", "Science Fiction", BookCondition::Good, ""),
            ("A Brief History of Time", "Stephen Hawking", "Science", BookCondition::Fair, "Cover is worn."),
            ("The Hobbit", "J.R.R. Tolkien", "Fantasy", BookCondition::New, ""),
        ],
    },
    Shelf {
        email: "carol@bookswap.demo",
        username: "carol",
        books: &[
            ("Gödel, Escher, Bach", "Douglas Hofstadter", "Non-Fiction", BookCondition::VeryGood, ""),
            ("Rebecca", "Daphne du Maurier", "Mystery", BookCondition::Good, "Hardcover."),
            ("The Left Hand of Darkness", "Ursula K. Le Guin", "Science Fiction", BookCondition::Fair, ""),
        ],
    },
];

/// Build the seeded backend
pub async fn seed() -> Result<Arc<InMemoryBackend>> {
    let backend = Arc::new(InMemoryBackend::new());
    let mut shelves: Vec<(crate::api::AuthSession, Vec<Book>)> = Vec::new();

    for shelf in SHELVES {
        let session = backend.sign_up(shelf.email, DEMO_PASSWORD).await?;
        backend
            .insert_profile(
                &session,
                &NewProfile {
                    id: session.user_id(),
                    username: shelf.username.to_string(),
                },
            )
            .await?;

        let mut books = Vec::new();
        for (title, author, genre, condition, description) in shelf.books {
            let description = (!description.is_empty()).then(|| (*description).to_string());
            let row = NewBook::new(session.user_id(), title, author, genre, *condition, description);
            books.push(backend.insert_book(&session, &row).await?);
        }
        shelves.push((session, books));
    }

    // (requester, offered book, owner, wanted book, message)
    let trades = [
        (1, 0, 0, 0, Some("Happy to swap, mine is in good shape!")),
        (2, 1, 0, 1, None),
        (0, 2, 1, 2, Some("Been looking for this one for ages.")),
        (1, 1, 2, 1, None),
    ];
    let mut requests = Vec::new();
    for (requester, offered, owner, wanted, message) in trades {
        let (session, mine) = &shelves[requester];
        let requested = &shelves[owner].1[wanted];
        let row = exchange::build_offer(
            session.user_id(),
            requested,
            &mine[offered],
            message.map(str::to_string),
        )?;
        requests.push(backend.insert_exchange_request(session, &row).await?);
    }

    // alice already turned one request down
    let (alice, _) = &shelves[0];
    backend
        .update_exchange_status(alice, requests[1].id, ExchangeStatus::Rejected)
        .await?;

    tracing::debug!(requests = requests.len(), "Seeded demo backend");
    Ok(backend)
}

/// Session store over the seeded backend, signed in as [`DEMO_EMAIL`]
pub async fn signed_in_store() -> Result<SessionStore> {
    let backend: Arc<dyn Backend> = seed().await?;
    let mut store = SessionStore::new(backend, SessionVault::Ephemeral);
    store.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await?;
    Ok(store)
}
