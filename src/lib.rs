//! # BookSwap 📚
//!
//! A terminal client for swapping physical books with other readers.
//!
//! ## Overview
//!
//! BookSwap lets readers list the books they own, browse what others have
//! listed and propose one-for-one exchanges. All data lives in a hosted
//! Supabase-compatible backend; the client only keeps an encrypted copy of
//! the current session.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          App                                │
//! │   Sync TUI loop  ◀── mpsc ──▶  async worker (owns session)  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │     Router      │ │      Pages      │ │     Session     │
//! │                 │ │                 │ │                 │
//! │ • Routes        │ │ • Books/filter  │ │ • Sign in/up    │
//! │ • Session gate  │ │ • My books      │ │ • Token refresh │
//! │ • Redirects     │ │ • Matches       │ │ • Vault (AES)   │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//!          │                   │                   │
//!          └───────────────────┴───────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │     Backend     │ │    Exchange     │ │     Models      │
//! │                 │ │                 │ │                 │
//! │ • Supabase HTTP │ │ • Offer rules   │ │ • Profile       │
//! │ • In-memory     │ │ • Transitions   │ │ • Book          │
//! │ • Trait seam    │ │                 │ │ • Request       │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`api`]: backend trait, Supabase client and in-memory double
//! - [`app`]: TUI state, event loop and rendering
//! - [`config`]: configuration file and environment overrides
//! - [`exchange`]: rules for building and answering exchange requests
//! - [`filter`]: in-memory search and genre filter
//! - [`models`]: profiles, books and exchange requests
//! - [`pages`]: per-view fetch and mutate operations
//! - [`router`]: route table and session gate
//! - [`session`]: session store and encrypted session vault
//! - [`theme`]: theme support via ratatui-themes
//!
//! ## Example
//!
//! ```no_run
//! use bookswap::app;
//!
//! fn main() -> anyhow::Result<()> {
//!     app::run(None)
//! }
//! ```

#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::unused_async)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::if_not_else)]
#![allow(clippy::single_match_else)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::use_self)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::similar_names)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::return_self_not_must_use)]

pub mod api;
pub mod app;
pub mod config;
pub mod demo;
pub mod error;
pub mod exchange;
pub mod filter;
pub mod models;
pub mod pages;
pub mod paths;
pub mod router;
pub mod session;
pub mod theme;

// Re-export main types for convenience
pub use api::{AuthSession, Backend, InMemoryBackend, SupabaseClient};
pub use app::AppState;
pub use config::Config;
pub use error::{BackendError, BackendResult};
pub use models::{Book, BookCondition, BookStatus, ExchangeRequest, ExchangeStatus, Profile};
pub use router::Route;
pub use session::{SessionStore, SessionVault};
pub use theme::{Theme, ThemeColors};

// Re-export theme types from ratatui-themes crate
pub use ratatui_themes::{ThemeName, ThemePalette};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
