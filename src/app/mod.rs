//! TUI Application module

mod async_ops;
mod events;
mod state;
mod ui;

pub use state::{AppState, Mode};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

use crate::api::SupabaseClient;
use crate::config::Config;
use crate::demo;
use crate::pages::books::BooksView;
use crate::pages::profile::ProfileForm;
use crate::router::Route;
use crate::session::{SessionStore, SessionVault};

use async_ops::{AsyncCommand, AsyncHandle, AsyncResult, spawn_worker};

/// Run the TUI against the configured backend, opening `path` once the session is ready
pub fn run(path: Option<&str>) -> Result<()> {
    let rt = Runtime::new()?;
    let config = Config::load()?;
    let connection = config.connection()?;

    let backend = SupabaseClient::new(&connection).context("Failed to build HTTP client")?;
    let vault = SessionVault::open_default()?;
    let store = SessionStore::new(Arc::new(backend), vault);

    run_with(&rt, config, store, Route::from_path(path.unwrap_or("/")))
}

/// Run the TUI over seeded in-memory data, signed in as the demo reader
pub fn run_demo() -> Result<()> {
    let rt = Runtime::new()?;
    let config = Config::load()?;
    let store = rt.block_on(demo::signed_in_store())?;

    run_with(&rt, config, store, Route::Books)
}

fn run_with(rt: &Runtime, config: Config, store: SessionStore, route: Route) -> Result<()> {
    let mut state = AppState::new(config);
    let needs_init = store.is_loading();
    if !needs_init {
        state.session_loading = false;
        state.user = store.user().cloned();
        if let Some(profile) = &state.user {
            state.profile_form = ProfileForm::from_profile(profile);
        }
    }

    // Spawn async worker
    let async_handle = rt.block_on(async { spawn_worker(store) });
    if needs_init {
        let _ = async_handle.cmd_tx.blocking_send(AsyncCommand::Init);
    }
    if let Some(cmd) = state.navigate(route) {
        let _ = async_handle.cmd_tx.blocking_send(cmd);
    }

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Main loop
    let result = run_app(&mut terminal, &mut state, async_handle);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;

    // Save config on exit
    state.config.save()
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    mut async_handle: AsyncHandle,
) -> Result<()> {
    loop {
        // Process any async results
        while let Ok(result) = async_handle.result_rx.try_recv() {
            if let Some(cmd) = handle_async_result(state, result) {
                let _ = async_handle.cmd_tx.blocking_send(cmd);
            }
        }

        // Draw UI
        terminal.draw(|frame| ui::render(frame, state))?;

        // Handle events
        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = event::read()?
            && let Some(cmd) = events::handle_key(state, key)
        {
            let _ = async_handle.cmd_tx.blocking_send(cmd);
        }

        // Tick for animations
        state.tick();

        if state.should_quit {
            let _ = async_handle.cmd_tx.blocking_send(AsyncCommand::Shutdown);
            break;
        }
    }

    Ok(())
}

fn handle_async_result(state: &mut AppState, result: AsyncResult) -> Option<AsyncCommand> {
    // Every result answers exactly one command
    state.loading = false;

    match result {
        AsyncResult::SessionReady { user } => {
            state.session_loading = false;
            if let Some(profile) = user {
                state.profile_form = ProfileForm::from_profile(&profile);
                state.user = Some(profile);
            }
            state.reroute()
        }
        AsyncResult::SignedIn(profile) => state.signed_in(profile),
        AsyncResult::AuthFailed(message) => {
            state.auth_form.fail(message);
            None
        }
        AsyncResult::SignedOut => {
            state.set_status("Signed out");
            state.signed_out()
        }
        AsyncResult::BooksLoaded(books) => {
            let filter = std::mem::take(&mut state.books.filter);
            state.books = BooksView::new(books);
            state.books.filter = filter;
            None
        }
        AsyncResult::MyBooksLoaded(books) => {
            state.set_my_books(books);
            None
        }
        AsyncResult::BookSaved(book) => {
            state.book_form = None;
            state.mode = Mode::Normal;
            state.set_status(format!("✓ Saved \"{}\"", book.title));
            state.loading = true;
            Some(AsyncCommand::LoadMyBooks)
        }
        AsyncResult::BookDeleted(_) => {
            state.set_status("✓ Book removed");
            state.loading = true;
            Some(AsyncCommand::LoadMyBooks)
        }
        AsyncResult::ExchangeOpened(modal) => {
            state.exchange = Some(modal);
            state.mode = Mode::Exchange;
            None
        }
        AsyncResult::ExchangeSent(_) => {
            let title = state
                .exchange
                .take()
                .map(|m| m.requested.title)
                .unwrap_or_default();
            state.mode = Mode::Normal;
            state.set_status(format!("✓ Exchange request sent for \"{title}\""));
            state.loading = true;
            Some(AsyncCommand::LoadBooks)
        }
        AsyncResult::MatchesLoaded(matches) => {
            state.set_matches(matches);
            None
        }
        AsyncResult::Responded(request) => {
            state.set_status(format!("{} Request {}", request.status.emoji(), request.status));
            state.loading = true;
            Some(AsyncCommand::LoadMatches)
        }
        AsyncResult::StatsLoaded(stats) => {
            state.profile_stats = Some(stats);
            None
        }
        AsyncResult::ProfileSaved(profile) => {
            state.profile_form = ProfileForm::from_profile(&profile);
            state.set_status(format!("✓ Profile updated for {}", profile.username));
            state.user = Some(profile);
            state.mode = Mode::Normal;
            None
        }
        AsyncResult::Error { message } => {
            if let Some(modal) = state.exchange.as_mut() {
                modal.submitting = false;
            }
            state.set_status(format!("❌ {message}"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookCondition, ExchangeStatus, NewBook, NewExchangeRequest, Profile};
    use crate::pages::exchange_modal::ExchangeModal;
    use uuid::Uuid;

    fn ready() -> AppState {
        let mut state = AppState::new(Config::default());
        state.navigate(Route::Matches);
        state
    }

    #[test]
    fn test_session_ready_resolves_pending_route() {
        let mut state = ready();
        let profile = Profile::new(Uuid::new_v4(), "alice");
        let cmd = handle_async_result(&mut state, AsyncResult::SessionReady { user: Some(profile) });
        assert_eq!(state.route, Route::Matches);
        assert!(matches!(cmd, Some(AsyncCommand::LoadMatches)));
        assert!(state.loading);
    }

    #[test]
    fn test_session_ready_signed_out_redirects() {
        let mut state = ready();
        let cmd = handle_async_result(&mut state, AsyncResult::SessionReady { user: None });
        assert!(cmd.is_none());
        assert_eq!(state.route, Route::Auth);
        assert_eq!(state.redirect_from, Some(Route::Matches));
    }

    #[test]
    fn test_reload_keeps_filter() {
        let mut state = ready();
        state.books.filter.search = "dune".to_string();
        let owner = Uuid::new_v4();
        let books = ["Dune", "Emma"]
            .iter()
            .map(|t| NewBook::new(owner, t, "X", "Fiction", BookCondition::Good, None).into_book(Uuid::new_v4()))
            .collect();
        handle_async_result(&mut state, AsyncResult::BooksLoaded(books));
        assert_eq!(state.books.visible().len(), 1);
    }

    #[test]
    fn test_exchange_sent_closes_modal_and_reloads_books() {
        let mut state = ready();
        let owner = Uuid::new_v4();
        let requested = NewBook::new(owner, "Emma", "Jane Austen", "Romance", BookCondition::Good, None)
            .into_book(Uuid::new_v4());
        state.exchange = Some(ExchangeModal::new(requested, Vec::new()));
        state.mode = Mode::Exchange;

        let request = NewExchangeRequest {
            requester_id: Uuid::new_v4(),
            owner_id: owner,
            requested_book_id: Uuid::new_v4(),
            offered_book_id: Uuid::new_v4(),
            status: ExchangeStatus::Pending,
            message: None,
        }
        .into_request(Uuid::new_v4());
        let cmd = handle_async_result(&mut state, AsyncResult::ExchangeSent(request));

        assert!(matches!(cmd, Some(AsyncCommand::LoadBooks)));
        assert!(state.loading);
        assert!(state.exchange.is_none());
        assert_eq!(state.mode, Mode::Normal);
        assert!(state.status.contains("Emma"));
    }

    #[test]
    fn test_auth_failure_shows_inline() {
        let mut state = ready();
        state.auth_form.password = "secret".to_string();
        state.auth_form.submitting = true;
        handle_async_result(&mut state, AsyncResult::AuthFailed("Invalid login credentials".to_string()));
        assert_eq!(state.auth_form.error.as_deref(), Some("Invalid login credentials"));
        assert!(state.auth_form.password.is_empty());
        assert!(!state.auth_form.submitting);
    }
}
