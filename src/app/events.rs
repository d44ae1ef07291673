//! Event handling

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::async_ops::AsyncCommand;
use super::state::{AppState, Mode};
use crate::exchange;
use crate::models::ExchangeStatus;
use crate::pages::my_books::BookForm;
use crate::pages::profile::ProfileForm;
use crate::router::Route;
use crate::theme::Theme;

/// Handle key events, returning an optional async command
pub fn handle_key(state: &mut AppState, key: KeyEvent) -> Option<AsyncCommand> {
    if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return None;
    }

    // Handle mode-specific input first
    match state.mode {
        Mode::ThemePicker => {
            handle_theme_picker_key(state, key);
            return None;
        }
        Mode::Help => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Enter) {
                state.mode = Mode::Normal;
            }
            return None;
        }
        Mode::Search => {
            handle_search_key(state, key);
            return None;
        }
        Mode::BookForm => return handle_book_form_key(state, key),
        Mode::Exchange => return handle_exchange_key(state, key),
        Mode::ProfileEdit => return handle_profile_edit_key(state, key),
        Mode::ConfirmDelete => return handle_confirm_delete_key(state, key),
        Mode::Normal => {}
    }

    // The auth form takes every printable key
    if state.route == Route::Auth && !state.session_loading {
        return handle_auth_key(state, key);
    }

    // Global shortcuts (work in normal mode)
    match (key.modifiers, key.code) {
        (_, KeyCode::Char('q')) => {
            state.should_quit = true;
            return None;
        }
        (_, KeyCode::Char('?') | KeyCode::F(1)) => {
            state.mode = Mode::Help;
            return None;
        }
        (_, KeyCode::Tab) => return state.next_route(),
        (_, KeyCode::BackTab) => return state.prev_route(),
        (_, KeyCode::Char(c @ '1'..='4')) => {
            let idx = c as usize - '1' as usize;
            return state.nav_routes().get(idx).and_then(|r| state.navigate(*r));
        }
        (_, KeyCode::Char('t')) => {
            state.theme_picker_index = Theme::all()
                .iter()
                .position(|t| *t == state.theme.inner())
                .unwrap_or(0);
            state.mode = Mode::ThemePicker;
            return None;
        }
        (_, KeyCode::Char('s')) if !state.is_signed_in() => return state.navigate(Route::Auth),
        (_, KeyCode::Char('S')) if state.is_signed_in() => {
            state.loading = true;
            state.set_status("Signing out...");
            return Some(AsyncCommand::SignOut);
        }
        _ => {}
    }

    if state.session_loading {
        return None;
    }

    // View-specific handling
    match state.route {
        Route::Home => match key.code {
            KeyCode::Enter => state.navigate(Route::Books),
            _ => None,
        },
        Route::NotFound => match key.code {
            KeyCode::Enter | KeyCode::Esc => state.navigate(Route::Home),
            _ => None,
        },
        Route::Books => handle_books_key(state, key),
        Route::MyBooks => handle_my_books_key(state, key),
        Route::Matches => handle_matches_key(state, key),
        Route::Profile => handle_profile_key(state, key),
        Route::Auth => None,
    }
}

fn handle_auth_key(state: &mut AppState, key: KeyEvent) -> Option<AsyncCommand> {
    let form = &mut state.auth_form;
    if form.submitting {
        return None;
    }

    match key.code {
        KeyCode::Esc => return state.navigate(Route::Home),
        KeyCode::F(2) => form.toggle_mode(),
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Backspace => {
            form.focused_mut().pop();
        }
        KeyCode::Enter => match form.credentials() {
            Ok(credentials) => {
                form.error = None;
                form.submitting = true;
                state.loading = true;
                return Some(AsyncCommand::Authenticate(credentials));
            }
            Err(e) => form.error = Some(e.to_string()),
        },
        KeyCode::Char(c) => form.focused_mut().push(c),
        _ => {}
    }
    None
}

fn handle_books_key(state: &mut AppState, key: KeyEvent) -> Option<AsyncCommand> {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.books.select_next(),
        KeyCode::Char('k') | KeyCode::Up => state.books.select_prev(),
        KeyCode::Char('/') => state.mode = Mode::Search,
        KeyCode::Char('f') => state.books.cycle_genre(true),
        KeyCode::Char('F') => state.books.cycle_genre(false),
        KeyCode::Esc => {
            state.books.filter = Default::default();
            state.books.selected = 0;
        }
        KeyCode::Char('r') => {
            state.loading = true;
            return Some(AsyncCommand::LoadBooks);
        }
        KeyCode::Enter => {
            let me = state.user_id()?;
            let book = state.books.selected_book()?.clone();
            if !book.can_be_requested_by(me) {
                state.set_status("That book is yours");
                return None;
            }
            state.loading = true;
            return Some(AsyncCommand::OpenExchange(book));
        }
        _ => {}
    }
    None
}

fn handle_search_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            state.mode = Mode::Normal;
            state.books.filter.search.clear();
            state.books.selected = 0;
        }
        KeyCode::Enter => state.mode = Mode::Normal,
        KeyCode::Char(c) => state.books.push_search(c),
        KeyCode::Backspace => state.books.pop_search(),
        _ => {}
    }
}

fn handle_my_books_key(state: &mut AppState, key: KeyEvent) -> Option<AsyncCommand> {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.select_next_my_book(),
        KeyCode::Char('k') | KeyCode::Up => state.select_prev_my_book(),
        KeyCode::Char('n') => {
            state.book_form = Some(BookForm::default());
            state.mode = Mode::BookForm;
        }
        KeyCode::Char('e') => {
            if let Some(book) = state.selected_my_book() {
                state.book_form = Some(BookForm::edit(book));
                state.mode = Mode::BookForm;
            }
        }
        KeyCode::Char('d') => {
            if state.selected_my_book().is_some() {
                state.mode = Mode::ConfirmDelete;
            }
        }
        KeyCode::Char('r') => {
            state.loading = true;
            return Some(AsyncCommand::LoadMyBooks);
        }
        _ => {}
    }
    None
}

fn handle_book_form_key(state: &mut AppState, key: KeyEvent) -> Option<AsyncCommand> {
    let Some(form) = state.book_form.as_mut() else {
        state.mode = Mode::Normal;
        return None;
    };

    match key.code {
        KeyCode::Esc => {
            state.book_form = None;
            state.mode = Mode::Normal;
        }
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Enter => {
            let form = form.clone();
            state.loading = true;
            return Some(AsyncCommand::SaveBook(form));
        }
        KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if form.focus.is_choice() => {
            form.cycle_choice();
        }
        KeyCode::Backspace => {
            if let Some(text) = form.focused_text() {
                text.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(text) = form.focused_text() {
                text.push(c);
            }
        }
        _ => {}
    }
    None
}

fn handle_confirm_delete_key(state: &mut AppState, key: KeyEvent) -> Option<AsyncCommand> {
    state.mode = Mode::Normal;
    match key.code {
        KeyCode::Char('y' | 'Y') => {
            let id = state.selected_my_book()?.id;
            state.loading = true;
            Some(AsyncCommand::DeleteBook(id))
        }
        _ => None,
    }
}

fn handle_exchange_key(state: &mut AppState, key: KeyEvent) -> Option<AsyncCommand> {
    let Some(modal) = state.exchange.as_mut() else {
        state.mode = Mode::Normal;
        return None;
    };
    if modal.submitting {
        return None;
    }

    match key.code {
        KeyCode::Esc => {
            state.exchange = None;
            state.mode = Mode::Normal;
        }
        KeyCode::Down | KeyCode::Tab => modal.select_next(),
        KeyCode::Up | KeyCode::BackTab => modal.select_prev(),
        KeyCode::Enter => {
            if modal.selected_offer().is_none() {
                state.set_status("List a book of your own first to offer it");
                return None;
            }
            modal.submitting = true;
            let modal = modal.clone();
            state.loading = true;
            return Some(AsyncCommand::SubmitExchange(modal));
        }
        KeyCode::Backspace => {
            modal.message.pop();
        }
        KeyCode::Char(c) => modal.message.push(c),
        _ => {}
    }
    None
}

fn handle_matches_key(state: &mut AppState, key: KeyEvent) -> Option<AsyncCommand> {
    let status = match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            state.select_next_match();
            return None;
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.select_prev_match();
            return None;
        }
        KeyCode::Char('r') => {
            state.loading = true;
            return Some(AsyncCommand::LoadMatches);
        }
        KeyCode::Char('a') => ExchangeStatus::Accepted,
        KeyCode::Char('x') => ExchangeStatus::Rejected,
        _ => return None,
    };

    let me = state.user_id()?;
    let request = state.selected_match()?.request.clone();
    if !exchange::can_respond(&request, me) {
        state.set_status("Only the owner can answer a pending request");
        return None;
    }
    state.loading = true;
    Some(AsyncCommand::Respond { request, status })
}

fn handle_profile_key(state: &mut AppState, key: KeyEvent) -> Option<AsyncCommand> {
    match key.code {
        KeyCode::Char('e') => {
            if let Some(profile) = &state.user {
                state.profile_form = ProfileForm::from_profile(profile);
                state.mode = Mode::ProfileEdit;
            }
            None
        }
        KeyCode::Char('r') => {
            state.loading = true;
            Some(AsyncCommand::LoadProfileStats)
        }
        _ => None,
    }
}

fn handle_profile_edit_key(state: &mut AppState, key: KeyEvent) -> Option<AsyncCommand> {
    let form = &mut state.profile_form;
    match key.code {
        KeyCode::Esc => {
            if let Some(profile) = &state.user {
                *form = ProfileForm::from_profile(profile);
            }
            state.mode = Mode::Normal;
        }
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            form.avatar_focused = !form.avatar_focused;
        }
        KeyCode::Enter => {
            let form = form.clone();
            state.loading = true;
            return Some(AsyncCommand::SaveProfile(form));
        }
        KeyCode::Backspace => {
            form.focused_mut().pop();
        }
        KeyCode::Char(c) => form.focused_mut().push(c),
        _ => {}
    }
    None
}

fn handle_theme_picker_key(state: &mut AppState, key: KeyEvent) {
    let themes = Theme::all();
    let len = themes.len();

    match key.code {
        KeyCode::Esc => {
            // Cancel: restore the configured theme
            state.theme = state.config.theme;
            state.mode = Mode::Normal;
        }
        KeyCode::Enter => {
            let selected_theme = Theme::from(themes[state.theme_picker_index]);
            state.theme = selected_theme;
            state.config.theme = selected_theme;

            state.mode = Mode::Normal;
            state.set_status(format!("✓ Theme set to {}", selected_theme.name()));
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.theme_picker_index = (state.theme_picker_index + 1) % len;
            // Preview theme
            state.theme = Theme::from(themes[state.theme_picker_index]);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.theme_picker_index = state.theme_picker_index.checked_sub(1).unwrap_or(len - 1);
            state.theme = Theme::from(themes[state.theme_picker_index]);
        }
        KeyCode::Home | KeyCode::Char('g') => {
            state.theme_picker_index = 0;
            state.theme = Theme::from(themes[state.theme_picker_index]);
        }
        KeyCode::End | KeyCode::Char('G') => {
            state.theme_picker_index = len - 1;
            state.theme = Theme::from(themes[state.theme_picker_index]);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{BookCondition, NewBook, Profile};
    use crate::pages::books::BooksView;
    use uuid::Uuid;

    fn press(state: &mut AppState, code: KeyCode) -> Option<AsyncCommand> {
        handle_key(state, KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn typed(state: &mut AppState, text: &str) {
        for c in text.chars() {
            press(state, KeyCode::Char(c));
        }
    }

    fn ready() -> AppState {
        let mut state = AppState::new(Config::default());
        state.session_loading = false;
        state
    }

    fn signed_in() -> AppState {
        let mut state = ready();
        state.signed_in(Profile::new(Uuid::new_v4(), "alice"));
        state
    }

    #[test]
    fn test_auth_form_typing_and_submit() {
        let mut state = ready();
        state.navigate(Route::Auth);
        typed(&mut state, "q@example.com");
        assert!(!state.should_quit);
        press(&mut state, KeyCode::Tab);
        typed(&mut state, "pw123456");

        let cmd = press(&mut state, KeyCode::Enter);
        assert!(matches!(cmd, Some(AsyncCommand::Authenticate(_))));
        assert!(state.auth_form.submitting);
    }

    #[test]
    fn test_auth_form_missing_email() {
        let mut state = ready();
        state.navigate(Route::Auth);
        assert!(press(&mut state, KeyCode::Enter).is_none());
        assert_eq!(state.auth_form.error.as_deref(), Some("email is required"));
    }

    #[test]
    fn test_home_enter_redirects_when_signed_out() {
        let mut state = ready();
        press(&mut state, KeyCode::Enter);
        assert_eq!(state.route, Route::Auth);
        assert_eq!(state.redirect_from, Some(Route::Books));
    }

    #[test]
    fn test_number_keys_navigate() {
        let mut state = signed_in();
        let cmd = press(&mut state, KeyCode::Char('3'));
        assert_eq!(state.route, Route::Matches);
        assert!(matches!(cmd, Some(AsyncCommand::LoadMatches)));
    }

    #[test]
    fn test_search_filters_on_each_keystroke() {
        let mut state = signed_in();
        let owner = Uuid::new_v4();
        let books = ["Dune", "Emma"]
            .iter()
            .map(|t| NewBook::new(owner, t, "X", "Fiction", BookCondition::Good, None).into_book(Uuid::new_v4()))
            .collect();
        state.books = BooksView::new(books);

        press(&mut state, KeyCode::Char('/'));
        assert_eq!(state.mode, Mode::Search);
        typed(&mut state, "em");
        assert_eq!(state.books.visible().len(), 1);
        press(&mut state, KeyCode::Esc);
        assert_eq!(state.books.visible().len(), 2);
        assert_eq!(state.mode, Mode::Normal);
    }

    #[test]
    fn test_own_book_cannot_be_requested() {
        let mut state = signed_in();
        let me = state.user_id().unwrap();
        let book = NewBook::new(me, "Dune", "X", "Fiction", BookCondition::Good, None).into_book(Uuid::new_v4());
        state.books = BooksView::new(vec![book]);
        assert!(press(&mut state, KeyCode::Enter).is_none());
    }

    #[test]
    fn test_delete_asks_first() {
        let mut state = signed_in();
        state.navigate(Route::MyBooks);
        let me = state.user_id().unwrap();
        let book = NewBook::new(me, "Dune", "X", "Fiction", BookCondition::Good, None).into_book(Uuid::new_v4());
        let id = book.id;
        state.set_my_books(vec![book]);

        assert!(press(&mut state, KeyCode::Char('d')).is_none());
        assert_eq!(state.mode, Mode::ConfirmDelete);
        let cmd = press(&mut state, KeyCode::Char('y'));
        assert!(matches!(cmd, Some(AsyncCommand::DeleteBook(d)) if d == id));
        assert_eq!(state.mode, Mode::Normal);
    }

    #[test]
    fn test_theme_picker_escape_restores() {
        let mut state = ready();
        let before = state.theme;
        press(&mut state, KeyCode::Char('t'));
        press(&mut state, KeyCode::Char('j'));
        press(&mut state, KeyCode::Esc);
        assert_eq!(state.theme, before);
        assert_eq!(state.mode, Mode::Normal);
    }
}
