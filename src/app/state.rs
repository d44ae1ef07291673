//! Application state

use uuid::Uuid;

use super::async_ops::AsyncCommand;
use crate::config::Config;
use crate::models::{Book, ExchangeRequestDetails, Profile};
use crate::pages::auth::AuthForm;
use crate::pages::books::BooksView;
use crate::pages::exchange_modal::ExchangeModal;
use crate::pages::my_books::BookForm;
use crate::pages::profile::{ProfileForm, ProfileStats};
use crate::router::{self, Resolution, Route};
use crate::theme::Theme;

/// Routes shown in the navigation bar when signed out
const NAV_SIGNED_OUT: &[Route] = &[Route::Home, Route::Auth];

/// Input mode (what receives key presses)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Help,
    ThemePicker,
    /// Typing into the book search box
    Search,
    /// Add/edit book popup
    BookForm,
    /// Request-exchange modal
    Exchange,
    /// Editing the profile form
    ProfileEdit,
    /// Waiting for y/n before deleting a listing
    ConfirmDelete,
}

/// Application state
pub struct AppState {
    pub config: Config,
    pub should_quit: bool,
    pub theme: Theme,
    /// Selected index in the theme picker
    pub theme_picker_index: usize,
    pub mode: Mode,

    /// Route being shown
    pub route: Route,
    /// Protected route the user was sent away from
    pub redirect_from: Option<Route>,
    /// Signed-in profile, mirrored from the worker's session store
    pub user: Option<Profile>,
    /// Session still initialising
    pub session_loading: bool,

    pub auth_form: AuthForm,
    pub books: BooksView,
    pub my_books: Vec<Book>,
    pub selected_my_book: usize,
    pub book_form: Option<BookForm>,
    pub exchange: Option<ExchangeModal>,
    pub matches: Vec<ExchangeRequestDetails>,
    pub selected_match: usize,
    pub profile_stats: Option<ProfileStats>,
    pub profile_form: ProfileForm,

    /// Status message (bottom bar)
    pub status: String,
    /// Waiting on the worker
    pub loading: bool,

    /// Tick counter for animations
    tick: u64,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let theme = config.theme;
        Self {
            config,
            should_quit: false,
            theme,
            theme_picker_index: 0,
            mode: Mode::Normal,
            route: Route::Home,
            redirect_from: None,
            user: None,
            session_loading: true,
            auth_form: AuthForm::default(),
            books: BooksView::default(),
            my_books: Vec::new(),
            selected_my_book: 0,
            book_form: None,
            exchange: None,
            matches: Vec::new(),
            selected_match: 0,
            profile_stats: None,
            profile_form: ProfileForm::default(),
            status: String::new(),
            loading: false,
            tick: 0,
        }
    }

    /// Tick for animations
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status = msg.into();
    }

    pub fn clear_status(&mut self) {
        self.status.clear();
    }

    pub const fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user.as_ref().map(|p| p.id)
    }

    /// Routes the navigation bar offers right now
    pub const fn nav_routes(&self) -> &'static [Route] {
        if self.is_signed_in() {
            Route::NAV_SIGNED_IN
        } else {
            NAV_SIGNED_OUT
        }
    }

    /// Gate `route` against the session and switch to whatever it resolves to.
    ///
    /// Returns the command that loads the view's data, if any.
    pub fn navigate(&mut self, route: Route) -> Option<AsyncCommand> {
        match router::resolve(route, self.is_signed_in(), self.session_loading) {
            Resolution::Loading => {
                self.route = route;
                None
            }
            Resolution::Redirect { to, from } => {
                if from.is_some() {
                    self.redirect_from = from;
                }
                self.navigate(to)
            }
            Resolution::Render(route) => {
                self.route = route;
                self.mode = Mode::Normal;
                let cmd = Self::load_command(route);
                self.loading = cmd.is_some();
                cmd
            }
        }
    }

    /// Re-run the gate for the current route (after the session changes)
    pub fn reroute(&mut self) -> Option<AsyncCommand> {
        self.navigate(self.route)
    }

    /// Data a view fetches when opened
    fn load_command(route: Route) -> Option<AsyncCommand> {
        match route {
            Route::Books => Some(AsyncCommand::LoadBooks),
            Route::MyBooks => Some(AsyncCommand::LoadMyBooks),
            Route::Matches => Some(AsyncCommand::LoadMatches),
            Route::Profile => Some(AsyncCommand::LoadProfileStats),
            Route::Home | Route::Auth | Route::NotFound => None,
        }
    }

    pub fn next_route(&mut self) -> Option<AsyncCommand> {
        let routes = self.nav_routes();
        let idx = routes.iter().position(|r| *r == self.route);
        let next = idx.map_or(routes[0], |i| routes[(i + 1) % routes.len()]);
        self.navigate(next)
    }

    pub fn prev_route(&mut self) -> Option<AsyncCommand> {
        let routes = self.nav_routes();
        let len = routes.len();
        let idx = routes.iter().position(|r| *r == self.route);
        let prev = idx.map_or(routes[len - 1], |i| routes[(i + len - 1) % len]);
        self.navigate(prev)
    }

    /// Session established: go where the user was headed
    pub fn signed_in(&mut self, profile: Profile) -> Option<AsyncCommand> {
        self.set_status(format!("Signed in as {}", profile.username));
        self.profile_form = ProfileForm::from_profile(&profile);
        self.user = Some(profile);
        self.auth_form = AuthForm::default();
        let target = router::after_sign_in(self.redirect_from.take());
        self.navigate(target)
    }

    /// Session gone: drop everything loaded for the old user
    pub fn signed_out(&mut self) -> Option<AsyncCommand> {
        self.user = None;
        self.books = BooksView::default();
        self.my_books.clear();
        self.selected_my_book = 0;
        self.book_form = None;
        self.exchange = None;
        self.matches.clear();
        self.selected_match = 0;
        self.profile_stats = None;
        self.profile_form = ProfileForm::default();
        self.redirect_from = None;
        self.navigate(Route::Home)
    }

    pub fn selected_my_book(&self) -> Option<&Book> {
        self.my_books.get(self.selected_my_book)
    }

    pub fn select_next_my_book(&mut self) {
        if !self.my_books.is_empty() {
            self.selected_my_book = (self.selected_my_book + 1).min(self.my_books.len() - 1);
        }
    }

    pub fn select_prev_my_book(&mut self) {
        self.selected_my_book = self.selected_my_book.saturating_sub(1);
    }

    pub fn selected_match(&self) -> Option<&ExchangeRequestDetails> {
        self.matches.get(self.selected_match)
    }

    pub fn select_next_match(&mut self) {
        if !self.matches.is_empty() {
            self.selected_match = (self.selected_match + 1).min(self.matches.len() - 1);
        }
    }

    pub fn select_prev_match(&mut self) {
        self.selected_match = self.selected_match.saturating_sub(1);
    }

    /// Replace the user's listings, keeping the selection in range
    pub fn set_my_books(&mut self, books: Vec<Book>) {
        self.my_books = books;
        self.selected_my_book = self
            .selected_my_book
            .min(self.my_books.len().saturating_sub(1));
    }

    pub fn set_matches(&mut self, matches: Vec<ExchangeRequestDetails>) {
        self.matches = matches;
        self.selected_match = self.selected_match.min(self.matches.len().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new(Config::default())
    }

    fn alice() -> Profile {
        Profile::new(Uuid::new_v4(), "alice")
    }

    #[test]
    fn test_nothing_routes_while_loading() {
        let mut state = state();
        assert!(state.navigate(Route::Books).is_none());
        assert_eq!(state.route, Route::Books);
        assert!(state.redirect_from.is_none());
    }

    #[test]
    fn test_protected_route_redirects_and_returns_after_sign_in() {
        let mut state = state();
        state.session_loading = false;
        state.navigate(Route::Matches);
        assert_eq!(state.route, Route::Auth);
        assert_eq!(state.redirect_from, Some(Route::Matches));

        let cmd = state.signed_in(alice());
        assert_eq!(state.route, Route::Matches);
        assert!(matches!(cmd, Some(AsyncCommand::LoadMatches)));
        assert!(state.loading);
        assert!(state.redirect_from.is_none());
    }

    #[test]
    fn test_sign_in_without_redirect_opens_books() {
        let mut state = state();
        state.session_loading = false;
        state.navigate(Route::Auth);
        let cmd = state.signed_in(alice());
        assert_eq!(state.route, Route::Books);
        assert!(matches!(cmd, Some(AsyncCommand::LoadBooks)));
    }

    #[test]
    fn test_auth_redirects_when_signed_in() {
        let mut state = state();
        state.session_loading = false;
        state.user = Some(alice());
        state.navigate(Route::Auth);
        assert_eq!(state.route, Route::Books);
    }

    #[test]
    fn test_tab_cycles_nav_routes() {
        let mut state = state();
        state.session_loading = false;
        state.user = Some(alice());
        state.navigate(Route::Profile);
        state.next_route();
        assert_eq!(state.route, Route::Books);
        state.prev_route();
        assert_eq!(state.route, Route::Profile);
    }

    #[test]
    fn test_sign_out_clears_user_data() {
        let mut state = state();
        state.session_loading = false;
        state.signed_in(alice());
        state.profile_stats = Some(ProfileStats::default());
        state.signed_out();
        assert!(state.user.is_none());
        assert!(state.profile_stats.is_none());
        assert_eq!(state.route, Route::Home);
    }
}
