//! Route table and session gate

/// A view reachable by path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Route {
    #[default]
    Home,
    Auth,
    Books,
    MyBooks,
    Matches,
    Profile,
    NotFound,
}

impl Route {
    /// Routes shown in the navigation bar when signed in
    pub const NAV_SIGNED_IN: &'static [Self] = &[Self::Books, Self::MyBooks, Self::Matches, Self::Profile];

    /// Map a path to its route. Unknown paths map to `NotFound`.
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Self::Home,
            "/auth" => Self::Auth,
            "/books" => Self::Books,
            "/my-books" => Self::MyBooks,
            "/matches" => Self::Matches,
            "/profile" => Self::Profile,
            _ => Self::NotFound,
        }
    }

    /// Canonical path of the route
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Auth => "/auth",
            Self::Books => "/books",
            Self::MyBooks => "/my-books",
            Self::Matches => "/matches",
            Self::Profile => "/profile",
            Self::NotFound => "/404",
        }
    }

    /// Title shown in the navigation bar
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Auth => "Sign In",
            Self::Books => "Browse Books",
            Self::MyBooks => "My Books",
            Self::Matches => "Matches",
            Self::Profile => "Profile",
            Self::NotFound => "Not Found",
        }
    }

    /// Whether the route requires a signed-in user
    pub const fn is_protected(&self) -> bool {
        matches!(self, Self::Books | Self::MyBooks | Self::Matches | Self::Profile)
    }
}

/// Outcome of gating a route against the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Session still initialising; show only a spinner
    Loading,
    /// Go elsewhere, remembering where the user was headed
    Redirect { to: Route, from: Option<Route> },
    Render(Route),
}

/// Gate a route. Pure function of the route and the session flags.
pub const fn resolve(route: Route, signed_in: bool, loading: bool) -> Resolution {
    if loading {
        return Resolution::Loading;
    }
    if route.is_protected() && !signed_in {
        return Resolution::Redirect {
            to: Route::Auth,
            from: Some(route),
        };
    }
    if matches!(route, Route::Auth) && signed_in {
        return Resolution::Redirect {
            to: Route::Books,
            from: None,
        };
    }
    Resolution::Render(route)
}

/// Where to go after signing in
pub fn after_sign_in(from: Option<Route>) -> Route {
    from.filter(|r| *r != Route::Auth && *r != Route::NotFound)
        .unwrap_or(Route::Books)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(Route::from_path("/"), Route::Home);
        assert_eq!(Route::from_path(""), Route::Home);
        assert_eq!(Route::from_path("/my-books"), Route::MyBooks);
        assert_eq!(Route::from_path("/books/"), Route::Books);
        assert_eq!(Route::from_path("/matches?tab=1"), Route::Matches);
        assert_eq!(Route::from_path("/nope"), Route::NotFound);
    }

    #[test]
    fn test_paths_roundtrip() {
        for route in [
            Route::Home,
            Route::Auth,
            Route::Books,
            Route::MyBooks,
            Route::Matches,
            Route::Profile,
        ] {
            assert_eq!(Route::from_path(route.path()), route);
        }
    }

    #[test]
    fn test_loading_renders_nothing_else() {
        assert_eq!(resolve(Route::Books, true, true), Resolution::Loading);
        assert_eq!(resolve(Route::Home, false, true), Resolution::Loading);
    }

    #[test]
    fn test_protected_route_redirects_signed_out_user() {
        assert_eq!(
            resolve(Route::Matches, false, false),
            Resolution::Redirect {
                to: Route::Auth,
                from: Some(Route::Matches)
            }
        );
        assert_eq!(resolve(Route::Matches, true, false), Resolution::Render(Route::Matches));
    }

    #[test]
    fn test_signed_in_user_leaves_auth() {
        assert_eq!(
            resolve(Route::Auth, true, false),
            Resolution::Redirect {
                to: Route::Books,
                from: None
            }
        );
        assert_eq!(resolve(Route::Auth, false, false), Resolution::Render(Route::Auth));
    }

    #[test]
    fn test_public_routes_render() {
        assert_eq!(resolve(Route::Home, false, false), Resolution::Render(Route::Home));
        assert_eq!(resolve(Route::NotFound, true, false), Resolution::Render(Route::NotFound));
    }

    #[test]
    fn test_after_sign_in() {
        assert_eq!(after_sign_in(Some(Route::Profile)), Route::Profile);
        assert_eq!(after_sign_in(None), Route::Books);
        assert_eq!(after_sign_in(Some(Route::Auth)), Route::Books);
    }
}
