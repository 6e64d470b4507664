//! Client-side routes and the header's navigation links.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A top-level page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    Home,
    About,
    Report,
}

impl Route {
    pub const ALL: [Route; 3] = [Route::Home, Route::About, Route::Report];

    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::About => "/about",
            Route::Report => "/report",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::About => "About",
            Route::Report => "Bug Report",
        }
    }

    /// Resolve a location path.
    ///
    /// ```rust
    /// use playpen_core::routes::Route;
    ///
    /// assert_eq!(Route::from_path("/about/"), Some(Route::About));
    /// assert_eq!(Route::from_path("/report?from=nav"), Some(Route::Report));
    /// assert_eq!(Route::from_path("/signin"), None);
    /// ```
    pub fn from_path(path: &str) -> Option<Route> {
        let path = normalize_path(path);
        Route::ALL.into_iter().find(|route| route.path() == path)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Drop query and fragment, add a leading slash, drop trailing slashes.
pub fn normalize_path(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path[..end].trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// A link in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
}

impl NavLink {
    /// The page this link opens, `None` for links without a page
    pub fn route(&self) -> Option<Route> {
        Route::from_path(self.href)
    }
}

/// Main navigation, left side of the header
pub const NAVIGATION: [NavLink; 3] = [
    NavLink {
        label: "Home",
        href: "/",
    },
    NavLink {
        label: "About",
        href: "/about",
    },
    NavLink {
        label: "Bug Report",
        href: "/report",
    },
];

/// Account buttons, right side of the header. Neither has a page.
pub const ACCOUNT_LINKS: [NavLink; 2] = [
    NavLink {
        label: "Register",
        href: "/register",
    },
    NavLink {
        label: "Sign In",
        href: "/signin",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_paths_resolve_to_themselves() {
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("about"), "/about");
        assert_eq!(normalize_path("/about//"), "/about");
        assert_eq!(normalize_path("/#top"), "/");
        assert_eq!(normalize_path("/report?x=1#y"), "/report");
    }

    #[test]
    fn test_navigation_links() {
        let routes: Vec<Option<Route>> = NAVIGATION.iter().map(NavLink::route).collect();
        assert_eq!(routes, vec![Some(Route::Home), Some(Route::About), Some(Route::Report)]);
        assert!(ACCOUNT_LINKS.iter().all(|link| link.route().is_none()));
    }

    #[test]
    fn test_unknown_paths() {
        assert_eq!(Route::from_path("/About"), None);
        assert_eq!(Route::from_path("/about/team"), None);
        assert_eq!(Route::from_path("/register"), None);
    }
}
