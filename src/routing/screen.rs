//! Screen table — client-side paths and their access requirements.

use serde::Serialize;

/// Access annotation carried by every screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    pub requires_auth: bool,
    pub requires_onboarding: bool,
    /// Only meaningful for signed-out visitors (sign-in, sign-up).
    pub anonymous_only: bool,
}

/// A navigable screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Home,
    Login,
    SignUp,
    Onboarding,
    Dashboard,
    NotFound,
}

impl Screen {
    pub const ALL: [Screen; 6] = [
        Screen::Home,
        Screen::Login,
        Screen::SignUp,
        Screen::Onboarding,
        Screen::Dashboard,
        Screen::NotFound,
    ];

    /// Resolve a path. Unknown paths map to `NotFound`.
    ///
    /// Query strings, fragments and a trailing slash are ignored.
    pub fn from_path(path: &str) -> Screen {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');
        match path {
            "" => Screen::Home,
            "/login" => Screen::Login,
            "/signup" => Screen::SignUp,
            "/onboarding" => Screen::Onboarding,
            "/dashboard" => Screen::Dashboard,
            _ => Screen::NotFound,
        }
    }

    /// Canonical path. `NotFound` has no canonical path of its own.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::SignUp => "/signup",
            Self::Onboarding => "/onboarding",
            Self::Dashboard => "/dashboard",
            Self::NotFound => "*",
        }
    }

    pub fn requirements(&self) -> Requirements {
        match self {
            Self::Home | Self::NotFound => Requirements::default(),
            Self::Login | Self::SignUp => Requirements {
                anonymous_only: true,
                ..Requirements::default()
            },
            Self::Onboarding => Requirements {
                requires_auth: true,
                ..Requirements::default()
            },
            Self::Dashboard => Requirements {
                requires_auth: true,
                requires_onboarding: true,
                anonymous_only: false,
            },
        }
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}
