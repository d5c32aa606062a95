//! Navigator — applies guard outcomes to the session store.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::guard::{self, GuardOutcome};
use super::screen::Screen;
use crate::session::SessionStore;

/// Redirect chains are at most two hops (e.g. /login → /dashboard →
/// /onboarding); anything longer means the guard table is inconsistent.
const MAX_REDIRECTS: usize = 4;

/// What the presenting layer should show after a navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Navigation {
    /// Session still loading; show the neutral placeholder.
    Pending { requested: Screen },
    /// Render `screen`. `redirects` lists the screens passed through on the
    /// way, in order, excluding the requested one.
    Render {
        requested: Screen,
        screen: Screen,
        redirects: Vec<Screen>,
    },
}

impl Navigation {
    /// The screen being rendered, if any.
    pub fn screen(&self) -> Option<Screen> {
        match self {
            Self::Pending { .. } => None,
            Self::Render { screen, .. } => Some(*screen),
        }
    }

    pub fn was_redirected(&self) -> bool {
        matches!(self, Self::Render { redirects, .. } if !redirects.is_empty())
    }
}

/// Resolves requested paths against the current session.
#[derive(Clone)]
pub struct Navigator {
    session: Arc<SessionStore>,
}

impl Navigator {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    pub async fn navigate(&self, path: &str) -> Navigation {
        self.navigate_to(Screen::from_path(path)).await
    }

    /// Evaluate the guard, following redirects and applying the
    /// returning-user promotion when asked to.
    pub async fn navigate_to(&self, requested: Screen) -> Navigation {
        let mut screen = requested;
        let mut redirects = Vec::new();
        let mut retried_promotion = false;

        loop {
            let status = self.session.status().await;
            match guard::evaluate(&status, screen) {
                GuardOutcome::Pending => return Navigation::Pending { requested },
                GuardOutcome::Allow => break,
                GuardOutcome::PromoteAndAllow => {
                    let user_id = status
                        .session()
                        .and_then(|s| s.identity())
                        .map(|i| i.id);
                    let promoted = match user_id {
                        Some(id) => self.session.promote_returning_user(id).await,
                        None => false,
                    };
                    if promoted || retried_promotion {
                        break;
                    }
                    // Session changed underneath us; evaluate again.
                    debug!(screen = %screen, "Promotion not applied, re-evaluating");
                    retried_promotion = true;
                }
                GuardOutcome::Redirect(to) => {
                    if redirects.len() >= MAX_REDIRECTS {
                        warn!(requested = %requested, at = %to, "Redirect loop, stopping");
                        break;
                    }
                    debug!(from = %screen, to = %to, "Guard redirect");
                    redirects.push(to);
                    screen = to;
                }
            }
        }

        Navigation::Render {
            requested,
            screen,
            redirects,
        }
    }

    /// Where a successful sign-in sends the user before guarding.
    pub fn after_sign_in() -> Screen {
        Screen::Dashboard
    }

    /// Where a successful sign-up sends the user before guarding.
    pub fn after_sign_up() -> Screen {
        Screen::Onboarding
    }
}
