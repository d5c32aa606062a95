//! Route guard: decides whether a requested screen may render.
//!
//! `evaluate` is pure. The returning-user promotion it may ask for is applied
//! by the caller (see `Navigator`), which keeps the decision testable without
//! a session store.

use serde::Serialize;

use super::screen::Screen;
use crate::session::{Session, SessionStatus, is_returning_user};

/// Result of evaluating the guard for one navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "to", rename_all = "snake_case")]
pub enum GuardOutcome {
    /// Session still loading; render a neutral placeholder and do nothing.
    Pending,
    Allow,
    Redirect(Screen),
    /// Returning user on a screen that needs onboarding: mark the session
    /// onboarded, then render.
    PromoteAndAllow,
}

/// Where an authenticated visitor lands by default.
pub fn landing_screen(session: &Session) -> Screen {
    match session.identity() {
        None => Screen::Home,
        Some(identity) if session.is_onboarded() || is_returning_user(identity) => {
            Screen::Dashboard
        }
        Some(_) => Screen::Onboarding,
    }
}

/// Evaluate the guard for `screen` given the current session status.
pub fn evaluate(status: &SessionStatus, screen: Screen) -> GuardOutcome {
    let Some(session) = status.session() else {
        return GuardOutcome::Pending;
    };
    let req = screen.requirements();

    let Some(identity) = session.identity() else {
        return if req.requires_auth {
            GuardOutcome::Redirect(Screen::Login)
        } else {
            GuardOutcome::Allow
        };
    };

    if req.anonymous_only {
        return GuardOutcome::Redirect(landing_screen(session));
    }

    if req.requires_onboarding && !session.is_onboarded() {
        return if is_returning_user(identity) {
            GuardOutcome::PromoteAndAllow
        } else {
            GuardOutcome::Redirect(Screen::Onboarding)
        };
    }

    // The wizard runs once per identity.
    if screen == Screen::Onboarding && session.is_onboarded() {
        return GuardOutcome::Redirect(Screen::Dashboard);
    }

    GuardOutcome::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Identity;

    fn fresh() -> Identity {
        Identity::new("new@example.com")
    }

    fn returning() -> Identity {
        Identity::new("old@example.com").with_metadata("full_name", serde_json::json!("Old Timer"))
    }

    fn ready(session: Session) -> SessionStatus {
        SessionStatus::Ready(session)
    }

    #[test]
    fn loading_is_pending_for_every_screen() {
        for screen in Screen::ALL {
            assert_eq!(
                evaluate(&SessionStatus::Loading, screen),
                GuardOutcome::Pending
            );
        }
    }

    #[test]
    fn anonymous_never_renders_auth_screens() {
        let status = ready(Session::anonymous());
        for screen in Screen::ALL {
            let outcome = evaluate(&status, screen);
            if screen.requirements().requires_auth {
                assert_eq!(outcome, GuardOutcome::Redirect(Screen::Login));
            } else {
                assert_eq!(outcome, GuardOutcome::Allow);
            }
        }
    }

    #[test]
    fn signed_in_users_leave_anonymous_only_screens() {
        let onboarded = ready(Session::authenticated(fresh(), true));
        let not_onboarded = ready(Session::authenticated(fresh(), false));
        for screen in [Screen::Login, Screen::SignUp] {
            assert_eq!(
                evaluate(&onboarded, screen),
                GuardOutcome::Redirect(Screen::Dashboard)
            );
            assert_eq!(
                evaluate(&not_onboarded, screen),
                GuardOutcome::Redirect(Screen::Onboarding)
            );
        }
    }

    #[test]
    fn new_identity_is_sent_to_onboarding() {
        let status = ready(Session::authenticated(fresh(), false));
        assert_eq!(
            evaluate(&status, Screen::Dashboard),
            GuardOutcome::Redirect(Screen::Onboarding)
        );
        assert_eq!(evaluate(&status, Screen::Onboarding), GuardOutcome::Allow);
    }

    #[test]
    fn returning_identity_is_promoted_not_redirected() {
        let status = ready(Session::authenticated(returning(), false));
        assert_eq!(
            evaluate(&status, Screen::Dashboard),
            GuardOutcome::PromoteAndAllow
        );
        assert_eq!(
            evaluate(&status, Screen::Login),
            GuardOutcome::Redirect(Screen::Dashboard)
        );
    }

    #[test]
    fn onboarded_identity_skips_the_wizard() {
        let status = ready(Session::authenticated(fresh(), true));
        assert_eq!(evaluate(&status, Screen::Dashboard), GuardOutcome::Allow);
        assert_eq!(
            evaluate(&status, Screen::Onboarding),
            GuardOutcome::Redirect(Screen::Dashboard)
        );
        assert_eq!(evaluate(&status, Screen::Home), GuardOutcome::Allow);
        assert_eq!(evaluate(&status, Screen::NotFound), GuardOutcome::Allow);
    }

    #[test]
    fn landing_screen_per_phase() {
        assert_eq!(landing_screen(&Session::anonymous()), Screen::Home);
        assert_eq!(
            landing_screen(&Session::authenticated(fresh(), false)),
            Screen::Onboarding
        );
        assert_eq!(
            landing_screen(&Session::authenticated(returning(), false)),
            Screen::Dashboard
        );
    }
}
