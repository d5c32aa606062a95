//! Session — who is signed in and whether they finished onboarding.
//!
//! The `SessionStore` is the single writer of session state. It is injected
//! wherever the session is read or changed and exposes exactly three
//! transitions: sign-in (or sign-up), sign-out, and onboarding completion.
//! The route guard may additionally promote a returning user once.

pub mod forms;
pub mod identity;
pub mod model;
pub mod policy;
pub mod store;

pub use forms::{LoginForm, SignUpForm};
pub use identity::{IdentityProvider, MemoryIdentityProvider};
pub use model::{Identity, Session, SessionEvent, SessionPhase, SessionStatus};
pub use policy::is_returning_user;
pub use store::SessionStore;
