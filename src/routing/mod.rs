//! Client-side routing: the screen table, the route guard and a navigator
//! that applies the guard to the session store.

pub mod guard;
pub mod navigator;
pub mod screen;

pub use guard::{GuardOutcome, evaluate, landing_screen};
pub use navigator::{Navigation, Navigator};
pub use screen::{Requirements, Screen};
