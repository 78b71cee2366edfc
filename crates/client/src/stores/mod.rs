//! Dashboard state, its transition function and the selectors reading it.

pub mod reducer;
pub mod selectors;
pub mod state;
pub mod store;

pub use reducer::reduce;
pub use selectors::*;
pub use state::{DashboardState, FieldError};
pub use store::{Store, StoreHandle, Subscriber};
