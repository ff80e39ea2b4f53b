pub mod backend;
pub use backend::*;

pub mod domain;
pub use domain::*;

pub mod store;
pub use store::{LocalStore, MessageSummary, PendingCommand, StoreConfig, StoreRegistry};
