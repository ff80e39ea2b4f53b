//! Store module.
//!
//! This module contains everything related to the local store: its
//! configuration, its schema, the migrations bringing older stores up
//! to date, and the queue of pending commands.

pub mod config;
pub use config::*;

pub mod error;
pub use error::{Error, Result};

pub mod migrations;

pub mod pending_command;
pub use pending_command::{
    PendingAppend, PendingCommand, PendingCommandEntry, PendingDelete, PendingExpunge,
    PendingMarkAllAsRead, PendingMoveOrCopy, PendingSetFlag,
};

pub mod registry;
pub use registry::StoreRegistry;

pub mod schema;
pub use schema::CURRENT_VERSION;

pub mod store;
pub use store::{LocalStore, MessageSummary};
