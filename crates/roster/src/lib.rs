//! `roster` - crew, mission and vessel records with a cross-linked flat-text store
//!
//! Records reference each other by key. The [`Store`] rebuilds live links in a
//! two-phase load, fans deletion notices out to every referencing record so
//! its field becomes a tombstone, and writes everything back through a
//! delimiter-based [`codec`] that nests child records inside their parent.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod record;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use record::{Entity, Handle, Kind, Record, RecordKey, Reference};
pub use store::{DeletionReport, LoadReport, SaveReport, Store};
