//! Deck GW: remote button deck server for OBS Studio
//!
//! Clients register a session, fetch a button layout and press buttons; each
//! press becomes an OBS WebSocket request. OBS status changes are pushed to
//! every connected watcher.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod hub;
pub mod models;
pub mod obs;
pub mod paths;
pub mod registry;
pub mod storage;

pub use error::{DeckError, Result};
