//! World city explorer: a braille globe and flat map of the world's great
//! cities, with per-city detail panels, CSV export and an HTTP API.

pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod detail;
pub mod error;
pub mod export;
pub mod figure;
pub mod format;
pub mod map;
pub mod server;
pub mod state;
pub mod telemetry;
pub mod ui;

pub use error::{Error, Result};
