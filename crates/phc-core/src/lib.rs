//! Core of the PHC Radio client: everything that runs without a terminal.
//!
//! The TUI crate owns rendering, mpv and the event loop; this crate owns the
//! metadata pipeline, enrichment, feed transport, theme persistence and config.

pub mod config;
pub mod debounce;
pub mod enrich;
pub mod feed;
pub mod history;
pub mod metadata;
pub mod pipeline;
pub mod platform;
pub mod storage;
pub mod theme;
