//! Sonotype CLI library.
//!
//! The binary in `main.rs` parses arguments and dispatches into
//! [`commands`]. The CLI owns everything the core crates refuse to own:
//! file I/O, output formatting and the session snapshot. Trait values
//! are assembled once per command (file, then token, then explicit
//! overrides) and the core renderers see only that snapshot.

pub mod commands;
pub mod input;
