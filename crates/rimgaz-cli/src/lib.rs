//! Rimgaz CLI library.
//!
//! Subcommand handlers plus the text/JSON renderers and terminal styling
//! they share.

pub mod commands;
pub mod output;
pub mod terminal;

#[cfg(test)]
pub(crate) mod test_helpers;
