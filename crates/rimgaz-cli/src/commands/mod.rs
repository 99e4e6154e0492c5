// Module exports for CLI subcommands.
//
// Each module handles one subcommand; main.rs parses arguments and dispatches.

pub mod replay;
pub mod zones;
