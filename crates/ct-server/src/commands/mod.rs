//! Offline subcommands of the `ct` binary.

pub mod canon;
pub mod keygen;
pub mod verify;
