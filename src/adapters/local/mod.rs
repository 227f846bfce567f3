//! Local adapters - tools run as child processes on this machine.

pub mod process;

pub use process::TokioProcessRunner;
