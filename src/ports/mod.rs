//! Ports - Traits the application layer is written against.

pub mod process;
