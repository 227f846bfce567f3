//! Domain layer - Pure business logic.

// Input scanning
pub mod discovery;

// Candidates, jobs and their outcomes
pub mod jobs;

// External tool invocations
pub mod stage;
