//! Utility modules shared across the pipeline.

pub mod plural;

pub use plural::plural_count;
