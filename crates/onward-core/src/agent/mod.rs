//! Prompt assembly for the onward-journey assistant.

pub mod prompt;
