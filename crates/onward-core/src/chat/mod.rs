//! Turn orchestration: recall, fast-answer reuse, prompt assembly, inference.

pub mod service;
