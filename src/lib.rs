// src/lib.rs - Library root for callhint

pub mod cli;
pub mod engine;
pub mod hints;
pub mod infra;
pub mod learner;
pub mod memory;
