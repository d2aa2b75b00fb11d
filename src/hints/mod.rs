// src/hints/mod.rs - Closed vocabularies and lookup tables for the engine

pub mod catalog;
pub mod policy;
pub mod trigger;

pub use catalog::HintCategory;
pub use policy::{FrequencyClass, FrequencyPolicy, ProficiencyLevel};
pub use trigger::TriggerKind;
