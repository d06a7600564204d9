pub mod classifier;
pub mod policy;

pub use policy::{policy_for, ScoringPolicy};
