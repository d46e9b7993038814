pub mod common;
pub mod engine;
pub mod harness;
pub mod nexmark;
