//! # velomark
//!
//! Model-based differential conformance harness for Nexmark queries.
//!
//! Every query in the suite is executed against a synthetic Nexmark auction
//! stream in two modes, batch and streaming, and its output is checked against
//! a reference model computed independently from the same configuration.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use velomark::velomark::config::HarnessConfig;
//! use velomark::velomark::harness::{ScenarioRegistry, SuiteRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = ScenarioRegistry::nexmark()?;
//!     let report = SuiteRunner::new(HarnessConfig::default())
//!         .run(&registry)
//!         .await?;
//!     std::process::exit(report.exit_code());
//! }
//! ```

// Allow certain clippy warnings for development
#![allow(clippy::derivable_impls)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::needless_doctest_main)]
#![allow(clippy::large_enum_variant)]

pub mod velomark;
