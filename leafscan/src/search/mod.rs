//! Searching final folders.
//!
//! `Scanner` drives a whole run: discovery fans out one task per top-level
//! subtree, then every final folder gets its own search task. Both phases
//! share one `MatchEngine`, so a term is compiled once per run.
//!
//! ```rust,ignore
//! let scanner = Scanner::new(&config, ExtractorRegistry::with_defaults())?;
//! let report = scanner.run(&roots, "anna")?;
//! for outcome in report.matches() {
//!     println!("{}: {}", outcome.name, outcome.match_details.as_ref().unwrap());
//! }
//! ```
pub mod engine;
pub mod matcher;

pub use engine::{Discovery, Scanner};
pub use matcher::MatchEngine;
