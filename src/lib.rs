// One-shot analysis of an e-commerce delivery dataset.
//
// The stages run in a fixed order, each taking the previous stage's output:
// `loader::load_orders` -> `dates::enrich` -> `aggregate::summarize`
// -> `charts::render_all` / `output::write_workbook`.

pub mod aggregate;
pub mod charts;
pub mod config;
pub mod dates;
pub mod error;
pub mod loader;
pub mod output;
pub mod types;
pub mod util;

pub use config::AnalysisConfig;
pub use error::{AnalysisError, Result};
