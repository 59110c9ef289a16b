//! Structured signals recovered from the agent's free-text output.
//!
//! - repository URL (`https://github.com/<owner>/<repo>`) from the publish phase
//! - deployment URL (`https://<name>.vercel.app`) from the deploy phase
//! - validation verdict (`SAFE TO DEPLOY` / `PASSED` vs `CRITICAL` / `FAILED`)

mod parser;
mod types;

pub use parser::{SignalScanner, classify_verdict, find_url};
pub use types::{PhaseSignals, UrlKind, Verdict};
