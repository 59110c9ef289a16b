//! CLI command implementations.
//!
//! | Module     | Commands handled |
//! |------------|------------------|
//! | `serve`    | `Serve`          |
//! | `generate` | `Generate`       |
//! | `prefill`  | `Prefill`        |
//! | `config`   | `Config`         |

pub mod config;
pub mod generate;
pub mod prefill;
pub mod serve;

pub use config::cmd_config;
pub use generate::cmd_generate;
pub use prefill::cmd_prefill;
pub use serve::cmd_serve;
