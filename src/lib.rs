pub mod agent;
pub mod business;
pub mod config;
pub mod errors;
pub mod jobs;
pub mod logging;
pub mod prefill;
pub mod prompts;
pub mod server;
pub mod signals;
pub mod stream;
pub mod ui;
pub mod util;
pub mod workflow;
