//! CLI command implementations.

mod clips;
mod config;
mod doctor;
mod run;

pub use clips::run_clips;
pub use config::run_config;
pub use doctor::run_doctor;
pub use run::run_pipeline;
