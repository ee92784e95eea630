//! Core of `sleuth`: an investigator and a referee, both backed by a
//! completion model, play out a detective case until it is solved or the
//! iteration budget runs out.

pub mod agents;
pub mod case;
pub mod config;
pub mod error;
pub mod extract;
pub mod investigation;
pub mod memory;
mod prompts;
pub mod providers;
pub mod report;
pub mod retry;
pub mod transcript;

pub use case::CaseBundle;
pub use config::SleuthConfig;
pub use error::{SleuthError, SleuthResult};
pub use investigation::{Investigation, Phase};
pub use report::{InvestigationReport, Termination};
