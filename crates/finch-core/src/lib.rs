pub mod commands;
pub mod contracts;
pub mod dedupe;
pub mod error;
pub mod migrations;
pub mod model;
pub mod normalize;
pub mod providers;
pub mod store;
pub mod sync;

pub use contracts::envelope::{FailureEnvelope, SuccessEnvelope};
pub use error::{CoreError, CoreResult};

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
