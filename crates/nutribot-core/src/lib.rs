pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::NutribotConfig;
pub use error::{NutribotError, Result};
pub use events::{DomainEvent, EventBus, FallbackReason};
pub use types::*;
