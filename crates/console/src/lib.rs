//! Interactive console for operating Safe multisig wallets.

pub mod commands;
pub mod config;
pub mod contract;
pub mod contract_session;
pub mod error;
pub mod parser;
pub mod safe_session;
pub mod session;

pub use config::{load_settings, Settings};
pub use error::ConsoleError;
pub use parser::{Command, ParseError, PriorityGroup};
pub use session::{Console, LineOutcome, ModeKind, ServiceFactory};
