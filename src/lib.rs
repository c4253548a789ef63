#![allow(clippy::new_without_default)]

#[macro_use]
extern crate hex_literal;

mod errors;
pub use errors::*;

pub mod nfc;
pub mod report;
pub mod search;

pub use search::scheme::AuthScheme;
pub use search::session::{AuthOutcome, DesfireSession};
pub use search::target::{ApplicationId, KeyNumber, SearchTarget};
pub use search::{search, CancelToken, CandidateSource, KeySearch, SearchOutcome};
