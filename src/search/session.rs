use serde::Serialize;

use crate::nfc::{DesfireKey, NfcResult};

use super::target::{ApplicationId, KeyNumber};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum AuthOutcome {
    Authenticated,
    /// The card did not accept the key. Expected for almost every candidate.
    Rejected,
}

/// A card session the search engine can try keys against.
///
/// The session is borrowed mutably for the whole search, so exactly one
/// search talks to a card at a time.
pub trait DesfireSession {
    fn select_application(&mut self, aid: ApplicationId) -> NfcResult<()>;

    /// `Err` means the session itself is broken, not that the key was wrong
    fn authenticate(&mut self, key_no: KeyNumber, key: &DesfireKey) -> NfcResult<AuthOutcome>;

    /// Called once per constructed key, right after its attempt
    fn release_key(&mut self, key: DesfireKey) {
        drop(key);
    }
}
