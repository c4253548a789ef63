pub mod mifare_desfire;
mod mifare_desfire_card;
pub mod mifare_desfire_simulation;
pub mod mifare_utils;
pub mod nfc_card;
pub mod nfc_reader;
pub mod utils;

pub use mifare_desfire::{DesfireKey, Framing, MiFareDESFireCard, Status};
pub use mifare_desfire_simulation::MiFareDESFireSimulation;
pub use nfc_card::{CardTransport, NfcCard};
pub use utils::{NfcError, NfcResult};
