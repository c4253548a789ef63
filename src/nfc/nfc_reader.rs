use std::ffi::CString;

use log::{info, warn};
use pcsc::*;

use super::mifare_desfire::Framing;
use super::utils::*;
use super::{MiFareDESFireCard, NfcCard};

pub fn list_readers(ctx: &Context) -> NfcResult<Vec<CString>> {
    let mut readers_buf = [0; 2048];
    let names = ctx.list_readers(&mut readers_buf)?;

    Ok(names.map(|name| name.to_owned()).collect())
}

/// Connect to the first DESFire tag in range.
///
/// With `reader` set only readers whose name contains it are considered.
/// Tags that do not identify as DESFire are skipped.
pub fn connect_desfire(
    reader: Option<&str>,
    framing: Framing,
) -> NfcResult<(String, MiFareDESFireCard<NfcCard>)> {
    let ctx = Context::establish(Scope::User)?;

    let readers = list_readers(&ctx)?;
    if readers.is_empty() {
        return Err(NfcError::CommunicationError("no NFC reader found".to_owned()));
    }

    for name in readers {
        let display_name = name.to_str().unwrap_or("unknown").to_owned();
        if let Some(filter) = reader {
            if !display_name.contains(filter) {
                continue;
            }
        }

        let card = match ctx.connect(&name, ShareMode::Exclusive, Protocols::ANY) {
            Ok(card) => NfcCard::new(card),
            Err(Error::NoSmartcard) | Err(Error::RemovedCard) => {
                info!("No card on reader {}", display_name);
                continue;
            }
            Err(e) => {
                warn!("Cannot connect to card on reader {}: {}", display_name, e);
                continue;
            }
        };

        if let Ok(atr) = card.get_atr() {
            info!("Card on {} with ATR {}", display_name, bytes_to_string(&atr));
        }

        let mut card = MiFareDESFireCard::new(card, framing);
        match card.get_version() {
            Ok(version) if version.is_desfire() => {
                info!(
                    "DESFire tag {} on reader {}",
                    bytes_to_string(&version.uid),
                    display_name
                );
                return Ok((display_name, card));
            }
            Ok(version) => {
                warn!(
                    "Tag is not DESFIRE: hardware type {:02X}",
                    version.hardware.card_type
                );
            }
            Err(e) => {
                warn!("Tag on reader {} did not answer GetVersion: {}", display_name, e);
            }
        }
    }

    Err(NfcError::CommunicationError(match reader {
        Some(filter) => format!("no DESFire tag on a reader matching '{filter}'"),
        None => "no DESFire tag found".to_owned(),
    }))
}
