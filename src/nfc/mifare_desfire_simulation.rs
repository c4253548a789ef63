use std::collections::HashMap;

use log::debug;

use super::mifare_desfire::*;
use super::mifare_utils::{self, ChainedCipher};
use super::nfc_card::CardTransport;
use super::utils::*;

const PICC_APPLICATION: [u8; 3] = [0x00, 0x00, 0x00];

const SIMULATED_VERSION: [u8; 28] = hex!(
    "04 01 01 01 00 18 05 04 01 01 01 04 18 05 04 5A 3C 1E 22 80 00 BA 54 43 10 20 2E 12"
);

#[allow(non_snake_case)]
struct PendingAuthentication {
    key_no: u8,
    key: DesfireKey,
    rndB: Vec<u8>,
}

/// In-memory MIFARE DESFire card.
///
/// Speaks the card side of SelectApplication, GetVersion and the three
/// authentication handshakes, so the reader code can be exercised without a
/// reader attached.
pub struct MiFareDESFireSimulation {
    applications: HashMap<[u8; 3], Vec<DesfireKey>>,
    framing: Framing,
    selected: [u8; 3],
    pending: Option<PendingAuthentication>,
    version_offset: Option<usize>,
    remove_after_selects: Option<usize>,
    pub selects: usize,
    pub authentications: usize,
    pub authenticated: Option<u8>,
}

impl MiFareDESFireSimulation {
    pub fn new() -> Self {
        let mut applications = HashMap::new();
        applications.insert(PICC_APPLICATION, vec![DesfireKey::des(&[0; 8])]);

        Self {
            applications,
            framing: Framing::Native,
            selected: PICC_APPLICATION,
            pending: None,
            version_offset: None,
            remove_after_selects: None,
            selects: 0,
            authentications: 0,
            authenticated: None,
        }
    }

    pub fn with_application(mut self, aid: [u8; 3], keys: Vec<DesfireKey>) -> Self {
        self.applications.insert(aid, keys);
        self
    }

    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    /// Pretend the card leaves the field once `selects` selections were answered
    pub fn remove_after_selects(mut self, selects: usize) -> Self {
        self.remove_after_selects = Some(selects);
        self
    }

    fn parse_query<'q>(&self, query: &'q [u8]) -> NfcResult<(u8, &'q [u8])> {
        match self.framing {
            Framing::Native => match query.split_first() {
                Some((command, data)) => Ok((*command, data)),
                None => Err(NfcError::UnexpectedResponse("empty command")),
            },
            Framing::Wrapped => {
                if query.len() < 5 || query[0] != 0x90 {
                    return Err(NfcError::UnexpectedResponse("not an ISO wrapped command"));
                }
                let data = if query.len() > 5 {
                    let lc = query[4] as usize;
                    query
                        .get(5..5 + lc)
                        .ok_or(NfcError::UnexpectedResponse("truncated command"))?
                } else {
                    &[]
                };
                Ok((query[1], data))
            }
        }
    }

    fn respond(&self, status: Status, data: &[u8]) -> Vec<u8> {
        let mut response = Vec::with_capacity(data.len() + 2);
        match self.framing {
            Framing::Native => {
                response.push(status.code());
                response.extend(data);
            }
            Framing::Wrapped => {
                response.extend(data);
                response.extend([0x91, status.code()]);
            }
        }
        response
    }

    fn select_application(&mut self, data: &[u8]) -> (Status, Vec<u8>) {
        self.authenticated = None;

        let aid: [u8; 3] = match data.try_into() {
            Ok(aid) => aid,
            Err(_) => return (Status::LengthError, Vec::new()),
        };
        if !self.applications.contains_key(&aid) {
            return (Status::ApplicationNotFound, Vec::new());
        }

        self.selected = aid;
        (Status::OperationOk, Vec::new())
    }

    #[allow(non_snake_case)]
    fn authenticate_phase1(&mut self, command: u8, data: &[u8]) -> NfcResult<(Status, Vec<u8>)> {
        self.authentications += 1;
        self.authenticated = None;

        let key_no = match data {
            [key_no] => *key_no,
            _ => return Ok((Status::LengthError, Vec::new())),
        };
        let key = match self
            .applications
            .get(&self.selected)
            .and_then(|keys| keys.get(key_no as usize))
        {
            Some(key) => key,
            None => return Ok((Status::NoSuchKey, Vec::new())),
        };
        if key.auth_command() != command {
            return Ok((Status::AuthenticationError, Vec::new()));
        }

        let rndB = mifare_utils::generate_challenge(key.challenge_len());
        let ek_rndB = ChainedCipher::card(key).encipher(&rndB)?;

        debug!("[MiFareDESFireSimulation] challenge for key {key_no}");
        self.pending = Some(PendingAuthentication {
            key_no,
            key: key.duplicate(),
            rndB,
        });

        Ok((Status::AdditionalFrame, ek_rndB))
    }

    #[allow(non_snake_case)]
    fn authenticate_phase2(
        &mut self,
        pending: PendingAuthentication,
        dk_rndA_rndBshifted: &[u8],
    ) -> NfcResult<(Status, Vec<u8>)> {
        let rnd_len = pending.key.challenge_len();
        if dk_rndA_rndBshifted.len() != rnd_len * 2 {
            return Ok((Status::LengthError, Vec::new()));
        }

        // replaying the challenge restores the chained IV
        let mut cipher = ChainedCipher::card(&pending.key);
        cipher.encipher(&pending.rndB)?;

        let rndA_rndBshifted = cipher.decipher(dk_rndA_rndBshifted)?;
        let (rndA, rndBshifted) = rndA_rndBshifted.split_at(rnd_len);
        if rndBshifted != mifare_utils::rotate_left(&pending.rndB).as_slice() {
            debug!("[MiFareDESFireSimulation] rndB mismatch, rejecting");
            return Ok((Status::AuthenticationError, Vec::new()));
        }

        let ek_rndAshifted = cipher.encipher(&mifare_utils::rotate_left(rndA))?;
        Ok((Status::OperationOk, ek_rndAshifted))
    }

    /// Hardware and software info come in frames of seven, the rest in one
    fn get_version(&mut self, offset: usize) -> (Status, Vec<u8>) {
        if offset >= 14 {
            return (Status::OperationOk, SIMULATED_VERSION[offset..].to_vec());
        }

        self.version_offset = Some(offset + 7);
        (
            Status::AdditionalFrame,
            SIMULATED_VERSION[offset..offset + 7].to_vec(),
        )
    }
}

impl Default for MiFareDESFireSimulation {
    fn default() -> Self {
        Self::new()
    }
}

impl CardTransport for MiFareDESFireSimulation {
    fn transmit(&mut self, query: &[u8]) -> NfcResult<Vec<u8>> {
        let (command, data) = self.parse_query(query)?;
        let pending = self.pending.take();
        let version_offset = self.version_offset.take();

        let (status, data) = match command {
            CMD_SELECT_APPLICATION => {
                if self.remove_after_selects == Some(self.selects) {
                    return Err(NfcError::CommunicationError("card removed".to_owned()));
                }
                self.selects += 1;
                self.select_application(data)
            }
            CMD_AUTHENTICATE_LEGACY | CMD_AUTHENTICATE_ISO | CMD_AUTHENTICATE_AES => {
                self.authenticate_phase1(command, data)?
            }
            CMD_GET_VERSION => self.get_version(0),
            STATUS_ADDITIONAL_FRAME => match (pending, version_offset) {
                (Some(pending), _) => {
                    let key_no = pending.key_no;
                    let (status, data) = self.authenticate_phase2(pending, data)?;
                    if status == Status::OperationOk {
                        self.authenticated = Some(key_no);
                    }
                    (status, data)
                }
                (None, Some(offset)) => self.get_version(offset),
                (None, None) => (Status::IllegalCommandCode, Vec::new()),
            },
            _ => (Status::IllegalCommandCode, Vec::new()),
        };

        Ok(self.respond(status, &data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::session::AuthOutcome;

    const APP: [u8; 3] = hex!("34 12 00");

    fn card_with(key: DesfireKey) -> MiFareDESFireCard<MiFareDESFireSimulation> {
        MiFareDESFireCard::new(
            MiFareDESFireSimulation::new().with_application(APP, vec![DesfireKey::des(&[0; 8]), key]),
            Framing::Native,
        )
    }

    #[test]
    fn every_scheme_authenticates_with_the_right_key() {
        let material: Vec<u8> = (0u8..24).collect();
        let keys = [
            DesfireKey::des(&material[..8]),
            DesfireKey::triple_des(&material[..16]),
            DesfireKey::three_k3des(&material[..24]),
            DesfireKey::aes(&material[..16]),
        ];

        for probe in &keys {
            let mut card = card_with(probe.duplicate());

            card.select_application(APP).unwrap();
            assert_eq!(card.authenticate(1, probe), Ok(AuthOutcome::Authenticated), "{probe:?}");
            assert_eq!(card.card.authenticated, Some(1));
        }
    }

    #[test]
    fn wrong_key_is_rejected() {
        let mut card = card_with(DesfireKey::aes(&[0x11; 16]));

        card.select_application(APP).unwrap();
        let outcome = card.authenticate(1, &DesfireKey::aes(&[0x12; 16]));
        assert_eq!(outcome, Ok(AuthOutcome::Rejected));
        assert_eq!(card.card.authenticated, None);
    }

    #[test]
    fn wrong_cipher_is_rejected_on_the_first_frame() {
        let mut card = card_with(DesfireKey::aes(&[0x11; 16]));

        card.select_application(APP).unwrap();
        let outcome = card.authenticate(1, &DesfireKey::triple_des(&[0x11; 16]));
        assert_eq!(outcome, Ok(AuthOutcome::Rejected));
    }

    #[test]
    fn missing_key_slot_is_an_error() {
        let mut card = card_with(DesfireKey::des(&[0x11; 8]));

        card.select_application(APP).unwrap();
        let outcome = card.authenticate(5, &DesfireKey::des(&[0x11; 8]));
        assert_eq!(outcome, Err(NfcError::CardStatus(Status::NoSuchKey)));
    }

    #[test]
    fn unknown_application_cannot_be_selected() {
        let mut card = card_with(DesfireKey::des(&[0x11; 8]));

        assert_eq!(
            card.select_application(hex!("99 99 00")),
            Err(NfcError::CardStatus(Status::ApplicationNotFound))
        );
    }

    #[test]
    fn wrapped_framing_round_trip() {
        let key = DesfireKey::three_k3des(&[0x5C; 24]);
        let mut card = MiFareDESFireCard::new(
            MiFareDESFireSimulation::new()
                .with_framing(Framing::Wrapped)
                .with_application(APP, vec![key.duplicate()]),
            Framing::Wrapped,
        );

        card.select_application(APP).unwrap();
        assert_eq!(card.authenticate(0, &key), Ok(AuthOutcome::Authenticated));
    }

    #[test]
    fn version_is_delivered_in_frames() {
        let mut card = card_with(DesfireKey::des(&[0; 8]));

        let version = card.get_version().unwrap();
        assert!(version.is_desfire());
        assert_eq!(version.uid, hex!("04 5A 3C 1E 22 80 00"));
    }

    #[test]
    fn removal_is_a_transport_error() {
        let mut card = MiFareDESFireCard::new(
            MiFareDESFireSimulation::new().remove_after_selects(1),
            Framing::Native,
        );

        assert!(card.select_application(PICC_APPLICATION).is_ok());
        assert!(matches!(
            card.select_application(PICC_APPLICATION),
            Err(NfcError::CommunicationError(_))
        ));
    }
}
