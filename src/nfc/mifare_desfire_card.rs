use log::trace;

use crate::search::session::{AuthOutcome, DesfireSession};
use crate::search::target::{ApplicationId, KeyNumber};

use super::mifare_desfire::*;
use super::mifare_utils::{self, ChainedCipher};
use super::nfc_card::CardTransport;
use super::utils::*;

/// GetVersion answers in three frames; anything longer is a confused card
const MAX_ADDITIONAL_FRAMES: usize = 8;

pub struct MiFareDESFireCard<T: CardTransport> {
    pub card: T,
    framing: Framing,
}

impl<T: CardTransport> MiFareDESFireCard<T> {
    pub fn new(card: T, framing: Framing) -> Self {
        MiFareDESFireCard { card, framing }
    }

    pub fn into_inner(self) -> T {
        self.card
    }

    fn transmit(&mut self, command: u8, data: &[u8]) -> NfcResult<(Status, Vec<u8>)> {
        let query = self.framing.wrap(command, data);
        trace!("  Send Command: l={}, data={}", query.len(), bytes_to_string(&query));

        let response = self.card.transmit(&query)?;
        trace!("   --> l={}, data={}", response.len(), bytes_to_string(&response));

        self.framing.unwrap(response)
    }

    /**
     * Command Set - Security Related Commands
     */

    /// Run the authentication handshake matching the key's cipher.
    ///
    /// A wrong key is `Ok(AuthOutcome::Rejected)`; only transport problems and
    /// unexpected card states are errors.
    #[allow(non_snake_case)]
    pub fn authenticate(&mut self, key_no: u8, key: &DesfireKey) -> NfcResult<AuthOutcome> {
        let rnd_len = key.challenge_len();

        let (status, ek_rndB) = self.transmit(key.auth_command(), &[key_no])?;
        match status {
            Status::AdditionalFrame => {}
            status if status.is_rejection() => return Ok(AuthOutcome::Rejected),
            status => return Err(NfcError::CardStatus(status)),
        }
        if ek_rndB.len() != rnd_len {
            return Err(NfcError::UnexpectedResponse("challenge has wrong length"));
        }

        let mut cipher = ChainedCipher::reader(key);
        let rndB = cipher.decipher(&ek_rndB)?;

        let rndA = mifare_utils::generate_challenge(rnd_len);
        let rndAshifted = mifare_utils::rotate_left(&rndA);

        let mut rndA_rndBshifted: Vec<u8> = Vec::with_capacity(rnd_len * 2);
        rndA_rndBshifted.extend(&rndA);
        rndA_rndBshifted.extend(mifare_utils::rotate_left(&rndB));

        let dk_rndA_rndBshifted = cipher.encipher(&rndA_rndBshifted)?;

        let (status, ek_rndAshifted_card) =
            self.transmit(STATUS_ADDITIONAL_FRAME, &dk_rndA_rndBshifted)?;
        match status {
            Status::OperationOk => {}
            status if status.is_rejection() => return Ok(AuthOutcome::Rejected),
            status => return Err(NfcError::CardStatus(status)),
        }
        if ek_rndAshifted_card.len() != rnd_len {
            return Err(NfcError::UnexpectedResponse("proof has wrong length"));
        }

        let rndAshifted_card = cipher.decipher(&ek_rndAshifted_card)?;
        if rndAshifted != rndAshifted_card {
            return Ok(AuthOutcome::Rejected);
        }

        Ok(AuthOutcome::Authenticated)
    }

    /**
     * Command Set - PICC Level Commands
     */

    pub fn select_application(&mut self, aid: [u8; 3]) -> NfcResult<()> {
        let (status, _) = self.transmit(CMD_SELECT_APPLICATION, &aid)?;
        status.to_result()
    }

    pub fn get_version(&mut self) -> NfcResult<Version> {
        let (mut status, mut result) = self.transmit(CMD_GET_VERSION, &[])?;
        status.to_result()?;

        let mut frames = 0;
        while status == Status::AdditionalFrame {
            frames += 1;
            if frames > MAX_ADDITIONAL_FRAMES {
                return Err(NfcError::UnexpectedResponse("too many additional frames"));
            }

            let (s, r) = self.transmit(STATUS_ADDITIONAL_FRAME, &[])?;
            s.to_result()?;
            status = s;
            result.extend(r);
        }

        Version::from_slice(&result)
    }
}

impl<T: CardTransport> DesfireSession for MiFareDESFireCard<T> {
    fn select_application(&mut self, aid: ApplicationId) -> NfcResult<()> {
        MiFareDESFireCard::select_application(self, aid.to_bytes())
    }

    fn authenticate(&mut self, key_no: KeyNumber, key: &DesfireKey) -> NfcResult<AuthOutcome> {
        MiFareDESFireCard::authenticate(self, key_no.value(), key)
    }
}
