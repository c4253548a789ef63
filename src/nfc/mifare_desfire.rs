use std::io::{Cursor, Read};
use std::str::FromStr;

use byteorder::ReadBytesExt;
use zeroize::Zeroize;

use super::utils::*;

pub use super::mifare_desfire_card::MiFareDESFireCard;

pub const STATUS_ADDITIONAL_FRAME: u8 = 0xAF;

pub const CMD_AUTHENTICATE_LEGACY: u8 = 0x0A;
pub const CMD_AUTHENTICATE_ISO: u8 = 0x1A;
pub const CMD_AUTHENTICATE_AES: u8 = 0xAA;
pub const CMD_SELECT_APPLICATION: u8 = 0x5A;
pub const CMD_GET_VERSION: u8 = 0x60;

/// Hardware type reported by GetVersion for MIFARE DESFire tags
pub const HARDWARE_TYPE_DESFIRE: u8 = 0x01;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Status {
    OperationOk,
    NoChanges,
    OutOfEepromError,
    IllegalCommandCode,
    IntegrityError,
    NoSuchKey,
    LengthError,
    PermissionDenied,
    ParameterError,
    ApplicationNotFound,
    ApplIntegrityError,
    AuthenticationError,
    AdditionalFrame,
    BoundaryError,
    PiccIntegrityError,
    CommandAborted,
    PiccDisabledError,
    CountError,
    DuplicateError,
    EepromError,
    FileNotFound,
    FileIntegrityError,
}

impl Status {
    pub fn parse(code: u8) -> NfcResult<Status> {
        Ok(match code {
            0x00 => Status::OperationOk,
            0x0C => Status::NoChanges,
            0x0E => Status::OutOfEepromError,
            0x1C => Status::IllegalCommandCode,
            0x1E => Status::IntegrityError,
            0x40 => Status::NoSuchKey,
            0x7E => Status::LengthError,
            0x9D => Status::PermissionDenied,
            0x9E => Status::ParameterError,
            0xA0 => Status::ApplicationNotFound,
            0xA1 => Status::ApplIntegrityError,
            0xAE => Status::AuthenticationError,
            0xAF => Status::AdditionalFrame,
            0xBE => Status::BoundaryError,
            0xC1 => Status::PiccIntegrityError,
            0xCA => Status::CommandAborted,
            0xCD => Status::PiccDisabledError,
            0xCE => Status::CountError,
            0xDE => Status::DuplicateError,
            0xEE => Status::EepromError,
            0xF0 => Status::FileNotFound,
            0xF1 => Status::FileIntegrityError,
            _ => return Err(NfcError::UnknownStatus(code)),
        })
    }

    pub fn code(self) -> u8 {
        match self {
            Status::OperationOk => 0x00,
            Status::NoChanges => 0x0C,
            Status::OutOfEepromError => 0x0E,
            Status::IllegalCommandCode => 0x1C,
            Status::IntegrityError => 0x1E,
            Status::NoSuchKey => 0x40,
            Status::LengthError => 0x7E,
            Status::PermissionDenied => 0x9D,
            Status::ParameterError => 0x9E,
            Status::ApplicationNotFound => 0xA0,
            Status::ApplIntegrityError => 0xA1,
            Status::AuthenticationError => 0xAE,
            Status::AdditionalFrame => 0xAF,
            Status::BoundaryError => 0xBE,
            Status::PiccIntegrityError => 0xC1,
            Status::CommandAborted => 0xCA,
            Status::PiccDisabledError => 0xCD,
            Status::CountError => 0xCE,
            Status::DuplicateError => 0xDE,
            Status::EepromError => 0xEE,
            Status::FileNotFound => 0xF0,
            Status::FileIntegrityError => 0xF1,
        }
    }

    /// Card rejected the presented key (as opposed to a broken session)
    pub fn is_rejection(self) -> bool {
        matches!(self, Status::AuthenticationError | Status::PermissionDenied)
    }

    pub fn to_result(self) -> NfcResult<()> {
        match self {
            Status::OperationOk | Status::NoChanges | Status::AdditionalFrame => Ok(()),
            _ => Err(NfcError::CardStatus(self)),
        }
    }
}

/// How native DESFire commands are put on the wire
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum Framing {
    /// `cmd data..` / `status data..`
    #[default]
    Native,
    /// ISO 7816-4 wrapping: `90 cmd 00 00 Lc data.. 00` / `data.. 91 status`
    Wrapped,
}

impl FromStr for Framing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(Framing::Native),
            "wrapped" | "iso" => Ok(Framing::Wrapped),
            _ => Err(format!("unknown framing '{s}', expected 'native' or 'wrapped'")),
        }
    }
}

impl Framing {
    pub fn wrap(self, command: u8, data: &[u8]) -> Vec<u8> {
        match self {
            Framing::Native => {
                let mut query = Vec::with_capacity(data.len() + 1);
                query.push(command);
                query.extend(data);
                query
            }
            Framing::Wrapped => {
                let mut query = Vec::with_capacity(data.len() + 6);
                query.extend([0x90, command, 0x00, 0x00]);
                if !data.is_empty() {
                    query.push(data.len() as u8);
                    query.extend(data);
                }
                query.push(0x00);
                query
            }
        }
    }

    pub fn unwrap(self, mut response: Vec<u8>) -> NfcResult<(Status, Vec<u8>)> {
        match self {
            Framing::Native => {
                if response.is_empty() {
                    return Err(NfcError::UnexpectedResponse("empty frame"));
                }
                let status = Status::parse(response.remove(0))?;
                Ok((status, response))
            }
            Framing::Wrapped => {
                if response.len() < 2 {
                    return Err(NfcError::UnexpectedResponse("frame without status word"));
                }
                let sw2 = response.pop().unwrap_or_default();
                let sw1 = response.pop().unwrap_or_default();
                if sw1 != 0x91 {
                    return Err(NfcError::CommunicationError(format!(
                        "ISO status word {sw1:02X} {sw2:02X}"
                    )));
                }
                Ok((Status::parse(sw2)?, response))
            }
        }
    }
}

/// Key material for one authentication attempt, tagged with its cipher.
///
/// The bytes are kept exactly as given; parity and version bits are left to
/// the card. The material is wiped when the key is dropped.
pub enum DesfireKey {
    Des([u8; 8]),
    TripleDes([u8; 16]),
    ThreeK3Des([u8; 24]),
    Aes([u8; 16]),
}

impl DesfireKey {
    pub fn des(raw: &[u8]) -> Self {
        let mut key = [0u8; 8];
        key.copy_from_slice(raw);
        DesfireKey::Des(key)
    }

    pub fn triple_des(raw: &[u8]) -> Self {
        let mut key = [0u8; 16];
        key.copy_from_slice(raw);
        DesfireKey::TripleDes(key)
    }

    pub fn three_k3des(raw: &[u8]) -> Self {
        let mut key = [0u8; 24];
        key.copy_from_slice(raw);
        DesfireKey::ThreeK3Des(key)
    }

    pub fn aes(raw: &[u8]) -> Self {
        let mut key = [0u8; 16];
        key.copy_from_slice(raw);
        DesfireKey::Aes(key)
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            DesfireKey::Des(key) => key,
            DesfireKey::TripleDes(key) => key,
            DesfireKey::ThreeK3Des(key) => key,
            DesfireKey::Aes(key) => key,
        }
    }

    pub fn auth_command(&self) -> u8 {
        match self {
            DesfireKey::Des(_) | DesfireKey::TripleDes(_) => CMD_AUTHENTICATE_LEGACY,
            DesfireKey::ThreeK3Des(_) => CMD_AUTHENTICATE_ISO,
            DesfireKey::Aes(_) => CMD_AUTHENTICATE_AES,
        }
    }

    /// Length of RndA and RndB exchanged during authentication
    pub fn challenge_len(&self) -> usize {
        match self {
            DesfireKey::Des(_) | DesfireKey::TripleDes(_) => 8,
            DesfireKey::ThreeK3Des(_) | DesfireKey::Aes(_) => 16,
        }
    }

    pub fn block_size(&self) -> usize {
        match self {
            DesfireKey::Aes(_) => 16,
            _ => 8,
        }
    }

    pub fn is_legacy(&self) -> bool {
        self.auth_command() == CMD_AUTHENTICATE_LEGACY
    }

    /// Same cipher and bytes; used by the simulated card to hold its own copy
    pub fn duplicate(&self) -> Self {
        match self {
            DesfireKey::Des(key) => DesfireKey::Des(*key),
            DesfireKey::TripleDes(key) => DesfireKey::TripleDes(*key),
            DesfireKey::ThreeK3Des(key) => DesfireKey::ThreeK3Des(*key),
            DesfireKey::Aes(key) => DesfireKey::Aes(*key),
        }
    }
}

impl std::fmt::Debug for DesfireKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DesfireKey::Des(_) => "Des",
            DesfireKey::TripleDes(_) => "TripleDes",
            DesfireKey::ThreeK3Des(_) => "ThreeK3Des",
            DesfireKey::Aes(_) => "Aes",
        };
        write!(f, "DesfireKey::{name}(..)")
    }
}

impl Drop for DesfireKey {
    fn drop(&mut self) {
        match self {
            DesfireKey::Des(key) => key.zeroize(),
            DesfireKey::TripleDes(key) => key.zeroize(),
            DesfireKey::ThreeK3Des(key) => key.zeroize(),
            DesfireKey::Aes(key) => key.zeroize(),
        }
    }
}

#[derive(Debug)]
pub struct VersionInformation {
    pub vendor_id: u8,
    pub card_type: u8,
    pub card_subtype: u8,
    pub major: u8,
    pub minor: u8,
    pub storage_size: u8,
    pub communication_protocol: u8,
}

impl Serializable for VersionInformation {
    fn from_bytes(cursor: &mut Cursor<&[u8]>) -> NfcResult<Self> {
        Ok(VersionInformation {
            vendor_id: cursor.read_u8()?,
            card_type: cursor.read_u8()?,
            card_subtype: cursor.read_u8()?,
            major: cursor.read_u8()?,
            minor: cursor.read_u8()?,
            storage_size: cursor.read_u8()?,
            communication_protocol: cursor.read_u8()?,
        })
    }
}

#[derive(Debug)]
pub struct Version {
    pub hardware: VersionInformation,
    pub software: VersionInformation,
    pub uid: [u8; 7],
    pub batch_nr: [u8; 5],
    pub calendar_week_of_production: u8,
    pub year_of_production: u8,
}

impl Serializable for Version {
    fn from_bytes(cursor: &mut Cursor<&[u8]>) -> NfcResult<Self> {
        let hardware = VersionInformation::from_bytes(cursor)?;
        let software = VersionInformation::from_bytes(cursor)?;
        let mut uid = [0u8; 7];
        cursor.read_exact(&mut uid)?;
        let mut batch_nr = [0u8; 5];
        cursor.read_exact(&mut batch_nr)?;

        Ok(Version {
            hardware,
            software,
            uid,
            batch_nr,
            calendar_week_of_production: cursor.read_u8()?,
            year_of_production: cursor.read_u8()?,
        })
    }
}

impl Version {
    pub fn is_desfire(&self) -> bool {
        self.hardware.card_type == HARDWARE_TYPE_DESFIRE
    }
}
