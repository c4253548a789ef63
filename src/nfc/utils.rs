use std::io::Cursor;

use super::mifare_desfire::Status;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum NfcError {
    /// The reader or the card transport failed
    CommunicationError(String),
    /// The card answered with an error status
    CardStatus(Status),
    /// The card answered with a status byte outside the DESFire table
    UnknownStatus(u8),
    /// The card answered with a well formed but unexpected frame
    UnexpectedResponse(&'static str),
    ByteParseError,
    CryptoError,
}

pub type NfcResult<T> = Result<T, NfcError>;

impl std::fmt::Display for NfcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NfcError::CommunicationError(message) => write!(f, "communication error: {message}"),
            NfcError::CardStatus(status) => write!(f, "card returned {status:?}"),
            NfcError::UnknownStatus(code) => write!(f, "card returned unknown status 0x{code:02X}"),
            NfcError::UnexpectedResponse(what) => write!(f, "unexpected response: {what}"),
            NfcError::ByteParseError => write!(f, "cannot parse card response"),
            NfcError::CryptoError => write!(f, "block cipher error"),
        }
    }
}

impl std::error::Error for NfcError {}

impl From<pcsc::Error> for NfcError {
    fn from(err: pcsc::Error) -> Self {
        NfcError::CommunicationError(format!("{err}"))
    }
}

impl From<block_modes::BlockModeError> for NfcError {
    fn from(_err: block_modes::BlockModeError) -> Self {
        NfcError::CryptoError
    }
}

impl From<std::io::Error> for NfcError {
    fn from(_err: std::io::Error) -> Self {
        NfcError::ByteParseError
    }
}

pub fn bytes_to_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|x| format!("{:02X}", x))
        .collect::<Vec<String>>()
        .join(" ")
}

pub trait Serializable
where
    Self: std::marker::Sized,
{
    fn from_bytes(cursor: &mut Cursor<&[u8]>) -> NfcResult<Self>;

    fn from_slice(bytes: &[u8]) -> NfcResult<Self> {
        Self::from_bytes(&mut Cursor::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_are_rendered_as_spaced_hex() {
        assert_eq!(bytes_to_string(&hex!("0A FF 00")), "0A FF 00");
        assert_eq!(bytes_to_string(&[]), "");
    }

    #[test]
    fn short_input_is_a_parse_error() {
        struct Pair(u8, u8);
        impl Serializable for Pair {
            fn from_bytes(cursor: &mut Cursor<&[u8]>) -> NfcResult<Self> {
                use byteorder::ReadBytesExt;
                Ok(Pair(cursor.read_u8()?, cursor.read_u8()?))
            }
        }

        assert!(Pair::from_slice(&[1, 2]).is_ok());
        assert_eq!(Pair::from_slice(&[1]).err(), Some(NfcError::ByteParseError));
    }
}
