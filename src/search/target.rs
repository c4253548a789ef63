use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::errors::{SearchError, SearchResult};

/// Highest key slot a DESFire application can hold
pub const MAX_KEY_NUMBER: u8 = 13;

/// 16-bit application identifier.
///
/// On the card it is a 3-byte little-endian AID whose top byte is zero.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub struct ApplicationId(u16);

impl ApplicationId {
    pub fn new(aid: u16) -> Self {
        ApplicationId(aid)
    }

    pub fn value(self) -> u16 {
        self.0
    }

    pub fn to_bytes(self) -> [u8; 3] {
        let [lo, hi] = self.0.to_le_bytes();
        [lo, hi, 0x00]
    }
}

impl FromStr for ApplicationId {
    type Err = SearchError;

    fn from_str(s: &str) -> SearchResult<Self> {
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u16::from_str_radix(hex, 16),
            None => s.parse::<u16>(),
        };

        parsed
            .map(ApplicationId)
            .map_err(|_| SearchError::InvalidApplicationId(s.to_owned()))
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub struct KeyNumber(u8);

impl KeyNumber {
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for KeyNumber {
    type Error = SearchError;

    fn try_from(value: u8) -> SearchResult<Self> {
        if value > MAX_KEY_NUMBER {
            return Err(SearchError::InvalidKeyNumber(value.to_string()));
        }
        Ok(KeyNumber(value))
    }
}

impl FromStr for KeyNumber {
    type Err = SearchError;

    fn from_str(s: &str) -> SearchResult<Self> {
        let value = s
            .parse::<u8>()
            .map_err(|_| SearchError::InvalidKeyNumber(s.to_owned()))?;
        KeyNumber::try_from(value)
    }
}

impl fmt::Display for KeyNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Application and key slot every candidate is tried against
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub struct SearchTarget {
    pub aid: ApplicationId,
    pub key_no: KeyNumber,
}

impl SearchTarget {
    pub fn new(aid: ApplicationId, key_no: KeyNumber) -> Self {
        SearchTarget { aid, key_no }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_id_accepts_decimal_and_hex() {
        assert_eq!("4660".parse::<ApplicationId>().unwrap(), ApplicationId::new(0x1234));
        assert_eq!("0x1234".parse::<ApplicationId>().unwrap(), ApplicationId::new(0x1234));
        assert_eq!("0XfF".parse::<ApplicationId>().unwrap(), ApplicationId::new(0xff));
        assert_eq!(ApplicationId::new(0x1234).to_bytes(), hex!("34 12 00"));
        assert_eq!(ApplicationId::new(0xabc).to_string(), "0xabc");
    }

    #[test]
    fn application_id_rejects_garbage_and_overflow() {
        for value in ["", "0x", "12ab", "0x10000", "65536", "-1"] {
            assert!(
                matches!(
                    value.parse::<ApplicationId>(),
                    Err(SearchError::InvalidApplicationId(_))
                ),
                "{value}"
            );
        }
    }

    #[test]
    fn key_number_range() {
        assert_eq!("0".parse::<KeyNumber>().unwrap().value(), 0);
        assert_eq!("13".parse::<KeyNumber>().unwrap().value(), 13);
        assert!(matches!("14".parse::<KeyNumber>(), Err(SearchError::InvalidKeyNumber(_))));
        assert!(matches!("x".parse::<KeyNumber>(), Err(SearchError::InvalidKeyNumber(_))));
        assert!(KeyNumber::try_from(255).is_err());
    }
}
