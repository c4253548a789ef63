use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::errors::{SearchError, SearchResult};
use crate::nfc::DesfireKey;

pub const AUTH_DES_KEYLEN: usize = 8;
pub const AUTH_3DES_KEYLEN: usize = 16;
pub const AUTH_3K3DES_KEYLEN: usize = 24;
pub const AUTH_AES_KEYLEN: usize = 16;

/// Authentication scheme, fixed for a whole search
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum AuthScheme {
    #[serde(rename = "AUTH_DES")]
    Des,
    #[serde(rename = "AUTH_3DES")]
    TripleDes,
    #[serde(rename = "AUTH_3K3DES")]
    ThreeK3Des,
    #[serde(rename = "AUTH_AES")]
    Aes,
}

/// What the search engine needs to know about a scheme
#[derive(Clone, Copy)]
pub struct SchemeBinding {
    pub key_len: usize,
    /// Wraps exactly `key_len` raw bytes, unaltered, into a key
    pub construct: fn(&[u8]) -> DesfireKey,
}

impl AuthScheme {
    pub const ALL: [AuthScheme; 4] = [
        AuthScheme::Des,
        AuthScheme::TripleDes,
        AuthScheme::ThreeK3Des,
        AuthScheme::Aes,
    ];

    pub fn resolve(self) -> SchemeBinding {
        match self {
            AuthScheme::Des => SchemeBinding {
                key_len: AUTH_DES_KEYLEN,
                construct: DesfireKey::des,
            },
            AuthScheme::TripleDes => SchemeBinding {
                key_len: AUTH_3DES_KEYLEN,
                construct: DesfireKey::triple_des,
            },
            AuthScheme::ThreeK3Des => SchemeBinding {
                key_len: AUTH_3K3DES_KEYLEN,
                construct: DesfireKey::three_k3des,
            },
            AuthScheme::Aes => SchemeBinding {
                key_len: AUTH_AES_KEYLEN,
                construct: DesfireKey::aes,
            },
        }
    }

    pub fn key_len(self) -> usize {
        self.resolve().key_len
    }

    pub fn name(self) -> &'static str {
        match self {
            AuthScheme::Des => "AUTH_DES",
            AuthScheme::TripleDes => "AUTH_3DES",
            AuthScheme::ThreeK3Des => "AUTH_3K3DES",
            AuthScheme::Aes => "AUTH_AES",
        }
    }
}

/// Numeric tags 0 to 3, in the order the schemes are listed
impl TryFrom<u8> for AuthScheme {
    type Error = SearchError;

    fn try_from(tag: u8) -> SearchResult<Self> {
        AuthScheme::ALL
            .get(tag as usize)
            .copied()
            .ok_or_else(|| SearchError::InvalidScheme(tag.to_string()))
    }
}

impl FromStr for AuthScheme {
    type Err = SearchError;

    fn from_str(s: &str) -> SearchResult<Self> {
        let upper = s.to_ascii_uppercase();
        let name = upper.strip_prefix("AUTH_").unwrap_or(&upper);

        match name {
            "DES" => Ok(AuthScheme::Des),
            "3DES" => Ok(AuthScheme::TripleDes),
            "3K3DES" => Ok(AuthScheme::ThreeK3Des),
            "AES" => Ok(AuthScheme::Aes),
            _ => Err(SearchError::InvalidScheme(s.to_owned())),
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
