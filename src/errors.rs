use crate::nfc::NfcError;

/// Everything that can stop a key search.
///
/// A rejected key is not an error; it is the normal way a search advances.
#[derive(Debug)]
pub enum SearchError {
    InvalidScheme(String),

    InvalidKeyNumber(String),

    InvalidApplicationId(String),

    /// The candidate source cannot hold a single key of the selected scheme
    InsufficientMaterial { available: usize, required: usize },

    Io(std::io::Error),

    /// Selection or transport failed; the remaining candidates are not tried
    SessionFault(&'static str, NfcError),
}

impl SearchError {
    /// Rejected before any card was touched
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SearchError::InvalidScheme(_)
                | SearchError::InvalidKeyNumber(_)
                | SearchError::InvalidApplicationId(_)
                | SearchError::InsufficientMaterial { .. }
        )
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            SearchError::SessionFault(..) => 3,
            _ => 2,
        }
    }
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchError::InvalidScheme(value) => write!(
                f,
                "Invalid authentication type '{value}', expected one of AUTH_DES, AUTH_3DES, AUTH_3K3DES, AUTH_AES"
            ),
            SearchError::InvalidKeyNumber(value) => write!(
                f,
                "Incorrect value '{value}' for key. Key must be in the range 0-13."
            ),
            SearchError::InvalidApplicationId(value) => write!(
                f,
                "Incorrect value '{value}' for AID. Specify as decimal or hex with leading 0x."
            ),
            SearchError::InsufficientMaterial {
                available,
                required,
            } => write!(
                f,
                "File length too short for key material ({available} bytes, need at least {required})."
            ),
            SearchError::Io(error) => write!(f, "{error}"),
            SearchError::SessionFault(operation, error) => write!(f, "{operation} failed: {error}"),
        }
    }
}

impl std::error::Error for SearchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SearchError::Io(error) => Some(error),
            SearchError::SessionFault(_, error) => Some(error),
            _ => None,
        }
    }
}

/// Helper for `SearchError` result
pub type SearchResult<T> = Result<T, SearchError>;

impl From<std::io::Error> for SearchError {
    fn from(error: std::io::Error) -> Self {
        SearchError::Io(error)
    }
}
