use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{info, trace};

use crate::errors::{SearchError, SearchResult};

pub mod extractor;
pub mod progress;
pub mod scheme;
pub mod session;
pub mod target;

use extractor::extract;
use progress::{NoProgress, SearchObserver};
use scheme::{AuthScheme, SchemeBinding};
use session::{AuthOutcome, DesfireSession};
use target::SearchTarget;

/// Candidate key material, read once and never modified
#[derive(Debug, Clone)]
pub struct CandidateSource {
    bytes: Arc<[u8]>,
}

impl CandidateSource {
    pub fn load<P: AsRef<Path>>(path: P) -> SearchResult<Self> {
        let bytes = std::fs::read(path)?;
        Ok(CandidateSource::from(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for CandidateSource {
    fn from(bytes: Vec<u8>) -> Self {
        CandidateSource {
            bytes: bytes.into(),
        }
    }
}

/// Asks a running search to stop before its next attempt.
///
/// An attempt that already started always completes, so the card never sees
/// half a handshake.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum SearchOutcome {
    Found {
        offset: usize,
        key: Vec<u8>,
        attempts: usize,
    },
    Exhausted {
        attempts: usize,
    },
    Cancelled {
        attempts: usize,
    },
}

impl SearchOutcome {
    pub fn attempts(&self) -> usize {
        match self {
            SearchOutcome::Found { attempts, .. }
            | SearchOutcome::Exhausted { attempts }
            | SearchOutcome::Cancelled { attempts } => *attempts,
        }
    }
}

/// A validated search: scheme resolved and material long enough for one key
pub struct KeySearch<'a> {
    source: &'a CandidateSource,
    target: SearchTarget,
    scheme: AuthScheme,
    binding: SchemeBinding,
    cancel: CancelToken,
}

impl<'a> KeySearch<'a> {
    pub fn new(
        source: &'a CandidateSource,
        target: SearchTarget,
        scheme: AuthScheme,
    ) -> SearchResult<Self> {
        let binding = scheme.resolve();
        if source.len() < binding.key_len {
            return Err(SearchError::InsufficientMaterial {
                available: source.len(),
                required: binding.key_len,
            });
        }

        Ok(KeySearch {
            source,
            target,
            scheme,
            binding,
            cancel: CancelToken::new(),
        })
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Number of keys an exhaustive run tries
    pub fn candidates(&self) -> usize {
        extract(self.source.as_bytes(), self.binding.key_len).len()
    }

    /// Try every candidate in offset order until the card accepts one.
    ///
    /// The application is selected again before each attempt, since a failed
    /// authentication leaves the card without a usable selection. Failing to
    /// select or a broken transport ends the search with
    /// [`SearchError::SessionFault`].
    pub fn run<S, O>(&self, session: &mut S, observer: &mut O) -> SearchResult<SearchOutcome>
    where
        S: DesfireSession + ?Sized,
        O: SearchObserver + ?Sized,
    {
        info!(
            "Trying {} {} keys against AID {} key {}",
            self.candidates(),
            self.scheme,
            self.target.aid,
            self.target.key_no
        );

        let mut attempts = 0;
        for (offset, raw) in extract(self.source.as_bytes(), self.binding.key_len) {
            if self.cancel.is_cancelled() {
                info!("Search cancelled after {} attempts", attempts);
                return Ok(SearchOutcome::Cancelled { attempts });
            }

            session
                .select_application(self.target.aid)
                .map_err(|e| SearchError::SessionFault("select application", e))?;

            let key = (self.binding.construct)(raw);
            let result = session.authenticate(self.target.key_no, &key);
            session.release_key(key);
            attempts += 1;

            let outcome = result.map_err(|e| SearchError::SessionFault("authenticate", e))?;
            trace!("offset {}: {:?}", offset, outcome);
            observer.on_attempt(offset, outcome);

            if outcome == AuthOutcome::Authenticated {
                info!("Key found at offset {} after {} attempts", offset, attempts);
                return Ok(SearchOutcome::Found {
                    offset,
                    key: raw.to_vec(),
                    attempts,
                });
            }
        }

        info!("Key material exhausted after {} attempts", attempts);
        Ok(SearchOutcome::Exhausted { attempts })
    }
}

/// Validate and run a search without progress reporting
pub fn search<S>(
    source: &CandidateSource,
    target: SearchTarget,
    scheme: AuthScheme,
    session: &mut S,
) -> SearchResult<SearchOutcome>
where
    S: DesfireSession + ?Sized,
{
    KeySearch::new(source, target, scheme)?.run(session, &mut NoProgress)
}
