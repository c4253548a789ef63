use serde::Serialize;

use crate::search::scheme::AuthScheme;
use crate::search::target::SearchTarget;
use crate::search::SearchOutcome;

/// `08:09:0a:..`, the form a found key is printed in
pub fn colon_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|x| format!("{:02x}", x))
        .collect::<Vec<String>>()
        .join(":")
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Found,
    Exhausted,
    Cancelled,
}

/// Summary of one run, printed with `--json`
#[derive(Debug, Serialize)]
pub struct SearchReport {
    pub reader: Option<String>,
    pub aid: String,
    pub key_no: u8,
    pub scheme: AuthScheme,
    pub status: ReportStatus,
    pub attempts: usize,
    pub offset: Option<usize>,
    pub key: Option<String>,
}

impl SearchReport {
    pub fn new(
        reader: Option<String>,
        target: SearchTarget,
        scheme: AuthScheme,
        outcome: &SearchOutcome,
    ) -> Self {
        let (status, offset, key) = match outcome {
            SearchOutcome::Found { offset, key, .. } => {
                (ReportStatus::Found, Some(*offset), Some(colon_hex(key)))
            }
            SearchOutcome::Exhausted { .. } => (ReportStatus::Exhausted, None, None),
            SearchOutcome::Cancelled { .. } => (ReportStatus::Cancelled, None, None),
        };

        SearchReport {
            reader,
            aid: target.aid.to_string(),
            key_no: target.key_no.value(),
            scheme,
            status,
            attempts: outcome.attempts(),
            offset,
            key,
        }
    }
}
