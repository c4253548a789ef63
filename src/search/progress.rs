use std::io::Write;

use log::warn;

use super::session::AuthOutcome;

/// Notified once per authentication attempt, in offset order
pub trait SearchObserver {
    fn on_attempt(&mut self, offset: usize, outcome: AuthOutcome);
}

impl<F: FnMut(usize, AuthOutcome)> SearchObserver for F {
    fn on_attempt(&mut self, offset: usize, outcome: AuthOutcome) {
        self(offset, outcome)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl SearchObserver for NoProgress {
    fn on_attempt(&mut self, _offset: usize, _outcome: AuthOutcome) {}
}

pub const DEFAULT_PROGRESS_WIDTH: usize = 80;

/// Prints a dot per rejected key and breaks the line every `width` attempts.
///
/// Output is flushed after every dot so progress shows up while the card is
/// still working.
pub struct DotProgress<W: Write> {
    out: W,
    width: usize,
    attempts: usize,
    broken: bool,
}

impl<W: Write> DotProgress<W> {
    pub fn new(out: W, width: usize) -> Self {
        DotProgress {
            out,
            width: width.max(1),
            attempts: 0,
            broken: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: &str) {
        let result = self
            .out
            .write_all(text.as_bytes())
            .and_then(|_| self.out.flush());

        // a broken terminal must not end the search
        if let Err(e) = result {
            if !self.broken {
                warn!("Cannot write progress: {}", e);
                self.broken = true;
            }
        }
    }
}

impl<W: Write> SearchObserver for DotProgress<W> {
    fn on_attempt(&mut self, _offset: usize, outcome: AuthOutcome) {
        let attempt = self.attempts;
        self.attempts += 1;

        match outcome {
            AuthOutcome::Rejected => {
                if attempt % self.width == 0 {
                    self.write("\n");
                }
                self.write(".");
            }
            AuthOutcome::Authenticated => self.write("\n"),
        }
    }
}
