//! Stanza accumulation
//!
//! [`Records`] pulls lines from its source only when it needs them and turns
//! them into frozen [`Record`]s, one per terminator line. It is an ordinary
//! iterator: restartable only by building a new one over a re-opened source.
//!
//! State machine per record:
//!
//! ```text
//! AwaitingStart --start tag--> Accumulating --"//"--> (yield record) --> AwaitingStart
//! ```
//!
//! Lines outside a record are ignored, unrecognized lines are dropped, and a
//! record still open at end of input is discarded. A fatal format violation
//! ends the iteration after yielding the error.

use std::mem;
use tracing::{debug, error, trace};

use crate::error::{FormatError, NormalizeError, Result};
use crate::grammar::Grammar;
use crate::line::{classify, Line, TagCode};
use crate::record::Record;
use crate::stanza::Stanza;

enum Phase<G: Grammar> {
    AwaitingStart,
    Accumulating {
        stanza: Stanza<G::State>,
        active: G::Tag,
        started_at: u64,
    },
}

/// Lazily accumulated records of one grammar
pub struct Records<G: Grammar, L> {
    grammar: G,
    lines: L,
    phase: Phase<G>,
    line_number: u64,
    finished: bool,
}

impl<G, L, E> Records<G, L>
where
    G: Grammar,
    L: Iterator<Item = std::result::Result<String, E>>,
    E: Into<NormalizeError>,
{
    pub fn new(grammar: G, lines: L) -> Self {
        Self {
            grammar,
            lines,
            phase: Phase::AwaitingStart,
            line_number: 0,
            finished: false,
        }
    }

    fn feed(&mut self, line: &str) -> Result<Option<Record>> {
        let line_number = self.line_number;

        match (&mut self.phase, classify::<G::Tag>(line)) {
            (Phase::AwaitingStart, Line::Tagged { tag, payload }) if tag.is_start() => {
                let mut stanza = Stanza::new(self.grammar.policy());
                apply(&self.grammar, &mut stanza, tag, payload, false, line_number)?;
                self.phase = Phase::Accumulating {
                    stanza,
                    active: tag,
                    started_at: line_number,
                };
            },
            (Phase::AwaitingStart, _) => {
                trace!(line = line_number, "skipping line outside of a record");
            },
            (Phase::Accumulating { .. }, Line::Terminator) => {
                if let Phase::Accumulating { mut stanza, .. } =
                    mem::replace(&mut self.phase, Phase::AwaitingStart)
                {
                    if let Err(e) = self.grammar.close(&mut stanza) {
                        reject(e, stanza.record().label(), line_number)?;
                    }
                    let record = stanza.into_record();
                    trace!(record = %record.label(), line = line_number, "record terminated");
                    return Ok(Some(record));
                }
            },
            (Phase::Accumulating { stanza, active, .. }, Line::Tagged { tag, payload }) => {
                *active = tag;
                apply(&self.grammar, stanza, tag, payload, false, line_number)?;
            },
            (Phase::Accumulating { stanza, active, .. }, Line::Continuation(payload)) => {
                apply(&self.grammar, stanza, *active, payload, true, line_number)?;
            },
            (Phase::Accumulating { .. }, Line::Unrecognized) => {
                trace!(line = line_number, "dropping unrecognized line");
            },
        }

        Ok(None)
    }
}

fn apply<G: Grammar>(
    grammar: &G,
    stanza: &mut Stanza<G::State>,
    tag: G::Tag,
    payload: &str,
    continuation: bool,
    line_number: u64,
) -> Result<()> {
    match grammar.accept(stanza, tag, payload, continuation) {
        Ok(()) => Ok(()),
        Err(e) => reject(e, stanza.record().label(), line_number),
    }
}

/// Drop recoverable errors, escalate fatal ones
fn reject(error: FormatError, record: &str, line_number: u64) -> Result<()> {
    if error.is_fatal() {
        error!(record = %record, line = line_number, error = %error, "aborting run on structural violation");
        Err(NormalizeError::Format(error))
    } else {
        debug!(record = %record, line = line_number, error = %error, "dropping malformed line");
        Ok(())
    }
}

impl<G, L, E> Iterator for Records<G, L>
where
    G: Grammar,
    L: Iterator<Item = std::result::Result<String, E>>,
    E: Into<NormalizeError>,
{
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                },
                None => {
                    self.finished = true;
                    if let Phase::Accumulating {
                        stanza, started_at, ..
                    } = &self.phase
                    {
                        debug!(
                            record = %stanza.record().label(),
                            started_at = *started_at,
                            "discarding unterminated record at end of input"
                        );
                    }
                    self.phase = Phase::AwaitingStart;
                    return None;
                },
            };

            self.line_number += 1;
            match self.feed(&line) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                },
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::grammar::EnzymeGrammar;
    use std::convert::Infallible;

    fn records(text: &str) -> Vec<Result<Record>> {
        let lines = text
            .lines()
            .map(|l| Ok::<_, Infallible>(l.to_string()))
            .collect::<Vec<_>>();
        Records::new(EnzymeGrammar, lines.into_iter()).collect()
    }

    #[test]
    fn test_header_before_first_record_is_ignored() {
        let out = records("CC   banner\n//\nID   1.1.1.1\nDE   Foo.\n//\n");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref().unwrap().id.as_deref(), Some("1.1.1.1"));
    }

    #[test]
    fn test_unterminated_record_is_discarded() {
        let out = records("ID   1.1.1.1\n//\nID   1.1.1.2\nDE   Partial.\n");
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_records_run_back_to_back() {
        let out = records("ID   1.1.1.1\n//\nID   1.1.1.2\n//\nID   1.1.1.3\n//");
        let ids: Vec<_> = out
            .into_iter()
            .map(|r| r.unwrap().id.unwrap())
            .collect();
        assert_eq!(ids, vec!["1.1.1.1", "1.1.1.2", "1.1.1.3"]);
    }
}
