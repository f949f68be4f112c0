use crate::token::MAX_NUM_CHARS;
use failure::Fail;
use itertools::Itertools;
use std::fmt::{self, Display, Formatter};
use std::ops::Deref;

/// Errors in the construction of a grammar, as opposed to anything that can
/// happen while enumerating one. These are reported to the caller before
/// generation ever starts.
#[derive(Debug, Fail)]
pub enum StateError {
    #[fail(display = "Sequences must have at least 1 child")]
    EmptySequence,
    #[fail(display = "Unions must have at least 1 child")]
    EmptyUnion,
    #[fail(display = "Undefined symbol: {}", 0)]
    UndefinedSymbol(String),
}

// Container for holding multiple grammar errors. This is the most common way
// to report errors from validation.
#[derive(Debug, Fail)]
pub struct StateErrors(Vec<StateError>);

impl StateErrors {
    pub fn new(errors: Vec<StateError>) -> Self {
        StateErrors(errors)
    }
}

impl Display for StateErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().join("\n"))
    }
}

impl Deref for StateErrors {
    type Target = Vec<StateError>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Errors in the use of tapes: asking a tape for an operation under a name
/// it doesn't answer to, or growing a vocabulary past what a token can hold.
#[derive(Debug, Fail)]
pub enum TapeError {
    #[fail(display = "Trying to use tape {} as tape {}", actual, requested)]
    TapeNameMismatch { requested: String, actual: String },
    #[fail(display = "Undefined tape: {}", 0)]
    UndefinedTape(String),
    #[fail(display = "Incompatible tapes: {}, {}", left, right)]
    IncompatibleTapes { left: String, right: String },
    #[fail(
        display = "Tape {} cannot hold more than {} symbols (adding {:?})",
        tape, max, symbol
    )]
    VocabOverflow {
        tape: String,
        max: usize,
        symbol: String,
    },
}

impl TapeError {
    pub fn name_mismatch(requested: &str, actual: &str) -> Self {
        TapeError::TapeNameMismatch {
            requested: requested.to_owned(),
            actual: actual.to_owned(),
        }
    }

    pub fn vocab_overflow(tape: &str, symbol: &str) -> Self {
        TapeError::VocabOverflow {
            tape: tape.to_owned(),
            max: MAX_NUM_CHARS,
            symbol: symbol.to_owned(),
        }
    }
}
