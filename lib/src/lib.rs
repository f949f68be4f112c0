//! A multi-tape, recursive, non-deterministic state machine for describing
//! and enumerating string relations, of the kind used in morphological
//! grammars: one tape holds a surface form, another a gloss, further tapes
//! whatever other analyses are wanted. Grammars are trees of state
//! constructors; generation lazily enumerates every string tuple the
//! grammar describes.

mod ast;
mod compile;
mod counter;
mod error;
mod generate;
mod output;
mod state;
mod tape;
mod token;
mod transducer;
mod utils;
mod validate;

pub use ast::{GrammarDef, GrammarExpr};
pub use compile::{Compile, CompiledGrammar};
pub use counter::CounterStack;
pub use error::{StateError, StateErrors, TapeError};
pub use generate::{DEFAULT_MAX_CHARS, DEFAULT_MAX_RECURSION};
pub use output::{MultiTapeOutput, Record, SingleTapeOutput};
pub use state::{
    any_char, embed, join, lit, literalizer, seq, uni, State, SymbolTable, Transition,
};
pub use tape::{
    FlagTape, RenamedTape, StringTape, Tape, TapeCollection, ANY_TAPE_NAME, NO_TAPE_NAME,
};
pub use token::{Token, ANY_CHAR, MAX_NUM_CHARS, NO_CHAR};
pub use transducer::Transducer;
pub use validate::{Valid, Validate};
