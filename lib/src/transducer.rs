use crate::ast::GrammarDef;
use crate::compile::Compile;
use crate::output::Record;
use crate::state::State;
use crate::validate::Validate;
use failure::Error;
use std::rc::Rc;

/// A compiled multi-tape grammar, ready to enumerate. This is the front
/// door for callers that hold a grammar description rather than states:
/// construction validates and compiles in one step, so a `Transducer` in
/// hand is always runnable.
#[derive(Debug)]
pub struct Transducer {
    start: Rc<State>,
}

impl Transducer {
    /// Validates and compiles the given grammar description.
    pub fn new(def: GrammarDef) -> Result<Self, Error> {
        let compiled = def.validate_into(&())?.compile(&());
        Ok(Self {
            start: compiled.start,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        let def = serde_json::from_str(json)?;
        Self::new(def)
    }

    /// Every record the grammar describes, under the default bounds.
    pub fn generate(&self) -> Result<Vec<Record>, Error> {
        self.start.generate()
    }

    pub fn generate_with(
        &self,
        max_recursion: usize,
        max_chars: usize,
    ) -> Result<Vec<Record>, Error> {
        self.start.generate_with(max_recursion, max_chars)
    }
}
