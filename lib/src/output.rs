use crate::error::TapeError;
use crate::tape::Tape;
use crate::token::Token;
use itertools::Itertools;
use std::collections::BTreeMap;
use std::rc::Rc;

/// One generated result: the string written to each tape that was written
/// at all. Ordered by tape name so enumeration is reproducible.
pub type Record = BTreeMap<String, String>;

/// The output written to a single tape, kept as a reverse-linked chain of
/// tokens. Non-deterministic branching means many in-flight outputs share
/// a common prefix; linking back to the shared node costs nothing, where
/// copying the prefix for every branch would be quadratic (and wasted work
/// whenever a branch turns out to be a dead end).
#[derive(Debug, Clone)]
pub struct SingleTapeOutput {
    tape: Tape,
    token: Token,
    prev: Option<Rc<SingleTapeOutput>>,
}

impl SingleTapeOutput {
    /// Link a new token onto a chain. Every node along one chain must
    /// belong to the same tape.
    pub fn new(
        tape: Tape,
        token: Token,
        prev: Option<Rc<SingleTapeOutput>>,
    ) -> Result<Self, TapeError> {
        if let Some(prev_output) = &prev {
            if prev_output.tape.tape_name() != tape.tape_name() {
                return Err(TapeError::IncompatibleTapes {
                    left: tape.tape_name().to_owned(),
                    right: prev_output.tape.tape_name().to_owned(),
                });
            }
        }
        Ok(SingleTapeOutput { tape, token, prev })
    }

    /// All strings this chain spells out: each token may decode to several
    /// symbols, so the result is the product of the decodings along the
    /// chain. An empty chain spells out the single empty string.
    pub fn strings(&self) -> Result<Vec<String>, TapeError> {
        let prefixes = match &self.prev {
            Some(prev) => prev.strings()?,
            None => vec![String::new()],
        };
        let symbols = self
            .tape
            .from_bits(self.tape.tape_name(), self.token)?;
        let mut results = Vec::new();
        for prefix in &prefixes {
            for symbol in &symbols {
                results.push(format!("{}{}", prefix, symbol));
            }
        }
        Ok(results)
    }
}

/// Outputs across all tapes, as a map from tape name to the head of that
/// tape's chain. `add` is copy-on-write at the map level: the new map
/// points to one new chain node, and every other entry is shared with the
/// original.
#[derive(Debug, Clone, Default)]
pub struct MultiTapeOutput {
    outputs: BTreeMap<String, Rc<SingleTapeOutput>>,
}

impl MultiTapeOutput {
    pub fn new() -> Self {
        MultiTapeOutput::default()
    }

    pub fn add(&self, tape: &Tape, token: Token) -> Result<MultiTapeOutput, TapeError> {
        // A transition resolved against an empty collection carries no
        // tape to write to; adding it must be a no-op, not a phantom entry.
        if tape.num_tapes() == 0 {
            return Ok(self.clone());
        }

        let tape_name = tape.tape_name().to_owned();
        let prev = self.outputs.get(&tape_name).cloned();
        let mut outputs = self.outputs.clone();
        outputs.insert(
            tape_name,
            Rc::new(SingleTapeOutput::new(tape.clone(), token, prev)?),
        );
        Ok(MultiTapeOutput { outputs })
    }

    /// Expand into flat records: the product of each tape's possible
    /// strings. With no output written anywhere, the result is one empty
    /// record.
    pub fn to_strings(&self) -> Result<Vec<Record>, TapeError> {
        if self.outputs.is_empty() {
            return Ok(vec![Record::new()]);
        }
        let per_tape: Vec<Vec<(String, String)>> = self
            .outputs
            .iter()
            .map(|(tape_name, output)| {
                Ok(output
                    .strings()?
                    .into_iter()
                    .map(|s| (tape_name.clone(), s))
                    .collect())
            })
            .collect::<Result<_, TapeError>>()?;
        Ok(per_tape
            .into_iter()
            .multi_cartesian_product()
            .map(|fields| fields.into_iter().collect())
            .collect())
    }
}
