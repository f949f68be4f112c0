use crate::counter::CounterStack;
use crate::output::{MultiTapeOutput, Record};
use crate::state::State;
use crate::tape::{Tape, TapeCollection};
use crate::token::ANY_CHAR;
use failure::Error;
use log::warn;
use std::rc::Rc;

/// How many times a symbol may re-enter itself before its embeddings go
/// silent. Infinite recursion is correct for a genuinely infinite grammar;
/// pass `usize::MAX` to `generate_with` to get it.
pub const DEFAULT_MAX_RECURSION: usize = 4;

/// Ceiling on the number of generation steps, and so (roughly) on the
/// total characters written across all tapes by any one traversal.
pub const DEFAULT_MAX_CHARS: usize = 1000;

impl State {
    /// Enumerate every record this grammar describes, under the default
    /// bounds.
    ///
    /// There is no separate parse entry point. To parse, join the grammar
    /// with a query grammar (for instance a literal on the surface tape)
    /// and generate the join; the choice of query grammar buys a whole
    /// family of query types for free.
    pub fn generate(&self) -> Result<Vec<Record>, Error> {
        self.generate_with(DEFAULT_MAX_RECURSION, DEFAULT_MAX_CHARS)
    }

    /// Breadth-first traversal of the state graph. Each queue entry pairs
    /// an in-progress output with the state that produced it; a step asks
    /// the state for acceptance (emitting its output) and for transitions
    /// (extending the output by one token each). Termination comes from
    /// both bounds at once: `max_chars` caps the traversal depth and
    /// `max_recursion` caps symbol re-entry.
    pub fn generate_with(
        &self,
        max_recursion: usize,
        max_chars: usize,
    ) -> Result<Vec<Record>, Error> {
        let mut tapes = TapeCollection::new();
        self.collect_vocab(&mut tapes, &mut Vec::new())?;
        let all_tapes = Tape::Collection(tapes);
        let stack = CounterStack::new(max_recursion);

        let root: Rc<State> = Rc::new(self.clone());
        let mut queue: Vec<(MultiTapeOutput, Rc<State>)> =
            vec![(MultiTapeOutput::new(), root)];
        let mut results: Vec<Record> = Vec::new();
        let mut chars = 0;

        while !queue.is_empty() && chars < max_chars {
            let mut next_queue = Vec::new();
            for (output, state) in queue {
                if state.accepting(&stack) {
                    results.extend(output.to_strings()?);
                }
                for transition in state.d_query(&all_tapes, ANY_CHAR, &stack)? {
                    if !transition.matched {
                        // Interior stays should have been absorbed before
                        // reaching the driver; drop it rather than write a
                        // phantom token
                        warn!(
                            "unmatched transition surfaced from {}, dropping it",
                            state.id()
                        );
                        continue;
                    }
                    next_queue
                        .push((output.add(&transition.tape, transition.token)?, transition.next));
                }
            }
            queue = next_queue;
            chars += 1;
        }
        Ok(results)
    }
}
