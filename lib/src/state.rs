use crate::counter::CounterStack;
use crate::error::StateError;
use crate::tape::{Tape, TapeCollection};
use crate::token::Token;
use failure::Error;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// One answer to a state query: the tape the state spoke about, the subset
/// of the target token it can match, and the state a successful transition
/// leads to.
///
/// `matched` distinguishes a real match from a stay: a state asked about a
/// tape it has no opinion on answers with the query unchanged, itself as
/// the successor, and `matched == false`. Stays are what let composite
/// states make progress on one tape while a sibling is waiting on another.
#[derive(Debug, Clone)]
pub struct Transition {
    pub tape: Tape,
    pub token: Token,
    pub matched: bool,
    pub next: Rc<State>,
}

/// Recognizes or emits a fixed string on one tape.
///
/// The token list starts empty: at construction time the grammar's
/// vocabulary isn't known yet, so the text can't be tokenized. Vocabulary
/// collection fills the tokens in before any query runs. Successors carry
/// the remaining tokens and the corresponding text suffix (the text is
/// only consulted for display).
#[derive(Debug, Clone)]
pub struct LiteralState {
    tape_name: String,
    text: String,
    tokens: RefCell<Vec<Token>>,
}

/// A reference to a named sub-grammar, looked up in a symbol table at query
/// time. This is what lets grammars nest and recurse: the referenced state
/// can itself contain embeddings of the same symbol.
///
/// Each query through an embedding bumps the symbol's count on the counter
/// stack, and an embedding whose count has reached the ceiling goes silent,
/// so left-recursive grammars unfold to a bounded depth instead of looping.
/// Successors keep the wrapper (with the successor as the resolved child),
/// so re-entries deeper in the parse keep counting.
#[derive(Clone)]
pub struct EmbedState {
    symbol: String,
    symbols: Rc<SymbolTable>,
    child: Option<Rc<State>>,
}

impl EmbedState {
    fn resolve(&self) -> Option<Rc<State>> {
        match &self.child {
            Some(child) => Some(child.clone()),
            None => self.symbols.get(&self.symbol),
        }
    }
}

// The symbol table can point back at states that contain this embedding;
// printing it here would never terminate.
impl fmt::Debug for EmbedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbedState")
            .field("symbol", &self.symbol)
            .finish()
    }
}

/// Named sub-grammars referenced by embed states. Defined before generation
/// starts and only read afterwards. Definitions may be cyclic (a symbol's
/// grammar may embed the symbol itself), which is why embed states hold the
/// table and look names up lazily.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: RefCell<HashMap<String, Rc<State>>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn define(&self, name: &str, state: Rc<State>) {
        self.symbols.borrow_mut().insert(name.to_owned(), state);
    }

    pub fn get(&self, name: &str) -> Option<Rc<State>> {
        self.symbols.borrow().get(name).cloned()
    }
}

/// The current state of a parse, and the whole grammar representation.
///
/// A state is never a node in a pre-built graph; it is the information such
/// a node would carry, and it builds its successor states on demand when
/// queried. A literal "hello" that has matched "he" is simply a literal
/// state for "llo". The structure of a composite state mirrors the grammar
/// it came from and simplifies as the parse proceeds.
///
/// Three operations drive everything:
///
/// - `nd_query`: which transitions can this state take, compatible with a
///   tape and a target token. Results may overlap (two transitions both
///   matching "q").
/// - `d_query`: the same transitions, rearranged so that results on one
///   tape are disjoint. Overlap is split three ways, with the shared part
///   leading to a union of the two continuations.
/// - `accepting`: whether this state is a complete parse of the sub-grammar
///   it stands for. For a composite that is a question about its children;
///   concatenation uses it to know when control passes to the second child.
#[derive(Debug, Clone)]
pub enum State {
    Literal(LiteralState),
    AnyChar { tape_name: String },
    Trivial,
    Concat { left: Rc<State>, right: Rc<State> },
    Union { left: Rc<State>, right: Rc<State> },
    Join { left: Rc<State>, right: Rc<State> },
    Embed(EmbedState),
}

impl State {
    /// An identifier for debugging output. Not guaranteed unique.
    pub fn id(&self) -> String {
        match self {
            State::Literal(lit) => format!("{}:{}", lit.tape_name, lit.text),
            State::AnyChar { tape_name } => format!("{}:(ANY)", tape_name),
            State::Trivial => "0".to_owned(),
            State::Concat { left, right } => format!("Concat({},{})", left.id(), right.id()),
            State::Union { left, right } => format!("Union({},{})", left.id(), right.id()),
            State::Join { left, right } => format!("Join({},{})", left.id(), right.id()),
            State::Embed(embed) => format!("Embed({})", embed.symbol),
        }
    }

    /// Whether this state is a complete parse of its sub-grammar. Reaching
    /// an accepting state doesn't end generation; an accepting state may
    /// still have live transitions (and a composite parent may not be
    /// accepting at all).
    pub fn accepting(&self, stack: &CounterStack) -> bool {
        match self {
            State::Literal(lit) => lit.tokens.borrow().is_empty(),
            State::AnyChar { .. } => false,
            State::Trivial => true,
            State::Concat { left, right } | State::Join { left, right } => {
                left.accepting(stack) && right.accepting(stack)
            }
            State::Union { left, right } => {
                left.accepting(stack) || right.accepting(stack)
            }
            State::Embed(embed) => {
                if stack.exceeds_max(&embed.symbol) {
                    return false;
                }
                match embed.resolve() {
                    Some(child) => child.accepting(&stack.add(&embed.symbol)),
                    None => false,
                }
            }
        }
    }

    /// Register every literally mentioned symbol with the tape collection.
    /// Must run to completion before the first query; literal states can't
    /// produce tokens until their text has been tokenized against the full
    /// vocabulary. `visited` guards against looping through recursive
    /// symbol definitions.
    pub fn collect_vocab(
        &self,
        tapes: &mut TapeCollection,
        visited: &mut Vec<String>,
    ) -> Result<(), Error> {
        match self {
            State::Literal(lit) => {
                let tokens = tapes.tokenize(&lit.tape_name, &lit.text)?;
                *lit.tokens.borrow_mut() = tokens;
                Ok(())
            }
            State::AnyChar { .. } | State::Trivial => Ok(()),
            State::Concat { left, right }
            | State::Union { left, right }
            | State::Join { left, right } => {
                left.collect_vocab(tapes, visited)?;
                right.collect_vocab(tapes, visited)
            }
            State::Embed(embed) => {
                if visited.iter().any(|seen| seen == &embed.symbol) {
                    return Ok(());
                }
                visited.push(embed.symbol.clone());
                let child = embed
                    .resolve()
                    .ok_or_else(|| StateError::UndefinedSymbol(embed.symbol.clone()))?;
                child.collect_vocab(tapes, visited)
            }
        }
    }

    /// Non-deterministic query: all transitions compatible with the given
    /// tape and target token. Results on the same tape may overlap; callers
    /// that need disjoint results go through `d_query` instead.
    pub fn nd_query(
        &self,
        tape: &Tape,
        target: Token,
        stack: &CounterStack,
    ) -> Result<Vec<Transition>, Error> {
        match self {
            State::Literal(lit) => {
                let matched_tape = match tape.match_tape(&lit.tape_name) {
                    Some(matched) => matched,
                    // Not our tape; let whoever is interested go first
                    None => return Ok(vec![self.stay(tape, target)]),
                };
                if self.accepting(stack) {
                    return Ok(Vec::new());
                }
                let (first, rest) = {
                    let tokens = lit.tokens.borrow();
                    match tokens.split_first() {
                        Some((first, rest)) => (*first, rest.to_vec()),
                        None => return Ok(Vec::new()),
                    }
                };
                let result = matched_tape.match_tokens(first, target);
                // Advance the display text past the symbol the first token
                // stands for
                let consumed: String =
                    matched_tape.from_bits(&lit.tape_name, first)?.concat();
                let rest_text = lit.text.get(consumed.len()..).unwrap_or("").to_owned();
                let next = State::Literal(LiteralState {
                    tape_name: lit.tape_name.clone(),
                    text: rest_text,
                    tokens: RefCell::new(rest),
                });
                Ok(vec![Transition {
                    tape: matched_tape,
                    token: result,
                    matched: true,
                    next: Rc::new(next),
                }])
            }

            State::AnyChar { tape_name } => {
                let matched_tape = match tape.match_tape(tape_name) {
                    Some(matched) => matched,
                    None => return Ok(vec![self.stay(tape, target)]),
                };
                let result = matched_tape.match_tokens(matched_tape.any(), target);
                Ok(vec![Transition {
                    tape: matched_tape,
                    token: result,
                    matched: true,
                    next: Rc::new(State::Trivial),
                }])
            }

            State::Trivial => Ok(Vec::new()),

            // Concatenation is the one place with an ordering discipline:
            // on any single tape, the left child consumes before the right.
            // Across different tapes there is no order, so when the left
            // child answers "not my tape", the right child gets its turn.
            // Naive strict ordering would deadlock under join, when the two
            // sides of the join mention the same tapes in opposite orders.
            State::Concat { left, right } => {
                let mut results = Vec::new();
                // The right child may be consulted both because the left
                // child is indifferent and because the left child is
                // accepting; doing both would duplicate its transitions.
                let mut yielded_already = false;
                for t1 in left.d_query(tape, target, stack)? {
                    if t1.matched {
                        results.push(Transition {
                            tape: t1.tape,
                            token: t1.token,
                            matched: true,
                            next: Rc::new(State::Concat {
                                left: t1.next,
                                right: right.clone(),
                            }),
                        });
                        continue;
                    }
                    // Left child doesn't care about this tape; the first
                    // character there, if any, is the right child's
                    for t2 in right.d_query(tape, target, stack)? {
                        results.push(Transition {
                            tape: t2.tape,
                            token: t2.token,
                            matched: t2.matched,
                            next: Rc::new(State::Concat {
                                left: left.clone(),
                                right: t2.next,
                            }),
                        });
                        yielded_already = true;
                    }
                }
                if !yielded_already && left.accepting(stack) {
                    // Left child is done; control passes to the right child
                    results.extend(right.d_query(tape, target, stack)?);
                }
                Ok(results)
            }

            // Unions just offer both children's transitions. Union states
            // only exist at the start of a parse and inside determinizer
            // output; their successors are their children's successors,
            // not new unions.
            State::Union { left, right } => {
                let mut results = left.d_query(tape, target, stack)?;
                results.extend(right.d_query(tape, target, stack)?);
                Ok(results)
            }

            // A join is an intersection on the tapes both children speak
            // about and a product on the rest. Each left transition is
            // replayed against the right child on the resolved tape: the
            // right child either narrows the token further (agreement) or
            // answers with a stay (indifference). Either way both
            // continuations are packaged back into a join.
            State::Join { left, right } => {
                let left_results = left.d_query(tape, target, stack)?;
                let mut results = Vec::new();
                for t1 in &left_results {
                    for t2 in right.d_query(&t1.tape, t1.token, stack)? {
                        results.push(Transition {
                            tape: t2.tape,
                            token: t2.token,
                            matched: t1.matched || t2.matched,
                            next: Rc::new(State::Join {
                                left: t1.next.clone(),
                                right: t2.next,
                            }),
                        });
                    }
                }
                // An exhausted-but-accepting left child can't answer a free
                // query, but the right child may still have material on
                // tapes the left child never speaks about. Material on the
                // left child's own tapes stays blocked.
                if left_results.is_empty() && left.accepting(stack) {
                    for t2 in right.d_query(tape, target, stack)? {
                        if t2.matched && left.ignores(&t2.tape, t2.token, stack)? {
                            results.push(Transition {
                                tape: t2.tape,
                                token: t2.token,
                                matched: true,
                                next: Rc::new(State::Join {
                                    left: left.clone(),
                                    right: t2.next,
                                }),
                            });
                        }
                    }
                }
                Ok(results)
            }

            State::Embed(embed) => {
                if stack.exceeds_max(&embed.symbol) {
                    return Ok(Vec::new());
                }
                let child = embed
                    .resolve()
                    .ok_or_else(|| StateError::UndefinedSymbol(embed.symbol.clone()))?;
                let deeper = stack.add(&embed.symbol);
                let mut results = child.nd_query(tape, target, &deeper)?;
                for transition in &mut results {
                    transition.next = Rc::new(State::Embed(EmbedState {
                        symbol: embed.symbol.clone(),
                        symbols: embed.symbols.clone(),
                        child: Some(transition.next.clone()),
                    }));
                }
                Ok(results)
            }
        }
    }

    /// Deterministic query: the transitions of `nd_query`, rearranged so
    /// that no two results on the same tape share a token bit.
    ///
    /// When two answers X and Y overlap, three disjoint paths replace them:
    /// X∩Y leading to the union of both continuations, X∖Y leading to X's,
    /// and Y∖X leading to Y's. This is what makes overlapping alternations
    /// behave correctly under join (and is a precondition for negation).
    /// Transitions that resolved against an empty collection carry no tape
    /// to partition on and pass through untouched.
    pub fn d_query(
        &self,
        tape: &Tape,
        target: Token,
        stack: &CounterStack,
    ) -> Result<Vec<Transition>, Error> {
        let mut results: Vec<Transition> = Vec::new();
        for incoming in self.nd_query(tape, target, stack)? {
            if incoming.tape.num_tapes() == 0 {
                results.push(incoming);
                continue;
            }

            let mut bits = incoming.token;
            let mut new_results: Vec<Transition> = Vec::new();
            for other in results {
                if incoming.tape.tape_name() != other.tape.tape_name() {
                    new_results.push(other);
                    continue;
                }

                let intersection = bits.and(other.token);
                if !intersection.is_empty() {
                    new_results.push(Transition {
                        tape: incoming.tape.clone(),
                        token: intersection,
                        matched: incoming.matched || other.matched,
                        next: Rc::new(State::Union {
                            left: incoming.next.clone(),
                            right: other.next.clone(),
                        }),
                    });
                }
                let other_bits = other.token.and_not(intersection);
                bits = bits.and_not(intersection);
                if !other_bits.is_empty() {
                    new_results.push(Transition {
                        token: other_bits,
                        ..other
                    });
                }
            }
            results = new_results;
            if !bits.is_empty() {
                results.push(Transition {
                    token: bits,
                    ..incoming
                });
            }
        }
        Ok(results)
    }

    /// A transition that leaves everything as it was: wrong tape, no
    /// opinion, state unchanged.
    fn stay(&self, tape: &Tape, target: Token) -> Transition {
        Transition {
            tape: tape.clone(),
            token: target,
            matched: false,
            next: Rc::new(self.clone()),
        }
    }

    /// Whether this state has nothing to say about the given tape: it
    /// answers the query, and every answer is a stay. An exhausted state
    /// asked about its own tape answers with no transitions at all, which
    /// is not indifference.
    fn ignores(
        &self,
        tape: &Tape,
        target: Token,
        stack: &CounterStack,
    ) -> Result<bool, Error> {
        let transitions = self.nd_query(tape, target, stack)?;
        Ok(!transitions.is_empty() && transitions.iter().all(|t| !t.matched))
    }
}

/// A literal on the named tape.
pub fn lit(tape_name: &str, text: &str) -> Rc<State> {
    Rc::new(State::Literal(LiteralState {
        tape_name: tape_name.to_owned(),
        text: text.to_owned(),
        tokens: RefCell::new(Vec::new()),
    }))
}

/// A function building literals on a fixed tape, for grammars with many
/// literals on the same tape.
pub fn literalizer(tape_name: &str) -> impl Fn(&str) -> Rc<State> {
    let tape_name = tape_name.to_owned();
    move |text| lit(&tape_name, text)
}

/// Any single character on the named tape; the regular-expression dot.
pub fn any_char(tape_name: &str) -> Rc<State> {
    Rc::new(State::AnyChar {
        tape_name: tape_name.to_owned(),
    })
}

/// Concatenation of any number of states, built up as right-branching
/// binary concatenations.
pub fn seq(mut children: Vec<Rc<State>>) -> Result<Rc<State>, StateError> {
    match children.pop() {
        None => Err(StateError::EmptySequence),
        Some(last) => Ok(children.into_iter().rev().fold(last, |acc, child| {
            Rc::new(State::Concat {
                left: child,
                right: acc,
            })
        })),
    }
}

/// Alternation of any number of states, built up as right-branching binary
/// unions.
pub fn uni(mut children: Vec<Rc<State>>) -> Result<Rc<State>, StateError> {
    match children.pop() {
        None => Err(StateError::EmptyUnion),
        Some(last) => Ok(children.into_iter().rev().fold(last, |acc, child| {
            Rc::new(State::Union {
                left: child,
                right: acc,
            })
        })),
    }
}

/// The join of two states: their string relations must agree on shared
/// tapes, and combine freely on disjoint ones. Joining a grammar with a
/// literal query grammar is also how parsing works; there is no separate
/// parse entry point.
pub fn join(left: Rc<State>, right: Rc<State>) -> Rc<State> {
    Rc::new(State::Join { left, right })
}

/// A reference to a named sub-grammar in `symbols`. The symbol may be
/// defined after the reference is created, which is what permits recursive
/// definitions.
pub fn embed(symbol: &str, symbols: &Rc<SymbolTable>) -> Rc<State> {
    Rc::new(State::Embed(EmbedState {
        symbol: symbol.to_owned(),
        symbols: symbols.clone(),
        child: None,
    }))
}
