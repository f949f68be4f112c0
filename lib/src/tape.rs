use crate::error::TapeError;
use crate::token::{Token, ANY_CHAR, MAX_NUM_CHARS, NO_CHAR};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Name reported by a non-empty `TapeCollection`. A query against a
/// collection means "match on any tape you like"; the concrete tape is
/// picked out later via `match_tape`.
pub const ANY_TAPE_NAME: &str = "__ANY_TAPE__";

/// Name reported by an empty `TapeCollection`.
pub const NO_TAPE_NAME: &str = "__NO_TAPE__";

/// A tape's vocabulary: the symbols it has seen, each assigned a stable
/// index into the token bit space. Indices are handed out in registration
/// order and never reassigned.
#[derive(Debug, Clone, Default)]
struct Vocab {
    index_by_symbol: HashMap<String, usize>,
    symbol_by_index: Vec<String>,
}

impl Vocab {
    fn register(&mut self, tape: &str, symbol: &str) -> Result<usize, TapeError> {
        if let Some(&index) = self.index_by_symbol.get(symbol) {
            return Ok(index);
        }
        let index = self.symbol_by_index.len();
        if index >= MAX_NUM_CHARS {
            return Err(TapeError::vocab_overflow(tape, symbol));
        }
        self.index_by_symbol.insert(symbol.to_owned(), index);
        self.symbol_by_index.push(symbol.to_owned());
        Ok(index)
    }

    fn index_of(&self, symbol: &str) -> Option<usize> {
        self.index_by_symbol.get(symbol).copied()
    }

    fn symbol_at(&self, index: usize) -> Option<&str> {
        self.symbol_by_index.get(index).map(String::as_str)
    }
}

/// The basic tape kind: a named channel of characters. The vocabulary is
/// shared between all clones of a tape, so the cheap copies handed out by
/// `match_tape` all see the same symbol indices.
#[derive(Debug, Clone)]
pub struct StringTape {
    name: String,
    vocab: Rc<RefCell<Vocab>>,
}

impl StringTape {
    pub fn new(name: &str) -> Self {
        StringTape {
            name: name.to_owned(),
            vocab: Rc::new(RefCell::new(Vocab::default())),
        }
    }

    fn check_name(&self, requested: &str) -> Result<(), TapeError> {
        if requested == self.name {
            Ok(())
        } else {
            Err(TapeError::name_mismatch(requested, &self.name))
        }
    }

    /// Split `text` into one-hot tokens, one per character, registering any
    /// character not seen before.
    pub fn tokenize(&self, tape_name: &str, text: &str) -> Result<Vec<Token>, TapeError> {
        self.check_name(tape_name)?;
        let mut vocab = self.vocab.borrow_mut();
        text.chars()
            .map(|c| {
                let index = vocab.register(&self.name, &c.to_string())?;
                Ok(Token::single(index))
            })
            .collect()
    }

    /// One-hot token for `symbol`, or the empty token if it was never
    /// registered.
    pub fn to_bits(&self, tape_name: &str, symbol: &str) -> Result<Token, TapeError> {
        self.check_name(tape_name)?;
        Ok(match self.vocab.borrow().index_of(symbol) {
            Some(index) => Token::single(index),
            None => NO_CHAR,
        })
    }

    /// Decode a token back into symbols, in ascending index order. Stops at
    /// the first set bit with no registered symbol behind it.
    pub fn from_bits(&self, tape_name: &str, token: Token) -> Result<Vec<String>, TapeError> {
        self.check_name(tape_name)?;
        let vocab = self.vocab.borrow();
        let mut symbols = Vec::new();
        for index in 0..MAX_NUM_CHARS {
            if token.contains(index) {
                match vocab.symbol_at(index) {
                    Some(symbol) => symbols.push(symbol.to_owned()),
                    None => break,
                }
            }
        }
        Ok(symbols)
    }

    /// String concatenation always succeeds and has a single result.
    pub fn add(&self, left: &str, right: &str) -> Vec<String> {
        vec![format!("{}{}", left, right)]
    }
}

/// A tape holding flags in the manner of XFST/LEXC "U" flags. The whole
/// string is one atomic symbol, and concatenating a flag onto a different
/// flag fails (empty result) instead of producing a longer string.
///
/// No state currently writes to a flag tape; the kind exists so a
/// collection can carry one.
#[derive(Debug, Clone)]
pub struct FlagTape(StringTape);

impl FlagTape {
    pub fn new(name: &str) -> Self {
        FlagTape(StringTape::new(name))
    }

    /// The entire string is registered as one symbol; no per-character
    /// splitting.
    pub fn tokenize(&self, tape_name: &str, text: &str) -> Result<Vec<Token>, TapeError> {
        self.0.check_name(tape_name)?;
        let index = self.0.vocab.borrow_mut().register(&self.0.name, text)?;
        Ok(vec![Token::single(index)])
    }

    /// Flags unify rather than concatenate: setting a flag that's unset or
    /// already equal succeeds, anything else fails.
    pub fn add(&self, left: &str, right: &str) -> Vec<String> {
        if left.is_empty() || left == right {
            vec![right.to_owned()]
        } else {
            vec![]
        }
    }

    pub fn to_bits(&self, tape_name: &str, symbol: &str) -> Result<Token, TapeError> {
        self.0.to_bits(tape_name, symbol)
    }

    pub fn from_bits(&self, tape_name: &str, token: Token) -> Result<Vec<String>, TapeError> {
        self.0.from_bits(tape_name, token)
    }
}

/// All the tapes a grammar mentions, keyed by name. A free query ("match
/// anything on any tape") passes one of these as the query tape; whichever
/// state answers resolves it to the concrete tape it cares about via
/// `match_tape`. Kept as an ordered map so enumeration order is stable.
#[derive(Debug, Clone, Default)]
pub struct TapeCollection {
    tapes: BTreeMap<String, Tape>,
}

impl TapeCollection {
    pub fn new() -> Self {
        TapeCollection::default()
    }

    pub fn num_tapes(&self) -> usize {
        self.tapes.len()
    }

    pub fn tape_name(&self) -> &'static str {
        if self.tapes.is_empty() {
            NO_TAPE_NAME
        } else {
            ANY_TAPE_NAME
        }
    }

    pub fn add_tape(&mut self, tape: Tape) {
        self.tapes.insert(tape.tape_name().to_owned(), tape);
    }

    /// Tokenize on the named tape, creating a fresh string tape the first
    /// time a name is seen. This is how vocabulary collection builds up the
    /// collection in the first place.
    pub fn tokenize(&mut self, tape_name: &str, text: &str) -> Result<Vec<Token>, TapeError> {
        let tape = self
            .tapes
            .entry(tape_name.to_owned())
            .or_insert_with(|| Tape::String(StringTape::new(tape_name)));
        tape.tokenize(tape_name, text)
    }

    pub fn match_tape(&self, tape_name: &str) -> Option<Tape> {
        self.tapes.get(tape_name).cloned()
    }

    fn get(&self, tape_name: &str) -> Result<&Tape, TapeError> {
        self.tapes
            .get(tape_name)
            .ok_or_else(|| TapeError::UndefinedTape(tape_name.to_owned()))
    }

    pub fn to_bits(&self, tape_name: &str, symbol: &str) -> Result<Token, TapeError> {
        self.get(tape_name)?.to_bits(tape_name, symbol)
    }

    pub fn from_bits(&self, tape_name: &str, token: Token) -> Result<Vec<String>, TapeError> {
        self.get(tape_name)?.from_bits(tape_name, token)
    }
}

/// An adapter that makes a tape answer to a different name. Different parts
/// of a grammar may refer to the same underlying tape under different names;
/// rather than teach every state about the name structure around it, the
/// renaming wraps the tape itself. Only name resolution is affected; bits
/// pass through untouched.
#[derive(Debug, Clone)]
pub struct RenamedTape {
    child: Box<Tape>,
    from_tape: String,
    to_tape: String,
}

impl RenamedTape {
    pub fn new(child: Tape, from_tape: &str, to_tape: &str) -> Self {
        RenamedTape {
            child: Box::new(child),
            from_tape: from_tape.to_owned(),
            to_tape: to_tape.to_owned(),
        }
    }

    fn adjust<'a>(&'a self, tape_name: &'a str) -> &'a str {
        if tape_name == self.from_tape {
            &self.to_tape
        } else {
            tape_name
        }
    }
}

/// The tape family. Everything that describes a tape (name, vocabulary,
/// matching rules) lives here; the actual characters written during
/// enumeration live in the output tries instead.
#[derive(Debug, Clone)]
pub enum Tape {
    String(StringTape),
    Flag(FlagTape),
    Collection(TapeCollection),
    Renamed(RenamedTape),
}

impl Tape {
    pub fn tape_name(&self) -> &str {
        match self {
            Tape::String(tape) => &tape.name,
            Tape::Flag(tape) => &tape.0.name,
            Tape::Collection(collection) => collection.tape_name(),
            Tape::Renamed(renamed) => renamed.child.tape_name(),
        }
    }

    pub fn num_tapes(&self) -> usize {
        match self {
            Tape::String(_) | Tape::Flag(_) => 1,
            Tape::Collection(collection) => collection.num_tapes(),
            Tape::Renamed(renamed) => renamed.child.num_tapes(),
        }
    }

    /// Resolve a tape name to the tape that answers to it: the tape itself,
    /// a member of a collection, or a renamed view of either.
    pub fn match_tape(&self, tape_name: &str) -> Option<Tape> {
        match self {
            Tape::String(tape) => {
                if tape_name == tape.name {
                    Some(self.clone())
                } else {
                    None
                }
            }
            Tape::Flag(tape) => {
                if tape_name == tape.0.name {
                    Some(self.clone())
                } else {
                    None
                }
            }
            Tape::Collection(collection) => collection.match_tape(tape_name),
            Tape::Renamed(renamed) => {
                let child = renamed.child.match_tape(renamed.adjust(tape_name))?;
                Some(Tape::Renamed(RenamedTape {
                    child: Box::new(child),
                    from_tape: renamed.from_tape.clone(),
                    to_tape: renamed.to_tape.clone(),
                }))
            }
        }
    }

    /// The token matching anything on this tape.
    pub fn any(&self) -> Token {
        match self {
            Tape::Renamed(renamed) => renamed.child.any(),
            _ => ANY_CHAR,
        }
    }

    /// Whether two tokens overlap: their intersection.
    pub fn match_tokens(&self, left: Token, right: Token) -> Token {
        match self {
            Tape::Renamed(renamed) => renamed.child.match_tokens(left, right),
            _ => left.and(right),
        }
    }

    pub fn tokenize(&self, tape_name: &str, text: &str) -> Result<Vec<Token>, TapeError> {
        match self {
            Tape::String(tape) => tape.tokenize(tape_name, text),
            Tape::Flag(tape) => tape.tokenize(tape_name, text),
            Tape::Collection(collection) => {
                collection.get(tape_name)?.tokenize(tape_name, text)
            }
            Tape::Renamed(renamed) => renamed.child.tokenize(renamed.adjust(tape_name), text),
        }
    }

    pub fn to_bits(&self, tape_name: &str, symbol: &str) -> Result<Token, TapeError> {
        match self {
            Tape::String(tape) => tape.to_bits(tape_name, symbol),
            Tape::Flag(tape) => tape.to_bits(tape_name, symbol),
            Tape::Collection(collection) => collection.to_bits(tape_name, symbol),
            Tape::Renamed(renamed) => renamed.child.to_bits(renamed.adjust(tape_name), symbol),
        }
    }

    pub fn from_bits(&self, tape_name: &str, token: Token) -> Result<Vec<String>, TapeError> {
        match self {
            Tape::String(tape) => tape.from_bits(tape_name, token),
            Tape::Flag(tape) => tape.from_bits(tape_name, token),
            Tape::Collection(collection) => collection.from_bits(tape_name, token),
            Tape::Renamed(renamed) => renamed.child.from_bits(renamed.adjust(tape_name), token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_registers_one_hot_tokens() {
        let tape = StringTape::new("text");
        let tokens = tape.tokenize("text", "aba").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], Token::single(0));
        assert_eq!(tokens[1], Token::single(1));
        // 'a' again, same index as before
        assert_eq!(tokens[2], Token::single(0));
    }

    #[test]
    fn test_tokenize_wrong_name_fails() {
        let tape = StringTape::new("text");
        let result = tape.tokenize("gloss", "a");
        assert!(result.is_err());
    }

    #[test]
    fn test_to_bits_unregistered_is_empty() {
        let tape = StringTape::new("text");
        tape.tokenize("text", "ab").unwrap();
        assert_eq!(tape.to_bits("text", "a").unwrap(), Token::single(0));
        assert!(tape.to_bits("text", "z").unwrap().is_empty());
    }

    #[test]
    fn test_from_bits_ascending_order() {
        let tape = StringTape::new("text");
        tape.tokenize("text", "ba").unwrap();
        // Decoding follows index order, not the order bits were asked about
        let symbols = tape.from_bits("text", ANY_CHAR).unwrap();
        assert_eq!(symbols, vec!["b".to_owned(), "a".to_owned()]);
    }

    #[test]
    fn test_from_bits_stops_at_unregistered() {
        let tape = StringTape::new("text");
        tape.tokenize("text", "a").unwrap();
        // Bit 5 has no symbol behind it; decoding stops there
        let symbols = tape.from_bits("text", ANY_CHAR).unwrap();
        assert_eq!(symbols, vec!["a".to_owned()]);
    }

    #[test]
    fn test_vocab_overflow_fails_loudly() {
        let tape = StringTape::new("text");
        // 32 distinct characters fill the vocabulary exactly
        let alphabet: String = (0..MAX_NUM_CHARS as u32)
            .map(|i| std::char::from_u32('a' as u32 + i).unwrap())
            .collect();
        tape.tokenize("text", &alphabet).unwrap();
        let result = tape.tokenize("text", "!");
        assert!(result.is_err());
    }

    #[test]
    fn test_string_add_concatenates() {
        let tape = StringTape::new("text");
        assert_eq!(tape.add("foo", "bar"), vec!["foobar".to_owned()]);
    }

    #[test]
    fn test_flag_tokenize_is_atomic() {
        let tape = FlagTape::new("flags");
        let tokens = tape.tokenize("flags", "PAST").unwrap();
        assert_eq!(tokens, vec![Token::single(0)]);
        assert_eq!(
            tape.from_bits("flags", Token::single(0)).unwrap(),
            vec!["PAST".to_owned()]
        );
    }

    #[test]
    fn test_flag_add_unifies() {
        let tape = FlagTape::new("flags");
        assert_eq!(tape.add("", "PAST"), vec!["PAST".to_owned()]);
        assert_eq!(tape.add("PAST", "PAST"), vec!["PAST".to_owned()]);
        assert!(tape.add("PAST", "FUT").is_empty());
    }

    #[test]
    fn test_collection_sentinels() {
        let mut collection = TapeCollection::new();
        assert_eq!(collection.tape_name(), NO_TAPE_NAME);
        assert_eq!(collection.num_tapes(), 0);
        collection.tokenize("text", "hi").unwrap();
        assert_eq!(collection.tape_name(), ANY_TAPE_NAME);
        assert_eq!(collection.num_tapes(), 1);
    }

    #[test]
    fn test_collection_routes_to_member() {
        let mut collection = TapeCollection::new();
        collection.tokenize("text", "hi").unwrap();
        let matched = collection.match_tape("text").unwrap();
        assert_eq!(matched.tape_name(), "text");
        assert!(collection.match_tape("gloss").is_none());
        assert_eq!(collection.to_bits("text", "h").unwrap(), Token::single(0));
        assert!(collection.to_bits("gloss", "h").is_err());
    }

    #[test]
    fn test_collection_vocabs_are_shared_with_matched_tapes() {
        let mut collection = TapeCollection::new();
        collection.tokenize("text", "h").unwrap();
        let matched = collection.match_tape("text").unwrap();
        // Registered later through the collection, visible via the clone
        collection.tokenize("text", "i").unwrap();
        assert_eq!(matched.to_bits("text", "i").unwrap(), Token::single(1));
    }

    #[test]
    fn test_collection_can_carry_a_flag_tape() {
        let mut collection = TapeCollection::new();
        collection.add_tape(Tape::Flag(FlagTape::new("flags")));
        let matched = collection.match_tape("flags").unwrap();
        // Routing reaches the flag tape's atomic tokenization
        assert_eq!(
            matched.tokenize("flags", "PAST").unwrap(),
            vec![Token::single(0)]
        );
        assert_eq!(collection.num_tapes(), 1);
    }

    #[test]
    fn test_renamed_adjusts_incoming_names() {
        let inner = StringTape::new("text");
        inner.tokenize("text", "ab").unwrap();
        let renamed = Tape::Renamed(RenamedTape::new(Tape::String(inner), "surface", "text"));
        // Asking under the new name reaches the underlying tape
        assert_eq!(
            renamed.to_bits("surface", "a").unwrap(),
            Token::single(0)
        );
        assert_eq!(
            renamed.from_bits("surface", Token::single(1)).unwrap(),
            vec!["b".to_owned()]
        );
        // Other names pass through unchanged, and miss here
        assert!(renamed.to_bits("gloss", "a").is_err());
    }

    #[test]
    fn test_renamed_match_tape_stays_renamed() {
        let inner = StringTape::new("text");
        inner.tokenize("text", "a").unwrap();
        let renamed = Tape::Renamed(RenamedTape::new(Tape::String(inner), "surface", "text"));
        let matched = renamed.match_tape("surface").unwrap();
        // The result is still an adapter, so further requests keep resolving
        assert_eq!(matched.to_bits("surface", "a").unwrap(), Token::single(0));
        assert!(renamed.match_tape("gloss").is_none());
    }
}
