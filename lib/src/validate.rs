use crate::ast::{GrammarDef, GrammarExpr};
use crate::error::{StateError, StateErrors};
use failure::Error;
use std::collections::HashSet;
use std::fmt::Debug;
use std::ops::Deref;

/// A wrapper to indicate that the contents have been validated. This can
/// only be created via `Validate::validate_into`, to prevent tomfoolery.
#[derive(Debug)]
pub struct Valid<T: Debug + Sized>(T);

impl<T: Debug + Sized> Deref for Valid<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Defines validation behavior for a type. Some types require contextual
/// data for validation, such as the set of defined symbol names. This trait
/// defines a type `Context` for that purpose.
pub trait Validate: Debug + Sized {
    type Context;

    /// Validates this object, using the given context. Any errors that are
    /// identified will be returned.
    fn validate(&self, context: &Self::Context) -> Vec<StateError>;

    /// Validates this object, and if it's valid, moves it into a `Valid`
    /// wrapper to indicate that.
    fn validate_into(self, context: &Self::Context) -> Result<Valid<Self>, Error> {
        let errors = self.validate(context);
        if errors.is_empty() {
            Ok(Valid(self))
        } else {
            Err(StateErrors::new(errors).into())
        }
    }
}

impl Validate for GrammarDef {
    type Context = ();

    fn validate(&self, _context: &Self::Context) -> Vec<StateError> {
        // Every defined symbol is referenceable everywhere, including from
        // its own definition
        let defined: HashSet<String> = self.symbols.keys().cloned().collect();

        self.symbols
            .values()
            .map(|expr| expr.validate(&defined))
            .flatten()
            .chain(self.start.validate(&defined))
            .collect()
    }
}

impl Validate for GrammarExpr {
    type Context = HashSet<String>;

    fn validate(&self, context: &Self::Context) -> Vec<StateError> {
        match self {
            GrammarExpr::Lit { .. } | GrammarExpr::Any { .. } => Vec::new(),
            GrammarExpr::Seq(children) => {
                let mut errors = Vec::new();
                if children.is_empty() {
                    errors.push(StateError::EmptySequence);
                }
                errors.extend(children.iter().map(|c| c.validate(context)).flatten());
                errors
            }
            GrammarExpr::Uni(children) => {
                let mut errors = Vec::new();
                if children.is_empty() {
                    errors.push(StateError::EmptyUnion);
                }
                errors.extend(children.iter().map(|c| c.validate(context)).flatten());
                errors
            }
            GrammarExpr::Join(left, right) => {
                let mut errors = left.validate(context);
                errors.extend(right.validate(context));
                errors
            }
            GrammarExpr::Embed(symbol) => {
                if context.contains(symbol) {
                    Vec::new()
                } else {
                    vec![StateError::UndefinedSymbol(symbol.clone())]
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::assert_error;
    use std::collections::BTreeMap;

    fn def(start: GrammarExpr) -> GrammarDef {
        GrammarDef {
            symbols: BTreeMap::new(),
            start,
        }
    }

    #[test]
    fn test_valid_grammar_passes() {
        let result = def(GrammarExpr::Seq(vec![
            GrammarExpr::Lit {
                tape: "text".into(),
                text: "hello".into(),
            },
            GrammarExpr::Any {
                tape: "text".into(),
            },
        ]))
        .validate_into(&());
        assert!(result.is_ok());
    }

    #[test]
    fn test_empty_seq_error() {
        let result = def(GrammarExpr::Seq(vec![])).validate_into(&());
        assert_error("Sequences must have at least 1 child", result);
    }

    #[test]
    fn test_empty_uni_error() {
        let result = def(GrammarExpr::Uni(vec![])).validate_into(&());
        assert_error("Unions must have at least 1 child", result);
    }

    #[test]
    fn test_nested_empty_seq_error() {
        let result = def(GrammarExpr::Join(
            Box::new(GrammarExpr::Seq(vec![])),
            Box::new(GrammarExpr::Lit {
                tape: "text".into(),
                text: "x".into(),
            }),
        ))
        .validate_into(&());
        assert_error("Sequences must have at least 1 child", result);
    }

    #[test]
    fn test_undefined_symbol_error() {
        let result = def(GrammarExpr::Embed("verb".into())).validate_into(&());
        assert_error("Undefined symbol: verb", result);
    }

    #[test]
    fn test_symbols_may_reference_themselves() {
        let mut symbols = BTreeMap::new();
        symbols.insert(
            "s".to_owned(),
            GrammarExpr::Uni(vec![
                GrammarExpr::Seq(vec![
                    GrammarExpr::Lit {
                        tape: "text".into(),
                        text: "a".into(),
                    },
                    GrammarExpr::Embed("s".into()),
                ]),
                GrammarExpr::Lit {
                    tape: "text".into(),
                    text: "".into(),
                },
            ]),
        );
        let result = GrammarDef {
            symbols,
            start: GrammarExpr::Embed("s".into()),
        }
        .validate_into(&());
        assert!(result.is_ok());
    }

    #[test]
    fn test_all_errors_are_collected() {
        let result = def(GrammarExpr::Join(
            Box::new(GrammarExpr::Seq(vec![])),
            Box::new(GrammarExpr::Embed("verb".into())),
        ))
        .validate_into(&());
        match result {
            Ok(_) => panic!("Expected Err but received Ok!"),
            Err(error) => {
                let message = error.to_string();
                assert!(message.contains("Sequences must have at least 1 child"));
                assert!(message.contains("Undefined symbol: verb"));
            }
        }
    }
}
