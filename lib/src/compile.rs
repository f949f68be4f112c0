use crate::ast::{GrammarDef, GrammarExpr};
use crate::state::{any_char, embed, join, lit, seq, uni, State, SymbolTable};
use crate::validate::Valid;
use std::rc::Rc;

/// A grammar description lowered into live states: the start state plus the
/// symbol table its embeddings resolve against.
#[derive(Debug)]
pub struct CompiledGrammar {
    pub start: Rc<State>,
    pub symbols: Rc<SymbolTable>,
}

/// Defines compilation steps for a single type.
pub trait Compile {
    type Context;
    type Output;

    /// Lower this data type into its runtime representation.
    fn compile(&self, context: &Self::Context) -> Self::Output;
}

impl Compile for Valid<GrammarDef> {
    type Context = ();
    type Output = CompiledGrammar;

    /// Compiles a whole grammar description. The symbol table is created
    /// first and shared with every embed state, so definitions are free to
    /// reference symbols defined later, or themselves.
    fn compile(&self, _context: &Self::Context) -> CompiledGrammar {
        let symbols = Rc::new(SymbolTable::new());
        for (name, expr) in &self.symbols {
            symbols.define(name, expr.compile(&symbols));
        }
        let start = self.start.compile(&symbols);
        CompiledGrammar { start, symbols }
    }
}

impl Compile for GrammarExpr {
    type Context = Rc<SymbolTable>;
    type Output = Rc<State>;

    fn compile(&self, symbols: &Self::Context) -> Rc<State> {
        match self {
            GrammarExpr::Lit { tape, text } => lit(tape, text),
            GrammarExpr::Any { tape } => any_char(tape),
            GrammarExpr::Seq(children) => {
                seq(children.iter().map(|c| c.compile(symbols)).collect())
                    .expect("Empty sequence! Something went wrong in validation.")
            }
            GrammarExpr::Uni(children) => {
                uni(children.iter().map(|c| c.compile(symbols)).collect())
                    .expect("Empty union! Something went wrong in validation.")
            }
            GrammarExpr::Join(left, right) => {
                join(left.compile(symbols), right.compile(symbols))
            }
            GrammarExpr::Embed(symbol) => embed(symbol, symbols),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{check_outputs, rec};
    use crate::validate::Validate;
    use std::collections::BTreeMap;

    fn text_lit(text: &str) -> GrammarExpr {
        GrammarExpr::Lit {
            tape: "text".into(),
            text: text.into(),
        }
    }

    #[test]
    fn test_compile_sequence() {
        let compiled = GrammarDef {
            symbols: BTreeMap::new(),
            start: GrammarExpr::Seq(vec![text_lit("hello"), text_lit("world")]),
        }
        .validate_into(&())
        .unwrap()
        .compile(&());
        let outputs = compiled.start.generate().unwrap();
        check_outputs(&outputs, &[rec(&[("text", "helloworld")])]);
    }

    #[test]
    fn test_compile_join_of_alternations() {
        let compiled = GrammarDef {
            symbols: BTreeMap::new(),
            start: GrammarExpr::Join(
                Box::new(GrammarExpr::Uni(vec![
                    text_lit("hello"),
                    text_lit("goodbye"),
                ])),
                Box::new(GrammarExpr::Uni(vec![
                    text_lit("goodbye"),
                    text_lit("welcome"),
                ])),
            ),
        }
        .validate_into(&())
        .unwrap()
        .compile(&());
        let outputs = compiled.start.generate().unwrap();
        check_outputs(&outputs, &[rec(&[("text", "goodbye")])]);
    }

    #[test]
    fn test_compile_recursive_symbol() {
        let mut symbols = BTreeMap::new();
        symbols.insert(
            "s".to_owned(),
            GrammarExpr::Uni(vec![
                GrammarExpr::Seq(vec![text_lit("a"), GrammarExpr::Embed("s".into())]),
                text_lit(""),
            ]),
        );
        let compiled = GrammarDef {
            symbols,
            start: GrammarExpr::Embed("s".into()),
        }
        .validate_into(&())
        .unwrap()
        .compile(&());
        let outputs = compiled.start.generate().unwrap();
        // Bounded unfolding of the self-reference: the start expression is
        // itself an embedding, so it spends one level of the default depth
        assert_eq!(outputs.len(), 4);
    }
}
