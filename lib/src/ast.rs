use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One node in a grammar description: the serializable counterpart of the
/// state constructors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GrammarExpr {
    /// A fixed string on the named tape
    Lit { tape: String, text: String },
    /// Any single character on the named tape
    Any { tape: String },
    /// Concatenation, in order
    Seq(Vec<GrammarExpr>),
    /// Alternation
    Uni(Vec<GrammarExpr>),
    /// Agreement on shared tapes, free combination on the rest
    Join(Box<GrammarExpr>, Box<GrammarExpr>),
    /// Reference to a named sub-grammar
    Embed(String),
}

/// A whole grammar description: named sub-grammars plus the expression to
/// generate from. The root of the description AST.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarDef {
    /// Sub-grammars that `Embed` nodes may reference. Definitions may
    /// reference each other and themselves.
    #[serde(default)]
    pub symbols: BTreeMap<String, GrammarExpr>,
    pub start: GrammarExpr,
}
