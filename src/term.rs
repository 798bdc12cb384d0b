//! Terms and statements: the unit of knowledge held by the knowledge base.
//!
//! A [`Statement`] is a predicate applied to an ordered list of [`Term`]s.
//! Terms are either constants or variables; variables are written with a
//! leading `?` in text form (`?x`) and stored without the sigil.
//!
//! Structural equality (`==`) is what the knowledge base uses for
//! deduplication. It is *not* unification: `(p ?x)` and `(p ?y)` are two
//! different statements even though they unify.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix that marks a variable in text form.
pub const VARIABLE_SIGIL: char = '?';

/// A single argument of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    /// An atomic identifier, equal only to itself.
    Constant(String),
    /// A variable name (without the `?` sigil).
    Variable(String),
}

impl Term {
    /// Create a constant term.
    pub fn constant(name: impl Into<String>) -> Self {
        Self::Constant(name.into())
    }

    /// Create a variable term. A leading `?` is stripped if present.
    pub fn variable(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.strip_prefix(VARIABLE_SIGIL) {
            Some(bare) => Self::Variable(bare.to_string()),
            None => Self::Variable(name),
        }
    }

    /// Classify a text token: `?name` is a variable, anything else a constant.
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        match token.strip_prefix(VARIABLE_SIGIL) {
            Some(var) => Self::Variable(var.to_string()),
            None => Self::Constant(token.to_string()),
        }
    }

    /// Returns `true` if this term is a variable.
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    /// The identifier without any sigil.
    pub fn name(&self) -> &str {
        match self {
            Self::Constant(name) | Self::Variable(name) => name,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(name) => write!(f, "{name}"),
            Self::Variable(name) => write!(f, "{VARIABLE_SIGIL}{name}"),
        }
    }
}

/// A predicate applied to an ordered list of terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Statement {
    pub predicate: String,
    pub terms: Vec<Term>,
}

impl Statement {
    pub fn new(predicate: impl Into<String>, terms: Vec<Term>) -> Self {
        Self {
            predicate: predicate.into(),
            terms,
        }
    }

    /// Build a statement from text tokens, classifying each with [`Term::parse`].
    ///
    /// ```
    /// use akh_chain::term::{Statement, Term};
    ///
    /// let s = Statement::from_tokens("isa", &["?x", "block"]);
    /// assert_eq!(s.terms[0], Term::variable("x"));
    /// assert_eq!(s.to_string(), "(isa ?x block)");
    /// ```
    pub fn from_tokens(predicate: impl Into<String>, tokens: &[&str]) -> Self {
        Self::new(predicate, tokens.iter().map(|t| Term::parse(t)).collect())
    }

    pub fn arity(&self) -> usize {
        self.terms.len()
    }

    /// Returns `true` if no term is a variable.
    pub fn is_ground(&self) -> bool {
        !self.terms.iter().any(Term::is_variable)
    }

    /// Iterate over the distinct variable names in order of first appearance.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        let mut seen: Vec<&str> = Vec::new();
        self.terms.iter().filter_map(move |t| match t {
            Term::Variable(name) if !seen.contains(&name.as_str()) => {
                seen.push(name);
                Some(name.as_str())
            }
            _ => None,
        })
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.predicate)?;
        for term in &self.terms {
            write!(f, " {term}")?;
        }
        write!(f, ")")
    }
}
