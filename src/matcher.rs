//! Pattern matching between statements.
//!
//! The knowledge base consumes matching through the [`Matcher`] trait: it
//! needs to unify a pattern with a candidate statement and to instantiate a
//! template under the resulting [`Bindings`]. [`Unifier`] is the default
//! implementation: occurs-check-free, first-order, one pass left to right over
//! the term lists.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::term::{Statement, Term};

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// A single `variable → term` assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// Variable name without the `?` sigil.
    pub variable: String,
    pub value: Term,
}

/// A consistent substitution: no variable is bound to two different terms.
///
/// Bindings are kept in the order they were made so that printed answers are
/// reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings {
    bindings: Vec<Binding>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// The term a variable is bound to, if any.
    pub fn bound_to(&self, variable: &str) -> Option<&Term> {
        self.bindings
            .iter()
            .find(|b| b.variable == variable)
            .map(|b| &b.value)
    }

    /// Bind `variable` to `value` unless it is already bound.
    ///
    /// Returns `false` when the variable is already bound to a different term,
    /// which is how inconsistent assignments are rejected.
    pub fn test_and_bind(&mut self, variable: &str, value: &Term) -> bool {
        match self.bound_to(variable) {
            Some(existing) => existing == value,
            None => {
                self.bindings.push(Binding {
                    variable: variable.to_string(),
                    value: value.clone(),
                });
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.bindings.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "?{} : {}", b.variable, b.value)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Matcher contract
// ---------------------------------------------------------------------------

/// Unification and instantiation over statements.
pub trait Matcher {
    /// Unify `pattern` with `candidate`. Variables on either side may bind to
    /// terms on the other. Returns `None` on predicate or arity mismatch, or
    /// on an inconsistent assignment. A successful match of two ground
    /// statements yields empty bindings.
    fn unify(&self, pattern: &Statement, candidate: &Statement) -> Option<Bindings>;

    /// Substitute every bound variable in `template`. Unbound variables and
    /// constants are left unchanged.
    fn instantiate(&self, template: &Statement, bindings: &Bindings) -> Statement;
}

/// Default first-order matcher over constant/variable terms.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unifier;

impl Matcher for Unifier {
    fn unify(&self, pattern: &Statement, candidate: &Statement) -> Option<Bindings> {
        if pattern.predicate != candidate.predicate || pattern.arity() != candidate.arity() {
            return None;
        }

        let mut bindings = Bindings::new();
        for (left, right) in pattern.terms.iter().zip(&candidate.terms) {
            let consistent = match (left, right) {
                (Term::Variable(var), value) => bindings.test_and_bind(var, value),
                (value, Term::Variable(var)) => bindings.test_and_bind(var, value),
                (a, b) => a == b,
            };
            if !consistent {
                return None;
            }
        }
        Some(bindings)
    }

    fn instantiate(&self, template: &Statement, bindings: &Bindings) -> Statement {
        let terms = template
            .terms
            .iter()
            .map(|term| match term {
                Term::Variable(var) => bindings.bound_to(var).cloned().unwrap_or_else(|| term.clone()),
                Term::Constant(_) => term.clone(),
            })
            .collect();
        Statement::new(template.predicate.clone(), terms)
    }
}
