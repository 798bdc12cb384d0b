//! Justification trees: why a fact or rule is in the knowledge base.
//!
//! The support graph can contain cycles (mutually recursive rules over a
//! finite domain justify each other), so expansion stops at any entity that is
//! already on the current path and marks it instead.

use std::fmt;

use serde::Serialize;

use crate::entity::{EntityId, FactId, RuleId};
use crate::kb::KnowledgeBase;
use crate::matcher::Matcher;
use crate::term::Statement;

/// Why expansion of a node stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cut {
    /// The entity already appears higher up on this branch.
    Cycle,
    /// The configured depth limit was reached.
    Depth,
}

/// One entity and the justifications that hold it in the KB.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub id: EntityId,
    /// Display text of the entity (`fact: ...` or `rule: ...`).
    pub text: String,
    pub asserted: bool,
    pub supported_by: Vec<SupportPair>,
    pub cut: Option<Cut>,
}

/// A single `(fact, rule)` justification, both sides expanded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportPair {
    pub fact: Explanation,
    pub rule: Explanation,
}

impl<M: Matcher> KnowledgeBase<M> {
    /// Explain the fact structurally equal to `statement`, without depth limit.
    pub fn explain(&self, statement: &Statement) -> Option<Explanation> {
        self.explain_limited(statement, None)
    }

    /// Explain a fact, expanding at most `max_depth` levels of support.
    pub fn explain_limited(
        &self,
        statement: &Statement,
        max_depth: Option<usize>,
    ) -> Option<Explanation> {
        let id = self.find_fact(statement)?;
        self.explain_entity(EntityId::Fact(id), max_depth)
    }

    pub fn explain_fact(&self, id: FactId, max_depth: Option<usize>) -> Option<Explanation> {
        self.explain_entity(EntityId::Fact(id), max_depth)
    }

    pub fn explain_rule(&self, id: RuleId, max_depth: Option<usize>) -> Option<Explanation> {
        self.explain_entity(EntityId::Rule(id), max_depth)
    }

    fn explain_entity(&self, id: EntityId, max_depth: Option<usize>) -> Option<Explanation> {
        self.support(id)?;
        let mut path = Vec::new();
        Some(self.expand(id, max_depth, &mut path))
    }

    fn expand(&self, id: EntityId, remaining: Option<usize>, path: &mut Vec<EntityId>) -> Explanation {
        let text = self.describe(id);
        let Some(support) = self.support(id) else {
            return Explanation {
                id,
                text,
                asserted: false,
                supported_by: Vec::new(),
                cut: None,
            };
        };

        let mut node = Explanation {
            id,
            text,
            asserted: support.is_asserted(),
            supported_by: Vec::new(),
            cut: None,
        };
        if support.supported_by().is_empty() {
            return node;
        }
        if path.contains(&id) {
            node.cut = Some(Cut::Cycle);
            return node;
        }
        if remaining == Some(0) {
            node.cut = Some(Cut::Depth);
            return node;
        }

        let next = remaining.map(|d| d - 1);
        path.push(id);
        node.supported_by = support
            .supported_by()
            .iter()
            .map(|pair| SupportPair {
                fact: self.expand(EntityId::Fact(pair.fact()), next, path),
                rule: self.expand(EntityId::Rule(pair.rule()), next, path),
            })
            .collect();
        path.pop();
        node
    }
}

impl Explanation {
    fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "  ".repeat(indent);
        write!(f, "{pad}{}", self.text)?;
        if self.asserted {
            write!(f, " ASSERTED")?;
        }
        match self.cut {
            Some(Cut::Cycle) => write!(f, " (cyclic support)")?,
            Some(Cut::Depth) => write!(f, " ...")?,
            None => {}
        }
        writeln!(f)?;

        if !self.supported_by.is_empty() {
            writeln!(f, "{pad}  SUPPORTED BY")?;
            for pair in &self.supported_by {
                pair.fact.write_indented(f, indent + 2)?;
                pair.rule.write_indented(f, indent + 2)?;
            }
        }
        Ok(())
    }

    /// Number of nodes in the tree, including this one.
    pub fn size(&self) -> usize {
        1 + self
            .supported_by
            .iter()
            .map(|p| p.fact.size() + p.rule.size())
            .sum::<usize>()
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}
