//! Export types for serializing knowledge base state.
//!
//! These types provide human-readable representations of facts, rules and
//! their justifications suitable for JSON export.

use serde::{Deserialize, Serialize};

use crate::entity::{Rule, Support};
use crate::kb::KnowledgeBase;
use crate::matcher::Matcher;

/// A justification pair with both sides resolved to display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JustificationExport {
    pub fact: String,
    pub rule: String,
}

/// Exported fact or rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityExport {
    /// Numeric id within the knowledge base.
    pub id: u64,
    /// Display text (`(pred ...)` for facts, `((lhs ...)) -> (rhs)` for rules).
    pub text: String,
    pub asserted: bool,
    pub supported_by: Vec<JustificationExport>,
    /// Number of facts and rules this entity directly supports.
    pub supports: usize,
}

/// The full contents of a knowledge base, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbSnapshot {
    pub facts: Vec<EntityExport>,
    pub rules: Vec<EntityExport>,
}

impl<M: Matcher> KnowledgeBase<M> {
    pub fn snapshot(&self) -> KbSnapshot {
        let facts = self
            .facts()
            .map(|(id, fact)| self.export_entity(id.get(), fact.statement.to_string(), fact.support()))
            .collect();
        let rules = self
            .rules()
            .map(|(id, rule)| self.export_entity(id.get(), rule_text(rule), rule.support()))
            .collect();
        KbSnapshot { facts, rules }
    }

    fn export_entity(&self, id: u64, text: String, support: &Support) -> EntityExport {
        let supported_by = support
            .supported_by()
            .iter()
            .map(|pair| JustificationExport {
                fact: self
                    .fact(pair.fact())
                    .map_or_else(|| pair.fact().to_string(), |f| f.statement.to_string()),
                rule: self
                    .rule(pair.rule())
                    .map_or_else(|| pair.rule().to_string(), rule_text),
            })
            .collect();
        EntityExport {
            id,
            text,
            asserted: support.is_asserted(),
            supported_by,
            supports: support.supports_facts().len() + support.supports_rules().len(),
        }
    }
}

/// A rule without its `rule: ` prefix.
fn rule_text(rule: &Rule) -> String {
    let text = rule.to_string();
    text.strip_prefix("rule: ")
        .map(str::to_string)
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Statement;

    fn st(pred: &str, tokens: &[&str]) -> Statement {
        Statement::from_tokens(pred, tokens)
    }

    #[test]
    fn snapshot_lists_entities_with_support() {
        let mut kb = KnowledgeBase::new();
        kb.assert(st("p", &["a"]));
        kb.assert(Rule::new(vec![st("p", &["?x"])], st("q", &["?x"])));

        let snap = kb.snapshot();
        assert_eq!(snap.facts.len(), 2);
        assert_eq!(snap.rules.len(), 1);
        assert_eq!(snap.facts[0].text, "(p a)");
        assert_eq!(snap.facts[0].supports, 1);
        assert_eq!(snap.rules[0].text, "((p ?x)) -> (q ?x)");
        assert_eq!(
            snap.facts[1].supported_by,
            vec![JustificationExport {
                fact: "(p a)".into(),
                rule: "((p ?x)) -> (q ?x)".into(),
            }]
        );
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let mut kb = KnowledgeBase::new();
        kb.assert(st("p", &["a"]));
        let json = serde_json::to_string(&kb.snapshot()).unwrap();
        let back: KbSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.facts[0].text, "(p a)");
        assert!(back.facts[0].asserted);
    }
}
