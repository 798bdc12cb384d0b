//! The single production step of forward chaining.
//!
//! [`InferenceEngine::derive`] takes one fact and one rule and produces at most
//! one new entity: matching the rule's first premise against the fact either
//! completes the rule (a derived fact) or peels off that premise (a derived,
//! shorter rule). The knowledge base links the result into the support graph
//! and adds it, which is what drives the fixpoint.

use crate::entity::{Entity, Fact, FactId, Justification, Rule, RuleId};
use crate::matcher::{Matcher, Unifier};

/// Forward-chaining step over a [`Matcher`].
#[derive(Debug, Clone, Default)]
pub struct InferenceEngine<M = Unifier> {
    matcher: M,
}

impl InferenceEngine<Unifier> {
    pub fn new() -> Self {
        Self { matcher: Unifier }
    }
}

impl<M: Matcher> InferenceEngine<M> {
    pub fn with_matcher(matcher: M) -> Self {
        Self { matcher }
    }

    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    /// Apply `rule` to `fact`.
    ///
    /// Returns `None` when the rule has no premises or its first premise does
    /// not match the fact. Otherwise the returned entity is unasserted and
    /// carries exactly one justification, `(fact_id, rule_id)`.
    pub fn derive(
        &self,
        (fact_id, fact): (FactId, &Fact),
        (rule_id, rule): (RuleId, &Rule),
    ) -> Option<Entity> {
        let (first, rest) = rule.lhs.split_first()?;

        tracing::trace!(
            fact = %fact.statement,
            premise = %first,
            rhs = %rule.rhs,
            "attempting inference"
        );

        let bindings = self.matcher.unify(first, &fact.statement)?;
        let by = Justification::new(fact_id, rule_id);
        let rhs = self.matcher.instantiate(&rule.rhs, &bindings);

        if rest.is_empty() {
            return Some(Entity::Fact(Fact::derived(rhs, by)));
        }

        let lhs = rest
            .iter()
            .map(|premise| self.matcher.instantiate(premise, &bindings))
            .collect();
        Some(Entity::Rule(Rule::derived(lhs, rhs, by)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Statement;

    fn st(pred: &str, tokens: &[&str]) -> Statement {
        Statement::from_tokens(pred, tokens)
    }

    fn ids() -> (FactId, RuleId) {
        (FactId::new(1).unwrap(), RuleId::new(2).unwrap())
    }

    #[test]
    fn single_premise_rule_derives_fact() {
        let (fid, rid) = ids();
        let fact = Fact::new(st("p", &["a"]));
        let rule = Rule::new(vec![st("p", &["?x"])], st("q", &["?x"]));

        let derived = InferenceEngine::new().derive((fid, &fact), (rid, &rule)).unwrap();
        let Entity::Fact(derived) = derived else {
            panic!("expected a derived fact");
        };
        assert_eq!(derived.statement, st("q", &["a"]));
        assert!(!derived.is_asserted());
        assert_eq!(derived.supported_by(), &[Justification::new(fid, rid)]);
    }

    #[test]
    fn multi_premise_rule_derives_reduced_rule() {
        let (fid, rid) = ids();
        let fact = Fact::new(st("p", &["a"]));
        let rule = Rule::new(
            vec![st("p", &["?x"]), st("q", &["?x", "?y"]), st("r", &["?y"])],
            st("s", &["?x", "?y"]),
        );

        let derived = InferenceEngine::new().derive((fid, &fact), (rid, &rule)).unwrap();
        let Entity::Rule(derived) = derived else {
            panic!("expected a derived rule");
        };
        assert_eq!(derived.lhs, vec![st("q", &["a", "?y"]), st("r", &["?y"])]);
        assert_eq!(derived.rhs, st("s", &["a", "?y"]));
        assert_eq!(derived.supported_by(), &[Justification::new(fid, rid)]);
    }

    #[test]
    fn no_match_derives_nothing() {
        let (fid, rid) = ids();
        let fact = Fact::new(st("p", &["a"]));
        let rule = Rule::new(vec![st("q", &["?x"])], st("r", &["?x"]));
        assert!(InferenceEngine::new().derive((fid, &fact), (rid, &rule)).is_none());
    }

    #[test]
    fn only_first_premise_is_matched() {
        let (fid, rid) = ids();
        let fact = Fact::new(st("q", &["a"]));
        let rule = Rule::new(vec![st("p", &["?x"]), st("q", &["?x"])], st("s", &["?x"]));
        assert!(InferenceEngine::new().derive((fid, &fact), (rid, &rule)).is_none());
    }

    #[test]
    fn empty_premise_list_derives_nothing() {
        let (fid, rid) = ids();
        let fact = Fact::new(st("p", &["a"]));
        let rule = Rule::new(Vec::new(), st("q", &["a"]));
        assert!(InferenceEngine::new().derive((fid, &fact), (rid, &rule)).is_none());
    }
}
