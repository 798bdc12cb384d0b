//! The knowledge base: deduplicated facts and rules, eager forward chaining,
//! and justification-aware retraction.
//!
//! Every public mutation leaves the KB at a local fixpoint and with these
//! invariants intact (checked by [`KnowledgeBase::verify`]):
//!
//! 1. No two facts share a statement; no two rules share premises and conclusion.
//! 2. An entity is stored iff it is asserted or has at least one justification.
//! 3. A justification `(F, R)` on `E` is mirrored by `E` in the supports lists
//!    of both `F` and `R`.
//! 4. No stored justification names a removed entity.
//!
//! Forward chaining assumes the derivable set is finite. A rule set that keeps
//! producing new statements (e.g. by nesting terms without bound) does not
//! terminate; there is no depth limit.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::fmt;

use serde::Serialize;

use crate::entity::{
    Entity, EntityId, Fact, FactId, IdAllocator, Justification, Rule, RuleId, RuleKey, Support,
};
use crate::error::{KbError, KbResult};
use crate::infer::InferenceEngine;
use crate::matcher::{Bindings, Matcher, Unifier};
use crate::term::Statement;

/// A newly inserted entity still being paired with the opposite arena.
///
/// The cursor is the last partner id visited. Partners are looked up in the
/// live arena on every step, so entities inserted further down the cascade
/// are visited too.
#[derive(Debug, Clone, Copy)]
enum Frame {
    Fact { id: FactId, cursor: Option<RuleId> },
    Rule { id: RuleId, cursor: Option<FactId> },
}

/// First key of `map` strictly after `cursor`.
fn next_key<K: Ord + Copy, V>(map: &BTreeMap<K, V>, cursor: Option<K>) -> Option<K> {
    match cursor {
        None => map.keys().next().copied(),
        Some(after) => map
            .range((Bound::Excluded(after), Bound::Unbounded))
            .next()
            .map(|(&k, _)| k),
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// One answer to an [`ask`](KnowledgeBase::ask).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub bindings: Bindings,
    pub fact: FactId,
    pub statement: Statement,
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bindings.is_empty() {
            write!(f, "{}", self.statement)
        } else {
            write!(f, "{} ({})", self.bindings, self.statement)
        }
    }
}

/// Outcome of retracting a fact that was present.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Retraction {
    /// Facts removed by the cascade, in removal order. The retracted fact
    /// comes first unless it survived.
    pub removed_facts: Vec<Fact>,
    /// Rules removed by the cascade, in removal order.
    pub removed_rules: Vec<Rule>,
    /// The retracted fact is still present because it has other support.
    pub survived: bool,
    /// Longest chain of removals triggered by this retraction.
    pub cascade_depth: usize,
}

impl Retraction {
    pub fn removed_count(&self) -> usize {
        self.removed_facts.len() + self.removed_rules.len()
    }
}

// ---------------------------------------------------------------------------
// Knowledge base
// ---------------------------------------------------------------------------

/// In-memory deductive store with truth maintenance.
///
/// Facts and rules are kept in insertion order; inference visits partners in
/// that order, so derivations are reproducible. Every mutation takes
/// `&mut self`; wrap the KB in a mutex to share it across threads.
#[derive(Debug, Clone)]
pub struct KnowledgeBase<M = Unifier> {
    facts: BTreeMap<FactId, Fact>,
    rules: BTreeMap<RuleId, Rule>,
    fact_index: HashMap<Statement, FactId>,
    rule_index: HashMap<RuleKey, RuleId>,
    ids: IdAllocator,
    engine: InferenceEngine<M>,
}

impl KnowledgeBase<Unifier> {
    /// Create an empty knowledge base using the default [`Unifier`].
    pub fn new() -> Self {
        Self::with_matcher(Unifier)
    }
}

impl Default for KnowledgeBase<Unifier> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Matcher> KnowledgeBase<M> {
    /// Create an empty knowledge base over a custom matcher.
    pub fn with_matcher(matcher: M) -> Self {
        Self {
            facts: BTreeMap::new(),
            rules: BTreeMap::new(),
            fact_index: HashMap::new(),
            rule_index: HashMap::new(),
            ids: IdAllocator::new(),
            engine: InferenceEngine::with_matcher(matcher),
        }
    }

    /// Build a knowledge base by asserting each entity in order.
    pub fn from_entities(matcher: M, entities: impl IntoIterator<Item = Entity>) -> Self {
        let mut kb = Self::with_matcher(matcher);
        for entity in entities {
            kb.assert(entity);
        }
        kb
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Assert a fact or rule and derive all of its consequences.
    ///
    /// Any support information on the argument is discarded: the entity
    /// enters as asserted with no justification. Asserting something already
    /// present marks it asserted and keeps its existing justifications.
    pub fn assert(&mut self, entity: impl Into<Entity>) {
        let entity = match entity.into() {
            Entity::Fact(fact) => Entity::Fact(Fact::new(fact.statement)),
            Entity::Rule(rule) => Entity::Rule(Rule::new(rule.lhs, rule.rhs)),
        };
        tracing::debug!(entity = %entity, "asserting");
        self.add(entity);
    }

    /// Insert or merge `entity`, then run forward chaining to fixpoint.
    ///
    /// A newly inserted entity is paired with every partner in insertion
    /// order, including partners that appear while its pairs are being
    /// processed. Frames run depth first, so a derivation's own consequences
    /// are exhausted before its parent moves to the next partner.
    fn add(&mut self, entity: Entity) {
        let mut frames: Vec<Frame> = Vec::new();
        if let (_, Some(frame)) = self.insert_or_merge(entity) {
            frames.push(frame);
        }

        while let Some(top) = frames.last_mut() {
            let pair = match top {
                Frame::Fact { id, cursor } => next_key(&self.rules, *cursor).map(|rule| {
                    *cursor = Some(rule);
                    (*id, rule)
                }),
                Frame::Rule { id, cursor } => next_key(&self.facts, *cursor).map(|fact| {
                    *cursor = Some(fact);
                    (fact, *id)
                }),
            };
            let Some((fact_id, rule_id)) = pair else {
                frames.pop();
                continue;
            };
            let (Some(fact), Some(rule)) = (self.facts.get(&fact_id), self.rules.get(&rule_id))
            else {
                continue;
            };
            let Some(derived) = self.engine.derive((fact_id, fact), (rule_id, rule)) else {
                continue;
            };

            let (target, frame) = self.insert_or_merge(derived);
            self.link(Justification::new(fact_id, rule_id), target);
            if let Some(frame) = frame {
                frames.push(frame);
            }
        }
    }

    /// Store `entity`, merging into a structurally equal one if present.
    ///
    /// Returns the id of the stored entity and, when it is new, the frame that
    /// pairs it with the opposite arena.
    fn insert_or_merge(&mut self, entity: Entity) -> (EntityId, Option<Frame>) {
        match entity {
            Entity::Fact(fact) => {
                let existing = self.fact_index.get(&fact.statement).copied();
                if let Some((id, stored)) =
                    existing.and_then(|id| self.facts.get_mut(&id).map(|f| (id, f)))
                {
                    merge(&mut stored.support, fact.support);
                    return (EntityId::Fact(id), None);
                }

                tracing::trace!(fact = %fact.statement, "adding fact");
                let id = self.ids.next_fact();
                self.fact_index.insert(fact.statement.clone(), id);
                self.facts.insert(id, fresh_fact(fact));
                (EntityId::Fact(id), Some(Frame::Fact { id, cursor: None }))
            }
            Entity::Rule(rule) => {
                let key = rule.key();
                let existing = self.rule_index.get(&key).copied();
                if let Some((id, stored)) =
                    existing.and_then(|id| self.rules.get_mut(&id).map(|r| (id, r)))
                {
                    merge(&mut stored.support, rule.support);
                    return (EntityId::Rule(id), None);
                }

                tracing::trace!(rule = %rule, "adding rule");
                let id = self.ids.next_rule();
                self.rule_index.insert(key, id);
                self.rules.insert(id, fresh_rule(rule));
                (EntityId::Rule(id), Some(Frame::Rule { id, cursor: None }))
            }
        }
    }

    /// Record `target` as supported by both members of `by`.
    fn link(&mut self, by: Justification, target: EntityId) {
        if let Some(fact) = self.facts.get_mut(&by.fact()) {
            fact.support.link(target);
        }
        if let Some(rule) = self.rules.get_mut(&by.rule()) {
            rule.support.link(target);
        }
    }

    /// Retract an asserted fact and remove everything that loses all support.
    ///
    /// Returns `None` (and changes nothing) if no fact with this statement is
    /// present. A fact that is still derivable from other support stays, only
    /// losing its asserted flag.
    pub fn retract(&mut self, statement: &Statement) -> Option<Retraction> {
        tracing::debug!(fact = %statement, "retracting");
        let id = self.find_fact(statement)?;
        Some(self.remove(EntityId::Fact(id)))
    }

    /// Cascading removal starting at `target`.
    ///
    /// A fact target is unasserted first. Any entity that ends up with no
    /// assertion and no justification is deleted and stripped from the
    /// justifications of everything it supported, which may in turn leave
    /// those unsupported. Runs on an explicit worklist.
    fn remove(&mut self, target: EntityId) -> Retraction {
        let mut report = Retraction::default();
        let mut work: Vec<(EntityId, usize)> = vec![(target, 0)];

        while let Some((id, depth)) = work.pop() {
            let removed_support = match id {
                EntityId::Fact(fact_id) => {
                    let Some(fact) = self.facts.get_mut(&fact_id) else {
                        continue;
                    };
                    fact.support.asserted = false;
                    if fact.support.is_live() {
                        if id == target {
                            report.survived = true;
                        }
                        continue;
                    }
                    let Some(fact) = self.facts.remove(&fact_id) else {
                        continue;
                    };
                    tracing::debug!(fact = %fact.statement, depth, "removing fact");
                    self.fact_index.remove(&fact.statement);
                    let support = fact.support.clone();
                    report.removed_facts.push(fact);
                    support
                }
                EntityId::Rule(rule_id) => {
                    let live = self.rules.get(&rule_id).map(|r| r.support.is_live());
                    if live != Some(false) {
                        continue;
                    }
                    let Some(rule) = self.rules.remove(&rule_id) else {
                        continue;
                    };
                    tracing::debug!(rule = %rule, depth, "removing rule");
                    self.rule_index.remove(&rule.key());
                    let support = rule.support.clone();
                    report.removed_rules.push(rule);
                    support
                }
            };

            report.cascade_depth = report.cascade_depth.max(depth);
            for dependent in removed_support.dependents() {
                let orphaned = match id {
                    EntityId::Fact(gone) => self.strip_support(dependent, |j| j.fact() == gone),
                    EntityId::Rule(gone) => self.strip_support(dependent, |j| j.rule() == gone),
                };
                if orphaned {
                    work.push((dependent, depth + 1));
                }
            }
        }

        report
    }

    /// Drop the justifications of `dependent` matching `pred`.
    ///
    /// Surviving partners of the dropped pairs stop listing `dependent` once
    /// no remaining pair names them. Returns `true` if `dependent` lost its
    /// last justification here and is not asserted.
    fn strip_support(&mut self, dependent: EntityId, pred: impl Fn(&Justification) -> bool) -> bool {
        let Some(support) = self.support_mut(dependent) else {
            return false;
        };
        let dropped: Vec<Justification> =
            support.supported_by.iter().filter(|&j| pred(j)).copied().collect();
        if dropped.is_empty() {
            return false;
        }
        support.strip(&pred);
        let remaining = support.supported_by.clone();
        let orphaned = !support.is_live();

        for pair in dropped {
            if !remaining.iter().any(|j| j.fact() == pair.fact()) {
                if let Some(fact) = self.facts.get_mut(&pair.fact()) {
                    fact.support.unlink(dependent);
                }
            }
            if !remaining.iter().any(|j| j.rule() == pair.rule()) {
                if let Some(rule) = self.rules.get_mut(&pair.rule()) {
                    rule.support.unlink(dependent);
                }
            }
        }
        orphaned
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Match a fact-shaped query against every fact, in insertion order.
    ///
    /// A rule-shaped query is invalid: it is reported through `tracing` and
    /// answered with no results. No inference happens here.
    pub fn ask(&self, query: &Entity) -> Vec<Answer> {
        match query {
            Entity::Fact(fact) => self.ask_statement(&fact.statement),
            Entity::Rule(rule) => {
                tracing::warn!(query = %rule, "invalid ask: only facts can be asked");
                Vec::new()
            }
        }
    }

    /// Every fact that unifies with `query`, paired with the bindings.
    pub fn ask_statement(&self, query: &Statement) -> Vec<Answer> {
        tracing::debug!(query = %query, "asking");
        self.facts
            .iter()
            .filter_map(|(&id, fact)| {
                self.engine
                    .matcher()
                    .unify(query, &fact.statement)
                    .map(|bindings| Answer {
                        bindings,
                        fact: id,
                        statement: fact.statement.clone(),
                    })
            })
            .collect()
    }

    pub fn fact(&self, id: FactId) -> Option<&Fact> {
        self.facts.get(&id)
    }

    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(&id)
    }

    /// The id of the fact structurally equal to `statement`.
    pub fn find_fact(&self, statement: &Statement) -> Option<FactId> {
        self.fact_index
            .get(statement)
            .copied()
            .filter(|id| self.facts.contains_key(id))
    }

    /// The id of the rule with exactly these premises and conclusion.
    pub fn find_rule(&self, lhs: &[Statement], rhs: &Statement) -> Option<RuleId> {
        self.rule_index
            .get(&(lhs.to_vec(), rhs.clone()))
            .copied()
            .filter(|id| self.rules.contains_key(id))
    }

    /// The stored fact structurally equal to `statement`.
    pub fn get_fact(&self, statement: &Statement) -> Option<&Fact> {
        self.find_fact(statement).and_then(|id| self.facts.get(&id))
    }

    pub fn contains(&self, statement: &Statement) -> bool {
        self.find_fact(statement).is_some()
    }

    /// Facts in insertion order.
    pub fn facts(&self) -> impl Iterator<Item = (FactId, &Fact)> {
        self.facts.iter().map(|(&id, fact)| (id, fact))
    }

    /// Rules in insertion order.
    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.rules.iter().map(|(&id, rule)| (id, rule))
    }

    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty() && self.rules.is_empty()
    }

    pub(crate) fn support(&self, id: EntityId) -> Option<&Support> {
        match id {
            EntityId::Fact(id) => self.facts.get(&id).map(|f| &f.support),
            EntityId::Rule(id) => self.rules.get(&id).map(|r| &r.support),
        }
    }

    fn support_mut(&mut self, id: EntityId) -> Option<&mut Support> {
        match id {
            EntityId::Fact(id) => self.facts.get_mut(&id).map(|f| &mut f.support),
            EntityId::Rule(id) => self.rules.get_mut(&id).map(|r| &mut r.support),
        }
    }

    pub(crate) fn describe(&self, id: EntityId) -> String {
        match id {
            EntityId::Fact(fid) => self
                .facts
                .get(&fid)
                .map_or_else(|| fid.to_string(), |f| f.to_string()),
            EntityId::Rule(rid) => self
                .rules
                .get(&rid)
                .map_or_else(|| rid.to_string(), |r| r.to_string()),
        }
    }

    // -----------------------------------------------------------------------
    // Verification
    // -----------------------------------------------------------------------

    /// Check every structural invariant of the knowledge base.
    ///
    /// A failure here is a bug in the mutation code, never a user error.
    pub fn verify(&self) -> KbResult<()> {
        self.verify_uniqueness()?;

        let entities = self
            .facts
            .keys()
            .map(|&id| EntityId::Fact(id))
            .chain(self.rules.keys().map(|&id| EntityId::Rule(id)));

        for id in entities {
            let Some(support) = self.support(id) else {
                continue;
            };
            if !support.is_live() {
                return Err(KbError::Unjustified {
                    entity: self.describe(id),
                });
            }

            for pair in support.supported_by() {
                let partners = [EntityId::Fact(pair.fact()), EntityId::Rule(pair.rule())];
                for partner in partners {
                    let Some(partner_support) = self.support(partner) else {
                        return Err(KbError::DanglingSupport {
                            entity: self.describe(id),
                            missing: partner.to_string(),
                        });
                    };
                    if !lists(partner_support, id) {
                        return Err(KbError::AsymmetricLink {
                            entity: self.describe(id),
                            partner: self.describe(partner),
                        });
                    }
                }
            }

            for dependent in support.dependents() {
                let named = self.support(dependent).is_some_and(|s| {
                    s.supported_by().iter().any(|j| match id {
                        EntityId::Fact(f) => j.fact() == f,
                        EntityId::Rule(r) => j.rule() == r,
                    })
                });
                if !named {
                    return Err(KbError::DanglingSupport {
                        entity: self.describe(id),
                        missing: dependent.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn verify_uniqueness(&self) -> KbResult<()> {
        let mut seen_facts: HashMap<&Statement, FactId> = HashMap::new();
        for (&id, fact) in &self.facts {
            if let Some(first) = seen_facts.insert(&fact.statement, id) {
                return Err(KbError::DuplicateFact {
                    statement: fact.statement.to_string(),
                    first: first.to_string(),
                    second: id.to_string(),
                });
            }
            if self.fact_index.get(&fact.statement) != Some(&id) {
                return Err(KbError::StaleIndex {
                    entity: fact.to_string(),
                });
            }
        }

        let mut seen_rules: HashMap<RuleKey, RuleId> = HashMap::new();
        for (&id, rule) in &self.rules {
            let key = rule.key();
            if let Some(first) = seen_rules.insert(key.clone(), id) {
                return Err(KbError::DuplicateRule {
                    rule: rule.to_string(),
                    first: first.to_string(),
                    second: id.to_string(),
                });
            }
            if self.rule_index.get(&key) != Some(&id) {
                return Err(KbError::StaleIndex {
                    entity: rule.to_string(),
                });
            }
        }

        if self.fact_index.len() != self.facts.len() || self.rule_index.len() != self.rules.len() {
            return Err(KbError::StaleIndex {
                entity: "structural index".into(),
            });
        }
        Ok(())
    }
}

/// Fold an incoming duplicate into the stored entity's support.
fn merge(stored: &mut Support, incoming: Support) {
    if incoming.supported_by.is_empty() {
        stored.asserted = true;
    } else {
        stored.supported_by.extend(incoming.supported_by);
    }
}

fn fresh_fact(mut fact: Fact) -> Fact {
    fact.support.supports_facts.clear();
    fact.support.supports_rules.clear();
    fact
}

fn fresh_rule(mut rule: Rule) -> Rule {
    rule.support.supports_facts.clear();
    rule.support.supports_rules.clear();
    rule
}

fn lists(support: &Support, id: EntityId) -> bool {
    match id {
        EntityId::Fact(f) => support.supports_facts().contains(&f),
        EntityId::Rule(r) => support.supports_rules().contains(&r),
    }
}

impl<M> fmt::Display for KnowledgeBase<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Knowledge Base:")?;
        for fact in self.facts.values() {
            writeln!(f, "{fact}")?;
        }
        for rule in self.rules.values() {
            writeln!(f, "{rule}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn st(pred: &str, tokens: &[&str]) -> Statement {
        Statement::from_tokens(pred, tokens)
    }

    fn rule(lhs: Vec<Statement>, rhs: Statement) -> Rule {
        Rule::new(lhs, rhs)
    }

    #[test]
    fn assert_fact_then_rule_derives() {
        let mut kb = KnowledgeBase::new();
        kb.assert(st("p", &["a"]));
        kb.assert(rule(vec![st("p", &["?x"])], st("q", &["?x"])));

        let q = kb.get_fact(&st("q", &["a"])).unwrap();
        assert!(!q.is_asserted());
        let p_id = kb.find_fact(&st("p", &["a"])).unwrap();
        let r_id = kb.find_rule(&[st("p", &["?x"])], &st("q", &["?x"])).unwrap();
        assert_eq!(q.supported_by(), &[Justification::new(p_id, r_id)]);
        kb.verify().unwrap();
    }

    #[test]
    fn assert_rule_then_fact_derives() {
        let mut kb = KnowledgeBase::new();
        kb.assert(rule(vec![st("p", &["?x"])], st("q", &["?x"])));
        kb.assert(st("p", &["a"]));
        assert!(kb.contains(&st("q", &["a"])));
        assert_eq!(kb.fact_count(), 2);
        kb.verify().unwrap();
    }

    #[test]
    fn reassert_sets_flag_and_keeps_support() {
        let mut kb = KnowledgeBase::new();
        kb.assert(rule(vec![st("p", &["?x"])], st("q", &["?x"])));
        kb.assert(st("p", &["a"]));
        kb.assert(st("q", &["a"]));

        assert_eq!(kb.fact_count(), 2);
        let q = kb.get_fact(&st("q", &["a"])).unwrap();
        assert!(q.is_asserted());
        assert_eq!(q.supported_by().len(), 1);
        kb.verify().unwrap();
    }

    #[test]
    fn asserted_support_is_discarded() {
        let mut kb = KnowledgeBase::new();
        let by = Justification::new(FactId::new(40).unwrap(), RuleId::new(41).unwrap());
        kb.assert(Fact::derived(st("p", &["a"]), by));
        let p = kb.get_fact(&st("p", &["a"])).unwrap();
        assert!(p.is_asserted());
        assert!(p.supported_by().is_empty());
        kb.verify().unwrap();
    }

    #[test]
    fn multi_premise_rule_waits_for_all_premises() {
        let mut kb = KnowledgeBase::new();
        kb.assert(rule(vec![st("p", &["?x"]), st("q", &["?x"])], st("s", &["?x"])));
        kb.assert(st("p", &["a"]));

        assert!(kb.find_rule(&[st("q", &["a"])], &st("s", &["a"])).is_some());
        assert!(!kb.contains(&st("s", &["a"])));

        kb.assert(st("q", &["a"]));
        assert!(kb.contains(&st("s", &["a"])));
        kb.verify().unwrap();
    }

    #[test]
    fn rederivation_appends_duplicate_pair() {
        // Two rules with the same conclusion justify (q a) twice.
        let mut kb = KnowledgeBase::new();
        kb.assert(st("p", &["a"]));
        kb.assert(rule(vec![st("p", &["?x"])], st("q", &["?x"])));
        kb.assert(rule(vec![st("p", &["?y"])], st("q", &["?y"])));
        let q = kb.get_fact(&st("q", &["a"])).unwrap();
        assert_eq!(q.supported_by().len(), 2);
        kb.verify().unwrap();
    }

    #[test]
    fn symmetric_rule_revisits_its_own_conclusion() {
        // (edge b a) is inserted while the rule is still pairing with facts,
        // so the rule reaches it twice: once from the new fact's own pass and
        // once from the rule's pass over the grown fact arena.
        let mut kb = KnowledgeBase::new();
        kb.assert(st("edge", &["a", "b"]));
        kb.assert(rule(vec![st("edge", &["?x", "?y"])], st("edge", &["?y", "?x"])));

        let ba = kb.find_fact(&st("edge", &["b", "a"])).unwrap();
        let r_id = kb
            .find_rule(&[st("edge", &["?x", "?y"])], &st("edge", &["?y", "?x"]))
            .unwrap();
        let ab = kb.get_fact(&st("edge", &["a", "b"])).unwrap();
        assert!(ab.is_asserted());
        assert_eq!(
            ab.supported_by(),
            &[Justification::new(ba, r_id), Justification::new(ba, r_id)]
        );
        kb.verify().unwrap();

        let report = kb.retract(&st("edge", &["a", "b"])).unwrap();
        assert!(report.survived);
        kb.verify().unwrap();
    }

    #[test]
    fn fact_pairs_with_rules_derived_from_itself() {
        let mut kb = KnowledgeBase::new();
        kb.assert(rule(vec![st("p", &["?x"]), st("p", &["?y"])], st("s", &["?x", "?y"])));
        kb.assert(st("p", &["a"]));

        let p_id = kb.find_fact(&st("p", &["a"])).unwrap();
        let reduced = kb.find_rule(&[st("p", &["?y"])], &st("s", &["a", "?y"])).unwrap();
        let s = kb.get_fact(&st("s", &["a", "a"])).unwrap();
        assert_eq!(
            s.supported_by(),
            &[Justification::new(p_id, reduced), Justification::new(p_id, reduced)]
        );
        kb.verify().unwrap();

        kb.retract(&st("p", &["a"])).unwrap();
        assert_eq!(kb.fact_count(), 0);
        assert_eq!(kb.rule_count(), 1);
        kb.verify().unwrap();
    }

    #[test]
    fn retract_absent_fact_is_noop() {
        let mut kb = KnowledgeBase::new();
        kb.assert(st("p", &["a"]));
        assert!(kb.retract(&st("p", &["b"])).is_none());
        assert_eq!(kb.fact_count(), 1);
    }

    #[test]
    fn retract_removes_unsupported_consequences() {
        let mut kb = KnowledgeBase::new();
        kb.assert(st("p", &["a"]));
        kb.assert(rule(vec![st("p", &["?x"])], st("q", &["?x"])));

        let report = kb.retract(&st("p", &["a"])).unwrap();
        assert!(!report.survived);
        assert_eq!(report.removed_facts.len(), 2);
        assert_eq!(report.removed_facts[0].statement, st("p", &["a"]));
        assert_eq!(report.cascade_depth, 1);
        assert_eq!(kb.fact_count(), 0);
        assert_eq!(kb.rule_count(), 1);
        kb.verify().unwrap();
    }

    #[test]
    fn retract_keeps_supported_fact_but_unasserts_it() {
        let mut kb = KnowledgeBase::new();
        kb.assert(rule(vec![st("p", &["?x"])], st("q", &["?x"])));
        kb.assert(st("p", &["a"]));
        kb.assert(st("q", &["a"]));

        let report = kb.retract(&st("q", &["a"])).unwrap();
        assert!(report.survived);
        assert_eq!(report.removed_count(), 0);
        let q = kb.get_fact(&st("q", &["a"])).unwrap();
        assert!(!q.is_asserted());
        kb.verify().unwrap();
    }

    #[test]
    fn derived_rules_are_removed_with_their_fact() {
        let mut kb = KnowledgeBase::new();
        kb.assert(rule(vec![st("p", &["?x"]), st("q", &["?x"])], st("s", &["?x"])));
        kb.assert(st("p", &["a"]));
        kb.assert(st("q", &["a"]));
        assert_eq!(kb.rule_count(), 2);

        let report = kb.retract(&st("p", &["a"])).unwrap();
        assert_eq!(report.removed_rules.len(), 1);
        assert_eq!(kb.rule_count(), 1);
        assert!(!kb.contains(&st("s", &["a"])));
        assert!(kb.contains(&st("q", &["a"])));
        kb.verify().unwrap();
    }

    #[test]
    fn surviving_partner_drops_link_to_removed_dependent() {
        let mut kb = KnowledgeBase::new();
        kb.assert(st("p", &["a"]));
        kb.assert(rule(vec![st("p", &["?x"])], st("q", &["?x"])));
        let r_id = kb.find_rule(&[st("p", &["?x"])], &st("q", &["?x"])).unwrap();
        assert_eq!(kb.rule(r_id).unwrap().support().supports_facts().len(), 1);

        kb.retract(&st("p", &["a"]));
        assert!(kb.rule(r_id).unwrap().support().supports_facts().is_empty());
        kb.verify().unwrap();
    }

    #[test]
    fn ask_returns_bindings_in_insertion_order() {
        let mut kb = KnowledgeBase::new();
        kb.assert(st("p", &["b"]));
        kb.assert(st("p", &["a"]));
        kb.assert(st("q", &["a"]));

        let answers = kb.ask_statement(&st("p", &["?x"]));
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].statement, st("p", &["b"]));
        assert_eq!(answers[1].bindings.to_string(), "?x : a");
    }

    #[test]
    fn rule_shaped_ask_is_empty() {
        let mut kb = KnowledgeBase::new();
        kb.assert(st("p", &["a"]));
        let query = Entity::Rule(rule(vec![st("p", &["?x"])], st("q", &["?x"])));
        assert!(kb.ask(&query).is_empty());
    }

    #[test]
    fn mutually_recursive_rules_terminate_over_finite_domain() {
        let mut kb = KnowledgeBase::new();
        kb.assert(rule(vec![st("p", &["?x"])], st("q", &["?x"])));
        kb.assert(rule(vec![st("q", &["?x"])], st("p", &["?x"])));
        kb.assert(st("p", &["a"]));

        assert_eq!(kb.fact_count(), 2);
        let p = kb.get_fact(&st("p", &["a"])).unwrap();
        assert!(p.is_asserted());
        assert_eq!(p.supported_by().len(), 1);
        kb.verify().unwrap();
    }

    #[test]
    fn display_lists_facts_then_rules() {
        let mut kb = KnowledgeBase::new();
        kb.assert(st("p", &["a"]));
        kb.assert(rule(vec![st("p", &["?x"])], st("q", &["?x"])));
        let text = kb.to_string();
        assert!(text.starts_with("Knowledge Base:\nfact: (p a)\nfact: (q a)\n"));
        assert!(text.ends_with("rule: ((p ?x)) -> (q ?x)\n"));
    }
}
