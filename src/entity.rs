//! Justification graph entities: facts, rules, and the links between them.
//!
//! Facts and rules live in the knowledge base's arenas and refer to each other
//! only through [`FactId`] / [`RuleId`]. A derived entity records every
//! `(fact, rule)` pair that produced it in `supported_by`; the producing fact
//! and rule record the derived entity in their `supports_facts` /
//! `supports_rules` lists.

use std::fmt;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use crate::term::Statement;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Stable identifier of a fact in a knowledge base.
///
/// Ids are allocated monotonically, so ordering by id is insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct FactId(NonZeroU64);

/// Stable identifier of a rule in a knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct RuleId(NonZeroU64);

impl FactId {
    /// Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(FactId)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl RuleId {
    /// Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(RuleId)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fact:{}", self.0)
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule:{}", self.0)
    }
}

/// Either kind of entity id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityId {
    Fact(FactId),
    Rule(RuleId),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fact(id) => id.fmt(f),
            Self::Rule(id) => id.fmt(f),
        }
    }
}

/// Monotonic id source shared by the fact and rule arenas of one KB.
#[derive(Debug, Clone)]
pub(crate) struct IdAllocator {
    next: NonZeroU64,
}

impl IdAllocator {
    pub(crate) fn new() -> Self {
        Self {
            next: NonZeroU64::MIN,
        }
    }

    fn bump(&mut self) -> NonZeroU64 {
        let id = self.next;
        self.next = id.saturating_add(1);
        id
    }

    pub(crate) fn next_fact(&mut self) -> FactId {
        FactId(self.bump())
    }

    pub(crate) fn next_rule(&mut self) -> RuleId {
        RuleId(self.bump())
    }
}

// ---------------------------------------------------------------------------
// Justification
// ---------------------------------------------------------------------------

/// The fact and rule whose forward-chaining application produced an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Justification {
    fact: FactId,
    rule: RuleId,
}

impl Justification {
    pub(crate) fn new(fact: FactId, rule: RuleId) -> Self {
        Self { fact, rule }
    }

    pub fn fact(&self) -> FactId {
        self.fact
    }

    pub fn rule(&self) -> RuleId {
        self.rule
    }
}

/// Assertion state and support links shared by facts and rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Support {
    pub(crate) asserted: bool,
    pub(crate) supported_by: Vec<Justification>,
    pub(crate) supports_facts: Vec<FactId>,
    pub(crate) supports_rules: Vec<RuleId>,
}

impl Support {
    fn asserted() -> Self {
        Self {
            asserted: true,
            ..Self::default()
        }
    }

    fn derived(by: Justification) -> Self {
        Self {
            asserted: false,
            supported_by: vec![by],
            ..Self::default()
        }
    }

    /// Explicitly supplied by a caller, independent of derivation.
    pub fn is_asserted(&self) -> bool {
        self.asserted
    }

    /// Every `(fact, rule)` pair that currently explains this entity.
    /// Repeated derivations through the same pair appear repeatedly.
    pub fn supported_by(&self) -> &[Justification] {
        &self.supported_by
    }

    pub fn supports_facts(&self) -> &[FactId] {
        &self.supports_facts
    }

    pub fn supports_rules(&self) -> &[RuleId] {
        &self.supports_rules
    }

    /// An entity stays in the KB iff it is asserted or still justified.
    pub fn is_live(&self) -> bool {
        self.asserted || !self.supported_by.is_empty()
    }

    /// Drop every justification matching `pred`; returns how many were removed.
    pub(crate) fn strip(&mut self, pred: impl Fn(&Justification) -> bool) -> usize {
        let before = self.supported_by.len();
        self.supported_by.retain(|j| !pred(j));
        before - self.supported_by.len()
    }

    pub(crate) fn link(&mut self, dependent: EntityId) {
        match dependent {
            EntityId::Fact(id) => self.supports_facts.push(id),
            EntityId::Rule(id) => self.supports_rules.push(id),
        }
    }

    pub(crate) fn unlink(&mut self, dependent: EntityId) {
        match dependent {
            EntityId::Fact(id) => self.supports_facts.retain(|f| *f != id),
            EntityId::Rule(id) => self.supports_rules.retain(|r| *r != id),
        }
    }

    /// Direct dependents, facts first, each id once, in first-link order.
    pub(crate) fn dependents(&self) -> Vec<EntityId> {
        let mut out: Vec<EntityId> = Vec::new();
        let candidates = self
            .supports_facts
            .iter()
            .map(|&id| EntityId::Fact(id))
            .chain(self.supports_rules.iter().map(|&id| EntityId::Rule(id)));
        for id in candidates {
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Fact and rule
// ---------------------------------------------------------------------------

/// A statement held as true, either asserted or derived.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fact {
    pub statement: Statement,
    pub(crate) support: Support,
}

impl Fact {
    /// A fact asserted by the caller, with no justification.
    pub fn new(statement: Statement) -> Self {
        Self {
            statement,
            support: Support::asserted(),
        }
    }

    pub(crate) fn derived(statement: Statement, by: Justification) -> Self {
        Self {
            statement,
            support: Support::derived(by),
        }
    }

    pub fn support(&self) -> &Support {
        &self.support
    }

    pub fn is_asserted(&self) -> bool {
        self.support.asserted
    }

    pub fn supported_by(&self) -> &[Justification] {
        &self.support.supported_by
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fact: {}", self.statement)
    }
}

/// An implication: ordered premises and a conclusion template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    /// Premises, matched left to right.
    pub lhs: Vec<Statement>,
    pub rhs: Statement,
    pub(crate) support: Support,
}

/// Structural identity of a rule, used for deduplication.
pub(crate) type RuleKey = (Vec<Statement>, Statement);

impl Rule {
    /// A rule asserted by the caller, with no justification.
    pub fn new(lhs: Vec<Statement>, rhs: Statement) -> Self {
        Self {
            lhs,
            rhs,
            support: Support::asserted(),
        }
    }

    pub(crate) fn derived(lhs: Vec<Statement>, rhs: Statement, by: Justification) -> Self {
        Self {
            lhs,
            rhs,
            support: Support::derived(by),
        }
    }

    pub(crate) fn key(&self) -> RuleKey {
        (self.lhs.clone(), self.rhs.clone())
    }

    /// Same premises and conclusion.
    pub fn same_shape(&self, other: &Rule) -> bool {
        self.lhs == other.lhs && self.rhs == other.rhs
    }

    pub fn support(&self) -> &Support {
        &self.support
    }

    pub fn is_asserted(&self) -> bool {
        self.support.asserted
    }

    pub fn supported_by(&self) -> &[Justification] {
        &self.support.supported_by
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule: (")?;
        for (i, premise) in self.lhs.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{premise}")?;
        }
        write!(f, ") -> {}", self.rhs)
    }
}

/// A fact or a rule, as handed to [`KnowledgeBase::assert`](crate::kb::KnowledgeBase::assert).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Entity {
    Fact(Fact),
    Rule(Rule),
}

impl Entity {
    pub fn support(&self) -> &Support {
        match self {
            Self::Fact(fact) => &fact.support,
            Self::Rule(rule) => &rule.support,
        }
    }

    pub fn is_fact(&self) -> bool {
        matches!(self, Self::Fact(_))
    }
}

impl From<Fact> for Entity {
    fn from(fact: Fact) -> Self {
        Self::Fact(fact)
    }
}

impl From<Rule> for Entity {
    fn from(rule: Rule) -> Self {
        Self::Rule(rule)
    }
}

impl From<Statement> for Entity {
    fn from(statement: Statement) -> Self {
        Self::Fact(Fact::new(statement))
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fact(fact) => fact.fmt(f),
            Self::Rule(rule) => rule.fmt(f),
        }
    }
}
