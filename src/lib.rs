// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # akh-chain
//!
//! A forward-chaining rule engine with justification-based truth maintenance.
//!
//! Facts are ground statements, rules are premise lists with one conclusion.
//! Asserting either runs inference to a fixpoint, recording for every derived
//! fact or rule the `(fact, rule)` pairs that produced it. Retraction walks
//! those records and removes exactly what lost all support.
//!
//! ## Architecture
//!
//! - **Terms** (`term`): statements with constant and `?variable` terms
//! - **Matching** (`matcher`): one-way unification behind the [`matcher::Matcher`] trait
//! - **Entities** (`entity`): facts, rules and their support records
//! - **Inference** (`infer`): one derivation step from a fact and a rule
//! - **Knowledge base** (`kb`): assertion, cascading retraction and queries
//! - **Explanation** (`explain`), **export** (`export`), **text format** (`parse`)
//!
//! ## Library usage
//!
//! ```
//! use akh_chain::entity::Rule;
//! use akh_chain::kb::KnowledgeBase;
//! use akh_chain::term::Statement;
//!
//! let mut kb = KnowledgeBase::new();
//! kb.assert(Statement::from_tokens("isa", &["cube", "block"]));
//! kb.assert(Rule::new(
//!     vec![Statement::from_tokens("isa", &["?x", "block"])],
//!     Statement::from_tokens("movable", &["?x"]),
//! ));
//!
//! let answers = kb.ask_statement(&Statement::from_tokens("movable", &["?y"]));
//! assert_eq!(answers.len(), 1);
//!
//! kb.retract(&Statement::from_tokens("isa", &["cube", "block"]));
//! assert!(kb.ask_statement(&Statement::from_tokens("movable", &["?y"])).is_empty());
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod explain;
pub mod export;
pub mod infer;
pub mod kb;
pub mod matcher;
pub mod parse;
pub mod script;
pub mod term;
