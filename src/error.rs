//! Rich diagnostic error types for akh-chain.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text. Expected conditions of the knowledge
//! base (retracting an absent fact, a failed match, a rule-shaped ask) are not
//! errors and never reach these types.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for akh-chain.
#[derive(Debug, Error, Diagnostic)]
pub enum ChainError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Kb(#[from] KbError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("line {line}: {message}: \"{text}\"")]
    #[diagnostic(
        code(akh_chain::parse::syntax),
        help(
            "Statements are written as `(predicate term ...)`. Rules are written as \
             `((premise ...) (premise ...)) -> (conclusion ...)`. Variables start with `?`."
        )
    )]
    Syntax {
        line: usize,
        text: String,
        message: String,
    },

    #[error("line {line}: unknown entry kind \"{prefix}\"")]
    #[diagnostic(
        code(akh_chain::parse::unknown_kind),
        help(
            "Each line must start with `fact:` or `rule:`. Scripts additionally accept \
             `assert:`, `retract:`, `ask:` and `explain:`."
        )
    )]
    UnknownKind { line: usize, prefix: String },

    #[error("line {line}: \"{directive}\" expects a fact, got a rule")]
    #[diagnostic(
        code(akh_chain::parse::expected_fact),
        help("Only facts can be retracted, asked or explained. Remove the `->` part.")
    )]
    ExpectedFact { line: usize, directive: String },

    #[error("failed to read {path}")]
    #[diagnostic(
        code(akh_chain::parse::io),
        help("Ensure the file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Knowledge base errors
// ---------------------------------------------------------------------------

/// An invariant of the knowledge base does not hold.
///
/// These indicate a bug in the mutation code, not a user error.
#[derive(Debug, Error, Diagnostic)]
pub enum KbError {
    #[error("duplicate fact {statement} stored as {first} and {second}")]
    #[diagnostic(
        code(akh_chain::kb::duplicate_fact),
        help("Two facts share a statement. Facts must only enter through `assert`, which merges duplicates.")
    )]
    DuplicateFact {
        statement: String,
        first: String,
        second: String,
    },

    #[error("duplicate rule {rule} stored as {first} and {second}")]
    #[diagnostic(
        code(akh_chain::kb::duplicate_rule),
        help("Two rules share premises and conclusion. Rules must only enter through `assert`, which merges duplicates.")
    )]
    DuplicateRule {
        rule: String,
        first: String,
        second: String,
    },

    #[error("{entity} is neither asserted nor supported but is still stored")]
    #[diagnostic(
        code(akh_chain::kb::unjustified),
        help("An unsupported entity should have been removed by the retraction cascade.")
    )]
    Unjustified { entity: String },

    #[error("{entity} is justified by {missing}, which is not in the knowledge base")]
    #[diagnostic(
        code(akh_chain::kb::dangling_support),
        help("Removing an entity must strip it from every justification that names it.")
    )]
    DanglingSupport { entity: String, missing: String },

    #[error("{entity} is justified by {partner}, but {partner} does not list it as supported")]
    #[diagnostic(
        code(akh_chain::kb::asymmetric_link),
        help("Every justification pair must be mirrored in the supports lists of its fact and rule.")
    )]
    AsymmetricLink { entity: String, partner: String },

    #[error("index entry for {entity} points at a missing or different entity")]
    #[diagnostic(
        code(akh_chain::kb::stale_index),
        help("The structural index and the entity arena are out of sync.")
    )]
    StaleIndex { entity: String },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    #[diagnostic(
        code(akh_chain::config::read),
        help("Check that the path passed to --config exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    #[diagnostic(
        code(akh_chain::config::parse),
        help("The config is TOML. Known keys: log_filter, json, explain_depth.")
    )]
    Parse { path: String, message: String },
}

/// Result type for parser operations.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Result type for knowledge base verification.
pub type KbResult<T> = std::result::Result<T, KbError>;

/// Result type for config loading.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Convenience result type for the crate as a whole.
pub type ChainResult<T> = std::result::Result<T, ChainError>;
