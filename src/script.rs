//! Script execution: apply parsed directives to a knowledge base in order.

use std::fmt;

use serde::Serialize;

use crate::explain::Explanation;
use crate::kb::{Answer, KnowledgeBase, Retraction};
use crate::matcher::Matcher;
use crate::parse::Directive;
use crate::term::Statement;

/// Result of one directive.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Asserted {
        entity: String,
    },
    Retracted {
        statement: Statement,
        /// `None` if the fact was not present.
        report: Option<Retraction>,
    },
    Answered {
        query: Statement,
        answers: Vec<Answer>,
    },
    Explained {
        statement: Statement,
        explanation: Option<Explanation>,
    },
}

/// Options for [`run`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Depth limit for `explain:` directives.
    pub explain_depth: Option<usize>,
}

/// Execute `directives` against `kb`, returning one outcome per directive.
pub fn run<M: Matcher>(
    kb: &mut KnowledgeBase<M>,
    directives: impl IntoIterator<Item = Directive>,
    options: RunOptions,
) -> Vec<Outcome> {
    directives
        .into_iter()
        .map(|directive| match directive {
            Directive::Assert(entity) => {
                let text = entity.to_string();
                kb.assert(entity);
                Outcome::Asserted { entity: text }
            }
            Directive::Retract(statement) => {
                let report = kb.retract(&statement);
                Outcome::Retracted { statement, report }
            }
            Directive::Ask(query) => {
                let answers = kb.ask_statement(&query);
                Outcome::Answered { query, answers }
            }
            Directive::Explain(statement) => {
                let explanation = kb.explain_limited(&statement, options.explain_depth);
                Outcome::Explained {
                    statement,
                    explanation,
                }
            }
        })
        .collect()
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asserted { entity } => writeln!(f, "asserted {entity}"),
            Self::Retracted { statement, report } => match report {
                None => writeln!(f, "retract {statement}: not present"),
                Some(report) => {
                    write!(f, "retracted {statement}")?;
                    if report.survived {
                        write!(f, " (still supported)")?;
                    }
                    writeln!(f)?;
                    for fact in &report.removed_facts {
                        writeln!(f, "  removed {fact}")?;
                    }
                    for rule in &report.removed_rules {
                        writeln!(f, "  removed {rule}")?;
                    }
                    Ok(())
                }
            },
            Self::Answered { query, answers } => {
                if answers.is_empty() {
                    return writeln!(f, "ask {query}: no answers");
                }
                writeln!(f, "ask {query}:")?;
                for answer in answers {
                    writeln!(f, "  {answer}")?;
                }
                Ok(())
            }
            Self::Explained {
                statement,
                explanation,
            } => match explanation {
                None => writeln!(f, "explain {statement}: not present"),
                Some(explanation) => write!(f, "{explanation}"),
            },
        }
    }
}
