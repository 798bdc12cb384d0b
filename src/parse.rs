//! Text format for facts, rules and script directives.
//!
//! One entry per line, `#` starts a comment line:
//!
//! ```text
//! fact: (isa cube block)
//! rule: ((isa ?x ?y) (isa ?y ?z)) -> (isa ?x ?z)
//! rule: (isa ?x block) -> (movable ?x)
//! ```
//!
//! Scripts additionally accept `assert:`, `retract:`, `ask:` and `explain:`.
//! Tokens starting with `?` are variables.

use std::path::Path;

use crate::entity::{Entity, Fact, Rule};
use crate::error::{ParseError, ParseResult};
use crate::term::{Statement, Term};

const ARROW: &str = "->";

/// One executable line of a script.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Assert(Entity),
    Retract(Statement),
    Ask(Statement),
    Explain(Statement),
}

// ---------------------------------------------------------------------------
// S-expression reader
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Atom(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Sexp {
    Atom(String),
    List(Vec<Sexp>),
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut atom = String::new();
    for c in text.chars() {
        if c == '(' || c == ')' || c.is_whitespace() {
            if !atom.is_empty() {
                tokens.push(Token::Atom(std::mem::take(&mut atom)));
            }
            match c {
                '(' => tokens.push(Token::Open),
                ')' => tokens.push(Token::Close),
                _ => {}
            }
        } else {
            atom.push(c);
        }
    }
    if !atom.is_empty() {
        tokens.push(Token::Atom(atom));
    }
    tokens
}

/// Read every top-level expression in `text`.
fn read_all(text: &str) -> Result<Vec<Sexp>, String> {
    let tokens = tokenize(text);
    let mut stack: Vec<Vec<Sexp>> = vec![Vec::new()];
    for token in tokens {
        match token {
            Token::Open => stack.push(Vec::new()),
            Token::Close => {
                if stack.len() < 2 {
                    return Err("unexpected `)`".into());
                }
                let list = stack.pop().unwrap_or_default();
                if let Some(parent) = stack.last_mut() {
                    parent.push(Sexp::List(list));
                }
            }
            Token::Atom(atom) => {
                if let Some(current) = stack.last_mut() {
                    current.push(Sexp::Atom(atom));
                }
            }
        }
    }
    if stack.len() != 1 {
        return Err("unbalanced parentheses: missing `)`".into());
    }
    Ok(stack.pop().unwrap_or_default())
}

fn to_statement(sexp: &Sexp) -> Result<Statement, String> {
    let Sexp::List(items) = sexp else {
        return Err("expected a parenthesized statement".into());
    };
    let Some((head, args)) = items.split_first() else {
        return Err("empty statement".into());
    };
    let Sexp::Atom(predicate) = head else {
        return Err("statement must start with a predicate name".into());
    };
    if predicate.starts_with(crate::term::VARIABLE_SIGIL) || predicate == ARROW {
        return Err(format!("invalid predicate name `{predicate}`"));
    }

    let mut terms = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Sexp::Atom(atom) if atom == ARROW => {
                return Err("unexpected `->` inside a statement".into());
            }
            Sexp::Atom(atom) => terms.push(Term::parse(atom)),
            Sexp::List(_) => return Err("nested terms are not supported".into()),
        }
    }
    Ok(Statement::new(predicate.clone(), terms))
}

fn single_statement(body: &str) -> Result<Statement, String> {
    match read_all(body)?.as_slice() {
        [one] => to_statement(one),
        [] => Err("missing statement".into()),
        _ => Err("expected exactly one statement".into()),
    }
}

fn rule_body(body: &str) -> Result<Rule, String> {
    let sexps = read_all(body)?;
    let [lhs, Sexp::Atom(arrow), rhs] = sexps.as_slice() else {
        return Err("rules are written `(premises) -> (conclusion)`".into());
    };
    if arrow != ARROW {
        return Err(format!("expected `->`, found `{arrow}`"));
    }

    let premises = match lhs {
        // `((p ?x) (q ?x))`: a list of statements.
        Sexp::List(items) if items.first().is_some_and(|i| matches!(i, Sexp::List(_))) => items
            .iter()
            .map(to_statement)
            .collect::<Result<Vec<_>, _>>()?,
        // `(p ?x)`: a single premise.
        single => vec![to_statement(single)?],
    };
    Ok(Rule::new(premises, to_statement(rhs)?))
}

fn entity_body(body: &str) -> Result<Entity, String> {
    if tokenize(body).contains(&Token::Atom(ARROW.into())) {
        rule_body(body).map(Entity::Rule)
    } else {
        single_statement(body).map(|s| Entity::Fact(Fact::new(s)))
    }
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Parse a bare statement such as `(isa ?x block)`.
pub fn parse_statement(text: &str) -> ParseResult<Statement> {
    single_statement(text).map_err(|message| syntax(1, text, message))
}

/// Parse a bare fact `(..)` or rule `(..) -> (..)` without a line prefix.
pub fn parse_entity(text: &str) -> ParseResult<Entity> {
    entity_body(text).map_err(|message| syntax(1, text, message))
}

/// Parse a knowledge base file: only `fact:` and `rule:` lines.
pub fn parse_kb(text: &str) -> ParseResult<Vec<Entity>> {
    let mut entities = Vec::new();
    for (line, kind, body) in entries(text)? {
        let entity = match kind {
            "fact" => single_statement(body).map(|s| Entity::Fact(Fact::new(s))),
            "rule" => rule_body(body).map(Entity::Rule),
            other => {
                return Err(ParseError::UnknownKind {
                    line,
                    prefix: other.to_string(),
                });
            }
        };
        entities.push(entity.map_err(|message| syntax(line, body, message))?);
    }
    Ok(entities)
}

/// Parse a script: knowledge base lines plus `assert:`, `retract:`, `ask:`
/// and `explain:` directives.
pub fn parse_script(text: &str) -> ParseResult<Vec<Directive>> {
    let mut directives = Vec::new();
    for (line, kind, body) in entries(text)? {
        let directive = match kind {
            "fact" => single_statement(body).map(|s| Directive::Assert(Entity::Fact(Fact::new(s)))),
            "rule" => rule_body(body).map(|r| Directive::Assert(Entity::Rule(r))),
            "assert" => entity_body(body).map(Directive::Assert),
            "retract" | "ask" | "explain" => {
                if tokenize(body).contains(&Token::Atom(ARROW.into())) {
                    return Err(ParseError::ExpectedFact {
                        line,
                        directive: kind.to_string(),
                    });
                }
                single_statement(body).map(|s| match kind {
                    "retract" => Directive::Retract(s),
                    "ask" => Directive::Ask(s),
                    _ => Directive::Explain(s),
                })
            }
            other => {
                return Err(ParseError::UnknownKind {
                    line,
                    prefix: other.to_string(),
                });
            }
        };
        directives.push(directive.map_err(|message| syntax(line, body, message))?);
    }
    Ok(directives)
}

/// Read and parse a knowledge base file.
pub fn load_kb_file(path: &Path) -> ParseResult<Vec<Entity>> {
    parse_kb(&read_file(path)?)
}

/// Read and parse a script file.
pub fn load_script_file(path: &Path) -> ParseResult<Vec<Directive>> {
    parse_script(&read_file(path)?)
}

fn read_file(path: &Path) -> ParseResult<String> {
    std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Split non-blank, non-comment lines into `(line number, kind, body)`.
fn entries(text: &str) -> ParseResult<Vec<(usize, &str, &str)>> {
    let mut out = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((kind, body)) = trimmed.split_once(':') else {
            return Err(ParseError::UnknownKind {
                line,
                prefix: trimmed.to_string(),
            });
        };
        out.push((line, kind.trim(), body.trim()));
    }
    Ok(out)
}

fn syntax(line: usize, text: &str, message: String) -> ParseError {
    ParseError::Syntax {
        line,
        text: text.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn st(pred: &str, tokens: &[&str]) -> Statement {
        Statement::from_tokens(pred, tokens)
    }

    #[test]
    fn parses_statement() {
        assert_eq!(parse_statement("(isa ?x block)").unwrap(), st("isa", &["?x", "block"]));
        assert_eq!(parse_statement("  (done)  ").unwrap(), st("done", &[]));
    }

    #[test]
    fn rejects_malformed_statements() {
        assert!(parse_statement("(isa cube").is_err());
        assert!(parse_statement("isa cube)").is_err());
        assert!(parse_statement("()").is_err());
        assert!(parse_statement("(?p a)").is_err());
        assert!(parse_statement("(p (f a))").is_err());
        assert!(parse_statement("(p a) (q b)").is_err());
    }

    #[test]
    fn parses_rule_with_premise_list() {
        let Entity::Rule(rule) = parse_entity("((isa ?x ?y) (isa ?y ?z)) -> (isa ?x ?z)").unwrap()
        else {
            panic!("expected a rule");
        };
        assert_eq!(rule.lhs, vec![st("isa", &["?x", "?y"]), st("isa", &["?y", "?z"])]);
        assert_eq!(rule.rhs, st("isa", &["?x", "?z"]));
    }

    #[test]
    fn parses_single_premise_shorthand() {
        let Entity::Rule(short) = parse_entity("(p ?x) -> (q ?x)").unwrap() else {
            panic!("expected a rule");
        };
        let Entity::Rule(long) = parse_entity("((p ?x))->(q ?x)").unwrap() else {
            panic!("expected a rule");
        };
        assert!(short.same_shape(&long));
    }

    #[test]
    fn parses_kb_file_text() {
        let text = "\
# blocks world
fact: (isa cube block)

rule: ((isa ?x block)) -> (movable ?x)
";
        let entities = parse_kb(text).unwrap();
        assert_eq!(entities.len(), 2);
        assert!(entities[0].is_fact());
        assert!(!entities[1].is_fact());
    }

    #[test]
    fn kb_rejects_script_directives() {
        let err = parse_kb("ask: (p ?x)").unwrap_err();
        assert!(matches!(err, ParseError::UnknownKind { line: 1, .. }));
    }

    #[test]
    fn syntax_errors_carry_line_numbers() {
        let err = parse_kb("fact: (p a)\nrule: (p ?x) (q ?x)\n").unwrap_err();
        let ParseError::Syntax { line, .. } = err else {
            panic!("expected syntax error, got {err:?}");
        };
        assert_eq!(line, 2);
    }

    #[test]
    fn parses_script_directives() {
        let text = "\
fact: (p a)
assert: (p ?x) -> (q ?x)
ask: (q ?y)
explain: (q a)
retract: (p a)
";
        let directives = parse_script(text).unwrap();
        assert_eq!(directives.len(), 5);
        assert!(matches!(directives[1], Directive::Assert(Entity::Rule(_))));
        assert_eq!(directives[2], Directive::Ask(st("q", &["?y"])));
        assert_eq!(directives[4], Directive::Retract(st("p", &["a"])));
    }

    #[test]
    fn rule_shaped_retract_is_rejected() {
        let err = parse_script("retract: (p ?x) -> (q ?x)").unwrap_err();
        assert!(matches!(err, ParseError::ExpectedFact { line: 1, .. }));
    }

    #[test]
    fn line_without_kind_is_rejected() {
        assert!(matches!(
            parse_kb("(p a)").unwrap_err(),
            ParseError::UnknownKind { line: 1, .. }
        ));
    }
}
