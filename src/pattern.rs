//! Route patterns with `{name}` placeholders.
//!
//! A pattern is compiled once, when the route is registered, into a list of
//! literal and placeholder tokens and from those into an anchored regular
//! expression. Matching is anchored at both ends and case-sensitive: the
//! whole path must be consumed by the whole pattern.
//!
//! ```text
//! /users/{id}           matches /users/42            → id = "42"
//! /files/{stem}.{ext}   matches /files/report.tar.gz → stem = "report.tar", ext = "gz"
//! /users/{id}           rejects /users/42/edit        (no prefix matches)
//! ```
//!
//! Each placeholder becomes a greedy `([^/]+)` group. The `regex` engine
//! matches in time linear in the path, however many placeholders share a
//! segment, so a hostile path cannot stall the worker that dispatches it.
//!
//! Matching runs on the raw (percent-encoded) path, so an encoded `%2F`
//! never splits a segment. Captured values are percent-decoded afterwards.

use std::borrow::Cow;
use std::fmt;

use regex::Regex;

use crate::params::Params;

/// A malformed route pattern.
///
/// Raised while routes are being registered, never while serving: a router
/// that was built successfully cannot produce this error.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum PatternError {
    #[error("`{pattern}`: unterminated placeholder at byte {offset}")]
    Unterminated { pattern: String, offset: usize },

    #[error("`{pattern}`: unmatched `}}` at byte {offset}")]
    UnmatchedClose { pattern: String, offset: usize },

    #[error("`{pattern}`: empty placeholder name at byte {offset}")]
    EmptyName { pattern: String, offset: usize },

    #[error("`{pattern}`: invalid placeholder name `{name}`")]
    InvalidName { pattern: String, name: String },

    #[error("`{pattern}`: placeholder `{name}` appears more than once")]
    DuplicateName { pattern: String, name: String },

    #[error("`{pattern}`: placeholder `{name}` directly follows another placeholder")]
    AdjacentPlaceholders { pattern: String, name: String },

    #[error("`{pattern}`: too large to compile: {reason}")]
    TooLarge { pattern: String, reason: String },
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Token {
    Literal(String),
    Var(String),
}

/// A compiled route pattern. Immutable once built.
#[derive(Clone, Debug)]
pub struct Pattern {
    source: String,
    /// Placeholder names, indexed by capture group minus one.
    names: Vec<String>,
    regex: Regex,
}

impl Pattern {
    /// Compiles `pattern`, rejecting malformed or duplicate placeholders.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let tokens = tokenize(pattern)?;

        let mut expr = String::from("^");
        let mut names = Vec::new();
        for token in &tokens {
            match token {
                Token::Literal(lit) => expr.push_str(&regex::escape(lit)),
                Token::Var(name) => {
                    expr.push_str("([^/]+)");
                    names.push(name.clone());
                }
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| PatternError::TooLarge {
            pattern: pattern.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self { source: pattern.to_owned(), names, regex })
    }

    /// Matches `path` against the whole pattern.
    ///
    /// Returns the captured variables, percent-decoded, on success. A value
    /// that does not decode to UTF-8 is kept as sent. `None` is an ordinary
    /// outcome: the caller moves on to the next candidate route.
    pub fn matches(&self, path: &str) -> Option<Params> {
        if self.names.is_empty() {
            return self.regex.is_match(path).then(Params::default);
        }
        let caps = self.regex.captures(path)?;
        let params = self
            .names
            .iter()
            .zip(caps.iter().skip(1))
            .filter_map(|(name, m)| Some((name.clone(), decode(m?.as_str()))))
            .collect();
        Some(params)
    }

    /// The pattern text as registered.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Placeholder names in the order they appear.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn tokenize(pattern: &str) -> Result<Vec<Token>, PatternError> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.char_indices();

    while let Some((offset, c)) = chars.next() {
        match c {
            '{' => {
                let rest = &pattern[offset + 1..];
                let end = rest.find('}').ok_or_else(|| PatternError::Unterminated {
                    pattern: pattern.to_owned(),
                    offset,
                })?;
                let name = &rest[..end];
                validate_name(pattern, offset, name, &tokens, literal.is_empty())?;

                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(Token::Var(name.to_owned()));

                // Valid names are ASCII, so bytes and chars line up.
                for _ in 0..=end {
                    chars.next();
                }
            }
            '}' => {
                return Err(PatternError::UnmatchedClose { pattern: pattern.to_owned(), offset });
            }
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

fn validate_name(
    pattern: &str,
    offset: usize,
    name: &str,
    tokens: &[Token],
    no_pending_literal: bool,
) -> Result<(), PatternError> {
    if name.is_empty() {
        return Err(PatternError::EmptyName { pattern: pattern.to_owned(), offset });
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(PatternError::InvalidName { pattern: pattern.to_owned(), name: name.to_owned() });
    }
    if tokens.iter().any(|t| matches!(t, Token::Var(n) if n == name)) {
        return Err(PatternError::DuplicateName { pattern: pattern.to_owned(), name: name.to_owned() });
    }
    if no_pending_literal && matches!(tokens.last(), Some(Token::Var(_))) {
        return Err(PatternError::AdjacentPlaceholders {
            pattern: pattern.to_owned(),
            name: name.to_owned(),
        });
    }
    Ok(())
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw)).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pattern: &str, path: &str) -> Option<Vec<(String, String)>> {
        let mut v: Vec<_> = Pattern::compile(pattern)
            .unwrap()
            .matches(path)?
            .iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        v.sort();
        Some(v)
    }

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_owned(), v.to_owned())
    }

    #[test]
    fn literal_pattern_matches_exactly() {
        assert_eq!(vars("/items", "/items"), Some(vec![]));
        assert_eq!(vars("/items", "/items/"), None);
        assert_eq!(vars("/items", "/item"), None);
        assert_eq!(vars("/items", "/Items"), None);
    }

    #[test]
    fn single_placeholder() {
        assert_eq!(vars("/users/{id}", "/users/42"), Some(vec![pair("id", "42")]));
        assert_eq!(vars("/users/{id}", "/users/42/edit"), None);
        assert_eq!(vars("/users/{id}", "/users/"), None);
        assert_eq!(vars("/users/{id}", "/users"), None);
    }

    #[test]
    fn several_placeholders() {
        assert_eq!(
            vars("/users/{user}/posts/{post}", "/users/7/posts/hello"),
            Some(vec![pair("post", "hello"), pair("user", "7")]),
        );
    }

    #[test]
    fn placeholder_inside_segment_is_greedy() {
        assert_eq!(
            vars("/files/{stem}.{ext}", "/files/report.tar.gz"),
            Some(vec![pair("ext", "gz"), pair("stem", "report.tar")]),
        );
        assert_eq!(vars("/files/{stem}.txt", "/files/.txt"), None);
    }

    #[test]
    fn placeholder_takes_multibyte_characters() {
        assert_eq!(vars("/tags/{tag}", "/tags/café"), Some(vec![pair("tag", "café")]));
    }

    #[test]
    fn catch_all_segment_matches_any_single_segment() {
        assert_eq!(vars("/{catchall}", "/items"), Some(vec![pair("catchall", "items")]));
        assert_eq!(vars("/{catchall}", "/items/1"), None);
    }

    #[test]
    fn captured_values_are_percent_decoded() {
        assert_eq!(
            vars("/users/{name}", "/users/J%C3%BCrgen%20S"),
            Some(vec![pair("name", "Jürgen S")]),
        );
        assert_eq!(vars("/q/{term}", "/q/a+b"), Some(vec![pair("term", "a+b")]));
        assert_eq!(vars("/raw/{v}", "/raw/%FF"), Some(vec![pair("v", "%FF")]));
    }

    #[test]
    fn encoded_slash_stays_inside_one_segment() {
        assert_eq!(vars("/files/{path}", "/files/a%2Fb"), Some(vec![pair("path", "a/b")]));
        assert_eq!(vars("/files/{path}", "/files/a/b"), None);
    }

    #[test]
    fn long_paths_match_in_linear_time() {
        let started = std::time::Instant::now();

        let dots = ".".repeat(40_000);
        let three = Pattern::compile("/f/{a}.{b}.{c}").unwrap();
        assert!(three.matches(&format!("/f/{dots}/")).is_none());

        let two = Pattern::compile("/f/{stem}.{ext}").unwrap();
        assert!(two.matches(&format!("/f/{dots}/")).is_none());
        let hit = two.matches(&format!("/f/x{dots}gz")).unwrap();
        assert_eq!(hit.get("ext"), Some("gz"));

        assert!(started.elapsed() < std::time::Duration::from_secs(2));
    }

    #[test]
    fn names_in_order() {
        let p = Pattern::compile("/a/{x}/b/{y}").unwrap();
        assert_eq!(p.names().collect::<Vec<_>>(), ["x", "y"]);
        assert_eq!(p.to_string(), "/a/{x}/b/{y}");
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        assert!(matches!(Pattern::compile("/users/{id"), Err(PatternError::Unterminated { offset: 7, .. })));
        assert!(matches!(Pattern::compile("/users/id}"), Err(PatternError::UnmatchedClose { .. })));
        assert!(matches!(Pattern::compile("/users/{}"), Err(PatternError::EmptyName { .. })));
        assert!(matches!(Pattern::compile("/a/{b/c}"), Err(PatternError::InvalidName { .. })));
        assert!(matches!(
            Pattern::compile("/{id}/x/{id}"),
            Err(PatternError::DuplicateName { name, .. }) if name == "id"
        ));
        assert!(matches!(Pattern::compile("/{a}{b}"), Err(PatternError::AdjacentPlaceholders { .. })));
    }

    #[test]
    fn error_message_names_the_pattern() {
        let err = Pattern::compile("/users/{id").unwrap_err();
        assert_eq!(err.to_string(), "`/users/{id`: unterminated placeholder at byte 7");
    }
}
