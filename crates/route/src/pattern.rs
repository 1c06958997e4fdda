//! Path template compilation and matching.
//!
//! A path specification is either a literal template such as
//! `/users/:userId/posts/:postId`, or an already compiled [`PathPattern`].
//! Templates are compiled into a token sequence (literal chunks and named
//! parameters) which is matched against full request paths:
//!
//! - a `:name` token (one or more ASCII letters after the colon) captures one
//!   or more characters excluding `/`, `:` and `?`, lazily;
//! - the whole template is anchored at both ends;
//! - a trailing slash on the request path is always permitted.
//!
//! Two adjacent parameters with no separating literal are not distinguishable
//! and split lazily; that is an accepted limitation of the template language.

use thiserror::Error;

/// Error raised while compiling a path specification.
///
/// Fatal to the registration call that produced it; a router build aborts on
/// the first one.
#[derive(Debug, Error)]
pub enum InvalidPathSpec {
    #[error("duplicate parameter name `{0}` in path template")]
    DuplicateParam(String),
}

/// A path specification as supplied at registration time: a template string
/// still to be compiled, or a pattern compiled up front by the caller.
#[derive(Debug, Clone)]
pub enum PathSpec {
    Template(String),
    Pattern(PathPattern),
}

impl PathSpec {
    /// The template or pattern source text, for diagnostics.
    pub fn source(&self) -> &str {
        match self {
            PathSpec::Template(template) => template,
            PathSpec::Pattern(pattern) => pattern.source(),
        }
    }

    /// Compiles the specification. A caller-supplied pattern passes through
    /// unchanged.
    pub fn compile(self) -> Result<PathPattern, InvalidPathSpec> {
        match self {
            PathSpec::Template(template) => PathPattern::compile(&template),
            PathSpec::Pattern(pattern) => Ok(pattern),
        }
    }
}

impl From<&str> for PathSpec {
    fn from(template: &str) -> Self {
        PathSpec::Template(template.to_owned())
    }
}

impl From<String> for PathSpec {
    fn from(template: String) -> Self {
        PathSpec::Template(template)
    }
}

impl From<PathPattern> for PathSpec {
    fn from(pattern: PathPattern) -> Self {
        PathSpec::Pattern(pattern)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Param(String),
}

/// The compiled, immutable form of a path specification.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    tokens: Vec<Token>,
}

impl PathPattern {
    /// Compiles a literal template.
    ///
    /// A `:` followed by one or more ASCII letters opens a parameter token
    /// named after those letters; any other character (including a `:` that
    /// is not followed by a letter) accumulates into the current literal.
    pub fn compile(template: &str) -> Result<Self, InvalidPathSpec> {
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            if c != ':' {
                literal.push(c);
                continue;
            }
            let mut name = String::new();
            while let Some(next) = chars.peek() {
                if !next.is_ascii_alphabetic() {
                    break;
                }
                name.push(*next);
                chars.next();
            }
            if name.is_empty() {
                literal.push(':');
                continue;
            }
            if tokens.iter().any(|t| matches!(t, Token::Param(p) if *p == name)) {
                return Err(InvalidPathSpec::DuplicateParam(name));
            }
            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            tokens.push(Token::Param(name));
        }
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        Ok(Self { source: template.to_owned(), tokens })
    }

    /// The template text this pattern was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn has_params(&self) -> bool {
        self.tokens.iter().any(|t| matches!(t, Token::Param(_)))
    }

    /// Whether the full `path` (query already stripped by the caller)
    /// matches this pattern, a trailing slash permitted.
    pub fn matches(&self, path: &str) -> bool {
        let mut captures = Vec::new();
        match_tokens(&self.tokens, path, &mut captures)
    }

    /// Extracts the named captures from `path`, stripping any query-string
    /// suffix first. Yields the empty set when the pattern has no parameters
    /// or the path does not match.
    pub fn extract(&self, path: &str) -> PathParams {
        let clean = match path.find('?') {
            Some(at) => &path[..at],
            None => path,
        };

        let mut captures = Vec::new();
        if !match_tokens(&self.tokens, clean, &mut captures) || captures.is_empty() {
            return PathParams::empty();
        }

        captures
            .into_iter()
            .map(|(name, value)| (name.to_owned(), value.to_owned()))
            .collect::<Vec<_>>()
            .into()
    }
}

fn match_tokens<'t, 'p>(tokens: &'t [Token], path: &'p str, captures: &mut Vec<(&'t str, &'p str)>) -> bool {
    let Some((token, rest)) = tokens.split_first() else {
        return path.is_empty() || path == "/";
    };

    match token {
        Token::Literal(literal) => match path.strip_prefix(literal.as_str()) {
            Some(remainder) => match_tokens(rest, remainder, captures),
            None => false,
        },
        Token::Param(name) => {
            // lazy capture: shortest first, growing until the tail matches
            for end in capture_ends(path) {
                captures.push((name, &path[..end]));
                if match_tokens(rest, &path[end..], captures) {
                    return true;
                }
                captures.pop();
            }
            false
        }
    }
}

/// Candidate capture end offsets: every char boundary inside the leading run
/// of characters a parameter may consume (anything but `/`, `:` and `?`).
fn capture_ends(path: &str) -> impl Iterator<Item = usize> + '_ {
    path.char_indices()
        .take_while(|(_, c)| !matches!(c, '/' | ':' | '?'))
        .map(|(at, c)| at + c.len_utf8())
}

/// Named captures extracted from a request path, in declaration order.
#[derive(Debug, Clone)]
pub struct PathParams {
    kind: PathParamsKind,
}

#[derive(Debug, Clone)]
enum PathParamsKind {
    None,
    Params(Vec<(String, String)>),
}

impl PathParams {
    /// Creates an empty set with no parameters.
    #[inline]
    pub const fn empty() -> Self {
        Self { kind: PathParamsKind::None }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        match &self.kind {
            PathParamsKind::None => true,
            PathParamsKind::Params(params) => params.is_empty(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        match &self.kind {
            PathParamsKind::None => 0,
            PathParamsKind::Params(params) => params.len(),
        }
    }

    /// Gets the value of a parameter by its name.
    #[inline]
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        match &self.kind {
            PathParamsKind::None => None,
            PathParamsKind::Params(params) => {
                params.iter().find(|(name, _)| name.as_str() == key.as_ref()).map(|(_, value)| value.as_str())
            }
        }
    }

    /// Iterates the captures in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        let params = match &self.kind {
            PathParamsKind::None => &[][..],
            PathParamsKind::Params(params) => params.as_slice(),
        };
        params.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl Default for PathParams {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<(String, String)>> for PathParams {
    fn from(params: Vec<(String, String)>) -> Self {
        if params.is_empty() {
            Self::empty()
        } else {
            Self { kind: PathParamsKind::Params(params) }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::pattern::{InvalidPathSpec, PathParams, PathPattern, PathSpec};

    fn compiled(template: &str) -> PathPattern {
        PathPattern::compile(template).unwrap()
    }

    #[test]
    fn literal_template_is_anchored() {
        let pattern = compiled("/a/b");
        assert!(pattern.matches("/a/b"));
        assert!(!pattern.matches("/a/b/c"));
        assert!(!pattern.matches("/x/a/b"));
        assert!(!pattern.matches("/a"));
    }

    #[test]
    fn trailing_slash_is_optional() {
        let pattern = compiled("/a/b");
        assert!(pattern.matches("/a/b"));
        assert!(pattern.matches("/a/b/"));
        assert!(!pattern.matches("/a/b//"));
    }

    #[test]
    fn named_param_captures_segment() {
        let pattern = compiled("/items/:id");
        assert!(pattern.matches("/items/42"));

        let params = pattern.extract("/items/42");
        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn param_requires_non_empty_segment() {
        let pattern = compiled("/items/:id");
        assert!(!pattern.matches("/items/"));
        assert!(!pattern.matches("/items"));
        assert!(pattern.extract("/items/").is_empty());
    }

    #[test]
    fn param_matches_with_trailing_slash() {
        let pattern = compiled("/items/:id");
        assert!(pattern.matches("/items/42/"));
        assert_eq!(pattern.extract("/items/42/").get("id"), Some("42"));
    }

    #[test]
    fn param_excludes_slash_colon_and_question_mark() {
        let pattern = compiled("/a/:x");
        assert!(!pattern.matches("/a/b/c"));
        assert!(!pattern.matches("/a/b:c"));
        assert!(!pattern.matches("/a/b?c"));
    }

    #[test]
    fn multiple_params_extract_in_declaration_order() {
        let pattern = compiled("/users/:userId/posts/:postId");
        let params = pattern.extract("/users/7/posts/99");

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("userId"), Some("7"));
        assert_eq!(params.get("postId"), Some("99"));

        let names: Vec<&str> = params.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["userId", "postId"]);
    }

    #[test]
    fn extract_strips_query_suffix() {
        let pattern = compiled("/users/:id");
        let params = pattern.extract("/users/7?x=1&y=2");
        assert_eq!(params.get("id"), Some("7"));
    }

    #[test]
    fn extract_on_mismatch_is_empty() {
        let pattern = compiled("/users/:id");
        assert!(pattern.extract("/posts/7").is_empty());
        assert!(pattern.extract("/posts/7").get("id").is_none());
    }

    #[test]
    fn extract_without_params_is_empty() {
        let pattern = compiled("/about");
        assert!(pattern.extract("/about").is_empty());
        assert!(!pattern.has_params());
    }

    #[test]
    fn colon_without_letters_stays_literal() {
        let pattern = compiled("/a/:1");
        assert!(pattern.matches("/a/:1"));
        assert!(!pattern.matches("/a/x"));
        assert!(!pattern.has_params());
    }

    #[test]
    fn adjacent_params_split_lazily() {
        let pattern = compiled("/x/:a:b");
        let params = pattern.extract("/x/mn");
        assert_eq!(params.get("a"), Some("m"));
        assert_eq!(params.get("b"), Some("n"));
    }

    #[test]
    fn param_inside_segment_captures_tail() {
        let pattern = compiled("/files/v:version");
        let params = pattern.extract("/files/v12");
        assert_eq!(params.get("version"), Some("12"));
        assert!(!pattern.matches("/files/v"));
    }

    #[test]
    fn duplicate_param_name_is_rejected() {
        let err = PathPattern::compile("/a/:id/b/:id").unwrap_err();
        assert!(matches!(err, InvalidPathSpec::DuplicateParam(name) if name == "id"));
    }

    #[test]
    fn precompiled_pattern_passes_through() {
        let pattern = compiled("/items/:id");
        let spec = PathSpec::from(pattern);
        let recompiled = spec.compile().unwrap();
        assert_eq!(recompiled.source(), "/items/:id");
        assert!(recompiled.matches("/items/1"));
    }

    #[test]
    fn empty_params_view() {
        let params = PathParams::empty();
        assert!(params.is_empty());
        assert_eq!(params.len(), 0);
        assert_eq!(params.get("anything"), None);
        assert_eq!(params.iter().count(), 0);
    }
}
