//! Per-request context: request inspection, a typed local store, response
//! staging, and the single finalize step.
//!
//! A [`Context`] is created fresh for each inbound request and consumed when
//! the response is finalized. Handlers read the request through it (method,
//! paths, query, headers, cookies, path parameters), stash per-request values
//! in its local store, stage response state (status, headers, cookies), and
//! may finalize early (e.g. [`Context::redirect`]); the dispatch layer always
//! commits exactly one response per request.

use crate::answer::Answer;
use crate::pattern::PathParams;
use http::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use http::request::Parts;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Response, StatusCode, Uri};
use std::collections::HashMap;
use std::net::SocketAddr;
use tracing::warn;

static EMPTY_PARAMS: PathParams = PathParams::empty();

const X_FORWARDED_FOR: &str = "x-forwarded-for";

#[derive(Debug)]
pub struct Context {
    head: Parts,
    peer_addr: Option<SocketAddr>,
    locals: http::Extensions,
    status: StatusCode,
    headers: HeaderMap,
    finished: Option<Response<Answer>>,
}

impl Context {
    /// Creates a context from a request head and the peer address, when the
    /// transport knows one.
    pub fn new(head: Parts, peer_addr: Option<SocketAddr>) -> Self {
        Self {
            head,
            peer_addr,
            locals: http::Extensions::new(),
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            finished: None,
        }
    }

    /// The request's HTTP method.
    pub fn method(&self) -> &Method {
        &self.head.method
    }

    pub fn uri(&self) -> &Uri {
        &self.head.uri
    }

    /// The full request path, query string included.
    pub fn path(&self) -> &str {
        self.head
            .uri
            .path_and_query()
            .map_or_else(|| self.head.uri.path(), |pq| pq.as_str())
    }

    /// The request path with any query string removed.
    pub fn clean_path(&self) -> &str {
        self.head.uri.path()
    }

    /// The parsed query-string mapping; empty when there is no query.
    pub fn query(&self) -> HashMap<String, String> {
        self.head
            .uri
            .query()
            .and_then(|q| serde_urlencoded::from_str(q).ok())
            .unwrap_or_default()
    }

    /// The request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    /// The client address: the `x-forwarded-for` header when present,
    /// otherwise the peer address of the connection.
    pub fn ip(&self) -> Option<String> {
        if let Some(forwarded) = self.head.headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            return Some(forwarded.to_owned());
        }
        self.peer_addr.map(|addr| addr.ip().to_string())
    }

    /// The request cookies, parsed from the `Cookie` header(s).
    pub fn cookies(&self) -> HashMap<String, String> {
        let mut cookies = HashMap::new();
        for value in self.head.headers.get_all(COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            for pair in raw.split(';') {
                if let Some((name, value)) = pair.split_once('=') {
                    cookies.insert(name.trim().to_owned(), value.to_owned());
                }
            }
        }
        cookies
    }

    /// Stores a per-request value in the local store, keyed by its type.
    pub fn set_local<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.locals.insert(value);
        self
    }

    /// Reads a per-request value from the local store.
    pub fn local<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.locals.get()
    }

    /// The path parameters resolved for this request; the empty view when
    /// dispatch has not injected any.
    pub fn params(&self) -> &PathParams {
        self.locals.get().unwrap_or(&EMPTY_PARAMS)
    }

    pub(crate) fn insert_params(&mut self, params: PathParams) {
        self.locals.insert(params);
    }

    /// Stages the response status.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// Stages a response header. An invalid name or value is dropped with a
    /// warning rather than failing the request.
    pub fn header(&mut self, name: impl TryInto<HeaderName>, value: impl TryInto<HeaderValue>) -> &mut Self {
        match (name.try_into(), value.try_into()) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => warn!("invalid response header dropped"),
        }
        self
    }

    pub fn content_type(&mut self, value: &str) -> &mut Self {
        self.header(CONTENT_TYPE, value)
    }

    pub fn cache_control(&mut self, value: &str) -> &mut Self {
        self.header(CACHE_CONTROL, value)
    }

    pub fn content_length(&mut self, length: u64) -> &mut Self {
        self.headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
        self
    }

    /// Stages a `Set-Cookie` response header; multiple cookies accumulate.
    pub fn cookie(&mut self, name: &str, value: &str) -> &mut Self {
        match HeaderValue::try_from(format!("{name}={value};")) {
            Ok(cookie) => {
                self.headers.append(SET_COOKIE, cookie);
            }
            Err(_) => warn!(cookie = name, "invalid cookie dropped"),
        }
        self
    }

    /// Finalizes early with a 301 redirect to `location`.
    pub fn redirect(&mut self, location: &str) {
        self.status(StatusCode::MOVED_PERMANENTLY).header(LOCATION, location).end(Answer::empty());
    }

    /// Commits the response with the given body, applying the staged status,
    /// headers and cookies. The first commit wins: a later call with an empty
    /// body is a no-op, a later non-empty body is dropped with a warning.
    pub fn end(&mut self, answer: impl Into<Answer>) {
        let answer = answer.into();
        if self.finished.is_some() {
            if !answer.is_empty() {
                warn!("response already finalized, dropping late body");
            }
            return;
        }

        if answer.is_text() && !self.headers.contains_key(CONTENT_TYPE) {
            if let Ok(text_plain) = mime::TEXT_PLAIN_UTF_8.as_ref().parse() {
                self.headers.insert(CONTENT_TYPE, text_plain);
            }
        }

        let mut response = Response::new(answer);
        *response.status_mut() = self.status;
        *response.headers_mut() = std::mem::take(&mut self.headers);
        self.finished = Some(response);
    }

    /// Consumes the context, committing `answer` unless a handler finalized
    /// earlier. Exactly one response leaves a context.
    pub fn finish(mut self, answer: Answer) -> Response<Answer> {
        self.end(answer);
        self.finished.unwrap_or_else(|| Response::new(Answer::empty()))
    }
}

#[cfg(test)]
mod tests {
    use crate::answer::Answer;
    use crate::context::Context;
    use crate::pattern::PathParams;
    use http::header::{CONTENT_TYPE, LOCATION, SET_COOKIE};
    use http::{Request, StatusCode};

    fn context_for(uri: &str) -> Context {
        let (head, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        Context::new(head, None)
    }

    #[test]
    fn paths_split_query() {
        let ctx = context_for("/users/7/posts/99?x=1");
        assert_eq!(ctx.path(), "/users/7/posts/99?x=1");
        assert_eq!(ctx.clean_path(), "/users/7/posts/99");
    }

    #[test]
    fn query_parses_into_mapping() {
        let ctx = context_for("/search?x=1&name=zava");
        let query = ctx.query();
        assert_eq!(query.get("x").map(String::as_str), Some("1"));
        assert_eq!(query.get("name").map(String::as_str), Some("zava"));

        assert!(context_for("/search").query().is_empty());
    }

    #[test]
    fn params_default_to_empty_view() {
        let mut ctx = context_for("/");
        assert!(ctx.params().is_empty());

        ctx.insert_params(PathParams::from(vec![("id".to_owned(), "42".to_owned())]));
        assert_eq!(ctx.params().get("id"), Some("42"));
    }

    #[test]
    fn locals_are_typed() {
        #[derive(Clone, Debug, PartialEq)]
        struct RequestTag(u32);

        let mut ctx = context_for("/");
        assert!(ctx.local::<RequestTag>().is_none());

        ctx.set_local(RequestTag(7));
        assert_eq!(ctx.local::<RequestTag>(), Some(&RequestTag(7)));
    }

    #[test]
    fn cookies_parse_from_header() {
        let (head, _) = Request::builder()
            .uri("/")
            .header("cookie", "session=abc; theme=dark")
            .body(())
            .unwrap()
            .into_parts();
        let ctx = Context::new(head, None);

        let cookies = ctx.cookies();
        assert_eq!(cookies.get("session").map(String::as_str), Some("abc"));
        assert_eq!(cookies.get("theme").map(String::as_str), Some("dark"));
    }

    #[test]
    fn ip_prefers_forwarded_header() {
        let (head, _) = Request::builder()
            .uri("/")
            .header("x-forwarded-for", "10.0.0.7")
            .body(())
            .unwrap()
            .into_parts();
        let ctx = Context::new(head, Some("127.0.0.1:9999".parse().unwrap()));
        assert_eq!(ctx.ip().as_deref(), Some("10.0.0.7"));

        let ctx = context_for("/");
        assert_eq!(ctx.ip(), None);
    }

    #[test]
    fn finish_applies_staged_state() {
        let mut ctx = context_for("/");
        ctx.status(StatusCode::CREATED).header("x-request-id", "r1").cookie("session", "abc");

        let response = ctx.finish(Answer::from("made"));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers().get("x-request-id").unwrap(), "r1");
        assert_eq!(response.headers().get(SET_COOKIE).unwrap(), "session=abc;");
        assert_eq!(response.into_body().into_bytes().as_ref(), b"made");
    }

    #[test]
    fn text_body_defaults_content_type() {
        let ctx = context_for("/");
        let response = ctx.finish(Answer::from("plain"));
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/plain; charset=utf-8");
    }

    #[test]
    fn staged_content_type_is_kept() {
        let mut ctx = context_for("/");
        ctx.content_type("application/json");
        let response = ctx.finish(Answer::from("{}"));
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn first_commit_wins() {
        let mut ctx = context_for("/");
        ctx.end(Answer::from("first"));
        ctx.end(Answer::from("second"));

        let response = ctx.finish(Answer::empty());
        assert_eq!(response.into_body().into_bytes().as_ref(), b"first");
    }

    #[test]
    fn redirect_finalizes_early() {
        let mut ctx = context_for("/old");
        ctx.redirect("/new");

        let response = ctx.finish(Answer::empty());
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/new");
        assert!(response.into_body().is_empty());
    }

    #[test]
    fn multiple_cookies_accumulate() {
        let mut ctx = context_for("/");
        ctx.cookie("a", "1").cookie("b", "2");

        let response = ctx.finish(Answer::empty());
        let cookies: Vec<_> = response.headers().get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies.len(), 2);
    }
}
