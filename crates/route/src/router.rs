use crate::answer::Answer;
use crate::context::Context;
use crate::handler::Handler;
use crate::pattern::{InvalidPathSpec, PathParams, PathPattern, PathSpec};
use http::{Method, Request, Response, StatusCode};
use std::net::SocketAddr;
use thiserror::Error;
use tracing::{debug, error};

/// Which request methods a route accepts: a single verb, or any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodRule {
    Any,
    Verb(Method),
}

impl MethodRule {
    fn allows(&self, method: &Method) -> bool {
        match self {
            MethodRule::Any => true,
            MethodRule::Verb(verb) => verb == method,
        }
    }
}

struct Route {
    rule: MethodRule,
    pattern: PathPattern,
    handler: Box<dyn Handler>,
}

impl Route {
    fn matches(&self, method: &Method, path: &str) -> bool {
        self.pattern.matches(path) && self.rule.allows(method)
    }
}

struct Middleware {
    pattern: PathPattern,
    handler: Box<dyn Handler>,
}

/// How a dispatch run ended; converted to status + body at the single
/// finalize call site in [`Router::serve`].
enum DispatchOutcome {
    Handled(Answer),
    NoRoute,
    MiddlewareFailed,
    HandlerFailed,
}

/// The router: an ordered route list and an ordered middleware list, built
/// once before traffic and shared read-only across requests.
pub struct Router {
    routes: Vec<Route>,
    middlewares: Vec<Middleware>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Dispatches one inbound request and produces its response.
    ///
    /// The request body is not consumed; routing looks at the head only.
    pub async fn serve<B>(&self, request: Request<B>, peer_addr: Option<SocketAddr>) -> Response<Answer> {
        let (head, _body) = request.into_parts();
        let mut ctx = Context::new(head, peer_addr);

        match self.dispatch(&mut ctx).await {
            DispatchOutcome::Handled(answer) => ctx.finish(answer),
            DispatchOutcome::NoRoute => {
                ctx.status(StatusCode::NOT_FOUND);
                ctx.finish(Answer::empty())
            }
            DispatchOutcome::MiddlewareFailed | DispatchOutcome::HandlerFailed => {
                ctx.status(StatusCode::INTERNAL_SERVER_ERROR);
                ctx.finish(Answer::empty())
            }
        }
    }

    async fn dispatch(&self, ctx: &mut Context) -> DispatchOutcome {
        let method = ctx.method().clone();
        let path = ctx.clean_path().to_owned();

        // first matching route wins; its absence is not yet fatal
        let route = self.routes.iter().find(|route| route.matches(&method, &path));
        let middlewares: Vec<&Middleware> =
            self.middlewares.iter().filter(|middleware| middleware.pattern.matches(&path)).collect();

        // params come from the selected route; a missing route still yields
        // a well-formed empty set
        let params = route.map(|route| route.pattern.extract(&path)).unwrap_or_else(PathParams::empty);
        ctx.insert_params(params);

        for middleware in middlewares {
            if let Err(e) = middleware.handler.invoke(ctx).await {
                error!(cause = %e, path = %path, "middleware failed, aborting dispatch");
                return DispatchOutcome::MiddlewareFailed;
            }
        }

        match route {
            Some(route) => match route.handler.invoke(ctx).await {
                Ok(answer) => DispatchOutcome::Handled(answer),
                Err(e) => {
                    error!(cause = %e, path = %path, "route handler failed");
                    DispatchOutcome::HandlerFailed
                }
            },
            None => {
                debug!(path = %path, "no route matched");
                DispatchOutcome::NoRoute
            }
        }
    }
}

/// Raised when a registered path specification fails to compile; fatal to
/// [`RouterBuilder::build`], so application startup aborts.
#[derive(Debug, Error)]
#[error("can't register path `{spec}`: {source}")]
pub struct RouterBuildError {
    spec: String,
    #[source]
    source: InvalidPathSpec,
}

macro_rules! method_route {
    ($name:ident, $verb:ident) => {
        pub fn $name(self, spec: impl Into<PathSpec>, handler: impl Handler + 'static) -> Self {
            self.route(MethodRule::Verb(Method::$verb), spec, handler)
        }
    };
}

/// Collects registrations in order; [`RouterBuilder::build`] compiles every
/// path specification and produces the immutable [`Router`].
pub struct RouterBuilder {
    routes: Vec<(MethodRule, PathSpec, Box<dyn Handler>)>,
    middlewares: Vec<(PathSpec, Box<dyn Handler>)>,
}

impl RouterBuilder {
    fn new() -> Self {
        Self { routes: Vec::new(), middlewares: Vec::new() }
    }

    /// Appends a middleware entry. Duplicate and overlapping paths are both
    /// legal; every matching middleware runs, in registration order, for
    /// every verb.
    pub fn middleware(mut self, spec: impl Into<PathSpec>, handler: impl Handler + 'static) -> Self {
        self.middlewares.push((spec.into(), Box::new(handler)));
        self
    }

    /// Appends a route entry. Among routes matching the same request, the
    /// first registered wins.
    pub fn route(mut self, rule: MethodRule, spec: impl Into<PathSpec>, handler: impl Handler + 'static) -> Self {
        self.routes.push((rule, spec.into(), Box::new(handler)));
        self
    }

    /// Appends a route matched regardless of verb.
    pub fn all(self, spec: impl Into<PathSpec>, handler: impl Handler + 'static) -> Self {
        self.route(MethodRule::Any, spec, handler)
    }

    method_route!(get, GET);
    method_route!(head, HEAD);
    method_route!(post, POST);
    method_route!(put, PUT);
    method_route!(delete, DELETE);
    method_route!(patch, PATCH);
    method_route!(options, OPTIONS);

    pub fn build(self) -> Result<Router, RouterBuildError> {
        let mut routes = Vec::with_capacity(self.routes.len());
        for (rule, spec, handler) in self.routes {
            routes.push(Route { rule, pattern: compile(spec)?, handler });
        }

        let mut middlewares = Vec::with_capacity(self.middlewares.len());
        for (spec, handler) in self.middlewares {
            middlewares.push(Middleware { pattern: compile(spec)?, handler });
        }

        Ok(Router { routes, middlewares })
    }
}

fn compile(spec: PathSpec) -> Result<PathPattern, RouterBuildError> {
    let source = spec.source().to_owned();
    spec.compile().map_err(|e| RouterBuildError { spec: source, source: e })
}
