//! An asynchronous micro request router.
//!
//! This crate is a request-routing layer on top of a raw HTTP listener: it
//! matches an incoming request (method + path) to a registered handler, runs
//! the ordered chain of path-matched middlewares first, and writes back
//! whatever the matched handler produces.
//!
//! - Path templates use `:name` placeholders (`/users/:userId`), compiled at
//!   registration time; a trailing slash on the request path is always
//!   accepted, and among overlapping routes the first registered wins.
//! - Middlewares match on path only, run for every verb, strictly in
//!   registration order; a failing middleware aborts the request with a 500
//!   before the route handler runs.
//! - A request without a matching route is a plain 404; a failing route
//!   handler degrades to a 500. No application error ever reaches the
//!   transport.
//!
//! # Example
//!
//! ```no_run
//! use micro_route::{handler_fn, Context, Router, Server};
//!
//! async fn hello(_ctx: &mut Context) -> &'static str {
//!     "hello world\r\n"
//! }
//!
//! async fn show_user(ctx: &mut Context) -> String {
//!     format!("user {}\r\n", ctx.params().get("userId").unwrap_or("?"))
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = Router::builder()
//!         .get("/", handler_fn(hello))
//!         .get("/users/:userId", handler_fn(show_user))
//!         .build()
//!         .expect("route table should compile");
//!
//!     Server::builder()
//!         .router(router)
//!         .address("127.0.0.1:8080")
//!         .build()
//!         .unwrap()
//!         .start()
//!         .await;
//! }
//! ```

mod answer;
mod context;
mod handler;
mod responder;
mod server;

pub mod pattern;
pub mod router;

pub use answer::Answer;
pub use context::Context;
pub use handler::handler_fn;
pub use handler::BoxError;
pub use handler::FnHandler;
pub use handler::Handler;
pub use handler::HandlerFn;
pub use pattern::InvalidPathSpec;
pub use pattern::PathParams;
pub use pattern::PathPattern;
pub use pattern::PathSpec;
pub use responder::Responder;
pub use router::MethodRule;
pub use router::Router;
pub use router::RouterBuilder;
pub use router::RouterBuildError;
pub use server::Server;
pub use server::ServerBuildError;
pub use server::ServerBuilder;
