use crate::answer::Answer;
use crate::context::Context;
use crate::responder::Responder;
use async_trait::async_trait;
use std::future::Future;

/// Boundary error type for application-supplied handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An object-safe request handler: both route handlers and middlewares.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn invoke(&self, ctx: &mut Context) -> Result<Answer, BoxError>;
}

/// Lifetime-generic view of an `async fn(&mut Context) -> impl Responder`.
///
/// Plain `async fn` items implement this for every lifetime, which is what
/// lets [`handler_fn`] accept them directly.
pub trait HandlerFn<'c>: Send + Sync {
    type Output: Responder;
    type Fut: Future<Output = Self::Output> + Send + 'c;

    fn call(&self, ctx: &'c mut Context) -> Self::Fut;
}

impl<'c, F, Fut> HandlerFn<'c> for F
where
    F: Fn(&'c mut Context) -> Fut + Send + Sync,
    Fut: Future + Send + 'c,
    Fut::Output: Responder,
{
    type Output = Fut::Output;
    type Fut = Fut;

    fn call(&self, ctx: &'c mut Context) -> Self::Fut {
        (self)(ctx)
    }
}

/// A [`HandlerFn`] holder adapting a plain async function into a [`Handler`].
pub struct FnHandler<F> {
    f: F,
}

pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: for<'c> HandlerFn<'c>,
{
    FnHandler { f }
}

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: for<'c> HandlerFn<'c>,
{
    async fn invoke(&self, ctx: &mut Context) -> Result<Answer, BoxError> {
        self.f.call(ctx).await.respond()
    }
}
