use std::future::Future;

use futures::future::{BoxFuture, FutureExt};

use crate::error::Result;
use crate::{Content, Resource};

/// Produces a new content from an existing one.
///
/// Implemented for every `Fn(Content) -> impl Future<Output = Result<Content>>`.
pub trait ContentTransformer: Send + Sync + 'static {
    fn transform(&self, content: Content) -> BoxFuture<'static, Result<Content>>;
}

impl<F, Fut> ContentTransformer for F
    where F: Fn(Content) -> Fut + Send + Sync + 'static,
          Fut: Future<Output = Result<Content>> + Send + 'static
{
    fn transform(&self, content: Content) -> BoxFuture<'static, Result<Content>> {
        self(content).boxed()
    }
}

/// Produces a new resource from an existing one.
///
/// Implemented for every `Fn(Resource) -> impl Future<Output = Result<Resource>>`.
pub trait ResourceTransformer: Send + Sync + 'static {
    fn transform(&self, resource: Resource) -> BoxFuture<'static, Result<Resource>>;
}

impl<F, Fut> ResourceTransformer for F
    where F: Fn(Resource) -> Fut + Send + Sync + 'static,
          Fut: Future<Output = Result<Resource>> + Send + 'static
{
    fn transform(&self, resource: Resource) -> BoxFuture<'static, Result<Resource>> {
        self(resource).boxed()
    }
}

/// Splits one resource into zero or more resources.
///
/// Implemented for every `Fn(Resource) -> impl Future<Output = Result<Vec<Resource>>>`.
pub trait ResourceDivider: Send + Sync + 'static {
    fn divide(&self, resource: Resource) -> BoxFuture<'static, Result<Vec<Resource>>>;
}

impl<F, Fut> ResourceDivider for F
    where F: Fn(Resource) -> Fut + Send + Sync + 'static,
          Fut: Future<Output = Result<Vec<Resource>>> + Send + 'static
{
    fn divide(&self, resource: Resource) -> BoxFuture<'static, Result<Vec<Resource>>> {
        self(resource).boxed()
    }
}

/// Decides whether a resource takes part in a stage.
///
/// Implemented for every `Fn(&Resource) -> bool`.
pub trait ResourcePredicate: Send + Sync + 'static {
    fn test(&self, resource: &Resource) -> bool;
}

impl<F> ResourcePredicate for F
    where F: Fn(&Resource) -> bool + Send + Sync + 'static
{
    fn test(&self, resource: &Resource) -> bool {
        self(resource)
    }
}
