//! Replayable, reloadable streams of resources.
//!
//! A [`Pipeline`] describes how to produce resources rather than holding
//! them: every drain re-runs the source factory and every stage after it.
//! Stages that may produce two resources at one path (the source, [`map`],
//! [`divide`], [`move_paths`], [`union`], [`add`], and [`add_summaries`])
//! merge such resources into one, in the order paths were first emitted.
//! Merging two representations with the same key is an error. The remaining
//! stages ([`filter`], [`transform`], [`diversify`]) preserve paths and
//! stream resources through as they arrive.
//!
//! [`map`]: Pipeline::map
//! [`divide`]: Pipeline::divide
//! [`move_paths`]: Pipeline::move_paths
//! [`union`]: Pipeline::union
//! [`add`]: Pipeline::add
//! [`add_summaries`]: Pipeline::add_summaries
//! [`filter`]: Pipeline::filter
//! [`transform`]: Pipeline::transform
//! [`diversify`]: Pipeline::diversify

mod traits;
mod merge;
mod reload;

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::fmt;

use chrono::{DateTime, Utc};
use futures::future::{self, FutureExt, TryFutureExt};
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use parking_lot::Mutex;

use crate::content::Criterion;
use crate::error::{Error, Result};
use crate::url::{Url, UrlBuf};
use crate::{Content, Resource};

pub use traits::*;
pub(crate) use merge::Merger;

/// A stream of resources, as produced by one drain of a [`Pipeline`].
pub type ResourceStream = BoxStream<'static, Result<Resource>>;

type Factory = Arc<dyn Fn() -> ResourceStream + Send + Sync>;

/// A take-once slot holding one attached reload trigger. Pipelines derived
/// from the one it was attached to share the slot.
type TriggerSlot = Arc<Mutex<Option<BoxStream<'static, ()>>>>;

/// A declarative, replayable sequence of resources.
///
/// ```rust
/// # futures::executor::block_on(async {
/// use prism::{Content, Resource, Pipeline};
///
/// let en = Content::builder("text/html")?.language("en")?.body("Hi").build();
/// let ko = Content::builder("text/html")?.language("ko")?.body("안녕").build();
///
/// let pipeline = Pipeline::from_resources([
///     Resource::new("/", [en])?,
///     Resource::new("/", [ko])?,
/// ]);
///
/// // Same-path resources merge.
/// let resources = pipeline.collect().await?;
/// assert_eq!(resources.len(), 1);
/// assert_eq!(resources[0].len(), 2);
///
/// // Pipelines replay.
/// assert_eq!(pipeline.collect().await?.len(), 1);
/// # Ok::<(), prism::Error>(())
/// # }).unwrap();
/// ```
#[derive(Clone)]
pub struct Pipeline {
    factory: Factory,
    triggers: Vec<TriggerSlot>,
}

impl Pipeline {
    /// A pipeline whose every drain calls `factory` for a fresh stream.
    pub fn new<F, S>(factory: F) -> Pipeline
        where F: Fn() -> S + Send + Sync + 'static,
              S: Stream<Item = Result<Resource>> + Send + 'static
    {
        Pipeline::from_factory(move || merge::merge_paths(factory().boxed()))
    }

    /// A pipeline that replays `resources`.
    pub fn from_resources<I: IntoIterator<Item = Resource>>(resources: I) -> Pipeline {
        let resources: Arc<[Resource]> = resources.into_iter().collect();
        Pipeline::new(move || stream::iter(resources.to_vec()).map(Ok))
    }

    pub fn empty() -> Pipeline {
        Pipeline::from_resources(Vec::new())
    }

    fn from_factory<F>(factory: F) -> Pipeline
        where F: Fn() -> ResourceStream + Send + Sync + 'static
    {
        Pipeline { factory: Arc::new(factory), triggers: Vec::new() }
    }

    /// A stage over the streams of `self`, sharing its reload triggers.
    fn stage<F>(&self, stage: F) -> Pipeline
        where F: Fn(ResourceStream) -> ResourceStream + Send + Sync + 'static
    {
        let factory = self.factory.clone();
        Pipeline {
            factory: Arc::new(move || stage(factory())),
            triggers: self.triggers.clone(),
        }
    }

    /// Like [`Pipeline::stage()`], then merges same-path resources.
    fn merging_stage<F>(&self, stage: F) -> Pipeline
        where F: Fn(ResourceStream) -> ResourceStream + Send + Sync + 'static
    {
        self.stage(move |stream| merge::merge_paths(stage(stream)))
    }

    /// Attaches a reload trigger: each item `trigger` yields asks
    /// [`Pipeline::for_each_with_reloading()`] to rebuild. The returned
    /// pipeline reloads on `trigger` alone. Pipelines `self` was derived
    /// from, and other clones of it, keep theirs.
    pub fn with_reload<S>(mut self, trigger: S) -> Pipeline
        where S: Stream<Item = ()> + Send + 'static
    {
        self.triggers = vec![Arc::new(Mutex::new(Some(trigger.boxed())))];
        self
    }

    /// Returns `true` if a reload trigger is attached and not yet consumed.
    pub fn has_reload(&self) -> bool {
        self.triggers.iter().any(|slot| slot.lock().is_some())
    }

    /// Takes every unconsumed trigger attached to this pipeline, merged.
    fn take_trigger(&self) -> Option<BoxStream<'static, ()>> {
        let triggers: Vec<_> = self.triggers.iter()
            .filter_map(|slot| slot.lock().take())
            .collect();

        match triggers.len() {
            0 => None,
            _ => Some(stream::select_all(triggers).boxed()),
        }
    }

    /// Runs the pipeline once.
    pub fn stream(&self) -> ResourceStream {
        (self.factory)()
    }

    /// Runs the pipeline once, collecting every resource.
    pub async fn collect(&self) -> Result<Vec<Resource>> {
        self.stream().try_collect().await
    }

    /// Applies `transformer` to every resource.
    pub fn map<T: ResourceTransformer>(&self, transformer: T) -> Pipeline {
        let transformer = Arc::new(transformer);
        self.merging_stage(move |stream| {
            let transformer = transformer.clone();
            stream.and_then(move |resource| transformer.transform(resource)).boxed()
        })
    }

    /// Keeps only the resources satisfying `predicate`.
    pub fn filter<P: ResourcePredicate>(&self, predicate: P) -> Pipeline {
        let predicate = Arc::new(predicate);
        self.stage(move |stream| {
            let predicate = predicate.clone();
            stream.try_filter(move |resource| future::ready(predicate.test(resource))).boxed()
        })
    }

    /// Replaces every representation matching `criterion` with the result of
    /// applying `transformer` to it. Other representations are unchanged.
    pub fn transform<T, C>(&self, transformer: T, criterion: C) -> Pipeline
        where T: ContentTransformer, C: Into<Criterion>
    {
        let transformer = Arc::new(transformer);
        let criterion = criterion.into();
        self.stage(move |stream| {
            let (transformer, criterion) = (transformer.clone(), criterion.clone());
            stream.and_then(move |resource| {
                transform_resource(resource, transformer.clone(), criterion.clone(), false)
            }).boxed()
        })
    }

    /// Like [`Pipeline::transform()`], but adds each transformed
    /// representation alongside the original. The transformed key must
    /// differ from the original's.
    pub fn diversify<T, C>(&self, transformer: T, criterion: C) -> Pipeline
        where T: ContentTransformer, C: Into<Criterion>
    {
        let transformer = Arc::new(transformer);
        let criterion = criterion.into();
        self.stage(move |stream| {
            let (transformer, criterion) = (transformer.clone(), criterion.clone());
            stream.and_then(move |resource| {
                transform_resource(resource, transformer.clone(), criterion.clone(), true)
            }).boxed()
        })
    }

    /// Replaces every resource with the resources `divider` splits it into.
    pub fn divide<D: ResourceDivider>(&self, divider: D) -> Pipeline {
        self.divide_where(divider, |_: &Resource| true)
    }

    /// Replaces every resource satisfying `predicate` with the resources
    /// `divider` splits it into. Other resources pass through.
    pub fn divide_where<D, P>(&self, divider: D, predicate: P) -> Pipeline
        where D: ResourceDivider, P: ResourcePredicate
    {
        let divider = Arc::new(divider);
        let predicate = Arc::new(predicate);
        self.merging_stage(move |stream| {
            let (divider, predicate) = (divider.clone(), predicate.clone());
            stream.and_then(move |resource| {
                let divided = if predicate.test(&resource) {
                    divider.divide(resource)
                } else {
                    future::ok(vec![resource]).boxed()
                };

                divided.map_ok(|resources| stream::iter(resources).map(Ok::<_, Error>))
            })
            .try_flatten()
            .boxed()
        })
    }

    /// Moves every resource to the path `f` returns for it.
    pub fn move_paths<F>(&self, f: F) -> Pipeline
        where F: Fn(&Url) -> UrlBuf + Send + Sync + 'static
    {
        let f = Arc::new(f);
        self.merging_stage(move |stream| {
            let f = f.clone();
            stream.and_then(move |resource| {
                let moved = match f(resource.path()) {
                    path if path.as_url() == resource.path() => Ok(resource),
                    path => resource.move_to(path),
                };

                future::ready(moved)
            }).boxed()
        })
    }

    /// Drains the pipeline once, grouping resources by the key `f` returns.
    /// Each group keeps emission order.
    pub async fn group_by<K, F>(&self, f: F) -> Result<BTreeMap<K, Vec<Resource>>>
        where K: Ord, F: Fn(&Resource) -> K
    {
        self.stream()
            .try_fold(BTreeMap::new(), |mut groups, resource| {
                groups.entry(f(&resource)).or_insert_with(Vec::new).push(resource);
                future::ok(groups)
            })
            .await
    }

    /// The resources of `self` followed by those of `other`, merged by path.
    ///
    /// The result reloads on either pipeline's triggers, which it shares
    /// with them.
    pub fn union(&self, other: &Pipeline) -> Pipeline {
        let (this, that) = (self.factory.clone(), other.factory.clone());
        let mut union = Pipeline::from_factory(move || {
            merge::merge_paths(this().chain(that()).boxed())
        });

        union.triggers = self.triggers.iter().chain(&other.triggers).cloned().collect();
        union
    }

    /// Adds `resource`, merging it with any resource at the same path.
    pub fn add(&self, resource: Resource) -> Pipeline {
        self.merging_stage(move |stream| {
            stream.chain(stream::iter([Ok(resource.clone())])).boxed()
        })
    }

    /// Prepends the resources `summarize` produces from a view of the whole
    /// pipeline, such as an index page listing every other page.
    ///
    /// Upstream runs once per drain: `summarize` sees a replay of the
    /// resources it produced.
    pub fn add_summaries<F, Fut>(&self, summarize: F) -> Pipeline
        where F: Fn(Pipeline) -> Fut + Send + Sync + 'static,
              Fut: Future<Output = Result<Vec<Resource>>> + Send + 'static
    {
        let summarize = Arc::new(summarize);
        self.merging_stage(move |stream| {
            let summarize = summarize.clone();
            let summarized = async move {
                let resources: Vec<Resource> = stream.try_collect().await?;
                let summaries = summarize(Pipeline::from_resources(resources.clone())).await?;
                tracing::debug!(count = summaries.len(), "added summaries");
                let all = summaries.into_iter().chain(resources);
                Ok::<_, Error>(stream::iter(all).map(Ok::<_, Error>))
            };

            stream::once(summarized).try_flatten().boxed()
        })
    }

    /// Drains the pipeline, calling `f` for every resource. Calls are issued
    /// in emission order and run concurrently.
    ///
    /// The first error ends the drain: calls still in flight are dropped
    /// and the error is returned.
    pub async fn for_each<F, Fut>(&self, f: F) -> Result<()>
        where F: Fn(Resource) -> Fut,
              Fut: Future<Output = Result<()>>
    {
        self.stream().try_for_each_concurrent(None, f).await
    }

    /// The latest modification time of any resource, or `None` if there are
    /// no resources.
    pub async fn last_modified(&self) -> Result<Option<DateTime<Utc>>> {
        self.stream()
            .try_fold(None, |max: Option<DateTime<Utc>>, resource| {
                future::ok(max.max(Some(resource.last_modified())))
            })
            .await
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("reload", &self.has_reload())
            .finish_non_exhaustive()
    }
}

async fn transform_resource<T: ContentTransformer>(
    resource: Resource,
    transformer: Arc<T>,
    criterion: Criterion,
    keep_original: bool,
) -> Result<Resource> {
    let matched: Vec<Content> = resource.contents()
        .filter(|content| criterion.test(content))
        .cloned()
        .collect();

    if matched.is_empty() {
        return Ok(resource);
    }

    tracing::debug!(path = %resource.path(), count = matched.len(), keep_original, "transforming");
    let transformed = future::try_join_all(matched.into_iter().map(|c| transformer.transform(c))).await?;
    if keep_original {
        return transformed.into_iter().try_fold(resource, |resource, c| resource.add(c));
    }

    let untouched = resource.contents()
        .filter(|content| !criterion.test(content))
        .cloned();

    Resource::new(resource.path(), untouched.chain(transformed))
}
