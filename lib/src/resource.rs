use std::sync::Arc;
use std::fmt;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;

use crate::error::{ContentKeyError, ResourceError, Result};
use crate::url::Url;
use crate::{Content, ContentKey};

/// A path and its representations, at most one per [`ContentKey`].
///
/// A `Resource` is an immutable, cheap-to-clone handle. Every operation that
/// would change it returns a new resource instead. A resource always has at
/// least one representation.
///
/// ```rust
/// use prism::{Content, Resource};
///
/// let en = Content::builder("text/html").unwrap().language("en").unwrap().build();
/// let ko = Content::builder("text/html").unwrap().language("ko").unwrap().build();
///
/// let resource = Resource::new("/index.html", [en.clone()]).unwrap();
/// let resource = resource.add(ko).unwrap();
/// assert_eq!(resource.len(), 2);
/// assert!(resource.has(&en.key()));
///
/// // Only one representation per key.
/// assert!(resource.add(en).is_err());
/// ```
#[derive(Clone)]
pub struct Resource(Arc<Inner>);

struct Inner {
    path: Arc<Url>,
    contents: FxHashMap<ContentKey, Content>,
    last_modified: DateTime<Utc>,
}

impl Resource {
    /// Creates a resource at `path` with representations `contents`.
    ///
    /// Fails with a `ResourceError` if `path` isn't a valid resource path or
    /// `contents` is empty, and with a `ContentKeyError` if two contents share
    /// a key.
    pub fn new<P, I>(path: P, contents: I) -> Result<Resource>
        where P: AsRef<str>, I: IntoIterator<Item = Content>
    {
        let path = Self::validate_path(path.as_ref())?;
        let mut map = FxHashMap::default();
        for content in contents {
            Self::insert(&mut map, &path, content)?;
        }

        Self::from_parts(path, map)
    }

    fn validate_path(path: &str) -> Result<Arc<Url>> {
        Url::try_from(Arc::from(path))
            .map_err(|path| ResourceError::new(&*path, "invalid resource path").into())
    }

    fn insert(map: &mut FxHashMap<ContentKey, Content>, path: &Url, content: Content) -> Result<()> {
        let key = content.key();
        if map.contains_key(&key) {
            let error = ContentKeyError::new(key.as_str(), format!("two representations at {path}"));
            return Err(error.into());
        }

        map.insert(key, content);
        Ok(())
    }

    fn from_parts(path: Arc<Url>, contents: FxHashMap<ContentKey, Content>) -> Result<Resource> {
        let last_modified = contents.values()
            .map(|c| c.last_modified())
            .max()
            .ok_or_else(|| ResourceError::new(path.as_str(), "resource has no representations"))?;

        Ok(Resource(Arc::new(Inner { path, contents, last_modified })))
    }

    pub fn ptr_eq(a: &Resource, b: &Resource) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub fn path(&self) -> &Url {
        &self.0.path
    }

    /// A shared handle to this resource's path.
    pub fn path_arc(&self) -> Arc<Url> {
        self.0.path.clone()
    }

    pub fn get(&self, key: &ContentKey) -> Option<&Content> {
        self.0.contents.get(key)
    }

    pub fn has(&self, key: &ContentKey) -> bool {
        self.0.contents.contains_key(key)
    }

    /// The representation keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &ContentKey> + '_ {
        self.0.contents.keys()
    }

    /// The representations, in no particular order.
    pub fn contents(&self) -> impl Iterator<Item = &Content> + '_ {
        self.0.contents.values()
    }

    /// The representations, sorted by key.
    pub fn sorted_contents(&self) -> Vec<&Content> {
        let mut contents: Vec<_> = self.0.contents.iter().collect();
        contents.sort_by(|(a, _), (b, _)| a.cmp(b));
        contents.into_iter().map(|(_, c)| c).collect()
    }

    /// The only representation, if there is exactly one.
    pub fn single(&self) -> Option<&Content> {
        match self.len() {
            1 => self.contents().next(),
            _ => None,
        }
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.contents.len()
    }

    /// The latest modification time of any representation.
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.0.last_modified
    }

    /// Returns a new resource with `content` added.
    pub fn add(&self, content: Content) -> Result<Resource> {
        let mut contents = self.0.contents.clone();
        Self::insert(&mut contents, &self.0.path, content)?;
        Self::from_parts(self.0.path.clone(), contents)
    }

    /// Returns a new resource at `path` with the same representations.
    pub fn move_to<P: AsRef<str>>(&self, path: P) -> Result<Resource> {
        let path = Self::validate_path(path.as_ref())?;
        Ok(Resource(Arc::new(Inner {
            path,
            contents: self.0.contents.clone(),
            last_modified: self.0.last_modified,
        })))
    }

    /// Returns a new resource with the representations of `self` and `other`,
    /// which must be at the same path and share no key.
    pub fn merge(&self, other: &Resource) -> Result<Resource> {
        if self.path() != other.path() {
            let reason = format!("can't merge with a resource at {}", other.path());
            return Err(ResourceError::new(self.path().as_str(), reason).into());
        }

        let mut contents = self.0.contents.clone();
        for content in other.contents() {
            Self::insert(&mut contents, &self.0.path, content.clone())?;
        }

        Self::from_parts(self.0.path.clone(), contents)
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.keys().collect();
        keys.sort();
        f.debug_struct("Resource")
            .field("path", &self.path().as_str())
            .field("keys", &keys)
            .field("last_modified", &self.last_modified())
            .finish()
    }
}

#[cfg(test)]
static_assertions::assert_impl_all!(Resource: Send, Sync);
