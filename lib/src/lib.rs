#![doc = svgbobdoc::transform!(
//! A resource model and pipeline engine for building static sites.
//!
//! # Overview
//!
//! Prism is a library for building static site generators around content
//! negotiation: one logical page may exist in several languages or formats,
//! and the site decides, at build time or in the browser, which one a visitor
//! sees.
//!
//! Internally, prism organizes content as follows:
//!
//! ```svgbob
//!  +----------------------------------------------------+
//!  | Pipeline                                           |
//!  |                                                    |
//!  |  +------------------+        +------------------+  |
//!  |  | Resource "/a/"   |  ...   | Resource "/b.css"|  |
//!  |  +--------+---------+        +--------+---------+  |
//!  |           |                           |            |
//!  |     +-----+------+                    |            |
//!  |     |            |                    |            |
//!  |  +--+-------+ +--+-------+      +-----+------+     |
//!  |  | Content  | | Content  |      |  Content   |     |
//!  |  | html; en | | html; ko |      |  text/css  |     |
//!  |  +----------+ +----------+      +------------+     |
//!  +----------------------------------------------------+
//! ```
//!
//! In words:
//!
//!   * A **content** is one representation: a media type, an optional
//!     language, a modification time, and a lazily loaded body and
//!     metadata. Contents are immutable; [`Content::replace()`] derives new
//!     ones without loading anything.
//!
//!   * A **resource** is a path and its representations, at most one per
//!     [`ContentKey`], the pair of media type and language.
//!
//!   * A **pipeline** is a replayable stream of resources and the stages
//!     applied to it. Stages transform contents, split and merge resources,
//!     and move them between paths.
//!
//! ## Building
//!
//! A site is typically built with the following operations:
//!
//! 1. Source files are scanned into resources with [`scan::Scanner`].
//! 2. Contents are transformed: front matter moves into metadata, Markdown
//!    becomes HTML, Sass becomes CSS. See [`transform`].
//! 3. Resources with several representations are split into one resource
//!    per representation plus a negotiator with [`multiview::MultiView`].
//! 4. Every resource is written to an output directory with
//!    [`write::Writer`], optionally again whenever sources change.
)]

#[macro_use]
pub mod error;
mod intern;
pub mod util;
pub mod url;
pub mod value;
pub mod media_type;
pub mod language_tag;
pub mod content;
pub mod resource;
pub mod pipeline;
pub mod multiview;
pub mod transform;
pub mod scan;
pub mod write;
pub mod config;

pub use error::{Error, ErrorKind, Result};
pub use media_type::MediaType;
pub use language_tag::LanguageTag;
pub use content::{Body, Content, ContentBuilder, ContentFilter, ContentKey, Criterion, Loaded, Replace};
pub use resource::Resource;
pub use pipeline::{
    Pipeline, ResourceStream,
    ContentTransformer, ResourceTransformer, ResourceDivider, ResourcePredicate,
};
