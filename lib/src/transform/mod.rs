//! Content transformers over the usual static site source formats.
//!
//! Each transformer implements [`ContentTransformer`](crate::pipeline::ContentTransformer)
//! and offers a `filter()` naming the contents it is meant for:
//!
//! ```rust
//! use prism::Pipeline;
//! use prism::transform::{FrontMatter, Markdown};
//!
//! # fn f(pipeline: Pipeline) {
//! let pipeline = pipeline
//!     .transform(FrontMatter::new(), FrontMatter::filter())
//!     .transform(Markdown::new(), Markdown::filter());
//! # }
//! ```

mod front_matter;
mod markdown;
#[cfg(feature = "sass")]
mod sass;

pub use front_matter::FrontMatter;
pub use markdown::Markdown;
#[cfg(feature = "sass")]
pub use sass::Sass;
