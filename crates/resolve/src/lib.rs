//! Thumbnail resolution.
//!
//! Turns a `(hash, size class, crop area?)` request into the file to stream
//! back: an artifact from the request cache or the thumbnail store, a fresh
//! render, the original file, or a placeholder image.
//!
//! # Flow
//! 1. The [`SizeRegistry`] validates the size class. Uncached classes are
//!    redirected to a precomputed one unless rendering them is allowed.
//! 2. The [`RequestCache`] is consulted, then the thumbnail store.
//! 3. The [`Index`](thumbs_index::Index) resolves the source file, falling
//!    back to a renderable sibling. Missing sources are flagged in the
//!    background.
//! 4. Oversized requests get the original; everything else is rendered.
//!
//! Failures never escape [`Resolver`]; they select a [`Placeholder`].

mod cache;
mod dispatch;
pub mod error;
mod fallback;
mod key;
mod resolver;
mod response;
mod sizes;
#[cfg(test)]
mod test_support;

pub use crate::cache::{CacheEntry, RequestCache};
pub use crate::key::{NAMESPACE, cache_key};
pub use crate::resolver::{CropRequest, Policy, Resolver, ThumbRequest};
pub use crate::response::{Delivery, Outcome, Placeholder, Resolution};
pub use crate::sizes::{SizeClass, SizeRegistry};
