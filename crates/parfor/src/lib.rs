//! Blocking parallel `for` loops over index ranges.
//!
//! `parfor` splits an index interval into chunks, hands every chunk to a
//! [`Scheduler`] and blocks until the whole interval has been processed or
//! the dispatch was cancelled. The same call surface works against every
//! scheduling substrate compiled into the crate:
//!
//! - [`Sequential`]: always available, runs on the calling thread.
//! - [`ThreadScheduler`] (`threads`, default): scoped OS threads.
//! - [`RayonScheduler`] (`rayon`): a work-stealing [`rayon`] pool.
//!
//! [`DefaultScheduler`] picks the most capable substrate that was compiled
//! in, and the free functions ([`for_each_index`], [`for_each_range`], ...)
//! dispatch through it.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! let sum = AtomicU64::new(0);
//! parfor::for_each_range_with_step(0u64, 10_000, 64, |chunk| {
//!     let local: u64 = chunk.iter().sum();
//!     sum.fetch_add(local, Ordering::Relaxed);
//! })
//! .unwrap();
//!
//! assert_eq!(sum.into_inner(), (0..10_000).sum::<u64>());
//! ```
//!
//! [`rayon`]: https://docs.rs/rayon
#![cfg_attr(docsrs, feature(doc_cfg))]

mod dispatch;
mod error;
mod index;
mod parallelism;
mod partition;
mod range;
mod scheduler;

pub use crate::dispatch::*;
pub use crate::error::*;
pub use crate::index::*;
pub use crate::parallelism::*;
pub use crate::partition::*;
pub use crate::range::*;
pub use crate::scheduler::*;
