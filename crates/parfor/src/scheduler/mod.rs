mod group;
mod interface;
#[cfg(feature = "rayon")]
mod rayon_pool;
mod sequential;
#[cfg(feature = "threads")]
mod threads;

pub use group::*;
pub use interface::*;
#[cfg_attr(docsrs, doc(cfg(feature = "rayon")))]
#[cfg(feature = "rayon")]
pub use rayon_pool::*;
pub use sequential::*;
#[cfg_attr(docsrs, doc(cfg(feature = "threads")))]
#[cfg(feature = "threads")]
pub use threads::*;

/// The scheduler used by the free `for_each_*` functions and by
/// `Dispatcher::default()`.
///
/// Resolved at compile time to the most capable substrate that is enabled:
/// `rayon`, then `threads`, then [`Sequential`].
#[cfg(feature = "rayon")]
pub type DefaultScheduler = RayonScheduler;

/// The scheduler used by the free `for_each_*` functions and by
/// `Dispatcher::default()`.
///
/// Resolved at compile time to the most capable substrate that is enabled:
/// `rayon`, then `threads`, then [`Sequential`].
#[cfg(all(feature = "threads", not(feature = "rayon")))]
pub type DefaultScheduler = ThreadScheduler;

/// The scheduler used by the free `for_each_*` functions and by
/// `Dispatcher::default()`.
///
/// Resolved at compile time to the most capable substrate that is enabled:
/// `rayon`, then `threads`, then [`Sequential`].
#[cfg(not(any(feature = "threads", feature = "rayon")))]
pub type DefaultScheduler = Sequential;
