#![warn(missing_docs)]

//! This crate provides the core index structure of an embedded ordered
//! key-value engine: an immutable, structurally shared tree of
//! interchangeable node representations called "cogs".
//!
//! A [`Cog`] is one of four variants:
//!
//! - [`Concatenation`]: two children enumerated one after the other
//! - [`Branch`]: two children partitioned by a separator key
//! - [`UnsortedLeaf`]: a slice of a [`Buffer`] in insertion order
//! - [`SortedLeaf`]: a slice of a [`Buffer`] in key order
//!
//! Cogs are never mutated once constructed. Composite cogs reference their
//! children through [`CogHandle`]s, and a handle is the only mutable point in
//! the structure: [`CogHandle::put`] atomically installs a new snapshot while
//! readers that already loaded the previous snapshot keep seeing it intact.
//!
//! Traversals accept a [`RewritePolicy`], which may replace the nodes they
//! visit with equivalent but better organised ones (sorting a leaf, cracking
//! it around a pivot). The tree reorganises itself as a side effect of being
//! read:
//!
//! ```rust
//! use std::sync::Arc;
//! use dialog_cog::{CogHandle, CogType, CrackingPolicy, CrackingSettings, SharedPolicy, Tuple};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handle = CogHandle::unsorted(
//!     [5u32, 2, 8, 1]
//!         .into_iter()
//!         .map(|key| Tuple::new(key, format!("value-{key}")))
//!         .collect(),
//! );
//!
//! let policy: SharedPolicy<u32, String> = Arc::new(CrackingPolicy::new(CrackingSettings {
//!     crack_threshold: 2,
//!     sort_threshold: 2,
//! })?);
//!
//! // Seeking reorganises the oversized leaf...
//! let found = handle.seek(&3, policy.as_ref());
//! assert_eq!(found.map(|tuple| tuple.key), Some(5));
//! assert_ne!(handle.cog_type(), CogType::UnsortedLeaf);
//!
//! // ...without changing the tuples that the handle holds
//! assert_eq!(handle.size(), 4);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

mod error;
pub use error::*;

mod kv;
pub use kv::*;

mod tuple;
pub use tuple::*;

mod buffer;
pub use buffer::*;

mod cog;
pub use cog::*;

mod handle;
pub use handle::*;

mod iterator;
pub use iterator::*;

mod policy;
pub use policy::*;

mod settings;
pub use settings::*;
