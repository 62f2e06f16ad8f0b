mod promote;
pub use promote::*;

mod crack;
pub use crack::*;

use std::sync::Arc;

use crate::{Cog, Key, Value};

/// A decision hook consulted at every handle a traversal passes through.
///
/// Before a snapshot is enumerated or searched, the policy may return a
/// replacement [`Cog`]. The traversal installs the replacement into the
/// owning [`CogHandle`] (unless the handle has moved on in the meantime)
/// and continues on it.
///
/// A replacement must hold exactly the same multiset of tuples as the node
/// it replaces, and any branch it introduces must uphold its separator.
/// Policies change representation, never data.
///
/// [`CogHandle`]: crate::CogHandle
pub trait RewritePolicy<Key, Value>: Send + Sync
where
    Key: self::Key,
    Value: self::Value,
{
    /// Offered each snapshot before it is enumerated.
    fn before_iterate(&self, _cog: &Cog<Key, Value>) -> Option<Cog<Key, Value>> {
        None
    }

    /// Offered each snapshot before it is searched for `key`.
    fn before_seek(&self, _cog: &Cog<Key, Value>, _key: &Key) -> Option<Cog<Key, Value>> {
        None
    }
}

/// A [`RewritePolicy`] that can be retained by lazy iterators
pub type SharedPolicy<Key, Value> = Arc<dyn RewritePolicy<Key, Value>>;

/// A [`RewritePolicy`] that never rewrites, for pure read-only traversal
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRewrite;

impl NoRewrite {
    /// A [`SharedPolicy`] wrapping [`NoRewrite`].
    pub fn shared<Key, Value>() -> SharedPolicy<Key, Value>
    where
        Key: self::Key,
        Value: self::Value,
    {
        Arc::new(NoRewrite)
    }
}

impl<Key, Value> RewritePolicy<Key, Value> for NoRewrite
where
    Key: self::Key,
    Value: self::Value,
{
}
