use crate::{Key, Value};

/// A key/payload pair stored in a [`Buffer`].
///
/// [`Buffer`]: crate::Buffer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tuple<Key, Value> {
    /// The key that orders this tuple.
    pub key: Key,
    /// The payload carried by this tuple.
    pub value: Value,
}

impl<Key, Value> Tuple<Key, Value>
where
    Key: self::Key,
    Value: self::Value,
{
    /// Create a new [`Tuple`].
    pub fn new(key: Key, value: Value) -> Self {
        Tuple { key, value }
    }
}

impl<Key, Value> From<(Key, Value)> for Tuple<Key, Value>
where
    Key: self::Key,
    Value: self::Value,
{
    fn from((key, value): (Key, Value)) -> Self {
        Tuple { key, value }
    }
}
