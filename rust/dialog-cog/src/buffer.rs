use std::{fmt::Display, ops::Sub, sync::Arc};

use crate::{DialogCogError, Key, Tuple, Value};

/// A position within a [`Buffer`].
///
/// A pair of [`BufferElement`]s bounds the half-open slice `[start, end)`
/// that a leaf cog covers. An element is only meaningful relative to the
/// [`Buffer`] that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferElement(usize);

impl BufferElement {
    /// The offset of this element from the beginning of its [`Buffer`].
    pub fn offset(&self) -> usize {
        self.0
    }

    /// The element `count` positions after this one.
    pub fn advance(&self, count: usize) -> Self {
        BufferElement(self.0 + count)
    }
}

impl Sub for BufferElement {
    type Output = usize;

    fn sub(self, rhs: Self) -> Self::Output {
        self.0 - rhs.0
    }
}

/// An immutable, reference-counted run of [`Tuple`]s.
///
/// Cloning a [`Buffer`] is cheap and never copies tuples. Leaves slice into a
/// shared buffer by [`BufferElement`] range, so any number of cogs across any
/// number of tree snapshots may refer to the same tuples. A new arrangement
/// of tuples (sorted, partitioned) is always a new [`Buffer`].
#[derive(Clone)]
pub struct Buffer<Key, Value>(Arc<[Tuple<Key, Value>]>);

impl<Key, Value> Buffer<Key, Value>
where
    Key: self::Key,
    Value: self::Value,
{
    /// Create a new [`Buffer`] that takes ownership of `tuples`.
    pub fn new(tuples: Vec<Tuple<Key, Value>>) -> Self {
        Buffer(tuples.into())
    }

    /// Build a [`Buffer`] from a fallible source of tuples.
    ///
    /// The first error from the source aborts construction, so no cog can
    /// ever reference a partially built buffer.
    pub fn try_collect<I, E>(source: I) -> Result<Self, DialogCogError>
    where
        I: IntoIterator<Item = Result<Tuple<Key, Value>, E>>,
        E: Display,
    {
        let tuples = source
            .into_iter()
            .collect::<Result<Vec<_>, E>>()
            .map_err(|error| DialogCogError::Buffer(format!("{error}")))?;

        Ok(Buffer::new(tuples))
    }

    /// The number of tuples held by this [`Buffer`].
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this [`Buffer`] holds no tuples.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The element at the start of this [`Buffer`].
    pub fn begin(&self) -> BufferElement {
        BufferElement(0)
    }

    /// The element one past the last tuple of this [`Buffer`].
    pub fn end(&self) -> BufferElement {
        BufferElement(self.0.len())
    }

    /// The tuple at `element`.
    ///
    /// Panics if `element` does not point at a tuple of this buffer.
    pub fn get(&self, element: BufferElement) -> &Tuple<Key, Value> {
        &self.0[element.0]
    }

    /// The tuples in `[start, end)`.
    pub fn slice(&self, start: BufferElement, end: BufferElement) -> &[Tuple<Key, Value>] {
        &self.0[start.0..end.0]
    }

    /// Whether `self` and `other` share the same underlying tuples.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Copy `[start, end)` into a new [`Buffer`], stably sorted by key.
    pub fn sorted(&self, start: BufferElement, end: BufferElement) -> Self {
        let mut tuples = self.slice(start, end).to_vec();
        tuples.sort_by(|left, right| left.key.cmp(&right.key));
        Buffer::new(tuples)
    }

    /// Copy `[start, end)` into two new [`Buffer`]s: tuples with a key below
    /// `pivot`, and tuples with a key at or above it.
    ///
    /// Uses a Hoare partition, so neither side preserves insertion order.
    pub fn partition(
        &self,
        start: BufferElement,
        end: BufferElement,
        pivot: &Key,
    ) -> (Self, Self) {
        let mut tuples = self.slice(start, end).to_vec();

        let mut low = 0;
        let mut high = tuples.len();

        loop {
            while low < high && tuples[low].key < *pivot {
                low += 1;
            }
            while low < high && tuples[high - 1].key >= *pivot {
                high -= 1;
            }
            if low >= high {
                break;
            }
            tuples.swap(low, high - 1);
            low += 1;
            high -= 1;
        }

        let upper = tuples.split_off(low);
        (Buffer::new(tuples), Buffer::new(upper))
    }
}

impl<Key, Value> From<Vec<Tuple<Key, Value>>> for Buffer<Key, Value>
where
    Key: self::Key,
    Value: self::Value,
{
    fn from(value: Vec<Tuple<Key, Value>>) -> Self {
        Buffer::new(value)
    }
}

impl<Key, Value> std::fmt::Debug for Buffer<Key, Value> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer").field("len", &self.0.len()).finish()
    }
}
