use rand::Rng;

use crate::{
    Branch, Buffer, BufferElement, Cog, CogHandle, CogIterator, Key, SortedLeaf, Tuple, Value,
};

/// A leaf over the slice `[start, end)` of a [`Buffer`], holding tuples in
/// the order they were written.
///
/// Writing an [`UnsortedLeaf`] costs nothing beyond building its buffer;
/// sorting is deferred until a rewrite policy decides that search over the
/// leaf has become worthwhile.
#[derive(Clone, Debug)]
pub struct UnsortedLeaf<Key, Value> {
    buffer: Buffer<Key, Value>,
    start: BufferElement,
    end: BufferElement,
}

impl<Key, Value> UnsortedLeaf<Key, Value>
where
    Key: self::Key,
    Value: self::Value,
{
    /// Create a new [`UnsortedLeaf`] over `[start, end)` of `buffer`.
    pub fn new(buffer: Buffer<Key, Value>, start: BufferElement, end: BufferElement) -> Self {
        UnsortedLeaf { buffer, start, end }
    }

    /// The [`Buffer`] this leaf slices.
    pub fn buffer(&self) -> &Buffer<Key, Value> {
        &self.buffer
    }

    /// The first element of this leaf's slice.
    pub fn start(&self) -> BufferElement {
        self.start
    }

    /// The element one past the end of this leaf's slice.
    pub fn end(&self) -> BufferElement {
        self.end
    }

    /// The number of tuples in this leaf.
    pub fn size(&self) -> usize {
        self.end - self.start
    }

    /// The tuples of this leaf, in insertion order.
    pub fn tuples(&self) -> &[Tuple<Key, Value>] {
        self.buffer.slice(self.start, self.end)
    }

    /// Enumerate the tuples of this leaf in insertion order.
    pub fn iterator(&self) -> CogIterator<Key, Value> {
        CogIterator::buffer(self.buffer.clone(), self.start, self.end)
    }

    /// The tuple with the smallest key at or after `key`, found by a full
    /// scan. Among equal keys the earliest written wins.
    pub fn lookup(&self, key: &Key) -> Option<&Tuple<Key, Value>> {
        self.tuples()
            .iter()
            .filter(|tuple| tuple.key >= *key)
            .min_by(|left, right| left.key.cmp(&right.key))
    }

    /// A new [`Buffer`] holding the tuples of this leaf sorted by key.
    pub fn sorted_buffer(&self) -> Buffer<Key, Value> {
        self.buffer.sorted(self.start, self.end)
    }

    /// Promote this leaf: a [`SortedLeaf`] over [`UnsortedLeaf::sorted_buffer`].
    pub fn sorted_cog(&self) -> Cog<Key, Value> {
        let buffer = self.sorted_buffer();
        let (start, end) = (buffer.begin(), buffer.end());
        Cog::SortedLeaf(SortedLeaf::new(buffer, start, end))
    }

    /// Partition the tuples of this leaf into two new [`Buffer`]s: keys below
    /// `pivot`, and keys at or above it. Either side may be empty.
    pub fn split(&self, pivot: &Key) -> (Buffer<Key, Value>, Buffer<Key, Value>) {
        self.buffer.partition(self.start, self.end, pivot)
    }

    /// A [`Branch`] separated by `pivot` over the two halves of
    /// [`UnsortedLeaf::split`].
    pub fn split_cog(&self, pivot: Key) -> Cog<Key, Value> {
        let (lower, upper) = self.split(&pivot);
        Self::partitioned(lower, pivot, upper)
    }

    pub(crate) fn partitioned(
        lower: Buffer<Key, Value>,
        pivot: Key,
        upper: Buffer<Key, Value>,
    ) -> Cog<Key, Value> {
        Cog::Branch(Branch::new(
            CogHandle::new(Cog::UnsortedLeaf(UnsortedLeaf::from(lower))),
            pivot,
            CogHandle::new(Cog::UnsortedLeaf(UnsortedLeaf::from(upper))),
        ))
    }

    /// A key sampled uniformly from this leaf, for choosing a split pivot
    /// without scanning.
    ///
    /// Panics if the leaf is empty.
    pub fn rand_key(&self) -> &Key {
        assert!(self.size() > 0, "Cannot sample a key from an empty leaf");
        let offset = rand::thread_rng().gen_range(0..self.size());
        &self.buffer.get(self.start.advance(offset)).key
    }
}

impl<Key, Value> From<Buffer<Key, Value>> for UnsortedLeaf<Key, Value>
where
    Key: self::Key,
    Value: self::Value,
{
    fn from(buffer: Buffer<Key, Value>) -> Self {
        let (start, end) = (buffer.begin(), buffer.end());
        UnsortedLeaf { buffer, start, end }
    }
}
