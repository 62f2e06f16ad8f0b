use crate::{
    Branch, Buffer, BufferElement, Cog, CogHandle, CogIterator, DialogCogError, Key, Tuple, Value,
};

/// A leaf over the slice `[start, end)` of a [`Buffer`], holding tuples in
/// non-decreasing key order so that it can be binary searched.
#[derive(Clone, Debug)]
pub struct SortedLeaf<Key, Value> {
    buffer: Buffer<Key, Value>,
    start: BufferElement,
    end: BufferElement,
}

impl<Key, Value> SortedLeaf<Key, Value>
where
    Key: self::Key,
    Value: self::Value,
{
    /// Create a new [`SortedLeaf`] over `[start, end)` of `buffer`, trusting
    /// the caller that the slice is sorted.
    ///
    /// Debug builds check the order and panic if it does not hold.
    pub fn new(buffer: Buffer<Key, Value>, start: BufferElement, end: BufferElement) -> Self {
        let leaf = SortedLeaf { buffer, start, end };
        if cfg!(debug_assertions) {
            if let Err(error) = leaf.check_order() {
                panic!("Sorted leaf constructed over unsorted tuples: {error}");
            }
        }
        leaf
    }

    /// Create a new [`SortedLeaf`], checking that the slice is sorted.
    pub fn try_new(
        buffer: Buffer<Key, Value>,
        start: BufferElement,
        end: BufferElement,
    ) -> Result<Self, DialogCogError> {
        let leaf = SortedLeaf { buffer, start, end };
        leaf.check_order()
            .map_err(|error| DialogCogError::InvalidConstruction(format!("{error}")))?;
        Ok(leaf)
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

    /// The tuples of this leaf, in key order.
    pub fn tuples(&self) -> &[Tuple<Key, Value>] {
        self.buffer.slice(self.start, self.end)
    }

    /// Enumerate the tuples of this leaf in key order.
    pub fn iterator(&self) -> CogIterator<Key, Value> {
        CogIterator::buffer(self.buffer.clone(), self.start, self.end)
    }

    /// The first element whose key is at or after `key`, or [`SortedLeaf::end`]
    /// if there is none.
    pub fn seek(&self, key: &Key) -> BufferElement {
        let offset = self.tuples().partition_point(|tuple| tuple.key < *key);
        self.start.advance(offset)
    }

    /// The tuple at [`SortedLeaf::seek`], if any.
    pub fn lookup(&self, key: &Key) -> Option<&Tuple<Key, Value>> {
        let element = self.seek(key);
        (element < self.end).then(|| self.buffer.get(element))
    }

    /// A [`Branch`] separated by `pivot` over two slices of this leaf's
    /// buffer. No tuples are copied.
    pub fn split_cog(&self, pivot: Key) -> Cog<Key, Value> {
        let middle = self.seek(&pivot);
        Cog::Branch(Branch::new(
            CogHandle::new(Cog::SortedLeaf(SortedLeaf::new(
                self.buffer.clone(),
                self.start,
                middle,
            ))),
            pivot,
            CogHandle::new(Cog::SortedLeaf(SortedLeaf::new(
                self.buffer.clone(),
                middle,
                self.end,
            ))),
        ))
    }

    /// Check that the slice is in non-decreasing key order.
    pub fn check_order(&self) -> Result<(), DialogCogError> {
        match self
            .tuples()
            .windows(2)
            .position(|pair| pair[0].key > pair[1].key)
        {
            Some(index) => {
                let tuples = self.tuples();
                Err(DialogCogError::InvariantViolation(format!(
                    "Sorted leaf key {:?} at offset {} is followed by smaller key {:?}",
                    tuples[index].key,
                    self.start.offset() + index,
                    tuples[index + 1].key
                )))
            }
            None => Ok(()),
        }
    }
}
