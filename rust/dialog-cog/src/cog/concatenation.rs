use crate::{Buffer, CogHandle, CogIterator, Key, NoRewrite, SharedPolicy, UnsortedLeaf, Value};

/// A composite whose logical sequence is the sequence of `lhs` followed by
/// the sequence of `rhs`.
///
/// No key relationship between the two sides is assumed, which is why a
/// [`Concatenation`] does not support seeking.
#[derive(Clone, Debug)]
pub struct Concatenation<Key, Value> {
    lhs: CogHandle<Key, Value>,
    rhs: CogHandle<Key, Value>,
}

impl<Key, Value> Concatenation<Key, Value>
where
    Key: self::Key,
    Value: self::Value,
{
    /// Create a new [`Concatenation`].
    pub fn new(lhs: CogHandle<Key, Value>, rhs: CogHandle<Key, Value>) -> Self {
        Concatenation { lhs, rhs }
    }

    /// The handle of the leading child.
    pub fn lhs(&self) -> &CogHandle<Key, Value> {
        &self.lhs
    }

    /// The handle of the trailing child.
    pub fn rhs(&self) -> &CogHandle<Key, Value> {
        &self.rhs
    }

    /// The combined size of both children.
    pub fn size(&self) -> usize {
        self.lhs.size() + self.rhs.size()
    }

    /// Enumerate `lhs`, then `rhs`. Both sides are pinned now; their tuples
    /// are produced on demand.
    pub fn iterator(&self, policy: &SharedPolicy<Key, Value>) -> CogIterator<Key, Value> {
        CogIterator::children(&self.lhs, &self.rhs, policy)
    }

    /// Copy every tuple reachable from this node, in concatenation order,
    /// into a single [`UnsortedLeaf`] over a new [`Buffer`].
    pub fn flatten(&self) -> UnsortedLeaf<Key, Value> {
        let tuples = self.iterator(&NoRewrite::shared()).collect::<Vec<_>>();
        UnsortedLeaf::from(Buffer::new(tuples))
    }
}

#[cfg(test)]
mod tests {
    use super::Concatenation;
    use crate::{CogHandle, Tuple};

    #[test]
    fn it_flattens_in_concatenation_order() {
        let concatenation = Concatenation::new(
            CogHandle::unsorted(vec![Tuple::new(4u32, ()), Tuple::new(1, ())]),
            CogHandle::new(crate::Cog::concatenation(
                CogHandle::unsorted(vec![Tuple::new(9, ())]),
                CogHandle::unsorted(vec![]),
            )),
        );

        let leaf = concatenation.flatten();
        let keys = leaf.tuples().iter().map(|tuple| tuple.key).collect::<Vec<_>>();

        assert_eq!(keys, vec![4, 1, 9]);
        assert_eq!(leaf.size(), concatenation.size());
    }
}
