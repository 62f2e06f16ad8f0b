use tracing::debug;

use crate::{Cog, Key, RewritePolicy, Value};

/// Promotes every [`UnsortedLeaf`] a traversal visits into a [`SortedLeaf`].
///
/// [`UnsortedLeaf`]: crate::UnsortedLeaf
/// [`SortedLeaf`]: crate::SortedLeaf
#[derive(Clone, Copy, Debug, Default)]
pub struct PromotionPolicy;

impl PromotionPolicy {
    fn promote<Key, Value>(cog: &Cog<Key, Value>) -> Option<Cog<Key, Value>>
    where
        Key: self::Key,
        Value: self::Value,
    {
        match cog {
            Cog::UnsortedLeaf(leaf) => {
                debug!(size = leaf.size(), "Promoting unsorted leaf");
                Some(leaf.sorted_cog())
            }
            _ => None,
        }
    }
}

impl<Key, Value> RewritePolicy<Key, Value> for PromotionPolicy
where
    Key: self::Key,
    Value: self::Value,
{
    fn before_iterate(&self, cog: &Cog<Key, Value>) -> Option<Cog<Key, Value>> {
        Self::promote(cog)
    }

    fn before_seek(&self, cog: &Cog<Key, Value>, _key: &Key) -> Option<Cog<Key, Value>> {
        Self::promote(cog)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::PromotionPolicy;
    use crate::{CogHandle, CogType, Tuple};

    #[test_log::test]
    fn it_promotes_every_leaf_below_a_branch_on_seek() {
        let lhs = CogHandle::unsorted(vec![Tuple::new(3u32, ()), Tuple::new(1, ())]);
        let rhs = CogHandle::unsorted(vec![Tuple::new(8u32, ()), Tuple::new(5, ())]);
        let root = CogHandle::branch(lhs.clone(), 5, rhs.clone());

        assert_eq!(root.seek(&2, &PromotionPolicy).map(|tuple| tuple.key), Some(3));

        assert_eq!(lhs.cog_type(), CogType::SortedLeaf);
        assert_eq!(rhs.cog_type(), CogType::UnsortedLeaf);
        assert_eq!(root.cog_type(), CogType::Branch);

        assert_eq!(root.seek(&6, &PromotionPolicy).map(|tuple| tuple.key), Some(8));
        assert_eq!(rhs.cog_type(), CogType::SortedLeaf);
    }
}
