mod concatenation;
pub use concatenation::*;

mod branch;
pub use branch::*;

mod unsorted;
pub use unsorted::*;

mod sorted;
pub use sorted::*;

use std::fmt::Display;

use crate::{
    Buffer, CogHandle, CogIterator, DialogCogError, Key, RewritePolicy, SharedPolicy, Tuple,
    Value,
};

/// The kinds of node that may occur within a cog tree
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CogType {
    /// Two children enumerated in sequence
    Concatenation = 0,
    /// Two children partitioned by a separator key
    Branch = 1,
    /// A buffer slice in insertion order
    UnsortedLeaf = 2,
    /// A buffer slice in key order
    SortedLeaf = 3,
}

impl From<CogType> for u8 {
    fn from(value: CogType) -> Self {
        value as u8
    }
}

impl Display for CogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CogType::Concatenation => "Concatenation",
            CogType::Branch => "Branch",
            CogType::UnsortedLeaf => "UnsortedLeaf",
            CogType::SortedLeaf => "SortedLeaf",
        };
        f.write_str(name)
    }
}

/// A node of the cog tree.
///
/// A [`Cog`] is immutable once constructed. Composite variants reach their
/// children through [`CogHandle`]s, so a child may be replaced wholesale
/// without rebuilding its ancestors.
#[derive(Clone, Debug)]
pub enum Cog<Key, Value> {
    /// See [`Concatenation`]
    Concatenation(Concatenation<Key, Value>),
    /// See [`Branch`]
    Branch(Branch<Key, Value>),
    /// See [`UnsortedLeaf`]
    UnsortedLeaf(UnsortedLeaf<Key, Value>),
    /// See [`SortedLeaf`]
    SortedLeaf(SortedLeaf<Key, Value>),
}

impl<Key, Value> Cog<Key, Value>
where
    Key: self::Key,
    Value: self::Value,
{
    /// Create an [`UnsortedLeaf`] over a new buffer holding `tuples`.
    pub fn unsorted(tuples: Vec<Tuple<Key, Value>>) -> Self {
        Cog::UnsortedLeaf(UnsortedLeaf::from(Buffer::new(tuples)))
    }

    /// Create a [`SortedLeaf`] over a new buffer holding `tuples`.
    ///
    /// The result is an error if `tuples` are not in non-decreasing key
    /// order.
    pub fn sorted(tuples: Vec<Tuple<Key, Value>>) -> Result<Self, DialogCogError> {
        let buffer = Buffer::new(tuples);
        let (start, end) = (buffer.begin(), buffer.end());
        SortedLeaf::try_new(buffer, start, end).map(Cog::SortedLeaf)
    }

    /// Create a [`Concatenation`] of two children.
    pub fn concatenation(lhs: CogHandle<Key, Value>, rhs: CogHandle<Key, Value>) -> Self {
        Cog::Concatenation(Concatenation::new(lhs, rhs))
    }

    /// Create a [`Branch`] of two children around `sep`, trusting the caller
    /// to uphold the partition.
    pub fn branch(
        lhs: CogHandle<Key, Value>,
        sep: Key,
        rhs: CogHandle<Key, Value>,
    ) -> Self {
        Cog::Branch(Branch::new(lhs, sep, rhs))
    }

    /// The [`CogType`] of this node.
    pub fn cog_type(&self) -> CogType {
        match self {
            Cog::Concatenation(_) => CogType::Concatenation,
            Cog::Branch(_) => CogType::Branch,
            Cog::UnsortedLeaf(_) => CogType::UnsortedLeaf,
            Cog::SortedLeaf(_) => CogType::SortedLeaf,
        }
    }

    /// The child handles of a composite node, in enumeration order.
    pub(crate) fn children(&self) -> Option<(&CogHandle<Key, Value>, &CogHandle<Key, Value>)> {
        match self {
            Cog::Concatenation(concatenation) => Some((concatenation.lhs(), concatenation.rhs())),
            Cog::Branch(branch) => Some((branch.lhs(), branch.rhs())),
            Cog::UnsortedLeaf(_) | Cog::SortedLeaf(_) => None,
        }
    }

    /// The number of tuples reachable from this node.
    ///
    /// Composite sizes are recomputed from the current contents of their
    /// child handles on every call, walking the tree without recursion.
    pub fn size(&self) -> usize {
        let Some((lhs, rhs)) = self.children() else {
            return self.leaf_size();
        };

        let mut size = 0;
        let mut pending = vec![lhs.get(), rhs.get()];
        while let Some(cog) = pending.pop() {
            match cog.children() {
                Some((lhs, rhs)) => {
                    pending.push(lhs.get());
                    pending.push(rhs.get());
                }
                None => size += cog.leaf_size(),
            }
        }
        size
    }

    fn leaf_size(&self) -> usize {
        match self {
            Cog::UnsortedLeaf(leaf) => leaf.size(),
            Cog::SortedLeaf(leaf) => leaf.size(),
            Cog::Concatenation(_) | Cog::Branch(_) => 0,
        }
    }

    /// A lazy iterator over the tuples of this node in its logical order.
    ///
    /// Every handle below this node is pinned now, and `policy` is offered
    /// each pinned snapshot as the iterator reaches it; this node itself has
    /// already been chosen.
    pub fn iterator(&self, policy: &SharedPolicy<Key, Value>) -> CogIterator<Key, Value> {
        match self {
            Cog::Concatenation(concatenation) => concatenation.iterator(policy),
            Cog::Branch(branch) => branch.iterator(policy),
            Cog::UnsortedLeaf(leaf) => leaf.iterator(),
            Cog::SortedLeaf(leaf) => leaf.iterator(),
        }
    }

    /// The first tuple (by key) at or after `key`, or `None` if every tuple
    /// in this node is below `key`.
    ///
    /// Panics on a [`Concatenation`]: its children carry no key relationship,
    /// so it cannot take part in keyed search. A [`RewritePolicy`] may
    /// flatten it before it is reached.
    pub fn seek(
        &self,
        key: &Key,
        policy: &dyn RewritePolicy<Key, Value>,
    ) -> Option<Tuple<Key, Value>> {
        match self {
            Cog::Concatenation(_) => panic!("Seek is not supported by a concatenation cog"),
            Cog::Branch(branch) => branch.seek(key, policy),
            Cog::UnsortedLeaf(leaf) => leaf.lookup(key).cloned(),
            Cog::SortedLeaf(leaf) => leaf.lookup(key).cloned(),
        }
    }

    /// Recursively check the structural invariants of this node: branch
    /// partitions and sorted leaf ordering.
    pub fn verify(&self) -> Result<(), DialogCogError> {
        match self {
            Cog::Concatenation(concatenation) => {
                concatenation.lhs().verify()?;
                concatenation.rhs().verify()
            }
            Cog::Branch(branch) => {
                branch.lhs().verify()?;
                branch.rhs().verify()?;
                branch.check_partition()
            }
            Cog::UnsortedLeaf(_) => Ok(()),
            Cog::SortedLeaf(leaf) => leaf.check_order(),
        }
    }

    /// Render the shape of this subtree, one node per line, indented two
    /// spaces per level starting at `depth`.
    pub fn debug_string(&self, depth: usize) -> String {
        let mut output = String::new();
        self.write_debug(depth, &mut output);
        output
    }

    /// Print [`Cog::debug_string`] to stdout.
    pub fn print_debug(&self, depth: usize) {
        print!("{}", self.debug_string(depth));
    }

    fn write_debug(&self, depth: usize, output: &mut String) {
        output.push_str(&"  ".repeat(depth));

        match self {
            Cog::Concatenation(concatenation) => {
                output.push_str(&format!("Concatenation[{} elements]\n", self.size()));
                concatenation.lhs().get().write_debug(depth + 1, output);
                concatenation.rhs().get().write_debug(depth + 1, output);
            }
            Cog::Branch(branch) => {
                output.push_str(&format!(
                    "Branch[sep = {:?}, {} elements]\n",
                    branch.sep(),
                    self.size()
                ));
                branch.lhs().get().write_debug(depth + 1, output);
                branch.rhs().get().write_debug(depth + 1, output);
            }
            Cog::UnsortedLeaf(leaf) => {
                output.push_str(&format!("UnsortedLeaf[{} elements]\n", leaf.size()));
            }
            Cog::SortedLeaf(leaf) => {
                output.push_str(&format!("SortedLeaf[{} elements]\n", leaf.size()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{Cog, CogType};
    use crate::{CogHandle, DialogCogError, NoRewrite, Tuple};

    fn tuples(keys: &[u32]) -> Vec<Tuple<u32, u32>> {
        keys.iter().map(|key| Tuple::new(*key, key * 10)).collect()
    }

    #[test]
    fn it_sums_child_sizes() {
        let concatenation = Cog::concatenation(
            CogHandle::unsorted(tuples(&[3, 1])),
            CogHandle::unsorted(tuples(&[9, 4, 7])),
        );

        assert_eq!(concatenation.size(), 5);
        assert_eq!(concatenation.cog_type(), CogType::Concatenation);
    }

    #[test]
    fn it_rejects_an_unsorted_batch_for_a_sorted_leaf() {
        let result = Cog::sorted(tuples(&[1, 5, 3]));

        assert!(matches!(result, Err(DialogCogError::InvalidConstruction(_))));
    }

    #[test]
    fn it_renders_the_shape_of_a_tree() {
        let tree = Cog::concatenation(
            CogHandle::new(Cog::branch(
                CogHandle::unsorted(tuples(&[2, 1])),
                5,
                CogHandle::sorted(tuples(&[5, 8])).unwrap(),
            )),
            CogHandle::unsorted(tuples(&[11])),
        );

        assert_eq!(
            tree.debug_string(0),
            "Concatenation[5 elements]\n  Branch[sep = 5, 4 elements]\n    UnsortedLeaf[2 elements]\n    SortedLeaf[2 elements]\n  UnsortedLeaf[1 elements]\n"
        );
    }

    #[test]
    fn it_verifies_a_well_formed_tree() {
        let tree = Cog::branch(
            CogHandle::unsorted(tuples(&[4, 1, 3])),
            4,
            CogHandle::sorted(tuples(&[4, 4, 9])).unwrap(),
        );

        assert!(tree.verify().is_ok());
    }

    #[test]
    fn it_reports_a_key_on_the_wrong_side_of_a_branch() {
        let lhs = CogHandle::unsorted(tuples(&[1, 4]));
        let tree = Cog::branch(lhs.clone(), 5, CogHandle::unsorted(tuples(&[7])));

        lhs.put(Cog::unsorted(tuples(&[1, 6])));

        assert!(matches!(
            tree.verify(),
            Err(DialogCogError::InvariantViolation(_))
        ));
    }

    #[test]
    fn it_reports_a_violation_nested_below_a_concatenation() {
        let rhs = CogHandle::unsorted(tuples(&[6]));
        let tree = Cog::concatenation(
            CogHandle::unsorted(tuples(&[1])),
            CogHandle::new(Cog::branch(CogHandle::unsorted(tuples(&[1])), 5, rhs.clone())),
        );

        rhs.put(Cog::unsorted(tuples(&[2])));

        assert!(tree.verify().is_err());
    }

    #[test]
    fn it_seeks_across_the_separator_of_a_branch() {
        let tree = Cog::branch(
            CogHandle::sorted(tuples(&[1, 2])).unwrap(),
            5,
            CogHandle::sorted(tuples(&[5, 8])).unwrap(),
        );

        assert_eq!(tree.seek(&2, &NoRewrite).map(|tuple| tuple.key), Some(2));
        assert_eq!(tree.seek(&3, &NoRewrite).map(|tuple| tuple.key), Some(5));
        assert_eq!(tree.seek(&6, &NoRewrite).map(|tuple| tuple.key), Some(8));
        assert_eq!(tree.seek(&9, &NoRewrite), None);
    }

    #[test]
    fn it_seeks_an_unsorted_leaf_by_scanning() {
        let leaf = Cog::unsorted(tuples(&[9, 4, 6, 4]));

        assert_eq!(leaf.seek(&5, &NoRewrite), Some(Tuple::new(6, 60)));
        assert_eq!(leaf.seek(&0, &NoRewrite), Some(Tuple::new(4, 40)));
        assert_eq!(leaf.seek(&10, &NoRewrite), None);
    }

    #[test]
    #[should_panic(expected = "concatenation")]
    fn it_refuses_to_seek_a_concatenation() {
        let tree = Cog::concatenation(
            CogHandle::unsorted(tuples(&[1])),
            CogHandle::unsorted(tuples(&[2])),
        );

        tree.seek(&1, &NoRewrite);
    }

    #[test]
    fn it_converts_cog_types_to_tags() {
        assert_eq!(u8::from(CogType::Concatenation), 0);
        assert_eq!(u8::from(CogType::SortedLeaf), 3);
        assert_eq!(CogType::UnsortedLeaf.to_string(), "UnsortedLeaf");
    }
}
