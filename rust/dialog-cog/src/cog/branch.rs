use crate::{
    CogHandle, CogIterator, DialogCogError, Key, NoRewrite, RewritePolicy, SharedPolicy, Tuple,
    Value,
};

/// A composite whose children are partitioned by a separator key.
///
/// Every key reachable from `lhs` is below `sep`, and every key reachable
/// from `rhs` is at or above it (LHS < sep <= RHS). Enumeration order is
/// the same as a concatenation; `sep` is only consulted when seeking.
#[derive(Clone, Debug)]
pub struct Branch<Key, Value> {
    lhs: CogHandle<Key, Value>,
    sep: Key,
    rhs: CogHandle<Key, Value>,
}

impl<Key, Value> Branch<Key, Value>
where
    Key: self::Key,
    Value: self::Value,
{
    /// Create a new [`Branch`], trusting the caller to uphold the partition.
    ///
    /// Debug builds check the partition and panic if it does not hold.
    pub fn new(lhs: CogHandle<Key, Value>, sep: Key, rhs: CogHandle<Key, Value>) -> Self {
        let branch = Branch { lhs, sep, rhs };
        if cfg!(debug_assertions) {
            if let Err(error) = branch.check_partition() {
                panic!("Branch constructed over unpartitioned children: {error}");
            }
        }
        branch
    }

    /// Create a new [`Branch`], checking every reachable key against `sep`.
    pub fn try_new(
        lhs: CogHandle<Key, Value>,
        sep: Key,
        rhs: CogHandle<Key, Value>,
    ) -> Result<Self, DialogCogError> {
        let branch = Branch { lhs, sep, rhs };
        branch
            .check_partition()
            .map_err(|error| DialogCogError::InvalidConstruction(format!("{error}")))?;
        Ok(branch)
    }

    /// The handle of the child holding keys below the separator.
    pub fn lhs(&self) -> &CogHandle<Key, Value> {
        &self.lhs
    }

    /// The separator key.
    pub fn sep(&self) -> &Key {
        &self.sep
    }

    /// The handle of the child holding keys at or above the separator.
    pub fn rhs(&self) -> &CogHandle<Key, Value> {
        &self.rhs
    }

    /// The combined size of both children.
    pub fn size(&self) -> usize {
        self.lhs.size() + self.rhs.size()
    }

    /// Enumerate `lhs`, then `rhs`.
    pub fn iterator(&self, policy: &SharedPolicy<Key, Value>) -> CogIterator<Key, Value> {
        CogIterator::children(&self.lhs, &self.rhs, policy)
    }

    /// Descend towards `key`. When `key` falls left of the separator but no
    /// key in `lhs` reaches it, the answer is the first tuple of `rhs`.
    pub fn seek(
        &self,
        key: &Key,
        policy: &dyn RewritePolicy<Key, Value>,
    ) -> Option<Tuple<Key, Value>> {
        if *key < self.sep {
            self.lhs
                .seek(key, policy)
                .or_else(|| self.rhs.seek(key, policy))
        } else {
            self.rhs.seek(key, policy)
        }
    }

    /// Check that the current contents of both children respect `sep`.
    pub fn check_partition(&self) -> Result<(), DialogCogError> {
        let policy = NoRewrite::shared();

        if let Some(tuple) = self.lhs.iterator(&policy).find(|tuple| tuple.key >= self.sep) {
            return Err(DialogCogError::InvariantViolation(format!(
                "Key {:?} is not below branch separator {:?}",
                tuple.key, self.sep
            )));
        }

        if let Some(tuple) = self.rhs.iterator(&policy).find(|tuple| tuple.key < self.sep) {
            return Err(DialogCogError::InvariantViolation(format!(
                "Key {:?} is below branch separator {:?}",
                tuple.key, self.sep
            )));
        }

        Ok(())
    }
}
