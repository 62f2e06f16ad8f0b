use std::sync::Arc;

use tracing::debug;

use crate::{
    Cog, CogHandle, CogType, Concatenation, CrackingSettings, DialogCogError, Key, NoRewrite,
    RewritePolicy, Tuple, UnsortedLeaf, Value,
};

/// Adaptive indexing driven by seeks.
///
/// Each seek reorganises the unsorted data it has to search through:
///
/// - a [`Concatenation`] left behind by appends is merged: when its leading
///   part is already organised the appended tuples are routed down its
///   separators, otherwise everything is flattened into a single leaf
/// - an [`UnsortedLeaf`] larger than `crack_threshold` is cracked into a
///   [`Branch`] around a randomly sampled pivot
/// - an [`UnsortedLeaf`] of at most `sort_threshold` tuples is promoted to a
///   [`SortedLeaf`]
///
/// Because the seek then descends into the children it just created, a
/// single seek keeps cracking until it reaches a leaf small enough to sort.
/// Enumeration is left untouched.
///
/// [`Branch`]: crate::Branch
/// [`SortedLeaf`]: crate::SortedLeaf
#[derive(Clone, Debug, Default)]
pub struct CrackingPolicy {
    settings: CrackingSettings,
}

impl CrackingPolicy {
    /// Create a new [`CrackingPolicy`], validating `settings`.
    pub fn new(settings: CrackingSettings) -> Result<Self, DialogCogError> {
        settings.validate()?;
        Ok(CrackingPolicy { settings })
    }

    /// The settings this policy was created with.
    pub fn settings(&self) -> &CrackingSettings {
        &self.settings
    }

    fn reorganise<Key, Value>(&self, leaf: &UnsortedLeaf<Key, Value>) -> Option<Cog<Key, Value>>
    where
        Key: self::Key,
        Value: self::Value,
    {
        let size = leaf.size();

        if size > self.settings.crack_threshold {
            let pivot = leaf.rand_key().clone();
            let (lower, upper) = leaf.split(&pivot);

            // The pivot always lands in `upper`; it only fails to divide the
            // leaf when it is the smallest key.
            if lower.is_empty() {
                debug!(size, ?pivot, "Pivot did not divide leaf; promoting instead");
                return Some(leaf.sorted_cog());
            }

            debug!(
                ?pivot,
                lower = lower.len(),
                upper = upper.len(),
                "Cracked unsorted leaf"
            );
            Some(UnsortedLeaf::partitioned(lower, pivot, upper))
        } else if size <= self.settings.sort_threshold {
            debug!(size, "Promoting unsorted leaf");
            Some(leaf.sorted_cog())
        } else {
            None
        }
    }
}

impl<Key, Value> RewritePolicy<Key, Value> for CrackingPolicy
where
    Key: self::Key,
    Value: self::Value,
{
    fn before_seek(&self, cog: &Cog<Key, Value>, _key: &Key) -> Option<Cog<Key, Value>> {
        match cog {
            Cog::Concatenation(concatenation) => Some(self.merge(concatenation)),
            Cog::UnsortedLeaf(leaf) => self.reorganise(leaf),
            Cog::Branch(_) | Cog::SortedLeaf(_) => None,
        }
    }
}

impl CrackingPolicy {
    /// Make a concatenation searchable.
    ///
    /// When its leading part is already organised (typically a tree that was
    /// cracked before more batches were appended to it), the trailing tuples
    /// are routed down its separators and only the leaves they land in are
    /// disturbed. Otherwise everything is flattened into one leaf.
    fn merge<Key, Value>(&self, concatenation: &Concatenation<Key, Value>) -> Cog<Key, Value>
    where
        Key: self::Key,
        Value: self::Value,
    {
        let mut parts = sequence(concatenation).into_iter();

        if let Some(first) = parts.next() {
            if matches!(first.cog_type(), CogType::Branch | CogType::SortedLeaf) {
                let policy = NoRewrite::shared();
                let trailing = parts
                    .flat_map(|part| part.iterator(&policy))
                    .collect::<Vec<_>>();

                debug!(
                    organised = first.size(),
                    appended = trailing.len(),
                    "Merged appended tuples into organised cog"
                );
                return self.settle(absorb(&first, trailing));
            }
        }

        let leaf = concatenation.flatten();
        debug!(size = leaf.size(), "Flattened concatenation");
        self.settle(Cog::UnsortedLeaf(leaf))
    }

    fn settle<Key, Value>(&self, cog: Cog<Key, Value>) -> Cog<Key, Value>
    where
        Key: self::Key,
        Value: self::Value,
    {
        match cog {
            Cog::UnsortedLeaf(leaf) => self
                .reorganise(&leaf)
                .unwrap_or_else(|| Cog::UnsortedLeaf(leaf)),
            other => other,
        }
    }
}

/// The maximal parts of a concatenation that are not themselves
/// concatenations, in enumeration order.
fn sequence<Key, Value>(concatenation: &Concatenation<Key, Value>) -> Vec<Arc<Cog<Key, Value>>>
where
    Key: self::Key,
    Value: self::Value,
{
    let mut parts = Vec::new();
    let mut pending = vec![concatenation.rhs().get(), concatenation.lhs().get()];

    while let Some(cog) = pending.pop() {
        match cog.as_ref() {
            Cog::Concatenation(nested) => {
                pending.push(nested.rhs().get());
                pending.push(nested.lhs().get());
            }
            _ => parts.push(cog),
        }
    }

    parts
}

/// Distribute `tuples` into `cog` along its branch separators. Children that
/// receive nothing keep their handles; leaves that receive tuples become
/// unsorted again.
fn absorb<Key, Value>(cog: &Cog<Key, Value>, tuples: Vec<Tuple<Key, Value>>) -> Cog<Key, Value>
where
    Key: self::Key,
    Value: self::Value,
{
    match cog {
        Cog::Branch(branch) => {
            let (lower, upper): (Vec<_>, Vec<_>) = tuples
                .into_iter()
                .partition(|tuple| tuple.key < *branch.sep());
            Cog::branch(
                absorb_into(branch.lhs(), lower),
                branch.sep().clone(),
                absorb_into(branch.rhs(), upper),
            )
        }
        _ => {
            let mut merged = cog.iterator(&NoRewrite::shared()).collect::<Vec<_>>();
            merged.extend(tuples);
            Cog::unsorted(merged)
        }
    }
}

fn absorb_into<Key, Value>(
    handle: &CogHandle<Key, Value>,
    tuples: Vec<Tuple<Key, Value>>,
) -> CogHandle<Key, Value>
where
    Key: self::Key,
    Value: self::Value,
{
    if tuples.is_empty() {
        handle.clone()
    } else {
        CogHandle::new(absorb(&handle.get(), tuples))
    }
}
