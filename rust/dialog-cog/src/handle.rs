use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, trace};

use crate::{
    Cog, CogIterator, CogType, Concatenation, DialogCogError, Key, RewritePolicy, SharedPolicy,
    Tuple, Value,
};

/// A shared, atomically swappable reference to one [`Cog`] snapshot.
///
/// Handles are the edges of the tree: composite cogs hold handles to their
/// children, and cloning a handle yields another reference to the same cell.
/// Installing a new snapshot with [`CogHandle::put`] is a single pointer
/// swap. It is immediately visible through every clone of the handle (and
/// so to every ancestor that holds one), while readers that loaded the
/// previous snapshot continue to traverse it undisturbed.
#[derive(Clone)]
pub struct CogHandle<Key, Value>(Arc<ArcSwap<Cog<Key, Value>>>);

impl<Key, Value> CogHandle<Key, Value>
where
    Key: self::Key,
    Value: self::Value,
{
    /// Create a new [`CogHandle`] holding `cog`.
    pub fn new(cog: Cog<Key, Value>) -> Self {
        CogHandle(Arc::new(ArcSwap::from_pointee(cog)))
    }

    /// Create a new [`CogHandle`] holding an existing snapshot.
    pub fn from_snapshot(snapshot: Arc<Cog<Key, Value>>) -> Self {
        CogHandle(Arc::new(ArcSwap::new(snapshot)))
    }

    /// Create a new [`CogHandle`] holding an unsorted leaf over `tuples`.
    pub fn unsorted(tuples: Vec<Tuple<Key, Value>>) -> Self {
        Self::new(Cog::unsorted(tuples))
    }

    /// Create a new [`CogHandle`] holding a sorted leaf over presorted
    /// `tuples`.
    pub fn sorted(tuples: Vec<Tuple<Key, Value>>) -> Result<Self, DialogCogError> {
        Cog::sorted(tuples).map(Self::new)
    }

    /// Create a new [`CogHandle`] holding a concatenation of two handles.
    pub fn concatenation(lhs: CogHandle<Key, Value>, rhs: CogHandle<Key, Value>) -> Self {
        Self::new(Cog::concatenation(lhs, rhs))
    }

    /// Create a new [`CogHandle`] holding a branch of two handles.
    pub fn branch(lhs: CogHandle<Key, Value>, sep: Key, rhs: CogHandle<Key, Value>) -> Self {
        Self::new(Cog::branch(lhs, sep, rhs))
    }

    /// The snapshot held at the moment of the call.
    pub fn get(&self) -> Arc<Cog<Key, Value>> {
        self.0.load_full()
    }

    /// Atomically replace the held snapshot with `cog`.
    pub fn put(&self, cog: Cog<Key, Value>) {
        self.put_snapshot(Arc::new(cog));
    }

    /// Atomically replace the held snapshot with an existing one.
    pub fn put_snapshot(&self, snapshot: Arc<Cog<Key, Value>>) {
        self.0.store(snapshot);
    }

    /// Install `replacement` only if the handle still holds `expected`.
    /// Returns whether the install happened.
    pub fn compare_and_put(
        &self,
        expected: &Arc<Cog<Key, Value>>,
        replacement: Arc<Cog<Key, Value>>,
    ) -> bool {
        let previous = self.0.compare_and_swap(expected, replacement);
        Arc::ptr_eq(&*previous, expected)
    }

    /// Append a batch of tuples after everything the handle currently holds.
    ///
    /// The batch becomes a new unsorted leaf. Batches are gathered under
    /// [`Concatenation`]s shaped like a binary counter: a full subtree is
    /// only ever paired with another of the same height, so the depth of
    /// the structure grows with the logarithm of the number of batches.
    /// Only the unfilled right edge is rebuilt; full subtrees are shared.
    ///
    /// Retries against concurrent installs, so no concurrently appended
    /// batch is lost.
    pub fn append(&self, tuples: Vec<Tuple<Key, Value>>) {
        let batch = CogHandle::unsorted(tuples);
        self.0.rcu(|current| Self::push(current, &batch));
    }

    fn push(snapshot: &Arc<Cog<Key, Value>>, batch: &CogHandle<Key, Value>) -> Cog<Key, Value> {
        match snapshot.as_ref() {
            Cog::Concatenation(concatenation) if !is_full(snapshot) => {
                let rhs = concatenation.rhs().get();
                Cog::Concatenation(Concatenation::new(
                    concatenation.lhs().clone(),
                    CogHandle::new(Self::push(&rhs, batch)),
                ))
            }
            _ => Cog::Concatenation(Concatenation::new(
                CogHandle::from_snapshot(snapshot.clone()),
                batch.clone(),
            )),
        }
    }

    /// Whether `self` and `other` are the same cell.
    pub fn same_handle(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The size of the current snapshot.
    pub fn size(&self) -> usize {
        self.0.load().size()
    }

    /// The [`CogType`] of the current snapshot.
    pub fn cog_type(&self) -> CogType {
        self.0.load().cog_type()
    }

    /// A lazy iterator over the current snapshot and everything reachable
    /// from it. `policy` is offered each pinned snapshot, starting with this
    /// one, as the iterator reaches it.
    pub fn iterator(&self, policy: &SharedPolicy<Key, Value>) -> CogIterator<Key, Value> {
        CogIterator::handle(self, policy)
    }

    /// The first tuple at or after `key` in the current snapshot, after
    /// offering it to `policy` for rewriting.
    pub fn seek(
        &self,
        key: &Key,
        policy: &dyn RewritePolicy<Key, Value>,
    ) -> Option<Tuple<Key, Value>> {
        let snapshot = self.rewrite(self.get(), |cog| policy.before_seek(cog, key));
        snapshot.seek(key, policy)
    }

    /// Check the structural invariants of the current snapshot.
    pub fn verify(&self) -> Result<(), DialogCogError> {
        self.0.load().verify()
    }

    /// See [`Cog::debug_string`].
    pub fn debug_string(&self, depth: usize) -> String {
        self.0.load().debug_string(depth)
    }

    /// See [`Cog::print_debug`].
    pub fn print_debug(&self, depth: usize) {
        self.0.load().print_debug(depth)
    }

    /// Offer `snapshot` to `decide`. A replacement is installed if the
    /// handle has not moved on since `snapshot` was loaded, and is returned
    /// either way: it holds the same tuples as `snapshot`.
    pub(crate) fn rewrite<F>(
        &self,
        snapshot: Arc<Cog<Key, Value>>,
        decide: F,
    ) -> Arc<Cog<Key, Value>>
    where
        F: FnOnce(&Cog<Key, Value>) -> Option<Cog<Key, Value>>,
    {
        let Some(replacement) = decide(snapshot.as_ref()) else {
            return snapshot;
        };
        let replacement = Arc::new(replacement);

        if self.compare_and_put(&snapshot, replacement.clone()) {
            debug!(
                from = %snapshot.cog_type(),
                to = %replacement.cog_type(),
                size = replacement.size(),
                "Installed rewritten cog"
            );
        } else {
            trace!(
                from = %snapshot.cog_type(),
                to = %replacement.cog_type(),
                "Handle changed during rewrite; continuing on the rewritten snapshot"
            );
        }

        replacement
    }
}

/// Whether a concatenation is a complete subtree: its leftmost and
/// rightmost paths through nested [`Concatenation`]s are equally long.
fn is_full<Key, Value>(snapshot: &Arc<Cog<Key, Value>>) -> bool
where
    Key: self::Key,
    Value: self::Value,
{
    edge_height(snapshot, |concatenation| concatenation.lhs())
        == edge_height(snapshot, |concatenation| concatenation.rhs())
}

fn edge_height<Key, Value, F>(snapshot: &Arc<Cog<Key, Value>>, side: F) -> usize
where
    Key: self::Key,
    Value: self::Value,
    F: Fn(&Concatenation<Key, Value>) -> &CogHandle<Key, Value>,
{
    let mut height = 0;
    let mut current = snapshot.clone();
    while let Cog::Concatenation(concatenation) = current.as_ref() {
        let next = side(concatenation).get();
        height += 1;
        current = next;
    }
    height
}

impl<Key, Value> std::fmt::Debug for CogHandle<Key, Value>
where
    Key: std::fmt::Debug,
    Value: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CogHandle").field(&*self.0.load()).finish()
    }
}
