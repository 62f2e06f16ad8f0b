use std::{iter::FusedIterator, sync::Arc};

use crate::{Buffer, BufferElement, Cog, CogHandle, Key, SharedPolicy, Tuple, Value};

/// A forward-only, pull-based iterator over the tuples of a cog.
///
/// The snapshot of every handle reachable from the cog is loaded when the
/// iterator is built. Puts made afterwards, at any depth, are not observed;
/// only tuples are produced lazily. An exhausted iterator stays exhausted.
///
/// Traversal keeps an explicit stack of pinned handles, so arbitrarily
/// deep trees are walked without recursion.
pub struct CogIterator<Key, Value> {
    leaf: Option<Cursor<Key, Value>>,
    pending: Vec<Frame<Key, Value>>,
    policy: Option<SharedPolicy<Key, Value>>,
}

/// The unread remainder of a leaf
struct Cursor<Key, Value> {
    buffer: Buffer<Key, Value>,
    next: BufferElement,
    end: BufferElement,
}

/// A handle pinned to the snapshot it held when the iterator was built.
///
/// The frames of its descendants sit directly below it on the stack, so a
/// rewritten composite can discard them in one truncation.
struct Frame<Key, Value> {
    handle: CogHandle<Key, Value>,
    snapshot: Arc<Cog<Key, Value>>,
    descendants: usize,
}

enum Visit<Key, Value> {
    Enter(CogHandle<Key, Value>, Arc<Cog<Key, Value>>),
    Exit(usize),
}

impl<Key, Value> CogIterator<Key, Value>
where
    Key: self::Key,
    Value: self::Value,
{
    pub(crate) fn buffer(
        buffer: Buffer<Key, Value>,
        start: BufferElement,
        end: BufferElement,
    ) -> Self {
        CogIterator {
            leaf: Some(Cursor {
                buffer,
                next: start,
                end,
            }),
            pending: Vec::new(),
            policy: None,
        }
    }

    /// Enumerate the snapshot `handle` holds now, offering it (and every
    /// descendant) to `policy` as it is reached.
    pub(crate) fn handle(
        handle: &CogHandle<Key, Value>,
        policy: &SharedPolicy<Key, Value>,
    ) -> Self {
        let mut iterator = Self::empty(policy);
        iterator.push_pinned(handle);
        iterator
    }

    /// Enumerate `lhs`, then `rhs`.
    pub(crate) fn children(
        lhs: &CogHandle<Key, Value>,
        rhs: &CogHandle<Key, Value>,
        policy: &SharedPolicy<Key, Value>,
    ) -> Self {
        let mut iterator = Self::empty(policy);
        iterator.push_children(lhs, rhs);
        iterator
    }

    fn empty(policy: &SharedPolicy<Key, Value>) -> Self {
        CogIterator {
            leaf: None,
            pending: Vec::new(),
            policy: Some(policy.clone()),
        }
    }

    fn push_children(&mut self, lhs: &CogHandle<Key, Value>, rhs: &CogHandle<Key, Value>) {
        let lhs = pin(lhs);
        let rhs = pin(rhs);
        self.pending.extend(rhs.into_iter().rev());
        self.pending.extend(lhs.into_iter().rev());
    }

    fn push_pinned(&mut self, handle: &CogHandle<Key, Value>) {
        self.pending.extend(pin(handle).into_iter().rev());
    }

    /// Pop the next pinned handle, offer its snapshot to the policy and
    /// position the iterator on it. Returns `false` once nothing is left.
    fn advance(&mut self) -> bool {
        let Some(frame) = self.pending.pop() else {
            return false;
        };

        let snapshot = match &self.policy {
            Some(policy) => frame
                .handle
                .rewrite(frame.snapshot.clone(), |cog| policy.before_iterate(cog)),
            None => frame.snapshot.clone(),
        };

        if !Arc::ptr_eq(&snapshot, &frame.snapshot) {
            // The replacement has children of its own.
            let remaining = self.pending.len() - frame.descendants;
            self.pending.truncate(remaining);
            if let Some((lhs, rhs)) = snapshot.children() {
                self.push_children(lhs, rhs);
            }
        }

        self.leaf = match snapshot.as_ref() {
            Cog::UnsortedLeaf(leaf) => Some(Cursor {
                buffer: leaf.buffer().clone(),
                next: leaf.start(),
                end: leaf.end(),
            }),
            Cog::SortedLeaf(leaf) => Some(Cursor {
                buffer: leaf.buffer().clone(),
                next: leaf.start(),
                end: leaf.end(),
            }),
            Cog::Concatenation(_) | Cog::Branch(_) => None,
        };

        true
    }
}

/// Load the snapshot of `root` and of every handle reachable from it, in
/// enumeration (pre-)order.
fn pin<Key, Value>(root: &CogHandle<Key, Value>) -> Vec<Frame<Key, Value>>
where
    Key: self::Key,
    Value: self::Value,
{
    let mut frames = Vec::new();
    let mut visits = vec![Visit::Enter(root.clone(), root.get())];

    while let Some(visit) = visits.pop() {
        match visit {
            Visit::Enter(handle, snapshot) => {
                if let Some((lhs, rhs)) = snapshot.children() {
                    visits.push(Visit::Exit(frames.len()));
                    visits.push(Visit::Enter(rhs.clone(), rhs.get()));
                    visits.push(Visit::Enter(lhs.clone(), lhs.get()));
                }
                frames.push(Frame {
                    handle,
                    snapshot,
                    descendants: 0,
                });
            }
            Visit::Exit(index) => {
                frames[index].descendants = frames.len() - index - 1;
            }
        }
    }

    frames
}

impl<Key, Value> Iterator for CogIterator<Key, Value>
where
    Key: self::Key,
    Value: self::Value,
{
    type Item = Tuple<Key, Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(Cursor { buffer, next, end }) = &mut self.leaf {
                if *next < *end {
                    let tuple = buffer.get(*next).clone();
                    *next = next.advance(1);
                    return Some(tuple);
                }
                self.leaf = None;
            }

            if !self.advance() {
                return None;
            }
        }
    }
}

impl<Key, Value> FusedIterator for CogIterator<Key, Value>
where
    Key: self::Key,
    Value: self::Value,
{
}
