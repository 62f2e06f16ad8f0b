use std::fmt::Debug;

/// A key used to order [`Tuple`]s within a [`Cog`].
///
/// Keys are totally ordered. Equal keys are permitted; uniqueness, where it
/// matters, is enforced by whatever builds the tree.
///
/// [`Tuple`]: crate::Tuple
/// [`Cog`]: crate::Cog
pub trait Key: Clone + Debug + Ord + Send + Sync + 'static {}

impl<T> Key for T where T: Clone + Debug + Ord + Send + Sync + 'static {}

/// An opaque payload stored alongside a [`Key`]
pub trait Value: Clone + Debug + Send + Sync + 'static {}

impl<T> Value for T where T: Clone + Debug + Send + Sync + 'static {}
