use crate::vtable::CopyOps;

mod private {
    pub trait Sealed {}
}

/// Selects the behavior of a [`FunctionBase`]: copyable ([`Copyable`]) or move-only ([`MoveOnly`]).
///
/// [`FunctionBase`]: crate::FunctionBase
pub trait Variant: private::Sealed + 'static {
    /// Whether functions of this variant implement `Clone`.
    const COPYABLE: bool;
}

/// The variant which may be copied with `Clone`.
/// Only admits `Clone` callables.
pub enum Copyable {}

/// The variant which may only be moved.
/// Admits any callable.
pub enum MoveOnly {}

impl private::Sealed for Copyable {}
impl private::Sealed for MoveOnly {}

impl Variant for Copyable {
    const COPYABLE: bool = true;
}

impl Variant for MoveOnly {
    const COPYABLE: bool = false;
}

/// Implemented by the variants which may store the callable type `F`.
pub trait Admits<F>: Variant {
    #[doc(hidden)]
    fn copy_ops() -> Option<CopyOps>;
}

impl<F: Clone> Admits<F> for Copyable {
    fn copy_ops() -> Option<CopyOps> {
        Some(CopyOps::of::<F>())
    }
}

impl<F> Admits<F> for MoveOnly {
    fn copy_ops() -> Option<CopyOps> {
        None
    }
}
