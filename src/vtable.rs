use {
    crate::{
        signature::{Callable, Signature},
        registry,
        storage::{Placement, Policy, Slot},
        variant::{Admits, MoveOnly},
    },
    std::any::{self, TypeId},
};

/// Calls the callable at the type-erased pointer with the packed arguments.
pub(crate) type InvokeFn<S> =
    unsafe fn(*mut u8, <S as Signature>::Args) -> <S as Signature>::Output;

/// Copies the callable from the first slot into the second.
pub(crate) type CopyFn = unsafe fn(&Slot, &mut Slot);

/// Moves the callable from the first slot into the second.
pub(crate) type MoveFn = unsafe fn(&mut Slot, &mut Slot);

/// Drops the callable in the slot.
pub(crate) type DestroyFn = unsafe fn(&mut Slot);

/// Copy operations, only present in the tables of copyable functions.
pub struct CopyOps {
    /// Destination slot is vacant.
    pub(crate) construct: CopyFn,
    /// Destination slot holds a value of the same concrete type.
    pub(crate) assign: CopyFn,
}

impl CopyOps {
    pub(crate) fn of<F: Clone>() -> Self {
        CopyOps {
            construct: copy_construct::<F>,
            assign: copy_assign::<F>,
        }
    }
}

/// Operation table for a concrete callable type,
/// which knows
/// 1) how to call the callable with the arguments of `S`;
/// 2) how to copy it, if the function is copyable;
/// 3) how to move it;
/// 4) how to drop it;
/// 5) its type identity and where it is stored.
/// Built once per concrete type by the registry; a static reference to it is stored in the function.
pub struct OpTable<S: Signature> {
    pub(crate) invoke: InvokeFn<S>,
    pub(crate) copy: Option<CopyOps>,
    pub(crate) move_construct: MoveFn,
    /// Destination slot holds a value of the same concrete type.
    pub(crate) move_assign: MoveFn,
    pub(crate) destroy: DestroyFn,
    pub(crate) identify: fn() -> TypeId,
    pub(crate) type_name: fn() -> &'static str,
    pub(crate) placement: Placement,
    /// Table of the same callable type in the move-only variant.
    pub(crate) move_only: fn() -> &'static OpTable<S>,
}

impl<S: Signature> OpTable<S> {
    pub(crate) fn of<F, V>() -> Self
    where
        F: Callable<S> + 'static,
        V: Admits<F>,
    {
        OpTable {
            invoke: invoke::<F, S>,
            copy: V::copy_ops(),
            move_construct: Slot::relocate::<F>,
            move_assign: move_assign::<F>,
            destroy: Slot::drop_value::<F>,
            identify: TypeId::of::<F>,
            type_name: any::type_name::<F>,
            placement: Policy::<F>::PLACEMENT,
            move_only: registry::table::<F, S, MoveOnly>,
        }
    }

    pub(crate) fn copy_ops(&self) -> &CopyOps {
        match &self.copy {
            Some(copy) => copy,
            None => unreachable!("copy requested from a move-only operation table"),
        }
    }
}

unsafe fn invoke<F, S>(value: *mut u8, args: S::Args) -> S::Output
where
    F: Callable<S>,
    S: Signature,
{
    let f = unsafe { &mut *value.cast::<F>() };
    f.call_with(args)
}

unsafe fn copy_construct<F: Clone>(src: &Slot, dst: &mut Slot) {
    // Clone first: a panicking `clone` leaves `dst` untouched.
    let copy = unsafe { (*src.get::<F>()).clone() };
    unsafe { dst.put(copy) };
}

unsafe fn copy_assign<F: Clone>(src: &Slot, dst: &mut Slot) {
    unsafe { (*dst.get_mut::<F>()).clone_from(&*src.get::<F>()) };
}

unsafe fn move_assign<F>(src: &mut Slot, dst: &mut Slot) {
    match Policy::<F>::PLACEMENT {
        Placement::Inline => unsafe {
            dst.drop_value::<F>();
            Slot::relocate::<F>(src, dst);
        },
        // Reuse the destination block.
        Placement::Heap => unsafe {
            let value = src.get::<F>().read();
            src.release::<F>();
            *dst.get_mut::<F>() = value;
        },
    }
}
