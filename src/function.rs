use {
    crate::{
        error::{Error, Result},
        registry,
        signature::{Callable, Signature},
        storage::{Placement, Slot, INLINE_CAPACITY},
        variant::{Admits, Copyable, MoveOnly, Variant},
        vtable::{InvokeFn, OpTable},
    },
    static_assertions::{assert_impl_all, assert_not_impl_any, const_assert},
    std::{any::TypeId, fmt, marker::PhantomData, mem, ptr},
};

/// Type-erased container for any callable with the call signature `S`.
///
/// `S` is a function pointer type describing the signature, e.g. `fn(i32, i32) -> i32`.
/// `V` is the [`Variant`]: [`Copyable`] functions implement `Clone` and only admit `Clone` callables,
/// [`MoveOnly`] functions admit any callable but may only be moved.
///
/// Internally uses the small function optimization: callables of up to [`INLINE_CAPACITY`] bytes
/// (and alignment of up to [`INLINE_ALIGN`]) are stored in the object itself,
/// larger ones are stored in a heap block.
/// Every concrete callable type gets an operation table, built on first use and shared
/// by all functions storing that type.
///
/// [`INLINE_CAPACITY`]: crate::INLINE_CAPACITY
/// [`INLINE_ALIGN`]: crate::INLINE_ALIGN
pub struct FunctionBase<S: Signature, V: Variant> {
    slot: Slot,
    /// `None` iff `ops` is `None`.
    invoke_entry: Option<InvokeFn<S>>,
    ops: Option<&'static OpTable<S>>,
    _variant: PhantomData<V>,
}

/// Copyable function.
pub type Function<S> = FunctionBase<S, Copyable>;

/// Move-only function.
pub type MoveOnlyFunction<S> = FunctionBase<S, MoveOnly>;

/// The empty function sentinel.
///
/// Compares equal to empty functions; converts into an empty function.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Null;

const_assert!(mem::size_of::<Function<fn()>>() <= 2 * INLINE_CAPACITY);
assert_impl_all!(Function<fn(i32) -> i32>: Clone, Default, fmt::Debug);
assert_not_impl_any!(MoveOnlyFunction<fn(i32) -> i32>: Clone);
assert_not_impl_any!(Function<fn()>: Send, Sync);

impl<S: Signature, V: Variant> FunctionBase<S, V> {
    /// Creates an empty function.
    pub const fn empty() -> Self {
        FunctionBase {
            slot: Slot::vacant(),
            invoke_entry: None,
            ops: None,
            _variant: PhantomData,
        }
    }

    /// Creates a function which contains the callable `f`.
    ///
    /// `f` must be `Clone` if the function is [`Copyable`].
    pub fn new<F>(f: F) -> Self
    where
        F: Callable<S> + 'static,
        V: Admits<F>,
    {
        let mut result = Self::empty();
        result.place(f);
        result
    }

    /// Stores the callable `f`, dropping the previously stored callable, if any.
    pub fn set<F>(&mut self, f: F)
    where
        F: Callable<S> + 'static,
        V: Admits<F>,
    {
        self.clear();
        self.place(f);
    }

    /// Drops the stored callable, if any. The function becomes empty.
    pub fn clear(&mut self) {
        self.invoke_entry = None;

        if let Some(ops) = self.ops.take() {
            unsafe { (ops.destroy)(&mut self.slot) };
        }
    }

    /// Moves the stored callable into a new function, leaving this one empty.
    pub fn take(&mut self) -> Self {
        let mut result = Self::empty();

        if let Some(ops) = self.ops.take() {
            result.invoke_entry = self.invoke_entry.take();
            unsafe { (ops.move_construct)(&mut self.slot, &mut result.slot) };
            result.ops = Some(ops);
        }

        result
    }

    /// Moves the callable stored in `source` into this function, dropping the previously stored callable, if any.
    ///
    /// `source` becomes empty.
    pub fn move_from(&mut self, source: &mut Self) {
        if ptr::eq(self, source) {
            return;
        }

        let theirs = match source.ops.take() {
            Some(ops) => ops,
            None => {
                self.clear();
                return;
            }
        };
        let invoke_entry = source.invoke_entry.take();

        self.invoke_entry = None;

        match self.ops.take() {
            Some(mine) if ptr::eq(mine, theirs) => unsafe {
                (theirs.move_assign)(&mut source.slot, &mut self.slot)
            },
            Some(mine) => unsafe {
                (mine.destroy)(&mut self.slot);
                (theirs.move_construct)(&mut source.slot, &mut self.slot);
            },
            None => unsafe { (theirs.move_construct)(&mut source.slot, &mut self.slot) },
        }

        self.invoke_entry = invoke_entry;
        self.ops = Some(theirs);
    }

    /// If the function is empty, returns `true`; otherwise returns `false`.
    pub fn is_empty(&self) -> bool {
        debug_assert_eq!(self.invoke_entry.is_none(), self.ops.is_none());
        self.ops.is_none()
    }

    /// If the function is not empty, returns `true`; otherwise returns `false`.
    pub fn is_some(&self) -> bool {
        !self.is_empty()
    }

    /// Calls the stored callable with the packed arguments.
    ///
    /// # Panics
    ///
    /// Panics if the function is empty.
    pub fn invoke(&mut self, args: S::Args) -> S::Output {
        match self.try_invoke(args) {
            Ok(output) => output,
            Err(err) => panic!("{}", err),
        }
    }

    /// Calls the stored callable with the packed arguments.
    ///
    /// Returns [`Error::EmptyCall`] if the function is empty.
    pub fn try_invoke(&mut self, args: S::Args) -> Result<S::Output> {
        match (self.invoke_entry, self.ops) {
            (Some(invoke), Some(ops)) => unsafe {
                let value = self.slot.value_mut_ptr(ops.placement);
                Ok(invoke(value, args))
            },
            _ => Err(Error::EmptyCall),
        }
    }

    /// Returns the [`TypeId`] of the stored callable, or `None` if the function is empty.
    pub fn target_type_id(&self) -> Option<TypeId> {
        self.ops.map(|ops| (ops.identify)())
    }

    /// Returns the type name of the stored callable, or `None` if the function is empty.
    pub fn target_type_name(&self) -> Option<&'static str> {
        self.ops.map(|ops| (ops.type_name)())
    }

    /// Returns where the stored callable lives, or `None` if the function is empty.
    pub fn placement(&self) -> Option<Placement> {
        self.ops.map(|ops| ops.placement)
    }

    /// Returns the pointer to the stored callable, cast to `T`; null if the function is empty.
    ///
    /// The type is not checked: see [`downcast_ref_unchecked`](Self::downcast_ref_unchecked).
    pub fn as_ptr<T>(&self) -> *const T {
        match self.ops {
            Some(ops) => unsafe { self.slot.value_ptr(ops.placement) }.cast(),
            None => ptr::null(),
        }
    }

    /// Returns the mutable pointer to the stored callable, cast to `T`; null if the function is empty.
    ///
    /// The type is not checked: see [`downcast_mut_unchecked`](Self::downcast_mut_unchecked).
    pub fn as_mut_ptr<T>(&mut self) -> *mut T {
        match self.ops {
            Some(ops) => unsafe { self.slot.value_mut_ptr(ops.placement) }.cast(),
            None => ptr::null_mut(),
        }
    }

    /// Returns the reference to the stored callable as `T`.
    ///
    /// # Safety
    ///
    /// The caller guarantees that the function is not empty
    /// and that the stored callable is of type `T`,
    /// e.g. by comparing [`target_type_id`](Self::target_type_id) with `TypeId::of::<T>()`.
    /// Nothing is verified here.
    pub unsafe fn downcast_ref_unchecked<T>(&self) -> &T {
        unsafe { &*self.as_ptr::<T>() }
    }

    /// Returns the mutable reference to the stored callable as `T`.
    ///
    /// # Safety
    ///
    /// See [`downcast_ref_unchecked`](Self::downcast_ref_unchecked).
    pub unsafe fn downcast_mut_unchecked<T>(&mut self) -> &mut T {
        unsafe { &mut *self.as_mut_ptr::<T>() }
    }

    fn place<F>(&mut self, f: F)
    where
        F: Callable<S> + 'static,
        V: Admits<F>,
    {
        debug_assert!(self.is_empty());

        let ops = registry::table::<F, S, V>();

        unsafe { self.slot.put(f) };

        self.invoke_entry = Some(ops.invoke);
        self.ops = Some(ops);
    }
}

impl<S: Signature> FunctionBase<S, Copyable> {
    /// Converts into a move-only function storing the same callable.
    pub fn into_move_only(mut self) -> MoveOnlyFunction<S> {
        let mut result = MoveOnlyFunction::empty();

        if let Some(ops) = self.ops.take() {
            self.invoke_entry = None;
            let ops = (ops.move_only)();
            result.slot = mem::replace(&mut self.slot, Slot::vacant());
            result.invoke_entry = Some(ops.invoke);
            result.ops = Some(ops);
        }

        result
    }
}

impl<S: Signature> Clone for FunctionBase<S, Copyable> {
    fn clone(&self) -> Self {
        let mut result = Self::empty();

        if let Some(ops) = self.ops {
            unsafe { (ops.copy_ops().construct)(&self.slot, &mut result.slot) };
            result.invoke_entry = self.invoke_entry;
            result.ops = Some(ops);
        }

        result
    }

    fn clone_from(&mut self, source: &Self) {
        if ptr::eq(self, source) {
            return;
        }

        match (self.ops, source.ops) {
            (_, None) => self.clear(),
            (Some(mine), Some(theirs)) if ptr::eq(mine, theirs) => unsafe {
                (theirs.copy_ops().assign)(&source.slot, &mut self.slot)
            },
            // Copy into a temporary first: a panicking copy leaves `self` intact.
            _ => *self = source.clone(),
        }
    }
}

impl<S: Signature, V: Variant> Default for FunctionBase<S, V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<S: Signature, V: Variant> Drop for FunctionBase<S, V> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<S: Signature, V: Variant> From<Null> for FunctionBase<S, V> {
    fn from(_: Null) -> Self {
        Self::empty()
    }
}

impl<S: Signature, V: Variant> PartialEq<Null> for FunctionBase<S, V> {
    fn eq(&self, _: &Null) -> bool {
        self.is_empty()
    }
}

impl<S: Signature, V: Variant> PartialEq<FunctionBase<S, V>> for Null {
    fn eq(&self, other: &FunctionBase<S, V>) -> bool {
        other.is_empty()
    }
}

impl<S: Signature, V: Variant> fmt::Debug for FunctionBase<S, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionBase")
            .field("target", &self.target_type_name())
            .field("placement", &self.placement())
            .field("copyable", &V::COPYABLE)
            .finish()
    }
}

macro_rules! impl_call {
    ($($arg:ident $name:ident),*) => {
        impl<R: 'static, V: Variant $(, $arg: 'static)*> FunctionBase<fn($($arg),*) -> R, V> {
            /// Calls the stored callable.
            ///
            /// # Panics
            ///
            /// Panics if the function is empty.
            #[inline]
            pub fn call(&mut self $(, $name: $arg)*) -> R {
                self.invoke(($($name,)*))
            }

            /// Calls the stored callable.
            ///
            /// Returns [`Error::EmptyCall`] if the function is empty.
            #[inline]
            pub fn try_call(&mut self $(, $name: $arg)*) -> Result<R> {
                self.try_invoke(($($name,)*))
            }
        }
    };
}

impl_call!();
impl_call!(A0 a0);
impl_call!(A0 a0, A1 a1);
impl_call!(A0 a0, A1 a1, A2 a2);
impl_call!(A0 a0, A1 a1, A2 a2, A3 a3);
impl_call!(A0 a0, A1 a1, A2 a2, A3 a3, A4 a4);
impl_call!(A0 a0, A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
