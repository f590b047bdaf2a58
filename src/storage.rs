use {
    static_assertions::{assert_eq_size, const_assert, const_assert_eq},
    std::{
        marker::PhantomData,
        mem::{self, align_of, size_of, MaybeUninit},
        ptr,
    },
};

/// Amount of memory available for inline callable storage in a [`FunctionBase`].
///
/// Callables larger than this are stored on the heap.
///
/// [`FunctionBase`]: crate::FunctionBase
pub const INLINE_CAPACITY: usize = 16;

/// Alignment of the inline callable storage.
///
/// Callables with a stricter alignment are stored on the heap regardless of their size.
pub const INLINE_ALIGN: usize = 16;

/// Where the bytes of a stored callable live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Inside the function object itself, no allocation.
    Inline,
    /// In a heap block sized exactly for the callable.
    Heap,
}

/// Compile-time placement decision for the concrete type `F`.
pub(crate) struct Policy<F>(PhantomData<F>);

impl<F> Policy<F> {
    pub(crate) const PLACEMENT: Placement =
        if size_of::<F>() <= INLINE_CAPACITY && align_of::<F>() <= INLINE_ALIGN {
            Placement::Inline
        } else {
            Placement::Heap
        };
}

/// Callable storage.
/// Inline or heap.
/// Tag is not stored here: it is a property of the stored type, known to its operation table.
#[repr(C, align(16))]
pub union Slot {
    inline: [MaybeUninit<u8>; INLINE_CAPACITY],
    heap: *mut u8,
}

const_assert_eq!(mem::align_of::<Slot>(), INLINE_ALIGN);
const_assert!(INLINE_CAPACITY >= size_of::<*mut u8>());
assert_eq_size!(Slot, [u8; INLINE_CAPACITY]);

impl Slot {
    pub(crate) const fn vacant() -> Self {
        Slot {
            heap: ptr::null_mut(),
        }
    }

    // `repr(C)`: both union members start at offset 0.
    fn inline_ptr(&self) -> *const u8 {
        (self as *const Self).cast()
    }

    fn inline_mut_ptr(&mut self) -> *mut u8 {
        (self as *mut Self).cast()
    }

    /// Erased pointer to the live value.
    ///
    /// # Safety
    ///
    /// The slot holds a value whose type has the given `placement`.
    pub(crate) unsafe fn value_ptr(&self, placement: Placement) -> *const u8 {
        match placement {
            Placement::Inline => self.inline_ptr(),
            Placement::Heap => unsafe { self.heap as *const u8 },
        }
    }

    /// See [`value_ptr`](Self::value_ptr).
    ///
    /// # Safety
    ///
    /// The slot holds a value whose type has the given `placement`.
    pub(crate) unsafe fn value_mut_ptr(&mut self, placement: Placement) -> *mut u8 {
        match placement {
            Placement::Inline => self.inline_mut_ptr(),
            Placement::Heap => unsafe { self.heap },
        }
    }

    /// # Safety
    ///
    /// The slot holds a live `F`.
    pub(crate) unsafe fn get<F>(&self) -> *const F {
        unsafe { self.value_ptr(Policy::<F>::PLACEMENT) }.cast()
    }

    /// # Safety
    ///
    /// The slot holds a live `F`.
    pub(crate) unsafe fn get_mut<F>(&mut self) -> *mut F {
        unsafe { self.value_mut_ptr(Policy::<F>::PLACEMENT) }.cast()
    }

    /// Moves `value` into the slot, allocating if `F` does not fit inline.
    ///
    /// # Safety
    ///
    /// The slot holds no live value; whatever it held is overwritten without being dropped.
    pub(crate) unsafe fn put<F>(&mut self, value: F) {
        match Policy::<F>::PLACEMENT {
            Placement::Inline => unsafe { self.inline_mut_ptr().cast::<F>().write(value) },
            Placement::Heap => self.heap = Box::into_raw(Box::new(value)).cast(),
        }
    }

    /// Moves the `F` held by `src` into `dst`, leaving `src` vacant.
    ///
    /// # Safety
    ///
    /// `src` holds a live `F`; `dst` holds no live value.
    pub(crate) unsafe fn relocate<F>(src: &mut Slot, dst: &mut Slot) {
        match Policy::<F>::PLACEMENT {
            Placement::Inline => unsafe {
                ptr::copy_nonoverlapping(src.inline_ptr(), dst.inline_mut_ptr(), size_of::<F>());
            },
            Placement::Heap => {
                dst.heap = unsafe { src.heap };
                src.heap = ptr::null_mut();
            }
        }
    }

    /// Drops the held `F`; frees the heap block, if necessary.
    ///
    /// # Safety
    ///
    /// The slot holds a live `F`. It is vacant afterwards.
    pub(crate) unsafe fn drop_value<F>(&mut self) {
        match Policy::<F>::PLACEMENT {
            Placement::Inline => unsafe { ptr::drop_in_place(self.inline_mut_ptr().cast::<F>()) },
            Placement::Heap => {
                let boxed = unsafe { Box::from_raw(self.heap.cast::<F>()) };
                self.heap = ptr::null_mut();
                // Value dropped and block freed here.
                mem::drop(boxed);
            }
        }
    }

    /// Frees the heap block of an `F` which has already been moved out.
    ///
    /// # Safety
    ///
    /// The slot held an `F` whose value is no longer live.
    pub(crate) unsafe fn release<F>(&mut self) {
        if Policy::<F>::PLACEMENT == Placement::Heap {
            // `MaybeUninit` has the layout of `F` but no drop glue.
            mem::drop(unsafe { Box::from_raw(self.heap.cast::<MaybeUninit<F>>()) });
            self.heap = ptr::null_mut();
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::{cell::Cell, rc::Rc}};

    struct Tracker {
        drops: Rc<Cell<u32>>,
    }

    impl Drop for Tracker {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    #[repr(align(32))]
    struct OverAligned(u8);

    #[test]
    fn placement() {
        assert_eq!(Policy::<()>::PLACEMENT, Placement::Inline);
        assert_eq!(Policy::<u8>::PLACEMENT, Placement::Inline);
        assert_eq!(Policy::<[u8; INLINE_CAPACITY]>::PLACEMENT, Placement::Inline);
        assert_eq!(Policy::<[u8; INLINE_CAPACITY + 1]>::PLACEMENT, Placement::Heap);
        assert_eq!(Policy::<u128>::PLACEMENT, Placement::Inline);
        assert_eq!(Policy::<OverAligned>::PLACEMENT, Placement::Heap);
    }

    #[test]
    fn put_get_inline() {
        let mut slot = Slot::vacant();

        unsafe {
            slot.put(0xdead_beef_u32);
            assert_eq!(*slot.get::<u32>(), 0xdead_beef);

            *slot.get_mut::<u32>() += 1;
            assert_eq!(*slot.get::<u32>(), 0xdead_bef0);

            assert_eq!(slot.value_ptr(Placement::Inline), slot.inline_ptr());

            slot.drop_value::<u32>();
        }
    }

    #[test]
    fn put_get_heap() {
        let mut slot = Slot::vacant();

        unsafe {
            slot.put([7u8; 64]);
            assert_ne!(slot.value_ptr(Placement::Heap), slot.inline_ptr());
            assert_eq!((*slot.get::<[u8; 64]>())[63], 7);

            slot.drop_value::<[u8; 64]>();
            assert!(slot.heap.is_null());
        }
    }

    #[test]
    fn relocate() {
        let drops = Rc::new(Cell::new(0));

        let mut src = Slot::vacant();
        let mut dst = Slot::vacant();

        unsafe {
            src.put(Tracker {
                drops: drops.clone(),
            });
            Slot::relocate::<Tracker>(&mut src, &mut dst);
            assert_eq!(drops.get(), 0);

            dst.drop_value::<Tracker>();
            assert_eq!(drops.get(), 1);

            src.put((Tracker { drops: drops.clone() }, [0u8; 32]));
            let block = src.heap;
            Slot::relocate::<(Tracker, [u8; 32])>(&mut src, &mut dst);
            assert!(src.heap.is_null());
            assert_eq!(dst.heap, block);

            dst.drop_value::<(Tracker, [u8; 32])>();
            assert_eq!(drops.get(), 2);
        }
    }

    #[test]
    fn release() {
        let drops = Rc::new(Cell::new(0));
        let mut slot = Slot::vacant();

        unsafe {
            slot.put((Tracker { drops: drops.clone() }, [0u8; 32]));
            let value = ptr::read(slot.get::<(Tracker, [u8; 32])>());
            slot.release::<(Tracker, [u8; 32])>();
            assert!(slot.heap.is_null());
            assert_eq!(drops.get(), 0);

            mem::drop(value);
            assert_eq!(drops.get(), 1);
        }
    }
}
