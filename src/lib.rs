#![deny(unsafe_op_in_unsafe_fn)]
//! Type-erased function objects with the small function optimization.
//!
//! [`FunctionBase`] stores any callable matching a call signature, described as a function pointer type,
//! and calls it without knowing its concrete type.
//! Callables of up to [`INLINE_CAPACITY`] bytes are stored in the function object itself;
//! larger ones are stored on the heap.
//!
//! Two variants share the same engine:
//! [`Function`] is `Clone` and only admits `Clone` callables,
//! [`MoveOnlyFunction`] admits any callable but may only be moved.
//!
//! ```
//! use minifunction::{Function, MoveOnlyFunction, Null, Placement};
//!
//! fn add(a: i32, b: i32) -> i32 {
//!     a + b
//! }
//!
//! let mut f = Function::<fn(i32, i32) -> i32>::new(add);
//! assert_eq!(f.call(2, 3), 5);
//!
//! let bias = 10;
//! f.set(move |a: i32, b: i32| a + b + bias);
//! assert_eq!(f.call(2, 3), 15);
//!
//! let mut g = f.clone();
//! assert_eq!(g.call(1, 1), 12);
//!
//! // Large captures go to the heap.
//! let table = [1u8; 64];
//! let mut h = MoveOnlyFunction::<fn(usize) -> u8>::new(move |i: usize| table[i]);
//! assert_eq!(h.placement(), Some(Placement::Heap));
//! assert_eq!(h.call(63), 1);
//!
//! let taken = h.take();
//! assert!(h == Null);
//! assert!(taken.is_some());
//! ```
//!
//! Closure arguments must be annotated: the signature is not inferred from the closure.

mod error;
mod function;
mod registry;
mod signature;
mod storage;
mod variant;
mod vtable;

pub use {
    error::{Error, Result},
    function::{Function, FunctionBase, MoveOnlyFunction, Null},
    signature::{Callable, Signature},
    storage::{Placement, INLINE_ALIGN, INLINE_CAPACITY},
    variant::{Admits, Copyable, MoveOnly, Variant},
};
