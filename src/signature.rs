/// Describes a call signature as a function pointer type, e.g. `fn(i32, i32) -> i32`.
///
/// Implemented for `fn(A0, .., An) -> R` with up to 6 arguments.
/// All argument and return types must be `'static`;
/// signatures with higher-ranked lifetimes (`fn(&str)`) are not supported.
pub trait Signature: 'static {
    /// Argument types, packed in a tuple.
    type Args: 'static;
    /// Return type.
    type Output: 'static;
}

/// A value which may be called with the arguments of the signature `S`,
/// returning its output.
///
/// Implemented for every `F: FnMut(A0, .., An) -> R`, i.e. closures, function items and function pointers.
pub trait Callable<S: Signature> {
    /// Calls the value with the packed arguments.
    fn call_with(&mut self, args: S::Args) -> S::Output;
}

macro_rules! impl_signature {
    ($($arg:ident $name:ident),*) => {
        impl<R: 'static $(, $arg: 'static)*> Signature for fn($($arg),*) -> R {
            type Args = ($($arg,)*);
            type Output = R;
        }

        impl<F, R: 'static $(, $arg: 'static)*> Callable<fn($($arg),*) -> R> for F
        where
            F: FnMut($($arg),*) -> R,
        {
            #[inline]
            fn call_with(&mut self, ($($name,)*): ($($arg,)*)) -> R {
                (*self)($($name),*)
            }
        }
    };
}

impl_signature!();
impl_signature!(A0 a0);
impl_signature!(A0 a0, A1 a1);
impl_signature!(A0 a0, A1 a1, A2 a2);
impl_signature!(A0 a0, A1 a1, A2 a2, A3 a3);
impl_signature!(A0 a0, A1 a1, A2 a2, A3 a3, A4 a4);
impl_signature!(A0 a0, A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
