use thiserror::Error;

/// Errors returned by the fallible [`FunctionBase`] calls.
///
/// [`FunctionBase`]: crate::FunctionBase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The function holds no callable.
    #[error("tried to call an empty function")]
    EmptyCall,
}

/// Result of a fallible call on a [`FunctionBase`].
///
/// [`FunctionBase`]: crate::FunctionBase
pub type Result<T> = std::result::Result<T, Error>;
