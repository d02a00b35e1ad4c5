//! Internal helper macros.

/// Early-return with an error when a condition does not hold.
///
/// Like `assert!`, but produces `return Err($error)` instead of panicking,
/// which keeps validation checks in the parsing and transfer paths terse.
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
