//! The crate-wide result alias and argument checks.

use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Returns early with an `InvalidArgument` error unless `$cond` holds.
///
/// The error names the argument and quotes the condition that failed.
#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $cond:expr) => {
        if !$cond {
            return ::std::result::Result::Err(
                $crate::result::rejected_arg(stringify!($name), stringify!($cond)).into(),
            );
        }
    };
}

#[cold]
#[doc(hidden)]
pub fn rejected_arg(name: &str, condition: &str) -> Error {
    Error::invalid_arg(name, condition)
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;

    fn check_len(len: usize) -> super::Result<usize> {
        verify_arg!(len, len != 0);
        Ok(len)
    }

    #[test]
    fn test_verify_arg() {
        assert_eq!(check_len(3).unwrap(), 3);
        let err = check_len(0).unwrap_err();
        match err.kind() {
            ErrorKind::InvalidArgument { name, message } => {
                assert_eq!(name, "len");
                assert_eq!(message, "len != 0");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.site().is_none());
    }
}
