//! Error types for cartompi.
//!
//! Geometry errors (shape mismatches, out-of-grid access, bad offsets) are
//! reported through dedicated variants; anything that goes wrong inside the
//! MPI runtime surfaces as [`Error::Transport`] with the error class and the
//! human-readable message obtained from the runtime.

use crate::ffi;
use thiserror::Error;

/// Result type for cartompi operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MPI error class, categorizing a transport failure.
///
/// These correspond to the standard MPI error classes; the C layer calls
/// `MPI_Error_class` to map an error code to one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// `MPI_SUCCESS` — no error
    Success,
    /// `MPI_ERR_BUFFER` — invalid buffer pointer
    Buffer,
    /// `MPI_ERR_COUNT` — invalid count argument
    Count,
    /// `MPI_ERR_TYPE` — invalid datatype argument
    Type,
    /// `MPI_ERR_TAG` — invalid tag argument
    Tag,
    /// `MPI_ERR_COMM` — invalid communicator
    Comm,
    /// `MPI_ERR_RANK` — invalid rank
    Rank,
    /// `MPI_ERR_REQUEST` — invalid request handle
    Request,
    /// `MPI_ERR_ROOT` — invalid root
    Root,
    /// `MPI_ERR_TOPOLOGY` — invalid topology
    Topology,
    /// `MPI_ERR_DIMS` — invalid dimension argument
    Dims,
    /// `MPI_ERR_ARG` — invalid argument
    Arg,
    /// `MPI_ERR_TRUNCATE` — message truncated
    Truncate,
    /// `MPI_ERR_OTHER` — other error
    Other,
    /// `MPI_ERR_INTERN` — internal MPI error
    Intern,
    /// Unrecognized error class from the MPI implementation
    Raw(i32),
}

impl ErrorClass {
    /// Map a raw MPI error class integer to the enum variant.
    ///
    /// Standard values (MPI-3.1 Table 9.4): 0=SUCCESS, 1=BUFFER, 2=COUNT,
    /// 3=TYPE, 4=TAG, 5=COMM, 6=RANK, 7=REQUEST, 8=ROOT, 11=TOPOLOGY,
    /// 12=DIMS, 13=ARG, 15=TRUNCATE, 16=OTHER, 17=INTERN.
    pub fn from_raw(class: i32) -> Self {
        match class {
            0 => ErrorClass::Success,
            1 => ErrorClass::Buffer,
            2 => ErrorClass::Count,
            3 => ErrorClass::Type,
            4 => ErrorClass::Tag,
            5 => ErrorClass::Comm,
            6 => ErrorClass::Rank,
            7 => ErrorClass::Request,
            8 => ErrorClass::Root,
            11 => ErrorClass::Topology,
            12 => ErrorClass::Dims,
            13 => ErrorClass::Arg,
            15 => ErrorClass::Truncate,
            16 => ErrorClass::Other,
            17 => ErrorClass::Intern,
            other => ErrorClass::Raw(other),
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorClass::Success => write!(f, "SUCCESS"),
            ErrorClass::Buffer => write!(f, "ERR_BUFFER"),
            ErrorClass::Count => write!(f, "ERR_COUNT"),
            ErrorClass::Type => write!(f, "ERR_TYPE"),
            ErrorClass::Tag => write!(f, "ERR_TAG"),
            ErrorClass::Comm => write!(f, "ERR_COMM"),
            ErrorClass::Rank => write!(f, "ERR_RANK"),
            ErrorClass::Request => write!(f, "ERR_REQUEST"),
            ErrorClass::Root => write!(f, "ERR_ROOT"),
            ErrorClass::Topology => write!(f, "ERR_TOPOLOGY"),
            ErrorClass::Dims => write!(f, "ERR_DIMS"),
            ErrorClass::Arg => write!(f, "ERR_ARG"),
            ErrorClass::Truncate => write!(f, "ERR_TRUNCATE"),
            ErrorClass::Other => write!(f, "ERR_OTHER"),
            ErrorClass::Intern => write!(f, "ERR_INTERN"),
            ErrorClass::Raw(c) => write!(f, "ERR_CLASS({c})"),
        }
    }
}

/// Error types for cartompi operations.
#[derive(Error, Debug)]
pub enum Error {
    /// MPI has already been initialized.
    #[error("MPI has already been initialized")]
    AlreadyInitialized,

    /// Tuple lengths disagree at an API boundary.
    #[error("shape mismatch: expected {expected} components, got {actual}")]
    ShapeMismatch {
        /// Number of components the grid rank requires.
        expected: usize,
        /// Number of components actually supplied.
        actual: usize,
    },

    /// The origin communicator has fewer peers than the grid needs.
    #[error("insufficient peers: grid needs {needed}, communicator has {available}")]
    InsufficientPeers {
        /// `prod(dims)` of the requested grid.
        needed: i64,
        /// Size of the origin communicator.
        available: i32,
    },

    /// A grid-dependent method was called on a peer outside the topology.
    #[error("{0} called on a peer outside the topology")]
    NotInGrid(&'static str),

    /// A rank or coordinate is outside its valid bounds.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// A direction component other than -1, 0, or +1 was encountered.
    #[error("invalid offset component {0} (must be -1, 0, or +1)")]
    InvalidOffset(i32),

    /// A caller-supplied buffer does not match the descriptor's extents.
    #[error("invalid buffer")]
    InvalidBuffer,

    /// MPI failure with class, code, and descriptive message from the runtime.
    #[error("transport error: {message} (class={class}, code={code})")]
    Transport {
        /// The error class (category of error).
        class: ErrorClass,
        /// The raw MPI error code.
        code: i32,
        /// Human-readable error message from `MPI_Error_string`.
        message: String,
    },

    /// Internal cartompi error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a transport error from an MPI error code.
    ///
    /// Calls `cartompi_error_info` to obtain the error class and
    /// human-readable message from the MPI runtime.
    ///
    /// # Panics
    ///
    /// Panics if called with `MPI_SUCCESS` (code 0).
    pub fn from_code(code: i32) -> Self {
        assert!(code != 0, "from_code called with success code 0");

        let mut class: i32 = 0;
        let mut msg_buf = [0u8; 512];
        let mut msg_len: i32 = 0;

        let ret = unsafe {
            ffi::cartompi_error_info(
                code,
                &mut class,
                msg_buf.as_mut_ptr().cast::<i8>(),
                &mut msg_len,
            )
        };

        if ret == 0 {
            let len = msg_len.max(0) as usize;
            let message = std::str::from_utf8(&msg_buf[..len])
                .unwrap_or("unknown error")
                .to_string();
            Error::Transport {
                class: ErrorClass::from_raw(class),
                code,
                message,
            }
        } else {
            // cartompi_error_info itself failed — provide a fallback
            Error::Transport {
                class: ErrorClass::Raw(code),
                code,
                message: format!("MPI error code {code}"),
            }
        }
    }

    /// Check an MPI return code, returning `Ok(())` for success.
    pub fn check(code: i32) -> Result<()> {
        if code == 0 {
            Ok(())
        } else {
            Err(Error::from_code(code))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_success_returns_ok() {
        assert!(Error::check(0).is_ok());
    }

    #[test]
    fn error_class_from_known_values() {
        assert_eq!(ErrorClass::from_raw(0), ErrorClass::Success);
        assert_eq!(ErrorClass::from_raw(5), ErrorClass::Comm);
        assert_eq!(ErrorClass::from_raw(6), ErrorClass::Rank);
        assert_eq!(ErrorClass::from_raw(11), ErrorClass::Topology);
        assert_eq!(ErrorClass::from_raw(12), ErrorClass::Dims);
        assert_eq!(ErrorClass::from_raw(17), ErrorClass::Intern);
    }

    #[test]
    fn error_class_unknown_raw_value() {
        assert_eq!(ErrorClass::from_raw(999), ErrorClass::Raw(999));
        assert_eq!(format!("{}", ErrorClass::Raw(42)), "ERR_CLASS(42)");
    }

    #[test]
    fn geometry_errors_format() {
        let err = Error::ShapeMismatch {
            expected: 3,
            actual: 2,
        };
        assert_eq!(
            format!("{err}"),
            "shape mismatch: expected 3 components, got 2"
        );

        let err = Error::InsufficientPeers {
            needed: 27,
            available: 8,
        };
        assert_eq!(
            format!("{err}"),
            "insufficient peers: grid needs 27, communicator has 8"
        );

        let err = Error::NotInGrid("rank()");
        assert_eq!(format!("{err}"), "rank() called on a peer outside the topology");

        let err = Error::InvalidOffset(2);
        assert_eq!(
            format!("{err}"),
            "invalid offset component 2 (must be -1, 0, or +1)"
        );
    }

    #[test]
    fn transport_error_formats() {
        let err = Error::Transport {
            class: ErrorClass::Rank,
            code: 6,
            message: "invalid rank".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "transport error: invalid rank (class=ERR_RANK, code=6)"
        );
    }
}
