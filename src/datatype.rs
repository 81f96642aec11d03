//! Element trait and primitive datatype tags.
//!
//! The [`Element`] trait maps a Rust scalar type to the primitive datatype
//! handle the C layer preloads in its type table. Every buffer handed to a
//! collective is typed by an `Element`, and every derived subarray view is
//! built on top of an element's primitive handle.
//!
//! # Supported Types
//!
//! | Rust Type | MPI Equivalent  | Tag Value |
//! |-----------|-----------------|-----------|
//! | `f32`     | `MPI_FLOAT`     | 0         |
//! | `f64`     | `MPI_DOUBLE`    | 1         |
//! | `i8`      | `MPI_INT8_T`    | 2         |
//! | `i16`     | `MPI_INT16_T`   | 3         |
//! | `i32`     | `MPI_INT32_T`   | 4         |
//! | `i64`     | `MPI_INT64_T`   | 5         |
//! | `u8`      | `MPI_UINT8_T`   | 6         |
//! | `u16`     | `MPI_UINT16_T`  | 7         |
//! | `u32`     | `MPI_UINT32_T`  | 8         |
//! | `u64`     | `MPI_UINT64_T`  | 9         |

/// Internal module to seal the trait — prevents external implementations.
mod sealed {
    pub trait Sealed {}
}

/// Tag values matching the C-side `CARTOMPI_*` defines.
///
/// These discriminants must stay in sync with the `#define CARTOMPI_*`
/// values in `csrc/cartompi.h`; they double as handles into the C layer's
/// preloaded datatype table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ElementTag {
    /// 32-bit floating point (`MPI_FLOAT`)
    F32 = 0,
    /// 64-bit floating point (`MPI_DOUBLE`)
    F64 = 1,
    /// 8-bit signed integer (`MPI_INT8_T`)
    I8 = 2,
    /// 16-bit signed integer (`MPI_INT16_T`)
    I16 = 3,
    /// 32-bit signed integer (`MPI_INT32_T`)
    I32 = 4,
    /// 64-bit signed integer (`MPI_INT64_T`)
    I64 = 5,
    /// 8-bit unsigned integer (`MPI_UINT8_T`)
    U8 = 6,
    /// 16-bit unsigned integer (`MPI_UINT16_T`)
    U16 = 7,
    /// 32-bit unsigned integer (`MPI_UINT32_T`)
    U32 = 8,
    /// 64-bit unsigned integer (`MPI_UINT64_T`)
    U64 = 9,
}

/// Trait for scalar types that can flow through the collectives.
///
/// This is a **sealed trait** — it cannot be implemented outside this crate,
/// so an unmapped element type is a compile-time error. Supported types:
/// [`f32`], [`f64`], [`i8`], [`i16`], [`i32`], [`i64`], [`u8`], [`u16`],
/// [`u32`], [`u64`].
pub trait Element: sealed::Sealed + Copy + Send + 'static {
    /// The primitive datatype handle used for FFI dispatch to the C layer.
    const TAG: ElementTag;
}

macro_rules! impl_element {
    ($ty:ty, $tag:expr) => {
        impl sealed::Sealed for $ty {}
        impl Element for $ty {
            const TAG: ElementTag = $tag;
        }
    };
}

impl_element!(f32, ElementTag::F32);
impl_element!(f64, ElementTag::F64);
impl_element!(i8, ElementTag::I8);
impl_element!(i16, ElementTag::I16);
impl_element!(i32, ElementTag::I32);
impl_element!(i64, ElementTag::I64);
impl_element!(u8, ElementTag::U8);
impl_element!(u16, ElementTag::U16);
impl_element!(u32, ElementTag::U32);
impl_element!(u64, ElementTag::U64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_values_match_c_defines() {
        assert_eq!(ElementTag::F32 as i32, 0);
        assert_eq!(ElementTag::F64 as i32, 1);
        assert_eq!(ElementTag::I8 as i32, 2);
        assert_eq!(ElementTag::I16 as i32, 3);
        assert_eq!(ElementTag::I32 as i32, 4);
        assert_eq!(ElementTag::I64 as i32, 5);
        assert_eq!(ElementTag::U8 as i32, 6);
        assert_eq!(ElementTag::U16 as i32, 7);
        assert_eq!(ElementTag::U32 as i32, 8);
        assert_eq!(ElementTag::U64 as i32, 9);
    }

    #[test]
    fn element_tags_dispatch_correctly() {
        assert_eq!(f32::TAG, ElementTag::F32);
        assert_eq!(f64::TAG, ElementTag::F64);
        assert_eq!(i8::TAG, ElementTag::I8);
        assert_eq!(i16::TAG, ElementTag::I16);
        assert_eq!(i32::TAG, ElementTag::I32);
        assert_eq!(i64::TAG, ElementTag::I64);
        assert_eq!(u8::TAG, ElementTag::U8);
        assert_eq!(u16::TAG, ElementTag::U16);
        assert_eq!(u32::TAG, ElementTag::U32);
        assert_eq!(u64::TAG, ElementTag::U64);
    }

    #[test]
    fn trait_is_implemented() {
        fn assert_element<T: Element>() {}
        assert_element::<f32>();
        assert_element::<f64>();
        assert_element::<i8>();
        assert_element::<i16>();
        assert_element::<i32>();
        assert_element::<i64>();
        assert_element::<u8>();
        assert_element::<u16>();
        assert_element::<u32>();
        assert_element::<u64>();
    }
}
