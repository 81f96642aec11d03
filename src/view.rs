//! Owned strided-subarray view handles.
//!
//! A [`SubarrayView`] names a rectangular region of a row-major dense buffer
//! (containing shape, sub-shape, origin; last axis contiguous) as a committed
//! derived datatype in the C layer's type table. Views are the currency of
//! the collectives: the root-side tile views, each peer's interior view, and
//! every halo strip are all `SubarrayView`s prebuilt at descriptor
//! construction.

use std::marker::PhantomData;

use crate::datatype::Element;
use crate::error::{Error, Result};
use crate::ffi;
use crate::shape;

/// An owned, committed strided view over a buffer of `T` elements.
///
/// The view holds a unique handle into the C layer's datatype table and
/// releases it exactly once on drop. Views are not cloneable; a descriptor
/// that needs the same geometry twice builds it twice.
pub struct SubarrayView<T: Element> {
    handle: i32,
    _marker: PhantomData<T>,
}

impl<T: Element> SubarrayView<T> {
    /// Build and commit a view of extent `subsizes` at origin `starts`
    /// inside a containing shape `sizes`.
    ///
    /// All three tuples must have the same length and `subsizes` must have
    /// non-zero volume; callers represent empty regions as `None` rather
    /// than constructing a degenerate view.
    ///
    /// # Panics
    ///
    /// Panics if the tuple lengths disagree.
    pub(crate) fn new(sizes: &[i32], subsizes: &[i32], starts: &[i32]) -> Result<Self> {
        assert_eq!(sizes.len(), subsizes.len(), "subarray tuple length mismatch");
        assert_eq!(sizes.len(), starts.len(), "subarray tuple length mismatch");
        debug_assert!(shape::prod(subsizes) > 0);

        let mut handle: i32 = -1;
        let ret = unsafe {
            ffi::cartompi_type_subarray(
                sizes.len() as i32,
                sizes.as_ptr(),
                subsizes.as_ptr(),
                starts.as_ptr(),
                T::TAG as i32,
                &mut handle,
            )
        };
        Error::check(ret)?;
        Ok(SubarrayView {
            handle,
            _marker: PhantomData,
        })
    }

    /// The raw datatype handle for FFI dispatch.
    pub(crate) fn raw_handle(&self) -> i32 {
        self.handle
    }
}

impl<T: Element> Drop for SubarrayView<T> {
    fn drop(&mut self) {
        let ret = unsafe { ffi::cartompi_type_free(self.handle) };
        if ret != 0 {
            tracing::error!(handle = self.handle, code = ret, "failed to release subarray view");
        }
    }
}
