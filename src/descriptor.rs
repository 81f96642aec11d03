//! Distributed descriptor: tile table, halo policy, and prebuilt views.
//!
//! A [`Descriptor`] is built by [`CartSplitter::create_descriptor`] for one
//! global shape and one halo policy. It derives every peer's interior tile,
//! applies the halo policy to obtain this peer's local buffer shape, and
//! prebuilds all the strided views the collectives dispatch over: one
//! root-side view per peer, the local interior view, and one send plus one
//! receive strip per neighbor direction.
//!
//! [`CartSplitter::create_descriptor`]: crate::CartSplitter::create_descriptor

use crate::datatype::Element;
use crate::error::{Error, Result};
use crate::shape;
use crate::view::SubarrayView;

/// Halo sizing policy applied at descriptor construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaloPolicy {
    /// No halos at all: requested and effective widths are forced to zero
    /// and halo exchange becomes a no-op.
    Unused,
    /// Every face of every tile reserves the requested width, including
    /// faces on the global boundary.
    Full,
    /// Faces at the grid boundary get zero effective width; interior faces
    /// keep the requested width. The boundary test looks only at coordinate
    /// extrema: a peer at coordinate 0 of a periodic axis still loses its
    /// low-face halo. This is an observable contract.
    Tight,
}

/// Per-peer decomposition of one global array, with prebuilt transfer views.
///
/// Descriptors own unique view handles and are therefore neither cloneable
/// nor copyable; dropping one releases every live view exactly once.
pub struct Descriptor<T: Element> {
    dims: Vec<i32>,
    sub_sizes: Vec<Vec<i32>>,
    starts: Vec<Vec<i32>>,
    halo_pre: Vec<i32>,
    halo_post: Vec<i32>,
    local_halo_pre: Vec<i32>,
    local_halo_post: Vec<i32>,
    local_dims: Vec<i32>,
    local_sub_sizes: Vec<i32>,
    local_starts: Vec<i32>,
    types: Vec<SubarrayView<T>>,
    local_type: SubarrayView<T>,
    send_types: Vec<Option<SubarrayView<T>>>,
    recv_types: Vec<Option<SubarrayView<T>>>,
}

impl<T: Element> Descriptor<T> {
    /// Run the whole derivation pipeline. Called by the splitter only.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn build(
        dims: Vec<i32>,
        sub_sizes: Vec<Vec<i32>>,
        starts: Vec<Vec<i32>>,
        halo_pre: &[i32],
        halo_post: &[i32],
        policy: HaloPolicy,
        coords: &[i32],
        grid_dims: &[i32],
        rank: i32,
        directions: &[Vec<i32>],
    ) -> Result<Self> {
        // Root-side view of every peer's interior inside the global shape.
        let mut types = Vec::with_capacity(sub_sizes.len());
        for (sub, start) in sub_sizes.iter().zip(&starts) {
            types.push(SubarrayView::new(&dims, sub, start)?);
        }

        let (halo_pre, halo_post, local_halo_pre, local_halo_post) =
            apply_policy(policy, halo_pre, halo_post, coords, grid_dims);

        let local_sub_sizes = sub_sizes[rank as usize].clone();
        let local_dims = shape::add(
            &shape::add(&local_sub_sizes, &local_halo_pre),
            &local_halo_post,
        );
        let local_starts = local_halo_pre.clone();

        let local_type = SubarrayView::new(&local_dims, &local_sub_sizes, &local_starts)?;

        let mut recv_types = Vec::with_capacity(directions.len());
        let mut send_types = Vec::with_capacity(directions.len());
        for off in directions {
            recv_types.push(
                match recv_strip(off, &local_starts, &local_sub_sizes, &local_dims)? {
                    Some((origin, extent)) => {
                        Some(SubarrayView::new(&local_dims, &extent, &origin)?)
                    }
                    None => None,
                },
            );
            send_types.push(
                match send_strip(off, &local_starts, &local_sub_sizes, &halo_pre, &halo_post)? {
                    Some((origin, extent)) => {
                        Some(SubarrayView::new(&local_dims, &extent, &origin)?)
                    }
                    None => None,
                },
            );
        }

        tracing::debug!(
            ?local_dims,
            ?local_sub_sizes,
            ?local_starts,
            "descriptor built"
        );

        Ok(Descriptor {
            dims,
            sub_sizes,
            starts,
            halo_pre,
            halo_post,
            local_halo_pre,
            local_halo_post,
            local_dims,
            local_sub_sizes,
            local_starts,
            types,
            local_type,
            send_types,
            recv_types,
        })
    }

    /// Number of elements (interior plus halos) in the local buffer.
    pub fn local_size(&self) -> usize {
        shape::prod(&self.local_dims) as usize
    }

    /// Number of elements moved by a full gather (the global element count).
    pub fn total_size(&self) -> usize {
        shape::prod(&self.dims) as usize
    }

    /// Local buffer shape, interior plus halos (last axis contiguous).
    pub fn local_dims(&self) -> &[i32] {
        &self.local_dims
    }

    /// This peer's interior shape.
    pub fn local_sub_sizes(&self) -> &[i32] {
        &self.local_sub_sizes
    }

    /// Origin of the interior inside the local buffer (equals the effective
    /// leading halo widths).
    pub fn local_starts(&self) -> &[i32] {
        &self.local_starts
    }

    /// Requested halo widths before the interior (zeroed under
    /// [`HaloPolicy::Unused`]). Send strips are sized by these, not by the
    /// effective widths.
    pub fn halo_pre(&self) -> &[i32] {
        &self.halo_pre
    }

    /// Requested halo widths after the interior (zeroed under
    /// [`HaloPolicy::Unused`]).
    pub fn halo_post(&self) -> &[i32] {
        &self.halo_post
    }

    /// Effective halo widths before the interior, after policy application.
    pub fn local_halo_pre(&self) -> &[i32] {
        &self.local_halo_pre
    }

    /// Effective halo widths after the interior, after policy application.
    pub fn local_halo_post(&self) -> &[i32] {
        &self.local_halo_post
    }

    /// Interior shape of peer `rank`.
    pub fn sub_sizes(&self, rank: i32) -> &[i32] {
        &self.sub_sizes[rank as usize]
    }

    /// Origin of peer `rank`'s interior inside the global array.
    pub fn starts(&self, rank: i32) -> &[i32] {
        &self.starts[rank as usize]
    }

    pub(crate) fn root_view(&self, rank: i32) -> &SubarrayView<T> {
        &self.types[rank as usize]
    }

    pub(crate) fn local_view(&self) -> &SubarrayView<T> {
        &self.local_type
    }

    pub(crate) fn send_view(&self, dir: usize) -> Option<&SubarrayView<T>> {
        self.send_types[dir].as_ref()
    }

    pub(crate) fn recv_view(&self, dir: usize) -> Option<&SubarrayView<T>> {
        self.recv_types[dir].as_ref()
    }
}

/// Derive requested and effective halo widths for one peer.
///
/// Returns `(halo_pre, halo_post, local_halo_pre, local_halo_post)`; the
/// first pair is what send strips are sized by, the second what the local
/// buffer actually reserves.
fn apply_policy(
    policy: HaloPolicy,
    halo_pre: &[i32],
    halo_post: &[i32],
    coords: &[i32],
    grid_dims: &[i32],
) -> (Vec<i32>, Vec<i32>, Vec<i32>, Vec<i32>) {
    match policy {
        HaloPolicy::Unused => {
            let zero = vec![0; halo_pre.len()];
            (zero.clone(), zero.clone(), zero.clone(), zero)
        }
        HaloPolicy::Full => (
            halo_pre.to_vec(),
            halo_post.to_vec(),
            halo_pre.to_vec(),
            halo_post.to_vec(),
        ),
        HaloPolicy::Tight => {
            let local_pre: Vec<i32> = coords
                .iter()
                .zip(halo_pre)
                .map(|(&c, &h)| if c > 0 { h } else { 0 })
                .collect();
            let local_post: Vec<i32> = coords
                .iter()
                .zip(grid_dims)
                .zip(halo_post)
                .map(|((&c, &g), &h)| if c < g - 1 { h } else { 0 })
                .collect();
            (halo_pre.to_vec(), halo_post.to_vec(), local_pre, local_post)
        }
    }
}

/// Region of the local buffer filled from the neighbor at offset `off`.
///
/// Returns `(origin, extent)`, or `None` when the region has zero volume
/// (no halo reserved on that face). Sized by the *effective* widths, which
/// are baked into `local_starts` and `local_dims`.
fn recv_strip(
    off: &[i32],
    local_starts: &[i32],
    local_sub_sizes: &[i32],
    local_dims: &[i32],
) -> Result<Option<(Vec<i32>, Vec<i32>)>> {
    let d = off.len();
    let mut origin = vec![0i32; d];
    let mut extent = vec![0i32; d];
    for dd in 0..d {
        let i = local_starts[dd];
        let s = local_sub_sizes[dd];
        let l = local_dims[dd];
        let (lo, hi) = match off[dd] {
            1 => (0, i),
            0 => (i, i + s),
            -1 => (i + s, l),
            other => return Err(Error::InvalidOffset(other)),
        };
        origin[dd] = lo;
        extent[dd] = hi - lo;
    }
    if shape::prod(&extent) == 0 {
        Ok(None)
    } else {
        Ok(Some((origin, extent)))
    }
}

/// Region of the local buffer donated to the neighbor at offset `off`.
///
/// Returns `(origin, extent)`, or `None` when the region has zero volume.
/// Sized by the *requested* widths: a peer whose own face lost its halo
/// under [`HaloPolicy::Tight`] still donates the full width its interior
/// neighbor reserves.
fn send_strip(
    off: &[i32],
    local_starts: &[i32],
    local_sub_sizes: &[i32],
    halo_pre: &[i32],
    halo_post: &[i32],
) -> Result<Option<(Vec<i32>, Vec<i32>)>> {
    let d = off.len();
    let mut origin = vec![0i32; d];
    let mut extent = vec![0i32; d];
    for dd in 0..d {
        let i = local_starts[dd];
        let s = local_sub_sizes[dd];
        let (lo, hi) = match off[dd] {
            1 => (i + s - halo_pre[dd], i + s),
            0 => (i, i + s),
            -1 => (i, i + halo_post[dd]),
            other => return Err(Error::InvalidOffset(other)),
        };
        origin[dd] = lo;
        extent[dd] = hi - lo;
    }
    if shape::prod(&extent) == 0 {
        Ok(None)
    } else {
        Ok(Some((origin, extent)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unused_policy_zeroes_everything() {
        let (pre, post, lpre, lpost) =
            apply_policy(HaloPolicy::Unused, &[2, 2], &[3, 3], &[1, 1], &[3, 3]);
        assert_eq!(pre, vec![0, 0]);
        assert_eq!(post, vec![0, 0]);
        assert_eq!(lpre, vec![0, 0]);
        assert_eq!(lpost, vec![0, 0]);
    }

    #[test]
    fn full_policy_keeps_requested_widths() {
        let (pre, post, lpre, lpost) =
            apply_policy(HaloPolicy::Full, &[2, 1], &[3, 4], &[0, 2], &[3, 3]);
        assert_eq!(pre, vec![2, 1]);
        assert_eq!(post, vec![3, 4]);
        assert_eq!(lpre, vec![2, 1]);
        assert_eq!(lpost, vec![3, 4]);
    }

    #[test]
    fn tight_policy_zeroes_boundary_faces_only() {
        // corner peer: low faces on both axes
        let (pre, post, lpre, lpost) =
            apply_policy(HaloPolicy::Tight, &[2, 2], &[2, 2], &[0, 0], &[3, 3]);
        assert_eq!(pre, vec![2, 2], "requested widths are untouched");
        assert_eq!(post, vec![2, 2]);
        assert_eq!(lpre, vec![0, 0]);
        assert_eq!(lpost, vec![2, 2]);

        // interior peer keeps everything
        let (_, _, lpre, lpost) =
            apply_policy(HaloPolicy::Tight, &[2, 2], &[2, 2], &[1, 1], &[3, 3]);
        assert_eq!(lpre, vec![2, 2]);
        assert_eq!(lpost, vec![2, 2]);

        // high-corner peer: high faces zeroed
        let (_, _, lpre, lpost) =
            apply_policy(HaloPolicy::Tight, &[2, 2], &[2, 2], &[2, 2], &[3, 3]);
        assert_eq!(lpre, vec![2, 2]);
        assert_eq!(lpost, vec![0, 0]);
    }

    #[test]
    fn tight_policy_ignores_periodicity() {
        // The boundary test consults coordinates only; there is no
        // periodicity input. A wrap neighbor does not restore the halo.
        let (_, _, lpre, _) =
            apply_policy(HaloPolicy::Tight, &[2], &[2], &[0], &[3]);
        assert_eq!(lpre, vec![0]);
    }

    #[test]
    fn tight_local_dims_match_known_case() {
        // 12x12 data on a 3x3 grid, halo 2 per side
        let sub = vec![4, 4];
        let (_, _, lpre, lpost) =
            apply_policy(HaloPolicy::Tight, &[2, 2], &[2, 2], &[0, 0], &[3, 3]);
        let local = shape::add(&shape::add(&sub, &lpre), &lpost);
        assert_eq!(local, vec![6, 6]);

        let (_, _, lpre, lpost) =
            apply_policy(HaloPolicy::Tight, &[2, 2], &[2, 2], &[1, 1], &[3, 3]);
        let local = shape::add(&shape::add(&sub, &lpre), &lpost);
        assert_eq!(local, vec![8, 8]);
    }

    #[test]
    fn recv_strips_follow_the_face_table() {
        // interior peer, Full halos: I = 2, S = 4, L = 8 on both axes
        let starts = vec![2, 2];
        let subs = vec![4, 4];
        let dims = vec![8, 8];

        // +1 on axis 0: leading halo slab
        let (origin, extent) = recv_strip(&[1, 0], &starts, &subs, &dims)
            .unwrap()
            .unwrap();
        assert_eq!(origin, vec![0, 2]);
        assert_eq!(extent, vec![2, 4]);

        // -1 on axis 1: trailing halo slab
        let (origin, extent) = recv_strip(&[0, -1], &starts, &subs, &dims)
            .unwrap()
            .unwrap();
        assert_eq!(origin, vec![2, 6]);
        assert_eq!(extent, vec![4, 2]);

        // corner
        let (origin, extent) = recv_strip(&[-1, 1], &starts, &subs, &dims)
            .unwrap()
            .unwrap();
        assert_eq!(origin, vec![6, 0]);
        assert_eq!(extent, vec![2, 2]);
    }

    #[test]
    fn recv_strip_vanishes_without_reserved_halo() {
        // no halos at all: every non-zero offset has an empty strip
        let starts = vec![0, 0];
        let subs = vec![4, 4];
        let dims = vec![4, 4];
        assert!(recv_strip(&[1, 0], &starts, &subs, &dims).unwrap().is_none());
        assert!(recv_strip(&[-1, -1], &starts, &subs, &dims).unwrap().is_none());
    }

    #[test]
    fn send_strips_use_requested_widths() {
        // Tight corner peer at (0,0): effective leading halo is zero, so
        // I = 0, but the send strip toward +1 must still be halo_pre wide.
        let starts = vec![0, 0];
        let subs = vec![4, 4];
        let pre = vec![2, 2];
        let post = vec![2, 2];

        let (origin, extent) = send_strip(&[1, 0], &starts, &subs, &pre, &post)
            .unwrap()
            .unwrap();
        assert_eq!(origin, vec![2, 0]);
        assert_eq!(extent, vec![2, 4]);

        let (origin, extent) = send_strip(&[0, -1], &starts, &subs, &pre, &post)
            .unwrap()
            .unwrap();
        assert_eq!(origin, vec![0, 0]);
        assert_eq!(extent, vec![4, 2]);
    }

    #[test]
    fn send_strip_vanishes_with_zero_request() {
        let starts = vec![0, 0];
        let subs = vec![4, 4];
        let zero = vec![0, 0];
        assert!(send_strip(&[1, 0], &starts, &subs, &zero, &zero)
            .unwrap()
            .is_none());
    }

    #[test]
    fn bad_offset_component_is_rejected() {
        let starts = vec![0];
        let subs = vec![4];
        let dims = vec![4];
        assert!(matches!(
            recv_strip(&[2], &starts, &subs, &dims),
            Err(Error::InvalidOffset(2))
        ));
        assert!(matches!(
            send_strip(&[-3], &starts, &subs, &[0], &[0]),
            Err(Error::InvalidOffset(-3))
        ));
    }
}
