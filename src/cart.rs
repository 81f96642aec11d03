//! Cartesian topology splitter and the collectives built on it.
//!
//! [`CartSplitter`] derives a rectangular process grid of arbitrary rank
//! from an origin communicator, resolves every first-neighbor relationship
//! up front, and computes the tile partition of any global shape. It is the
//! sole constructor of [`Descriptor`]s, and it hosts the three collectives
//! (scatter, gather, halo update) as thin dispatchers over a descriptor's
//! prebuilt views.

use crate::comm::Communicator;
use crate::datatype::Element;
use crate::descriptor::{Descriptor, HaloPolicy};
use crate::error::{Error, Result};
use crate::request::Request;
use crate::shape;
use crate::NULL_RANK;

/// Message tags, one per collective. Both endpoints of every transfer agree
/// on these by construction.
const TAG_SCATTER: i32 = 333;
const TAG_GATHER: i32 = 666;
const TAG_HALO: i32 = 11;

/// Placeholder primitive handle for zero-count sides of a halo exchange.
const PLACEHOLDER_TYPE: i32 = crate::ElementTag::I32 as i32;

/// A Cartesian arrangement of peers with per-axis periodicity.
///
/// Construction is collective over the origin communicator. Peers that do
/// not fit in the grid (origin size exceeds `prod(dims)`) come back with
/// [`in_grid`](Self::in_grid) `false` and hold no substrate resources;
/// every grid-dependent method on such a peer fails with
/// [`Error::NotInGrid`].
///
/// A splitter owns its derived communicator and must not be duplicated;
/// dropping it releases the communicator.
pub struct CartSplitter {
    dims: Vec<i32>,
    periodicity: Vec<bool>,
    comm: Option<Communicator>,
    rank: i32,
    size: i32,
    coords: Vec<i32>,
    directions: Vec<Vec<i32>>,
    dest_neighbours: Vec<i32>,
    src_neighbours: Vec<i32>,
}

impl CartSplitter {
    /// Derive a Cartesian grid from `origin`.
    ///
    /// `dims` gives the per-axis grid extents, `periodicity` the per-axis
    /// wrap-around flags; with `reorder` the runtime may permute peer
    /// identities for locality.
    ///
    /// # Errors
    ///
    /// [`Error::ShapeMismatch`] when `dims` and `periodicity` disagree in
    /// length; [`Error::InsufficientPeers`] when the grid needs more peers
    /// than `origin` holds.
    pub fn new(
        dims: &[i32],
        periodicity: &[bool],
        origin: &Communicator,
        reorder: bool,
    ) -> Result<Self> {
        if dims.len() != periodicity.len() {
            return Err(Error::ShapeMismatch {
                expected: dims.len(),
                actual: periodicity.len(),
            });
        }

        let available = origin.size();
        let needed = shape::prod(dims);
        if needed > i64::from(available) {
            return Err(Error::InsufficientPeers { needed, available });
        }

        let periods: Vec<i32> = periodicity.iter().map(|&p| i32::from(p)).collect();
        let comm = origin.cart_create(dims, &periods, reorder)?;

        let mut splitter = CartSplitter {
            dims: dims.to_vec(),
            periodicity: periodicity.to_vec(),
            comm,
            rank: NULL_RANK,
            size: 0,
            coords: Vec::new(),
            directions: Vec::new(),
            dest_neighbours: Vec::new(),
            src_neighbours: Vec::new(),
        };

        if let Some(comm) = &splitter.comm {
            splitter.rank = comm.rank();
            splitter.size = comm.size();
            splitter.coords = comm.cart_coords(splitter.rank, dims.len())?;
            splitter.directions = fill_directions(dims.len());
        }

        if splitter.in_grid() {
            let mut dest = Vec::with_capacity(splitter.directions.len());
            let mut src = Vec::with_capacity(splitter.directions.len());
            for off in &splitter.directions {
                dest.push(splitter.rank_by_offset(off)?);
                src.push(splitter.rank_by_offset(&shape::neg(off))?);
            }
            splitter.dest_neighbours = dest;
            splitter.src_neighbours = src;

            tracing::debug!(
                rank = splitter.rank,
                size = splitter.size,
                coords = ?splitter.coords,
                "joined cartesian grid"
            );
        }

        Ok(splitter)
    }

    /// Whether this peer was mapped into the grid.
    pub fn in_grid(&self) -> bool {
        self.comm.is_some()
    }

    /// The grid communicator (debug and driver use only).
    ///
    /// Collectives should go through the splitter; this accessor exists for
    /// drivers that need raw point-to-point between grid ranks.
    pub fn communicator(&self) -> Result<&Communicator> {
        self.grid_comm("communicator()")
    }

    fn grid_comm(&self, what: &'static str) -> Result<&Communicator> {
        self.comm.as_ref().ok_or(Error::NotInGrid(what))
    }

    /// This peer's rank inside the grid communicator.
    ///
    /// With `reorder` the rank may differ from the rank in the origin
    /// communicator.
    pub fn rank(&self) -> Result<i32> {
        self.grid_comm("rank()")?;
        Ok(self.rank)
    }

    /// Number of peers in the grid (`prod(dims)`).
    pub fn size(&self) -> Result<i32> {
        self.grid_comm("size()")?;
        Ok(self.size)
    }

    /// Per-axis grid extents.
    pub fn dims(&self) -> Result<&[i32]> {
        self.grid_comm("dims()")?;
        Ok(&self.dims)
    }

    /// This peer's grid coordinates.
    pub fn coords(&self) -> Result<&[i32]> {
        self.grid_comm("coords()")?;
        Ok(&self.coords)
    }

    /// The first-neighbor offset table, in the contractual enumeration
    /// order (axis 0 fastest over the alphabet `[-1, +1, 0]`, the all-zero
    /// entry omitted). Empty on peers outside the grid.
    ///
    /// Direction `ii` is the one exploited in the exchange
    /// `src_neighbours[ii] -> me -> dest_neighbours[ii]`.
    pub fn directions(&self) -> &[Vec<i32>] {
        &self.directions
    }

    /// Rank at `coords + directions[ii]` for each direction, or
    /// [`NULL_RANK`] when that neighbor is off-grid.
    pub fn dest_neighbours(&self) -> &[i32] {
        &self.dest_neighbours
    }

    /// Rank at `coords - directions[ii]` for each direction, or
    /// [`NULL_RANK`] when that neighbor is off-grid.
    pub fn src_neighbours(&self) -> &[i32] {
        &self.src_neighbours
    }

    /// Check whether a coordinate tuple names a peer.
    ///
    /// Each axis passes when it is periodic (any value wraps) or the
    /// component lies in `[0, dims)`.
    pub fn coords_check(&self, coords: &[i32]) -> Result<bool> {
        if coords.len() != self.dims.len() {
            return Err(Error::ShapeMismatch {
                expected: self.dims.len(),
                actual: coords.len(),
            });
        }
        Ok(self
            .periodicity
            .iter()
            .zip(coords)
            .zip(&self.dims)
            .all(|((&p, &c), &d)| p || (c >= 0 && c < d)))
    }

    /// Resolve grid coordinates to a rank.
    ///
    /// Returns [`NULL_RANK`] when the coordinates leave the grid on a
    /// non-periodic axis; periodic axes wrap.
    pub fn rank_of(&self, coords: &[i32]) -> Result<i32> {
        let comm = self.grid_comm("rank_of()")?;
        if !self.coords_check(coords)? {
            return Ok(NULL_RANK);
        }
        comm.cart_rank(coords)
    }

    /// Resolve the rank of the peer at `coords + offset`.
    pub fn rank_by_offset(&self, offset: &[i32]) -> Result<i32> {
        self.grid_comm("rank_by_offset()")?;
        if offset.len() != self.dims.len() {
            return Err(Error::ShapeMismatch {
                expected: self.dims.len(),
                actual: offset.len(),
            });
        }
        self.rank_of(&shape::add(&self.coords, offset))
    }

    /// Resolve a rank to its grid coordinates.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] when `rank` is outside `[0, size)`.
    pub fn coords_of(&self, rank: i32) -> Result<Vec<i32>> {
        let comm = self.grid_comm("coords_of()")?;
        if rank < 0 || rank >= self.size {
            return Err(Error::OutOfRange(format!(
                "rank {rank} not in [0, {})",
                self.size
            )));
        }
        comm.cart_coords(rank, self.dims.len())
    }

    /// Compute the tile partition of a global shape for every peer.
    ///
    /// Returns `(sub_sizes, starts)`, indexed by rank: the interior extent
    /// of each peer's tile and its origin inside the global array. Along
    /// each axis the tiles tile `0..data_dims[d]` contiguously without
    /// overlap; the first `data % grid` peers take one extra element.
    pub fn eval_dims_offsets(
        &self,
        data_dims: &[i32],
    ) -> Result<(Vec<Vec<i32>>, Vec<Vec<i32>>)> {
        self.grid_comm("eval_dims_offsets()")?;
        if data_dims.len() != self.dims.len() {
            return Err(Error::ShapeMismatch {
                expected: self.dims.len(),
                actual: data_dims.len(),
            });
        }

        let mut sub_sizes = Vec::with_capacity(self.size as usize);
        let mut starts = Vec::with_capacity(self.size as usize);
        for node in 0..self.size {
            let coo = self.coords_of(node)?;
            let (sub, start) = tile_extents(data_dims, &self.dims, &coo);
            sub_sizes.push(sub);
            starts.push(start);
        }
        Ok((sub_sizes, starts))
    }

    /// Synchronization barrier over the grid communicator.
    ///
    /// Must be called by every in-grid peer.
    pub fn barrier(&self) -> Result<()> {
        self.grid_comm("barrier()")?.barrier()
    }

    /// Build a [`Descriptor`] for a global shape with per-axis halo widths.
    ///
    /// `halo_pre[d]` / `halo_post[d]` give the requested widths before and
    /// after the interior on axis `d`; `policy` decides which faces
    /// actually reserve them.
    pub fn create_descriptor<T: Element>(
        &self,
        data_dims: &[i32],
        halo_pre: &[i32],
        halo_post: &[i32],
        policy: HaloPolicy,
    ) -> Result<Descriptor<T>> {
        self.grid_comm("create_descriptor()")?;
        if halo_pre.len() != data_dims.len() {
            return Err(Error::ShapeMismatch {
                expected: data_dims.len(),
                actual: halo_pre.len(),
            });
        }
        if halo_post.len() != data_dims.len() {
            return Err(Error::ShapeMismatch {
                expected: data_dims.len(),
                actual: halo_post.len(),
            });
        }

        let (sub_sizes, starts) = self.eval_dims_offsets(data_dims)?;
        Descriptor::build(
            data_dims.to_vec(),
            sub_sizes,
            starts,
            halo_pre,
            halo_post,
            policy,
            &self.coords,
            &self.dims,
            self.rank,
            &self.directions,
        )
    }

    /// Build a [`Descriptor`] with one halo width broadcast across all axes.
    pub fn create_descriptor_uniform<T: Element>(
        &self,
        data_dims: &[i32],
        halo_pre: i32,
        halo_post: i32,
        policy: HaloPolicy,
    ) -> Result<Descriptor<T>> {
        let pre = vec![halo_pre; data_dims.len()];
        let post = vec![halo_post; data_dims.len()];
        self.create_descriptor(data_dims, &pre, &post, policy)
    }

    // ========================================================================
    // Collectives
    // ========================================================================

    /// Distribute a global array into per-peer local buffers.
    ///
    /// `data` must hold [`Descriptor::total_size`] elements at `root`;
    /// `local_data` must hold [`Descriptor::local_size`] elements on every
    /// peer. Only the interior of `local_data` is defined afterwards; the
    /// halo region is untouched (see [`halo_update`](Self::halo_update)).
    ///
    /// Collective: every in-grid peer must call with the same `root`.
    pub fn scatter<T: Element>(
        &self,
        data: &[T],
        local_data: &mut [T],
        root: i32,
        dd: &Descriptor<T>,
    ) -> Result<()> {
        let comm = self.grid_comm("scatter()")?;
        if local_data.len() != dd.local_size() {
            return Err(Error::InvalidBuffer);
        }

        let requests = if self.rank == root {
            if data.len() != dd.total_size() {
                return Err(Error::InvalidBuffer);
            }
            (0..self.size)
                .map(|node| comm.isend_view(data, dd.root_view(node), node, TAG_SCATTER))
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        comm.recv_view(local_data, dd.local_view(), root, TAG_SCATTER)?;

        Request::wait_all(requests)
    }

    /// Collect the interior of every peer's local buffer into a global
    /// array at `root`.
    ///
    /// `new_data` must hold [`Descriptor::total_size`] elements at `root`.
    /// Halo cells are never transferred.
    ///
    /// Collective: every in-grid peer must call with the same `root`.
    pub fn gather<T: Element>(
        &self,
        local_data: &[T],
        new_data: &mut [T],
        root: i32,
        dd: &Descriptor<T>,
    ) -> Result<()> {
        let comm = self.grid_comm("gather()")?;
        if local_data.len() != dd.local_size() {
            return Err(Error::InvalidBuffer);
        }

        let requests = if self.rank == root {
            if new_data.len() != dd.total_size() {
                return Err(Error::InvalidBuffer);
            }
            (0..self.size)
                .map(|node| comm.irecv_view(new_data, dd.root_view(node), node, TAG_GATHER))
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        comm.send_view(local_data, dd.local_view(), root, TAG_GATHER)?;

        Request::wait_all(requests)
    }

    /// Exchange boundary strips with every first neighbor.
    ///
    /// After the call each reserved halo face of `local_data` holds a copy
    /// of the adjacent interior of the corresponding neighbor. Directions
    /// are walked sequentially in the contractual enumeration order with
    /// one combined send-and-receive per step, which pairs up across peers
    /// and cannot deadlock. Off-grid neighbors and unreserved faces take
    /// part with zero-element transfers.
    ///
    /// Collective: every in-grid peer must call.
    pub fn halo_update<T: Element>(&self, local_data: &mut [T], dd: &Descriptor<T>) -> Result<()> {
        let comm = self.grid_comm("halo_update()")?;
        if local_data.len() != dd.local_size() {
            return Err(Error::InvalidBuffer);
        }

        for ii in 0..self.directions.len() {
            let dest = self.dest_neighbours[ii];
            let source = self.src_neighbours[ii];

            let (sendcount, sendtype) = match dd.send_view(ii) {
                Some(view) if dest != NULL_RANK => (1, view.raw_handle()),
                _ => (0, PLACEHOLDER_TYPE),
            };
            let (recvcount, recvtype) = match dd.recv_view(ii) {
                Some(view) if source != NULL_RANK => (1, view.raw_handle()),
                _ => (0, PLACEHOLDER_TYPE),
            };

            comm.sendrecv_within::<T>(
                local_data, sendcount, sendtype, dest, TAG_HALO, recvcount, recvtype, source,
                TAG_HALO,
            )?;
        }
        Ok(())
    }
}

impl Drop for CartSplitter {
    fn drop(&mut self) {
        if let Some(comm) = &mut self.comm {
            if let Err(e) = comm.release() {
                tracing::error!(error = %e, "failed to release cartesian communicator");
            }
        }
    }
}

/// Enumerate all first-neighbor offsets for a topology of rank `d`.
///
/// The per-axis alphabet is `[-1, +1, 0]`; index `ii` has component
/// `alphabet[(ii / 3^j) % 3]` on axis `j`, so axis 0 changes fastest. The
/// all-zero combination would occupy the final slot and is omitted, leaving
/// `3^d - 1` entries. This order is contractual: the collectives and their
/// tests rely on it.
fn fill_directions(d: usize) -> Vec<Vec<i32>> {
    const ALPHABET: [i32; 3] = [-1, 1, 0];

    let n = 3usize.pow(d as u32) - 1;
    let mut directions = vec![vec![0i32; d]; n];

    let mut burst = 1;
    for jj in 0..d {
        for (ii, dir) in directions.iter_mut().enumerate() {
            dir[jj] = ALPHABET[(ii / burst) % ALPHABET.len()];
        }
        burst *= ALPHABET.len();
    }

    directions
}

/// Tile extent and origin of the peer at `coo`, per axis.
///
/// With `q = data / grid` and `r = data % grid`, coordinate `c` gets extent
/// `q + 1` when `c < r` (else `q`) and origin `c*q + min(c, r)`, giving a
/// contiguous, non-overlapping cover of `0..data`.
fn tile_extents(data_dims: &[i32], grid_dims: &[i32], coo: &[i32]) -> (Vec<i32>, Vec<i32>) {
    let tile = shape::div(data_dims, grid_dims);
    let rest = shape::rem(data_dims, grid_dims);

    let d = data_dims.len();
    let mut sub = vec![0i32; d];
    let mut start = vec![0i32; d];
    for dd in 0..d {
        sub[dd] = tile[dd] + i32::from(coo[dd] < rest[dd]);
        start[dd] = coo[dd] * tile[dd] + coo[dd].min(rest[dd]);
    }
    (sub, start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_1d() {
        assert_eq!(fill_directions(1), vec![vec![-1], vec![1]]);
    }

    #[test]
    fn directions_2d_enumeration_is_contractual() {
        let dirs = fill_directions(2);
        let expected = [
            [-1, -1],
            [1, -1],
            [0, -1],
            [-1, 1],
            [1, 1],
            [0, 1],
            [-1, 0],
            [1, 0],
        ];
        assert_eq!(dirs.len(), 8);
        for (got, want) in dirs.iter().zip(&expected) {
            assert_eq!(got.as_slice(), want.as_slice());
        }
    }

    #[test]
    fn directions_count_is_three_pow_d_minus_one() {
        for d in 1..=4 {
            let dirs = fill_directions(d);
            assert_eq!(dirs.len(), 3usize.pow(d as u32) - 1);
            // the all-zero entry is never generated
            assert!(dirs.iter().all(|dir| dir.iter().any(|&c| c != 0)));
        }
    }

    #[test]
    fn directions_match_index_formula() {
        const ALPHABET: [i32; 3] = [-1, 1, 0];
        let dirs = fill_directions(3);
        for (ii, dir) in dirs.iter().enumerate() {
            for jj in 0..3 {
                assert_eq!(dir[jj], ALPHABET[(ii / 3usize.pow(jj as u32)) % 3]);
            }
        }
    }

    #[test]
    fn tile_extents_known_case() {
        // 1000^3 over a 3x3x3 grid
        let data = [1000, 1000, 1000];
        let grid = [3, 3, 3];

        let (sub, start) = tile_extents(&data, &grid, &[0, 0, 0]);
        assert_eq!(sub, vec![334, 334, 334]);
        assert_eq!(start, vec![0, 0, 0]);

        let (sub, start) = tile_extents(&data, &grid, &[2, 2, 2]);
        assert_eq!(sub, vec![333, 333, 333]);
        assert_eq!(start, vec![667, 667, 667]);
    }

    #[test]
    fn tiles_cover_each_axis_without_gaps() {
        let data = [17];
        let grid = [5];
        let q = data[0] / grid[0];

        let mut covered = 0;
        for c in 0..grid[0] {
            let (sub, start) = tile_extents(&data, &grid, &[c]);
            assert_eq!(start[0], covered, "tiles must be adjacent");
            assert!(sub[0] == q || sub[0] == q + 1);
            covered += sub[0];
        }
        assert_eq!(covered, data[0]);
    }

    #[test]
    fn adjacent_tiles_share_a_boundary() {
        let data = [1200, 1200];
        let grid = [3, 3];
        for c in 0..2 {
            let (sub, start) = tile_extents(&data, &grid, &[c, 1]);
            let (_, next_start) = tile_extents(&data, &grid, &[c + 1, 1]);
            assert_eq!(start[0] + sub[0], next_start[0]);
        }
    }
}
