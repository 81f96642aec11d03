//! Halo-exchange laws on a small 2D case, for every halo policy:
//!
//! - after scatter + halo update, every local cell whose global position is
//!   in range holds the generating value; unfilled halo cells keep their
//!   sentinel
//! - a second halo update is a fixpoint (changes nothing)
//! - interiors are never corrupted by halo traffic
//! - Tight local buffer shapes match the boundary-face rule
//!
//! Uses a 12x12 array over a 3x3 grid with a 2-cell halo, so every tile is
//! 4x4. Run with: mpiexec -n 9 ./target/debug/examples/halo_fixpoint

use cartompi::{CartSplitter, Descriptor, HaloPolicy, Mpi};

const ROOT: i32 = 0;
const SENTINEL: f64 = -1.0;

fn value(r: i32, c: i32) -> f64 {
    100.0 * (r + 1) as f64 + c as f64
}

/// Verify the whole local buffer cell by cell: a cell whose global position
/// is in range must hold the generating value (interior via scatter, halo
/// via update); a cell outside the global array must still hold the
/// sentinel it was initialized with.
fn check_local(
    tag: &str,
    rank: i32,
    local: &[f64],
    dd: &Descriptor<f64>,
    dims: &[i32],
) {
    let l = dd.local_dims();
    let lpre = dd.local_starts();
    let g0 = dd.starts(rank)[0] - lpre[0];
    let g1 = dd.starts(rank)[1] - lpre[1];

    for a in 0..l[0] {
        for b in 0..l[1] {
            let got = local[(a * l[1] + b) as usize];
            let r = g0 + a;
            let c = g1 + b;
            let in_range = r >= 0 && r < dims[0] && c >= 0 && c < dims[1];
            let expected = if in_range { value(r, c) } else { SENTINEL };
            assert_eq!(
                got, expected,
                "{tag}: rank {rank} local ({a},{b}) -> global ({r},{c})"
            );
        }
    }
}

fn run_policy(cs: &CartSplitter, dims: &[i32], policy: HaloPolicy) -> cartompi::Result<()> {
    let rank = cs.rank()?;
    let dd = cs.create_descriptor_uniform::<f64>(dims, 2, 2, policy)?;

    if policy == HaloPolicy::Unused {
        assert_eq!(dd.local_dims(), dd.local_sub_sizes());
    }
    if policy == HaloPolicy::Tight {
        // tiles are 4x4; boundary faces reserve nothing
        let expected: Vec<i32> = cs
            .coords()?
            .iter()
            .zip(cs.dims()?)
            .map(|(&c, &g)| 4 + 2 * i32::from(c > 0) + 2 * i32::from(c < g - 1))
            .collect();
        assert_eq!(dd.local_dims(), expected.as_slice(), "tight local shape");
    }

    let data = if rank == ROOT {
        let mut data = vec![0.0f64; dd.total_size()];
        for r in 0..dims[0] {
            for c in 0..dims[1] {
                data[(r * dims[1] + c) as usize] = value(r, c);
            }
        }
        data
    } else {
        Vec::new()
    };

    let mut local = vec![SENTINEL; dd.local_size()];
    cs.scatter(&data, &mut local, ROOT, &dd)?;

    if policy == HaloPolicy::Unused {
        // no halos reserved: the update must leave the buffer untouched
        let before = local.clone();
        cs.halo_update(&mut local, &dd)?;
        assert_eq!(local, before, "halo update with Unused policy is a no-op");
    } else {
        cs.halo_update(&mut local, &dd)?;
    }

    check_local("after first update", rank, &local, &dd, dims);

    // idempotence: repeating the exchange with an unmodified interior is a
    // fixpoint
    let before = local.clone();
    cs.halo_update(&mut local, &dd)?;
    assert_eq!(local, before, "second halo update changed the buffer");

    cs.barrier()?;
    if rank == ROOT {
        println!("PASS: {policy:?}");
    }
    Ok(())
}

fn main() -> cartompi::Result<()> {
    tracing_subscriber::fmt::init();

    let mpi = Mpi::init()?;

    // When one rank panics the others would block forever inside a
    // collective; abort so every rank exits.
    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        std::process::abort();
    }));

    let world = mpi.world();
    let dims = [12i32, 12];
    let cs = CartSplitter::new(&[3, 3], &[false, false], &world, true)?;

    if cs.in_grid() {
        run_policy(&cs, &dims, HaloPolicy::Unused)?;
        run_policy(&cs, &dims, HaloPolicy::Full)?;
        run_policy(&cs, &dims, HaloPolicy::Tight)?;
    }

    world.barrier()?;
    Ok(())
}
