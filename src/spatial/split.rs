//! Quadratic node split (Guttman).

use crate::config::IndexDims;
use crate::math::BoundBox;

use super::node::{Branch, MINFILL};

/// Size measure minimized by the split: planar area, or volume for 3D trees.
pub(crate) fn measure(rect: &BoundBox, dims: IndexDims) -> f64 {
    match dims {
        IndexDims::Two => rect.area_2d(),
        IndexDims::Three => rect.volume(),
    }
}

/// Distributes an overfull branch list over two groups.
///
/// Seeds are the pair wasting the most space when covered together. The
/// remaining entries are assigned one at a time, most decisive first, to the
/// group whose cover grows least. Each group ends with at least
/// [`MINFILL`] entries.
pub(crate) fn quadratic_split(
    branches: Vec<Branch>,
    dims: IndexDims,
) -> (Vec<Branch>, Vec<Branch>) {
    let n = branches.len();
    let (s1, s2) = pick_seeds(&branches, dims);

    let mut groups: [Vec<Branch>; 2] = [Vec::with_capacity(n), Vec::with_capacity(n)];
    let mut covers = [branches[s1].rect, branches[s2].rect];
    let mut pending: Vec<Branch> = Vec::with_capacity(n);
    for (i, b) in branches.into_iter().enumerate() {
        if i == s1 {
            groups[0].push(b);
        } else if i == s2 {
            groups[1].push(b);
        } else {
            pending.push(b);
        }
    }

    while !pending.is_empty() {
        for g in 0..2 {
            if groups[g].len() + pending.len() <= MINFILL {
                groups[g].append(&mut pending);
                return (
                    std::mem::take(&mut groups[0]),
                    std::mem::take(&mut groups[1]),
                );
            }
        }

        let mut best = 0;
        let mut best_diff = f64::NEG_INFINITY;
        let mut best_growth = [0.0, 0.0];
        for (i, b) in pending.iter().enumerate() {
            let growth = [
                measure(&covers[0].union(&b.rect), dims) - measure(&covers[0], dims),
                measure(&covers[1].union(&b.rect), dims) - measure(&covers[1], dims),
            ];
            let diff = (growth[0] - growth[1]).abs();
            if diff > best_diff {
                best_diff = diff;
                best = i;
                best_growth = growth;
            }
        }

        let g = if best_growth[0] < best_growth[1] {
            0
        } else if best_growth[1] < best_growth[0] {
            1
        } else if measure(&covers[0], dims) < measure(&covers[1], dims) {
            0
        } else if measure(&covers[1], dims) < measure(&covers[0], dims) {
            1
        } else if groups[0].len() <= groups[1].len() {
            0
        } else {
            1
        };
        let b = pending.swap_remove(best);
        covers[g] = covers[g].union(&b.rect);
        groups[g].push(b);
    }

    let [a, b] = groups;
    (a, b)
}

fn pick_seeds(branches: &[Branch], dims: IndexDims) -> (usize, usize) {
    let mut seeds = (0, 1);
    let mut worst = f64::NEG_INFINITY;
    for i in 0..branches.len() {
        for j in i + 1..branches.len() {
            let a = &branches[i].rect;
            let b = &branches[j].rect;
            let waste = measure(&a.union(b), dims) - measure(a, dims) - measure(b, dims);
            if waste > worst {
                worst = waste;
                seeds = (i, j);
            }
        }
    }
    seeds
}
