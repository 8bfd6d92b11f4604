use crate::error::Error;
use crate::math::BoundBox;
use crate::spatial::SpatialIndex;
use crate::topology::{AreaId, CentroidArea, LineId, LineType, PrimitiveStore};

use super::{BuildPass, BuildStats, Progress};

/// Area containing `(x, y)`, isles excluded. When several areas qualify
/// (the point lies on a shared boundary) the one with the smallest box wins.
pub(crate) fn find_area(
    store: &PrimitiveStore,
    index: &mut SpatialIndex,
    x: f64,
    y: f64,
) -> Result<Option<AreaId>, Error> {
    let mut best: Option<(AreaId, f64)> = None;
    for area in index.select_areas(&BoundBox::from_xy(x, y, x, y))? {
        if !store.point_in_area(x, y, area)? {
            continue;
        }
        let size = store.area(area)?.bbox.area_2d();
        if best.map_or(true, |(_, s)| size < s) {
            best = Some((area, size));
        }
    }
    Ok(best.map(|(a, _)| a))
}

/// Binds every centroid to the area it lies in. The first centroid of an
/// area binds; later ones are flagged as duplicates.
pub(crate) fn run(
    store: &mut PrimitiveStore,
    index: &mut SpatialIndex,
    stats: &mut BuildStats,
    sink: Option<&mut dyn FnMut(BuildPass, u8)>,
) -> Result<(), Error> {
    let centroids: Vec<LineId> = store
        .lines()
        .filter(|(_, l)| l.kind == LineType::Centroid)
        .map(|(id, _)| id)
        .collect();
    let mut progress = Progress::new(sink, BuildPass::Centroids, centroids.len() as u64);

    stats.bound_centroids = 0;
    stats.duplicate_centroids = 0;
    stats.orphan_centroids = 0;
    for (done, &id) in centroids.iter().enumerate() {
        let p = store.line(id)?.points[0];
        let area = find_area(store, index, p.x, p.y)?;
        match store.bind_centroid(id, area)? {
            CentroidArea::Bound(_) => stats.bound_centroids += 1,
            CentroidArea::Duplicate(area) => {
                stats.duplicate_centroids += 1;
                tracing::warn!(centroid = ?id, ?area, "area already has a centroid");
            }
            CentroidArea::Outside => stats.orphan_centroids += 1,
        }
        progress.step(done as u64 + 1);
    }
    progress.finish();

    tracing::debug!(
        bound = stats.bound_centroids,
        duplicate = stats.duplicate_centroids,
        outside = stats.orphan_centroids,
        "centroids attached"
    );
    Ok(())
}
