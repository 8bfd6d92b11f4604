use crate::error::Error;
use crate::math::polygon_2d::{point_location, signed_area_2d, PointLocation};
use crate::spatial::SpatialIndex;
use crate::topology::{AreaId, IsleId, PrimitiveStore};

use super::{BuildPass, BuildStats, Progress};

/// Nests every isle in the smallest area whose outer ring contains it.
///
/// Candidates come from the area index (box containment). Containment is
/// decided on the first isle vertex that is not on the candidate's ring, so
/// an area built from the same boundaries as the isle never contains it.
pub(crate) fn run(
    store: &mut PrimitiveStore,
    index: &mut SpatialIndex,
    stats: &mut BuildStats,
    sink: Option<&mut dyn FnMut(BuildPass, u8)>,
) -> Result<(), Error> {
    let isles: Vec<IsleId> = store.isles().map(|(id, _)| id).collect();
    let mut progress = Progress::new(sink, BuildPass::AttachIsles, isles.len() as u64);

    let mut attached = 0;
    for (done, &isle) in isles.iter().enumerate() {
        if let Some(area) = containing_area(store, index, isle)? {
            store.attach_isle(isle, area)?;
            attached += 1;
        }
        progress.step(done as u64 + 1);
    }
    progress.finish();

    stats.attached_isles = attached;
    tracing::debug!(isles = isles.len(), attached, "isles attached");
    Ok(())
}

fn containing_area(
    store: &PrimitiveStore,
    index: &mut SpatialIndex,
    isle: IsleId,
) -> Result<Option<AreaId>, Error> {
    let ibox = store.isle(isle)?.bbox;
    let points = store.isle_points(isle)?;

    // (area, outer ring size, box size)
    let mut best: Option<(AreaId, f64, f64)> = None;
    for area in index.select_areas(&ibox)? {
        let abox = store.area(area)?.bbox;
        if !abox.contains_box_2d(&ibox) {
            continue;
        }
        let ring = store.area_points(area)?;
        let location = points
            .iter()
            .map(|p| point_location(p.x, p.y, &ring))
            .find(|l| *l != PointLocation::OnBoundary);
        if location != Some(PointLocation::Inside) {
            continue;
        }
        let size = signed_area_2d(&ring).abs();
        let box_size = abox.area_2d();
        let better = match best {
            None => true,
            Some((_, s, b)) => size < s || (size == s && box_size < b),
        };
        if better {
            best = Some((area, size, box_size));
        }
    }
    Ok(best.map(|(a, _, _)| a))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::config::MapConfig;
    use crate::map::Map;
    use crate::math::{BoundBox, Point3};
    use crate::stream::{Primitive, VecReader};
    use crate::topology::{BuildLevel, LineType};

    fn square(lo: f64, hi: f64) -> Primitive {
        let pts = [(lo, lo), (hi, lo), (hi, hi), (lo, hi), (lo, lo)]
            .iter()
            .map(|&(x, y)| Point3::new(x, y, 0.0))
            .collect();
        Primitive::new(LineType::Boundary, pts)
    }

    #[test]
    fn isle_goes_to_the_smallest_enclosing_area() {
        let prims = vec![square(0.0, 100.0), square(20.0, 80.0), square(40.0, 60.0)];
        let mut map = Map::open(MapConfig::default(), VecReader::new(prims)).unwrap();
        let stats = map.build(BuildLevel::AttachIsles).unwrap();
        assert_eq!(stats.areas, 3);
        assert_eq!(stats.isles, 3);
        assert_eq!(stats.attached_isles, 2);

        let outer = map.find_area(10.0, 10.0).unwrap().unwrap();
        let middle = map.find_area(30.0, 30.0).unwrap().unwrap();
        assert_ne!(outer, middle);

        let store = map.store();
        let outer_isles = &store.area(outer).unwrap().isles;
        assert_eq!(outer_isles.len(), 1);
        let ring = store.isle(outer_isles[0]).unwrap();
        assert_eq!(ring.bbox.max.x, 80.0);

        let middle_isles = &store.area(middle).unwrap().isles;
        assert_eq!(middle_isles.len(), 1);
        let inner = store.isle(middle_isles[0]).unwrap();
        assert_eq!(
            inner.bbox,
            BoundBox::from_points(&[Point3::new(40.0, 40.0, 0.0), Point3::new(60.0, 60.0, 0.0)])
        );
        assert_eq!(inner.area, Some(middle));
    }
}
