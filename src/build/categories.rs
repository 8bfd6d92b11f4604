use crate::topology::{CategoryIndex, Feature, PrimitiveStore};

use super::{BuildPass, BuildStats, Progress};

/// Rebuilds the category index: one entry per category of every line, plus
/// area entries carrying the categories of their bound centroid.
pub(crate) fn run(
    store: &mut PrimitiveStore,
    stats: &mut BuildStats,
    sink: Option<&mut dyn FnMut(BuildPass, u8)>,
) {
    let total = (store.num_lines() + store.num_areas()) as u64;
    let mut progress = Progress::new(sink, BuildPass::Categories, total);

    let mut cidx = CategoryIndex::new();
    let mut done = 0;
    for (id, line) in store.lines() {
        cidx.add_all(&line.cats, Feature::Line { kind: line.kind, id });
        done += 1;
        progress.step(done);
    }
    for (id, area) in store.areas() {
        if let Some(centroid) = area.centroid.and_then(|c| store.line(c).ok()) {
            cidx.add_all(&centroid.cats, Feature::Area(id));
        }
        done += 1;
        progress.step(done);
    }
    cidx.sort();
    progress.finish();

    stats.category_entries = cidx.len();
    tracing::debug!(
        layers = cidx.layers().len(),
        entries = cidx.len(),
        "category index built"
    );
    *store.category_index_mut() = cidx;
}
