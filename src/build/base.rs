use crate::error::{BuildError, Error};
use crate::spatial::SpatialIndex;
use crate::stream::PrimitiveReader;
use crate::topology::PrimitiveStore;

use super::{BuildPass, BuildStats, Progress};

/// Without a size hint, the pass logs its count this often.
const UNSIZED_REPORT_EVERY: u64 = 10_000;

/// Reads the whole stream into the store and indexes nodes and lines.
///
/// The stream is rewound first. An unreadable or malformed primitive aborts
/// the pass.
pub(crate) fn run(
    store: &mut PrimitiveStore,
    index: &mut SpatialIndex,
    reader: &mut dyn PrimitiveReader,
    stats: &mut BuildStats,
    sink: Option<&mut dyn FnMut(BuildPass, u8)>,
) -> Result<(), Error> {
    reader.rewind().map_err(|e| BuildError::Reader {
        index: 0,
        reason: e.to_string(),
    })?;
    let hint = reader.size_hint();
    let mut progress = Progress::new(sink, BuildPass::Base, hint.unwrap_or(0));
    progress.start();

    let mut read: u64 = 0;
    loop {
        let primitive = match reader.next_primitive() {
            Ok(Some(p)) => p,
            Ok(None) => break,
            Err(e) => {
                return Err(BuildError::Reader {
                    index: read,
                    reason: e.to_string(),
                }
                .into())
            }
        };
        let id = store
            .register(primitive.kind, primitive.points, primitive.cats)
            .map_err(|e| BuildError::MalformedPrimitive {
                index: read,
                reason: e.to_string(),
            })?;
        index.insert_line(id, store.line(id)?.bbox)?;
        read += 1;
        if hint.is_some() {
            progress.step(read);
        } else if read % UNSIZED_REPORT_EVERY == 0 {
            tracing::debug!(read, "primitives read");
        }
    }

    store.take_node_updates();
    for (id, node) in store.nodes() {
        index.insert_node(id, &node.point)?;
    }
    progress.finish();

    stats.primitives = read;
    stats.nodes = store.num_nodes();
    stats.lines = store.num_lines();
    tracing::debug!(
        primitives = read,
        nodes = stats.nodes,
        lines = stats.lines,
        "base topology built"
    );
    Ok(())
}
