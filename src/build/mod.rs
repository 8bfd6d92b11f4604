//! Build passes turning a primitive stream into topology.
//!
//! Each pass raises the map by one [`BuildLevel`](crate::topology::BuildLevel)
//! and only reads state produced by the passes below it.

pub(crate) mod areas;
pub(crate) mod base;
pub(crate) mod categories;
pub(crate) mod centroids;
pub(crate) mod isles;

use std::fmt;

/// A build pass, as reported to progress callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildPass {
    /// Reading primitives, creating nodes and lines.
    Base,
    /// Ring tracing.
    Areas,
    /// Nesting isles in areas.
    AttachIsles,
    /// Binding centroids to areas.
    Centroids,
    /// Filling the category index.
    Categories,
}

impl fmt::Display for BuildPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildPass::Base => "base",
            BuildPass::Areas => "areas",
            BuildPass::AttachIsles => "attach isles",
            BuildPass::Centroids => "centroids",
            BuildPass::Categories => "categories",
        };
        f.write_str(name)
    }
}

/// Summary counts of the topology built so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Primitives consumed from the stream by the last base pass.
    pub primitives: u64,
    pub nodes: usize,
    pub lines: usize,
    pub areas: usize,
    pub isles: usize,
    /// Isles nested in an area.
    pub attached_isles: usize,
    /// Boundary sides for which no closed ring was found.
    pub open_rings: usize,
    /// Centroids bound to an area.
    pub bound_centroids: usize,
    /// Centroids inside an area that already had one.
    pub duplicate_centroids: usize,
    /// Centroids outside every area.
    pub orphan_centroids: usize,
    /// Entries in the category index.
    pub category_entries: usize,
}

/// Percentage reporter for one pass.
///
/// Calls the sink (and logs at `debug`) whenever the integer percentage
/// changes.
pub(crate) struct Progress<'a> {
    sink: Option<&'a mut dyn FnMut(BuildPass, u8)>,
    pass: BuildPass,
    total: u64,
    last: Option<u8>,
}

impl<'a> Progress<'a> {
    pub(crate) fn new(
        sink: Option<&'a mut dyn FnMut(BuildPass, u8)>,
        pass: BuildPass,
        total: u64,
    ) -> Self {
        Self {
            sink,
            pass,
            total,
            last: None,
        }
    }

    pub(crate) fn start(&mut self) {
        self.emit(0);
    }

    /// Reports `done` of `total` items processed.
    pub(crate) fn step(&mut self, done: u64) {
        let pct = if self.total == 0 {
            100
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let p = (done.min(self.total) * 100 / self.total) as u8;
            p
        };
        self.emit(pct);
    }

    pub(crate) fn finish(&mut self) {
        self.emit(100);
    }

    fn emit(&mut self, pct: u8) {
        if self.last == Some(pct) {
            return;
        }
        self.last = Some(pct);
        tracing::debug!(pass = %self.pass, percent = pct, "build progress");
        if let Some(sink) = self.sink.as_mut() {
            sink(self.pass, pct);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn progress_reports_each_percentage_once() {
        let mut seen = Vec::new();
        let mut sink = |pass: BuildPass, pct: u8| seen.push((pass, pct));
        let mut p = Progress::new(Some(&mut sink), BuildPass::Areas, 400);
        for i in 0..=400 {
            p.step(i);
        }
        p.finish();
        drop(p);
        assert_eq!(seen.len(), 101);
        assert_eq!(seen[0], (BuildPass::Areas, 0));
        assert_eq!(seen[100], (BuildPass::Areas, 100));
    }

    #[test]
    fn empty_pass_reports_completion() {
        let mut seen = Vec::new();
        let mut sink = |_: BuildPass, pct: u8| seen.push(pct);
        let mut p = Progress::new(Some(&mut sink), BuildPass::Base, 0);
        p.step(0);
        p.finish();
        drop(p);
        assert_eq!(seen, vec![100]);
    }
}
