use std::fmt;

/// How much derived topology has been computed for a map.
///
/// Levels are strictly ordered; every level implies all lower ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum BuildLevel {
    /// Nothing is built.
    #[default]
    None,
    /// Nodes, lines and the running bounding box.
    Base,
    /// Areas and isles traced from boundaries.
    Areas,
    /// Isles attached to the areas that contain them.
    AttachIsles,
    /// Centroids bound to areas.
    Centroids,
    /// Category index.
    All,
}

impl BuildLevel {
    /// Every level in build order.
    pub const ORDER: [BuildLevel; 6] = [
        BuildLevel::None,
        BuildLevel::Base,
        BuildLevel::Areas,
        BuildLevel::AttachIsles,
        BuildLevel::Centroids,
        BuildLevel::All,
    ];

    /// The level directly below this one, if any.
    #[must_use]
    pub fn previous(self) -> Option<BuildLevel> {
        match self {
            BuildLevel::None => None,
            BuildLevel::Base => Some(BuildLevel::None),
            BuildLevel::Areas => Some(BuildLevel::Base),
            BuildLevel::AttachIsles => Some(BuildLevel::Areas),
            BuildLevel::Centroids => Some(BuildLevel::AttachIsles),
            BuildLevel::All => Some(BuildLevel::Centroids),
        }
    }

    /// The level directly above this one, if any.
    #[must_use]
    pub fn next(self) -> Option<BuildLevel> {
        match self {
            BuildLevel::None => Some(BuildLevel::Base),
            BuildLevel::Base => Some(BuildLevel::Areas),
            BuildLevel::Areas => Some(BuildLevel::AttachIsles),
            BuildLevel::AttachIsles => Some(BuildLevel::Centroids),
            BuildLevel::Centroids => Some(BuildLevel::All),
            BuildLevel::All => None,
        }
    }
}

impl fmt::Display for BuildLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildLevel::None => "NONE",
            BuildLevel::Base => "BASE",
            BuildLevel::Areas => "AREAS",
            BuildLevel::AttachIsles => "ATTACH_ISLES",
            BuildLevel::Centroids => "CENTROIDS",
            BuildLevel::All => "ALL",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered() {
        for w in BuildLevel::ORDER.windows(2) {
            assert!(w[0] < w[1]);
            assert_eq!(w[0].next(), Some(w[1]));
            assert_eq!(w[1].previous(), Some(w[0]));
        }
    }

    #[test]
    fn display_names() {
        assert_eq!(BuildLevel::AttachIsles.to_string(), "ATTACH_ISLES");
        assert_eq!(BuildLevel::default(), BuildLevel::None);
    }
}
