use serde::Serialize;

/// One run-length-compressed segment of a path id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PathSegment {
    /// Index of the branch taken (edge position, or 0 for an epsilon step).
    pub branch: usize,
    /// How many consecutive times that index was taken.
    pub count: usize,
}

/// Structural identifier of one execution path through a run.
///
/// Extending with the same branch index collapses into the last segment's
/// count, so a loop that takes edge 0 a thousand times costs one segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct PathId(Vec<PathSegment>);

impl PathId {
    pub fn root() -> Self {
        Self::default()
    }

    /// A copy of this path extended by one branch.
    pub fn child(&self, branch: usize) -> Self {
        let mut segments = self.0.clone();
        match segments.last_mut() {
            Some(last) if last.branch == branch => last.count += 1,
            _ => segments.push(PathSegment { branch, count: 1 }),
        }
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Total number of transitions on this path.
    pub fn depth(&self) -> usize {
        self.0.iter().map(|s| s.count).sum()
    }
}

impl std::fmt::Display for PathId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "-");
        }
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|s| {
                if s.count > 1 {
                    format!("{}x{}", s.branch, s.count)
                } else {
                    s.branch.to_string()
                }
            })
            .collect();
        write!(f, "{}", parts.join("."))
    }
}
