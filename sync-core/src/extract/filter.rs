//! Declarative keep-path filter.

/// What to do with a field at a given path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Not on any keep path: consume and discard.
    Skip,
    /// An ancestor of a keep path: keep the container, filter its children.
    Descend,
    /// On or below a keep path: keep the whole subtree.
    Keep,
}

/// A set of dotted field paths to retain during decode.
///
/// Each path keeps its whole subtree. A `*` segment matches any object key.
/// Array elements share their parent's path, so `rooms.join` keeps every
/// timeline array underneath it.
#[derive(Debug, Clone, Default)]
pub struct KeepPaths {
    paths: Vec<Vec<String>>,
}

impl KeepPaths {
    /// Build a filter from dotted paths such as `"rooms.join"`.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths = paths
            .into_iter()
            .map(|p| {
                p.as_ref()
                    .split('.')
                    .filter(|seg| !seg.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|segs| !segs.is_empty())
            .collect();
        Self { paths }
    }

    /// Decide what to do with the field at `path`.
    pub fn verdict<S: AsRef<str>>(&self, path: &[S]) -> Verdict {
        let mut verdict = Verdict::Skip;
        for pattern in &self.paths {
            let shared = pattern.len().min(path.len());
            let matches = pattern[..shared]
                .iter()
                .zip(&path[..shared])
                .all(|(want, got)| want == "*" || want == got.as_ref());
            if !matches {
                continue;
            }
            if pattern.len() <= path.len() {
                return Verdict::Keep;
            }
            verdict = Verdict::Descend;
        }
        verdict
    }
}
