//! Composition of several sources behind one path-addressable face.

use crate::path::{Path, Segment};
use crate::source::{Source, SourceError, TypeHint};
use crate::value::Value;

// ============================================================================
// MERGE POLICY
// ============================================================================

/// How overlapping structure from multiple sources merges at one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Merge {
    /// Only the first source that resolves at this level contributes.
    #[default]
    First,
    /// Only the last source that resolves at this level contributes.
    Last,
    /// Every resolving source contributes: mapping key sets union
    /// (first source wins a duplicate key), sequences concatenate in
    /// source order.
    Combine,
}

// ============================================================================
// UNION SOURCE
// ============================================================================

/// An ordered list of sources presented as one.
///
/// Mapping and sequence merge policies are configured independently, and an
/// optional merge depth caps how deep merging reaches — beyond it the
/// policy falls back to [`Merge::First`]. A leaf value always comes from
/// the first source where its path exists, whatever the policy.
///
/// # Examples
///
/// ```
/// use forma::source::{Merge, MemorySource, Source, UnionSource};
/// use forma::Path;
///
/// let overrides = MemorySource::from(serde_json::json!({"read_size": 4096}));
/// let defaults = MemorySource::from(serde_json::json!({"read_size": 1024, "strict": true}));
/// let src = UnionSource::new(vec![Box::new(overrides), Box::new(defaults)])
///     .merge(Merge::Combine);
///
/// let mut keys = src.mapping(&Path::new()).unwrap();
/// keys.sort();
/// assert_eq!(keys, vec!["read_size", "strict"]);
/// ```
#[derive(Debug)]
pub struct UnionSource {
    sources: Vec<Box<dyn Source>>,
    mapping_merge: Merge,
    sequence_merge: Merge,
    merge_depth: Option<usize>,
}

/// One underlying source still in play during a path walk, with the path
/// translated into its own coordinates (sequence indices shift under
/// [`Merge::Combine`]).
#[derive(Debug, Clone)]
struct Candidate {
    index: usize,
    local: Path,
}

impl UnionSource {
    /// Composes `sources` with [`Merge::First`] for both mappings and
    /// sequences.
    #[must_use]
    pub fn new(sources: Vec<Box<dyn Source>>) -> Self {
        Self {
            sources,
            mapping_merge: Merge::First,
            sequence_merge: Merge::First,
            merge_depth: None,
        }
    }

    /// Sets both the mapping and the sequence merge policy.
    #[must_use]
    pub fn merge(mut self, merge: Merge) -> Self {
        self.mapping_merge = merge;
        self.sequence_merge = merge;
        self
    }

    /// Sets the mapping merge policy only.
    #[must_use]
    pub fn mapping_merge(mut self, merge: Merge) -> Self {
        self.mapping_merge = merge;
        self
    }

    /// Sets the sequence merge policy only.
    #[must_use]
    pub fn sequence_merge(mut self, merge: Merge) -> Self {
        self.sequence_merge = merge;
        self
    }

    /// Caps merging at `depth` path segments; deeper levels use
    /// [`Merge::First`].
    #[must_use]
    pub fn merge_depth(mut self, depth: usize) -> Self {
        self.merge_depth = Some(depth);
        self
    }

    fn effective(&self, merge: Merge, depth: usize) -> Merge {
        match self.merge_depth {
            Some(cap) if depth >= cap => Merge::First,
            _ => merge,
        }
    }

    /// Applies a merge policy to the candidates capable of acting as a
    /// container at their local path. `capable` reports whether one
    /// candidate qualifies.
    fn select(
        &self,
        candidates: &[Candidate],
        merge: Merge,
        capable: impl Fn(&Candidate) -> bool,
    ) -> Vec<Candidate> {
        let mut kept: Vec<Candidate> = candidates.iter().filter(|c| capable(c)).cloned().collect();
        match merge {
            Merge::Combine => kept,
            Merge::First => {
                kept.truncate(1);
                kept
            }
            Merge::Last => match kept.pop() {
                Some(last) => vec![last],
                None => Vec::new(),
            },
        }
    }

    fn select_mappings(&self, candidates: &[Candidate], depth: usize) -> Vec<Candidate> {
        let merge = self.effective(self.mapping_merge, depth);
        self.select(candidates, merge, |c| {
            let source = &self.sources[c.index];
            !source.is_null(&c.local) && source.mapping(&c.local).is_ok()
        })
    }

    fn select_sequences(&self, candidates: &[Candidate], depth: usize) -> Vec<Candidate> {
        let merge = self.effective(self.sequence_merge, depth);
        self.select(candidates, merge, |c| {
            let source = &self.sources[c.index];
            !source.is_null(&c.local) && source.sequence(&c.local).is_ok()
        })
    }

    /// Walks `path`, narrowing the contributing sources segment by segment
    /// and translating combined sequence indices into per-source ones.
    /// Returns the surviving candidates whose local paths exist.
    fn candidates(&self, path: &Path) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = (0..self.sources.len())
            .map(|index| Candidate {
                index,
                local: Path::new(),
            })
            .collect();

        for (depth, segment) in path.segments().iter().enumerate() {
            match segment {
                Segment::Key(key) => {
                    candidates = self
                        .select_mappings(&candidates, depth)
                        .into_iter()
                        .filter_map(|mut candidate| {
                            let source = &self.sources[candidate.index];
                            let keys = source.mapping(&candidate.local).ok()?;
                            keys.iter().any(|k| k == key).then(|| {
                                candidate.local.push(key.clone());
                                candidate
                            })
                        })
                        .collect();
                }
                Segment::Index(index) => {
                    let mut remaining = *index;
                    let mut chosen = None;
                    for mut candidate in self.select_sequences(&candidates, depth) {
                        let length = self.sources[candidate.index]
                            .sequence(&candidate.local)
                            .unwrap_or(0);
                        if remaining < length {
                            candidate.local.push(remaining);
                            chosen = Some(candidate);
                            break;
                        }
                        remaining -= length;
                    }
                    candidates = chosen.into_iter().collect();
                }
            }
            if candidates.is_empty() {
                return candidates;
            }
        }

        candidates.retain(|c| self.sources[c.index].exists(&c.local));
        candidates
    }
}

impl Source for UnionSource {
    fn exists(&self, path: &Path) -> bool {
        !self.candidates(path).is_empty()
    }

    fn is_null(&self, path: &Path) -> bool {
        self.candidates(path)
            .first()
            .is_some_and(|c| self.sources[c.index].is_null(&c.local))
    }

    fn primitive(&self, path: &Path, hints: &[TypeHint]) -> Result<Value, SourceError> {
        match self.candidates(path).first() {
            Some(c) => self.sources[c.index].primitive(&c.local, hints),
            None => Err(SourceError::new(path.to_string(), "does not exist")),
        }
    }

    fn sequence(&self, path: &Path) -> Result<usize, SourceError> {
        let candidates = self.candidates(path);
        let selected = self.select_sequences(&candidates, path.len());
        if selected.is_empty() {
            return Err(SourceError::new(path.to_string(), "is not a sequence"));
        }
        tracing::trace!(
            contributors = selected.len(),
            path = %path,
            "union sequence"
        );
        let mut total = 0;
        for candidate in &selected {
            total += self.sources[candidate.index].sequence(&candidate.local)?;
        }
        Ok(total)
    }

    fn mapping(&self, path: &Path) -> Result<Vec<String>, SourceError> {
        let candidates = self.candidates(path);
        let selected = self.select_mappings(&candidates, path.len());
        if selected.is_empty() {
            return Err(SourceError::new(path.to_string(), "is not a mapping"));
        }
        tracing::trace!(
            contributors = selected.len(),
            path = %path,
            "union mapping"
        );
        let mut keys = Vec::new();
        for candidate in &selected {
            for key in self.sources[candidate.index].mapping(&candidate.local)? {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use serde_json::json;

    fn union(merge: Merge) -> UnionSource {
        let first = MemorySource::from(json!({
            "read_size": 1024,
            "auth": {"user": "slurp"},
            "includes": ["a.conf", "b.conf"],
        }));
        let second = MemorySource::from(json!({
            "read_size": 4096,
            "strict": true,
            "auth": {"user": "other", "pass": "hunter2"},
            "includes": ["c.conf"],
        }));
        UnionSource::new(vec![Box::new(first), Box::new(second)]).merge(merge)
    }

    fn path<S: Into<Segment>>(segments: impl IntoIterator<Item = S>) -> Path {
        segments.into_iter().collect()
    }

    #[test]
    fn first_restricts_to_the_first_resolving_source() {
        let src = union(Merge::First);
        let keys = src.mapping(&Path::new()).unwrap();
        assert_eq!(keys, vec!["read_size", "auth", "includes"]);
        assert!(!src.exists(&path(["strict"])));
    }

    #[test]
    fn last_restricts_to_the_last_resolving_source() {
        let src = union(Merge::Last);
        let keys = src.mapping(&Path::new()).unwrap();
        assert_eq!(keys, vec!["read_size", "strict", "auth", "includes"]);
        assert_eq!(
            src.primitive(&path(["read_size"]), &[TypeHint::Int]).unwrap(),
            Value::Int(4096)
        );
    }

    #[test]
    fn combine_unions_keys_first_source_wins_leaves() {
        let src = union(Merge::Combine);
        let keys = src.mapping(&Path::new()).unwrap();
        assert_eq!(keys, vec!["read_size", "auth", "includes", "strict"]);
        // Overlapping leaf resolves from the first source that has it.
        assert_eq!(
            src.primitive(&path(["read_size"]), &[TypeHint::Int]).unwrap(),
            Value::Int(1024)
        );
        // Keys unique to a later source still resolve.
        assert_eq!(
            src.primitive(&path(["auth", "pass"]), &[TypeHint::Str]).unwrap(),
            Value::Str("hunter2".into())
        );
    }

    #[test]
    fn combine_concatenates_sequences_with_index_translation() {
        let src = union(Merge::Combine);
        assert_eq!(src.sequence(&path(["includes"])).unwrap(), 3);
        assert_eq!(
            src.primitive(&path(["includes"]).child(2usize), &[TypeHint::Str])
                .unwrap(),
            Value::Str("c.conf".into())
        );
        assert!(!src.exists(&path(["includes"]).child(3usize)));
    }

    #[test]
    fn merge_depth_falls_back_to_first() {
        let src = union(Merge::Combine).merge_depth(1);
        // Top level still combines...
        assert!(src.exists(&path(["strict"])));
        // ...but below the cap only the first resolving source counts.
        assert!(!src.exists(&path(["auth", "pass"])));
        assert_eq!(
            src.primitive(&path(["auth", "user"]), &[TypeHint::Str]).unwrap(),
            Value::Str("slurp".into())
        );
    }
}
