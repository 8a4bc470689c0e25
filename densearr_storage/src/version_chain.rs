use crate::Timestamp;

/// A chain of versions of a value, ordered by commit timestamp.
///
/// Multiple versions may share a timestamp, in which case the most recently pushed one wins.
#[derive(Clone, Debug)]
pub struct VersionChain<T> {
    // Sorted by (timestamp, sequence).
    versions: Vec<(Timestamp, u64, T)>,
    sequence: u64,
}

impl<T> Default for VersionChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> VersionChain<T> {
    /// Create an empty version chain.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            versions: Vec::new(),
            sequence: 0,
        }
    }

    /// Push a version committed at `timestamp`.
    pub fn push(&mut self, timestamp: Timestamp, value: T) {
        let sequence = self.sequence;
        self.sequence += 1;
        let index = self
            .versions
            .partition_point(|(ts, seq, _)| (*ts, *seq) <= (timestamp, sequence));
        self.versions.insert(index, (timestamp, sequence, value));
    }

    /// Return the newest version committed at or before `timestamp`.
    #[must_use]
    pub fn get_at(&self, timestamp: Timestamp) -> Option<&T> {
        let index = self.versions.partition_point(|(ts, _, _)| *ts <= timestamp);
        index
            .checked_sub(1)
            .map(|index| &self.versions[index].2)
    }

    /// Return the newest version.
    #[must_use]
    pub fn latest(&self) -> Option<&T> {
        self.versions.last().map(|(_, _, value)| value)
    }

    /// Return the versions committed at or before `timestamp`, oldest first.
    pub fn iter_at(&self, timestamp: Timestamp) -> impl Iterator<Item = (Timestamp, &T)> {
        let index = self.versions.partition_point(|(ts, _, _)| *ts <= timestamp);
        self.versions[..index]
            .iter()
            .map(|(ts, _, value)| (*ts, value))
    }

    /// Return the number of versions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Returns true if the chain holds no versions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
