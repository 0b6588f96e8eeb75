use super::candidate::{RepoId, RepositoryCandidate};
use std::collections::HashMap;

/// What happened when a candidate was merged into a [`ResultSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// First time this identity was seen
    Inserted,
    /// Known identity with a different version; the entry was replaced in place
    Replaced,
    /// Known identity with the same version; nothing changed
    Unchanged,
}

/// Ordered collection of candidates, unique by identity, in discovery order
#[derive(Debug, Default, Clone)]
pub struct ResultSet {
    entries: Vec<RepositoryCandidate>,
    positions: HashMap<RepoId, usize>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, candidate: RepositoryCandidate) -> MergeOutcome {
        match self.positions.get(&candidate.id) {
            Some(&index) if self.entries[index].version == candidate.version => {
                MergeOutcome::Unchanged
            }
            Some(&index) => {
                self.entries[index] = candidate;
                MergeOutcome::Replaced
            }
            None => {
                self.positions.insert(candidate.id.clone(), self.entries.len());
                self.entries.push(candidate);
                MergeOutcome::Inserted
            }
        }
    }

    pub fn remove(&mut self, id: &RepoId) -> Option<RepositoryCandidate> {
        let index = self.positions.remove(id)?;
        let removed = self.entries.remove(index);

        for position in self.positions.values_mut() {
            if *position > index {
                *position -= 1;
            }
        }

        Some(removed)
    }

    pub fn contains(&self, id: &RepoId) -> bool {
        self.positions.contains_key(id)
    }

    pub fn get(&self, id: &RepoId) -> Option<&RepositoryCandidate> {
        self.positions.get(id).map(|&index| &self.entries[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepositoryCandidate> {
        self.entries.iter()
    }

    /// Copy of the current contents, in discovery order
    pub fn snapshot(&self) -> Vec<RepositoryCandidate> {
        self.entries.clone()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
