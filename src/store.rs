use std::collections::BTreeMap;

use crate::detection::Detection;
use crate::track::Participant;

/// Owned arena of the tracks of one stream.
///
/// Ids come from a per-store counter, start at 1 and are never reused.
/// Iteration is in ascending id order, i.e. creation order.
#[derive(Debug, Default)]
pub struct TrackStore {
    tracks: BTreeMap<u32, Participant>,
    last_id: u32,
    retention_cap: Option<usize>,
}

impl TrackStore {
    pub fn new(retention_cap: Option<usize>) -> Self {
        Self {
            tracks: BTreeMap::new(),
            last_id: 0,
            retention_cap,
        }
    }

    fn next_id(&mut self) -> u32 {
        self.last_id += 1;
        self.last_id
    }

    /// Inserts a new track for `det` and returns its id
    pub fn spawn(&mut self, frame: u64, det: &Detection) -> u32 {
        let id = self.next_id();
        self.tracks.insert(id, Participant::new(id, frame, det));
        id
    }

    #[inline]
    pub fn get(&self, id: u32) -> Option<&Participant> {
        self.tracks.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: u32) -> Option<&mut Participant> {
        self.tracks.get_mut(&id)
    }

    #[inline]
    pub fn remove(&mut self, id: u32) -> Option<Participant> {
        self.tracks.remove(&id)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.tracks.values()
    }

    #[inline]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Participant> {
        self.tracks.values_mut()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    #[inline]
    pub fn last_id(&self) -> u32 {
        self.last_id
    }

    /// Evicts least recently seen frozen tracks until at most `retention_cap`
    /// of them remain. Returns the evicted ids.
    pub fn retain_capacity(&mut self) -> Vec<u32> {
        let cap = match self.retention_cap {
            Some(cap) => cap,
            None => return Vec::new(),
        };

        let mut frozen: Vec<(u64, u32)> = self
            .tracks
            .values()
            .filter(|t| t.is_frozen())
            .map(|t| (t.last_seen, t.id))
            .collect();

        if frozen.len() <= cap {
            return Vec::new();
        }

        frozen.sort_unstable();
        let excess = frozen.len() - cap;

        frozen
            .into_iter()
            .take(excess)
            .map(|(_, id)| {
                self.tracks.remove(&id);
                id
            })
            .collect()
    }
}
