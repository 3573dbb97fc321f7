//! Wear-leveled, slot-addressed position store.
//!
//! Every slot owns a ring of `slots_per_key` records laid out back to back:
//! slot `k` starts at byte `k * slots_per_key * 8`. A record is a little-endian
//! `u32` write counter followed by a little-endian `i32` value. Erased bytes
//! are `0xFF`, so an empty record reads as counter `0xFFFF_FFFF`.
//!
//! The newest record is the one whose counter is greatest under wrapping
//! comparison; a write goes to the ring position after it with the counter
//! incremented. With a backing file the whole image is rewritten atomically
//! after every write.

use std::path::{Path, PathBuf};

use reckon_traits::PositionStore;

use crate::atomic::write_atomic;
use crate::error::{HwError, Result};

/// Bytes per record: counter plus value.
pub const RECORD_BYTES: usize = 8;

/// Counter value of an erased record.
pub const EMPTY: u32 = u32::MAX;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Record {
    counter: u32,
    value: i32,
}

#[derive(Debug)]
pub struct WearLevelStore {
    image: Vec<u8>,
    slots_per_key: u16,
    path: Option<PathBuf>,
}

impl WearLevelStore {
    /// Erased in-memory image of `size_bytes`.
    pub fn new(size_bytes: usize, slots_per_key: u16) -> Result<Self> {
        if slots_per_key == 0 {
            return Err(HwError::Storage("slots_per_key must be >= 1".into()));
        }
        Ok(Self {
            image: vec![0xFF; size_bytes],
            slots_per_key,
            path: None,
        })
    }

    /// File-backed image. A missing file starts erased; an existing file must
    /// have exactly `size_bytes`.
    pub fn open(path: &Path, size_bytes: usize, slots_per_key: u16) -> Result<Self> {
        let mut store = Self::new(size_bytes, slots_per_key)?;
        match std::fs::read(path) {
            Ok(bytes) => {
                if bytes.len() != size_bytes {
                    return Err(HwError::Storage(format!(
                        "{} holds {} bytes, expected {size_bytes}",
                        path.display(),
                        bytes.len()
                    )));
                }
                store.image = bytes;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no store image yet; starting erased");
            }
            Err(e) => return Err(e.into()),
        }
        store.path = Some(path.to_path_buf());
        Ok(store)
    }

    /// Number of addressable slots.
    pub fn capacity(&self) -> usize {
        self.image.len() / self.ring_bytes()
    }

    pub fn image(&self) -> &[u8] {
        &self.image
    }

    fn ring_bytes(&self) -> usize {
        usize::from(self.slots_per_key) * RECORD_BYTES
    }

    fn ring_start(&self, slot: u16) -> Result<usize> {
        if usize::from(slot) >= self.capacity() {
            return Err(HwError::Storage(format!(
                "slot {slot} out of range ({} slots)",
                self.capacity()
            )));
        }
        Ok(usize::from(slot) * self.ring_bytes())
    }

    fn record_at(&self, offset: usize) -> Record {
        let mut counter = [0u8; 4];
        let mut value = [0u8; 4];
        counter.copy_from_slice(&self.image[offset..offset + 4]);
        value.copy_from_slice(&self.image[offset + 4..offset + RECORD_BYTES]);
        Record {
            counter: u32::from_le_bytes(counter),
            value: i32::from_le_bytes(value),
        }
    }

    /// Ring index and record of the newest entry for `slot`.
    fn newest(&self, slot: u16) -> Result<Option<(usize, Record)>> {
        let start = self.ring_start(slot)?;
        let mut best: Option<(usize, Record)> = None;
        for i in 0..usize::from(self.slots_per_key) {
            let rec = self.record_at(start + i * RECORD_BYTES);
            if rec.counter == EMPTY {
                continue;
            }
            let newer = match best {
                None => true,
                Some((_, b)) => (rec.counter.wrapping_sub(b.counter) as i32) > 0,
            };
            if newer {
                best = Some((i, rec));
            }
        }
        Ok(best)
    }

    fn write(&mut self, slot: u16, value: i32) -> Result<()> {
        let start = self.ring_start(slot)?;
        let (index, counter) = match self.newest(slot)? {
            Some((_, rec)) if rec.value == value => return Ok(()),
            Some((i, rec)) => {
                let next = rec.counter.wrapping_add(1);
                let next = if next == EMPTY { 0 } else { next };
                ((i + 1) % usize::from(self.slots_per_key), next)
            }
            None => (0, 0),
        };
        let offset = start + index * RECORD_BYTES;
        self.image[offset..offset + 4].copy_from_slice(&counter.to_le_bytes());
        self.image[offset + 4..offset + RECORD_BYTES].copy_from_slice(&value.to_le_bytes());
        tracing::trace!(slot, index, counter, value, "store record written");

        if let Some(path) = &self.path {
            write_atomic(path, &self.image)?;
        }
        Ok(())
    }

    fn read(&self, slot: u16) -> Result<Option<i32>> {
        Ok(self.newest(slot)?.map(|(_, r)| r.value))
    }
}

impl PositionStore for WearLevelStore {
    fn put(&mut self, slot: u16, value: i32) -> std::result::Result<(), BoxError> {
        self.write(slot, value).map_err(Into::into)
    }

    fn get(&self, slot: u16) -> std::result::Result<Option<i32>, BoxError> {
        self.read(slot).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters(store: &WearLevelStore, slot: u16) -> Vec<u32> {
        let start = store.ring_start(slot).unwrap();
        (0..usize::from(store.slots_per_key))
            .map(|i| store.record_at(start + i * RECORD_BYTES).counter)
            .collect()
    }

    #[test]
    fn erased_slot_reads_none() {
        let store = WearLevelStore::new(64, 4).unwrap();
        assert_eq!(store.get(0).unwrap(), None);
        assert_eq!(store.capacity(), 2);
    }

    #[test]
    fn writes_advance_around_the_ring() {
        let mut store = WearLevelStore::new(64, 4).unwrap();
        for v in 1..=6 {
            store.put(1, v).unwrap();
        }
        assert_eq!(store.get(1).unwrap(), Some(6));
        assert_eq!(counters(&store, 1), vec![4, 5, 2, 3]);
        assert_eq!(store.get(0).unwrap(), None);
    }

    #[test]
    fn unchanged_value_is_not_rewritten() {
        let mut store = WearLevelStore::new(32, 4).unwrap();
        store.put(0, 42).unwrap();
        store.put(0, 42).unwrap();
        assert_eq!(counters(&store, 0), vec![0, EMPTY, EMPTY, EMPTY]);
    }

    #[test]
    fn counter_wrap_skips_the_empty_marker() {
        let mut store = WearLevelStore::new(16, 2).unwrap();
        let near_wrap = (EMPTY - 1).to_le_bytes();
        store.image[0..4].copy_from_slice(&near_wrap);
        store.image[4..8].copy_from_slice(&7i32.to_le_bytes());

        store.put(0, 8).unwrap();
        assert_eq!(counters(&store, 0), vec![EMPTY - 1, 0]);
        assert_eq!(store.get(0).unwrap(), Some(8));

        store.put(0, 9).unwrap();
        assert_eq!(counters(&store, 0), vec![1, 0]);
        assert_eq!(store.get(0).unwrap(), Some(9));
    }

    #[test]
    fn out_of_range_slot_is_an_error() {
        let mut store = WearLevelStore::new(16, 2).unwrap();
        assert!(store.put(1, 5).is_err());
        assert!(store.get(7).is_err());
    }

    #[test]
    fn zero_ring_length_is_rejected() {
        assert!(WearLevelStore::new(16, 0).is_err());
    }
}
