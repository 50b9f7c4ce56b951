//! Read-only, memory-mapped accession hash table.
//!
//! File layout (all integers little-endian):
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 8 | magic `TXRIDX01` |
//! | 8 | 8 | slot count (power of two) |
//! | 16 | 8 | entry count |
//! | 24 | 8 | key arena offset |
//! | 32 | 16 × slots | slots: key offset `u64`, key length `u32`, id `i32` |
//! | arena | … | key bytes |
//!
//! A slot with key length 0 is empty. Keys are placed by FNV-1a hash with
//! linear probing; the table is built at most half full.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use fxhash::FxHashMap;
use memmap2::Mmap;
use tracing::info;

use crate::core::types::ClassificationId;
use crate::index::{AccessionLookup, LoadError};
use crate::parsing::mapping::read_mapping_file;
use crate::utils::cancel::CancelToken;

const MAGIC: &[u8; 8] = b"TXRIDX01";
const HEADER_SIZE: usize = 32;
const SLOT_SIZE: usize = 16;
const MIN_SLOTS: u64 = 16;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

fn read_u64(data: &[u8], pos: usize) -> Option<u64> {
    Some(u64::from_le_bytes(data.get(pos..pos + 8)?.try_into().ok()?))
}

fn read_u32(data: &[u8], pos: usize) -> Option<u32> {
    Some(u32::from_le_bytes(data.get(pos..pos + 4)?.try_into().ok()?))
}

fn read_i32(data: &[u8], pos: usize) -> Option<i32> {
    Some(i32::from_le_bytes(data.get(pos..pos + 4)?.try_into().ok()?))
}

/// Memory-mapped accession table. The mapping is read-only, so any number
/// of threads can query one instance without locking.
#[derive(Debug)]
pub struct DiskHashTable {
    path: PathBuf,
    mmap: Mmap,
    num_slots: u64,
    num_entries: u64,
    arena_offset: usize,
}

impl DiskHashTable {
    /// Map a table file and validate its header. Pages are faulted in on
    /// demand by the OS.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Io` if the file cannot be opened or mapped and
    /// `LoadError::InvalidFormat` if the header is corrupt.
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path)?;
        // SAFETY: the file is opened read-only and tables are never modified
        // in place after being written
        let mmap = unsafe { Mmap::map(&file)? };

        let invalid = |msg: &str| LoadError::InvalidFormat(format!("{}: {msg}", path.display()));

        if mmap.len() < HEADER_SIZE || &mmap[..8] != MAGIC {
            return Err(invalid("not an accession index (bad magic)"));
        }
        let num_slots = read_u64(&mmap, 8).ok_or_else(|| invalid("truncated header"))?;
        let num_entries = read_u64(&mmap, 16).ok_or_else(|| invalid("truncated header"))?;
        let arena_offset = read_u64(&mmap, 24).ok_or_else(|| invalid("truncated header"))?;

        if num_slots == 0 || !num_slots.is_power_of_two() || num_entries > num_slots {
            return Err(invalid("invalid slot count"));
        }
        let slots_end = usize::try_from(num_slots)
            .ok()
            .and_then(|n| n.checked_mul(SLOT_SIZE))
            .and_then(|n| n.checked_add(HEADER_SIZE))
            .ok_or_else(|| invalid("slot table too large"))?;
        let arena_offset =
            usize::try_from(arena_offset).map_err(|_| invalid("arena offset too large"))?;
        if arena_offset != slots_end || arena_offset > mmap.len() {
            return Err(invalid("slot table does not match file size"));
        }

        info!(
            "Opened accession index {} ({num_entries} entries)",
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            num_slots,
            num_entries,
            arena_offset,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.num_entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_entries == 0
    }

    fn slot(&self, index: u64) -> Option<(usize, usize, ClassificationId)> {
        let pos = HEADER_SIZE + usize::try_from(index).ok()? * SLOT_SIZE;
        let key_offset = usize::try_from(read_u64(&self.mmap, pos)?).ok()?;
        let key_len = read_u32(&self.mmap, pos + 8)? as usize;
        let value = read_i32(&self.mmap, pos + 12)?;
        Some((key_offset, key_len, value))
    }

    fn key_bytes(&self, offset: usize, len: usize) -> Option<&[u8]> {
        let start = self.arena_offset.checked_add(offset)?;
        self.mmap.get(start..start.checked_add(len)?)
    }
}

impl AccessionLookup for DiskHashTable {
    fn get(&self, accession: &str) -> Option<ClassificationId> {
        let key = accession.as_bytes();
        if key.is_empty() {
            return None;
        }
        let mask = self.num_slots - 1;
        let mut index = fnv1a(key) & mask;

        for _ in 0..self.num_slots {
            let (offset, len, value) = self.slot(index)?;
            if len == 0 {
                return None;
            }
            if len == key.len() && self.key_bytes(offset, len)? == key {
                return Some(value);
            }
            index = (index + 1) & mask;
        }
        None
    }
}

/// Collects `(accession, id)` pairs and writes a [`DiskHashTable`] file
#[derive(Debug, Default)]
pub struct DiskHashTableBuilder {
    entries: FxHashMap<String, ClassificationId>,
}

impl DiskHashTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect all entries of a two-column mapping file
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Parse` or `LoadError::Canceled` from the scan.
    pub fn from_mapping_file(path: &Path, cancel: &CancelToken) -> Result<Self, LoadError> {
        let mut builder = Self::new();
        read_mapping_file(path, cancel, |accession, id| builder.insert(accession, id))?;
        Ok(builder)
    }

    /// Add an entry; empty keys and ids that are not positive are ignored,
    /// and a repeated key keeps the last id
    pub fn insert(&mut self, accession: impl Into<String>, id: ClassificationId) {
        let accession = accession.into();
        if !accession.is_empty() && id > 0 {
            self.entries.insert(accession, id);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the table. Returns the number of entries written.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Io` if the file cannot be written and
    /// `LoadError::InvalidFormat` for keys longer than `u32::MAX` bytes.
    pub fn write(&self, path: &Path) -> Result<usize, LoadError> {
        let start = Instant::now();
        let num_slots = (self.entries.len() as u64 * 2)
            .next_power_of_two()
            .max(MIN_SLOTS);
        let mask = num_slots - 1;

        // Sorted so the same input always produces the same file
        let mut keys: Vec<(&String, &ClassificationId)> = self.entries.iter().collect();
        keys.sort_unstable();

        let slot_count = usize::try_from(num_slots)
            .map_err(|_| LoadError::InvalidFormat("too many entries".to_string()))?;
        let mut slots: Vec<Option<(u64, u32, ClassificationId)>> = vec![None; slot_count];
        let mut arena: Vec<u8> = Vec::new();

        for (key, &id) in keys {
            let key_len = u32::try_from(key.len()).map_err(|_| {
                LoadError::InvalidFormat(format!("accession too long: {} bytes", key.len()))
            })?;
            let offset = arena.len() as u64;
            arena.extend_from_slice(key.as_bytes());

            let mut index = fnv1a(key.as_bytes()) & mask;
            loop {
                let slot = &mut slots[usize::try_from(index).unwrap_or_default()];
                if slot.is_none() {
                    *slot = Some((offset, key_len, id));
                    break;
                }
                index = (index + 1) & mask;
            }
        }

        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(MAGIC)?;
        writer.write_all(&num_slots.to_le_bytes())?;
        writer.write_all(&(self.entries.len() as u64).to_le_bytes())?;
        let arena_offset = (HEADER_SIZE + slot_count * SLOT_SIZE) as u64;
        writer.write_all(&arena_offset.to_le_bytes())?;
        for slot in &slots {
            let (offset, len, id) = slot.unwrap_or((0, 0, 0));
            writer.write_all(&offset.to_le_bytes())?;
            writer.write_all(&len.to_le_bytes())?;
            writer.write_all(&id.to_le_bytes())?;
        }
        writer.write_all(&arena)?;
        writer.flush()?;

        info!(
            "Wrote {} accessions to {} in {:.1}s",
            self.entries.len(),
            path.display(),
            start.elapsed().as_secs_f64()
        );
        Ok(self.entries.len())
    }
}
