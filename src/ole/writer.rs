//! Compound file writer.
//!
//! Everything is buffered in memory and laid out in one pass by
//! [`OleWriter::to_bytes`]. The output is a version 3 file (512-byte
//! sectors) in this order:
//!
//! ```text
//! header | large streams | mini stream | mini FAT | directory | FAT | DIFAT
//! ```
//!
//! Streams below 4096 bytes go to the mini stream. Siblings in each storage
//! form a binary search tree ordered by name length, then by upper-cased
//! name; every node is black.

use super::consts::*;
use super::error::OleError;
use std::cmp::Ordering;

const SECTOR: usize = SECTOR_SIZE_V3;
const IDS_PER_SECTOR: usize = SECTOR / 4;

#[derive(Debug)]
struct Node {
    name: String,
    kind: u8,
    data: Vec<u8>,
    children: Vec<usize>,
}

/// Builder for a compound file.
///
/// ```rust
/// use litchi_xlsx::ole::{OleReader, OleWriter};
///
/// let mut writer = OleWriter::new();
/// writer.create_stream(&["Storage", "Stream"], b"payload")?;
/// let bytes = writer.to_bytes()?;
///
/// let reader = OleReader::open(&bytes)?;
/// assert_eq!(reader.open_stream(&["storage", "stream"])?, b"payload");
/// # Ok::<(), litchi_xlsx::ole::OleError>(())
/// ```
#[derive(Debug)]
pub struct OleWriter {
    nodes: Vec<Node>,
}

impl Default for OleWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a stream's bytes ended up.
#[derive(Debug, Clone, Copy)]
struct Placement {
    start: u32,
    size: u64,
}

impl OleWriter {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: "Root Entry".to_string(),
                kind: STGTY_ROOT,
                data: Vec::new(),
                children: Vec::new(),
            }],
        }
    }

    /// Create a storage, along with any missing parents.
    pub fn create_storage(&mut self, path: &[&str]) -> Result<(), OleError> {
        self.storage_at(path).map(|_| ())
    }

    /// Create or replace a stream. Missing parent storages are created.
    pub fn create_stream(&mut self, path: &[&str], data: &[u8]) -> Result<(), OleError> {
        let Some((name, parents)) = path.split_last() else {
            return Err(OleError::InvalidName("empty path".to_string()));
        };
        validate_name(name)?;
        let parent = self.storage_at(parents)?;
        match self.child(parent, name) {
            Some(idx) if self.nodes[idx].kind == STGTY_STREAM => self.nodes[idx].data = data.to_vec(),
            Some(_) => return Err(OleError::InvalidName(format!("{name} is a storage"))),
            None => {
                self.nodes.push(Node {
                    name: name.to_string(),
                    kind: STGTY_STREAM,
                    data: data.to_vec(),
                    children: Vec::new(),
                });
                let idx = self.nodes.len() - 1;
                self.nodes[parent].children.push(idx);
            },
        }
        Ok(())
    }

    fn child(&self, parent: usize, name: &str) -> Option<usize> {
        let upper = name.to_uppercase();
        self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c].name.to_uppercase() == upper)
    }

    fn storage_at(&mut self, path: &[&str]) -> Result<usize, OleError> {
        let mut current = 0;
        for name in path {
            validate_name(name)?;
            current = match self.child(current, name) {
                Some(idx) if self.nodes[idx].kind == STGTY_STORAGE => idx,
                Some(_) => return Err(OleError::InvalidName(format!("{name} is a stream"))),
                None => {
                    self.nodes.push(Node {
                        name: name.to_string(),
                        kind: STGTY_STORAGE,
                        data: Vec::new(),
                        children: Vec::new(),
                    });
                    let idx = self.nodes.len() - 1;
                    self.nodes[current].children.push(idx);
                    idx
                },
            };
        }
        Ok(current)
    }

    /// Serialize the compound file.
    pub fn to_bytes(&self) -> Result<Vec<u8>, OleError> {
        let mut fat: Vec<u32> = Vec::new();
        let mut placements: Vec<Option<Placement>> = vec![None; self.nodes.len()];

        // Large streams first, each in a contiguous run
        let mut body: Vec<u8> = Vec::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            if node.kind != STGTY_STREAM || node.data.len() < MINI_STREAM_CUTOFF as usize {
                continue;
            }
            let start = allocate_run(&mut fat, sectors_for(node.data.len(), SECTOR));
            append_padded(&mut body, &node.data, SECTOR);
            placements[idx] = Some(Placement {
                start,
                size: node.data.len() as u64,
            });
        }

        // Small streams into the mini stream
        let mut ministream: Vec<u8> = Vec::new();
        let mut minifat: Vec<u32> = Vec::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            if node.kind != STGTY_STREAM || node.data.len() >= MINI_STREAM_CUTOFF as usize {
                continue;
            }
            let placement = if node.data.is_empty() {
                Placement {
                    start: ENDOFCHAIN,
                    size: 0,
                }
            } else {
                let start = allocate_run(&mut minifat, sectors_for(node.data.len(), MINI_SECTOR_SIZE));
                append_padded(&mut ministream, &node.data, MINI_SECTOR_SIZE);
                Placement {
                    start,
                    size: node.data.len() as u64,
                }
            };
            placements[idx] = Some(placement);
        }

        let ministream_start = if ministream.is_empty() {
            ENDOFCHAIN
        } else {
            allocate_run(&mut fat, sectors_for(ministream.len(), SECTOR))
        };
        append_padded(&mut body, &ministream, SECTOR);

        let (minifat_start, minifat_sectors) = if minifat.is_empty() {
            (ENDOFCHAIN, 0)
        } else {
            let count = sectors_for(minifat.len() * 4, SECTOR);
            minifat.resize(count * IDS_PER_SECTOR, FREESECT);
            let start = allocate_run(&mut fat, count);
            body.extend(minifat.iter().flat_map(|id| id.to_le_bytes()));
            (start, count)
        };

        let directory = self.directory(&placements, ministream_start, ministream.len() as u64);
        let dir_start = allocate_run(&mut fat, sectors_for(directory.len(), SECTOR));
        body.extend_from_slice(&directory);

        // FAT and DIFAT sectors describe themselves, so size them to a fixed point
        let data_sectors = fat.len();
        let (mut fat_sectors, mut difat_sectors) = (0usize, 0usize);
        loop {
            let needed_fat = sectors_for((data_sectors + fat_sectors + difat_sectors) * 4, SECTOR);
            let needed_difat = needed_fat
                .saturating_sub(HEADER_DIFAT_ENTRIES)
                .div_ceil(IDS_PER_SECTOR - 1);
            if needed_fat == fat_sectors && needed_difat == difat_sectors {
                break;
            }
            (fat_sectors, difat_sectors) = (needed_fat, needed_difat);
        }
        let fat_start = fat.len() as u32;
        fat.extend(std::iter::repeat_n(FATSECT, fat_sectors));
        let difat_start = fat.len() as u32;
        fat.extend(std::iter::repeat_n(DIFSECT, difat_sectors));
        fat.resize(fat_sectors * IDS_PER_SECTOR, FREESECT);
        log::trace!(
            "compound file layout: {data_sectors} data sectors, {fat_sectors} FAT, {difat_sectors} DIFAT"
        );

        let fat_ids: Vec<u32> = (fat_start..fat_start + fat_sectors as u32).collect();
        let mut out = Vec::with_capacity(HEADER_SIZE + (fat.len() + difat_sectors) * SECTOR);
        write_header(
            &mut out,
            &HeaderFields {
                num_fat_sectors: fat_sectors as u32,
                first_dir_sector: dir_start,
                first_minifat_sector: minifat_start,
                num_minifat_sectors: minifat_sectors as u32,
                first_difat_sector: if difat_sectors > 0 { difat_start } else { ENDOFCHAIN },
                num_difat_sectors: difat_sectors as u32,
            },
            &fat_ids,
        );
        out.extend_from_slice(&body);
        out.extend(fat.iter().flat_map(|id| id.to_le_bytes()));

        // DIFAT: 127 FAT sector ids per sector plus a link to the next one
        let overflow = fat_ids.get(HEADER_DIFAT_ENTRIES..).unwrap_or_default();
        for (i, chunk) in overflow.chunks(IDS_PER_SECTOR - 1).enumerate() {
            let mut ids = chunk.to_vec();
            ids.resize(IDS_PER_SECTOR - 1, FREESECT);
            ids.push(if i + 1 < difat_sectors {
                difat_start + i as u32 + 1
            } else {
                ENDOFCHAIN
            });
            out.extend(ids.iter().flat_map(|id| id.to_le_bytes()));
        }
        Ok(out)
    }

    /// Directory stream with sibling trees linked, padded to whole sectors.
    fn directory(&self, placements: &[Option<Placement>], ministream_start: u32, ministream_size: u64) -> Vec<u8> {
        let count = self.nodes.len();
        let mut left = vec![NOSTREAM; count];
        let mut right = vec![NOSTREAM; count];
        let mut child = vec![NOSTREAM; count];

        for (idx, node) in self.nodes.iter().enumerate() {
            if node.children.is_empty() {
                continue;
            }
            let mut sorted = node.children.clone();
            sorted.sort_by(|&a, &b| compare_names(&self.nodes[a].name, &self.nodes[b].name));
            child[idx] = link_tree(&sorted, &mut left, &mut right);
        }

        let mut out = Vec::with_capacity(sectors_for(count * DIRENTRY_SIZE, SECTOR) * SECTOR);
        for (idx, node) in self.nodes.iter().enumerate() {
            let placement = match node.kind {
                STGTY_ROOT => Placement {
                    start: ministream_start,
                    size: ministream_size,
                },
                STGTY_STREAM => placements[idx].unwrap_or(Placement {
                    start: ENDOFCHAIN,
                    size: 0,
                }),
                _ => Placement { start: 0, size: 0 },
            };
            write_entry(
                &mut out,
                &node.name,
                node.kind,
                [left[idx], right[idx], child[idx]],
                placement,
            );
        }
        while out.len() % SECTOR != 0 {
            write_entry(
                &mut out,
                "",
                STGTY_EMPTY,
                [NOSTREAM; 3],
                Placement { start: 0, size: 0 },
            );
        }
        out
    }
}

/// Link `sorted` into a balanced tree and return its root.
fn link_tree(sorted: &[usize], left: &mut [u32], right: &mut [u32]) -> u32 {
    if sorted.is_empty() {
        return NOSTREAM;
    }
    let mid = sorted.len() / 2;
    let root = sorted[mid];
    left[root] = link_tree(&sorted[..mid], left, right);
    right[root] = link_tree(&sorted[mid + 1..], left, right);
    root as u32
}

fn compare_names(a: &str, b: &str) -> Ordering {
    let (la, lb) = (a.encode_utf16().count(), b.encode_utf16().count());
    la.cmp(&lb).then_with(|| a.to_uppercase().cmp(&b.to_uppercase()))
}

fn validate_name(name: &str) -> Result<(), OleError> {
    let units = name.encode_utf16().count();
    if units == 0 || units > MAX_NAME_UNITS || name.contains(['/', '\\', ':', '!']) {
        return Err(OleError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[inline]
fn sectors_for(len: usize, sector: usize) -> usize {
    len.div_ceil(sector)
}

/// Append a chained run of `count` entries to an allocation table.
fn allocate_run(table: &mut Vec<u32>, count: usize) -> u32 {
    let start = table.len() as u32;
    for i in 1..count {
        table.push(start + i as u32);
    }
    if count > 0 {
        table.push(ENDOFCHAIN);
    }
    start
}

fn append_padded(out: &mut Vec<u8>, data: &[u8], sector: usize) {
    out.extend_from_slice(data);
    let rem = data.len() % sector;
    if rem != 0 {
        out.resize(out.len() + sector - rem, 0);
    }
}

struct HeaderFields {
    num_fat_sectors: u32,
    first_dir_sector: u32,
    first_minifat_sector: u32,
    num_minifat_sectors: u32,
    first_difat_sector: u32,
    num_difat_sectors: u32,
}

fn write_header(out: &mut Vec<u8>, fields: &HeaderFields, fat_ids: &[u32]) {
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[0u8; 16]);
    out.extend_from_slice(&0x003Eu16.to_le_bytes());
    out.extend_from_slice(&3u16.to_le_bytes());
    out.extend_from_slice(&0xFFFEu16.to_le_bytes());
    out.extend_from_slice(&9u16.to_le_bytes());
    out.extend_from_slice(&6u16.to_le_bytes());
    out.extend_from_slice(&[0u8; 6]);
    // Directory sector count is always zero in version 3
    out.extend_from_slice(&0u32.to_le_bytes());
    for value in [
        fields.num_fat_sectors,
        fields.first_dir_sector,
        0,
        MINI_STREAM_CUTOFF,
        fields.first_minifat_sector,
        fields.num_minifat_sectors,
        fields.first_difat_sector,
        fields.num_difat_sectors,
    ] {
        out.extend_from_slice(&value.to_le_bytes());
    }
    for i in 0..HEADER_DIFAT_ENTRIES {
        let id = fat_ids.get(i).copied().unwrap_or(FREESECT);
        out.extend_from_slice(&id.to_le_bytes());
    }
    debug_assert_eq!(out.len(), HEADER_SIZE);
}

fn write_entry(out: &mut Vec<u8>, name: &str, kind: u8, links: [u32; 3], placement: Placement) {
    let mut name_bytes = [0u8; 64];
    let mut units = 0usize;
    for (i, unit) in name.encode_utf16().take(MAX_NAME_UNITS).enumerate() {
        name_bytes[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        units += 1;
    }
    out.extend_from_slice(&name_bytes);
    let name_len: u16 = if name.is_empty() { 0 } else { ((units + 1) * 2) as u16 };
    out.extend_from_slice(&name_len.to_le_bytes());
    out.push(kind);
    // Black
    out.push(1);
    for link in links {
        out.extend_from_slice(&link.to_le_bytes());
    }
    out.extend_from_slice(&[0u8; 16]);
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0u64.to_le_bytes());
    out.extend_from_slice(&0u64.to_le_bytes());
    out.extend_from_slice(&placement.start.to_le_bytes());
    out.extend_from_slice(&placement.size.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::OleReader;

    fn pattern(len: usize, seed: u8) -> Vec<u8> {
        (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
    }

    #[test]
    fn test_round_trip_mini_and_large() {
        let small = pattern(100, 1);
        let large = pattern(10_000, 2);
        let mut writer = OleWriter::new();
        writer.create_stream(&["EncryptionInfo"], &small).unwrap();
        writer.create_stream(&["EncryptedPackage"], &large).unwrap();
        writer.create_stream(&["\u{6}DataSpaces", "Version"], b"v").unwrap();
        writer.create_stream(&["Empty"], b"").unwrap();
        let bytes = writer.to_bytes().unwrap();
        assert_eq!(bytes.len() % SECTOR, 0);

        let reader = OleReader::open(&bytes).unwrap();
        assert_eq!(reader.open_stream(&["EncryptionInfo"]).unwrap(), small);
        assert_eq!(reader.open_stream(&["encryptedpackage"]).unwrap(), large);
        assert_eq!(reader.open_stream(&["\u{6}DataSpaces", "Version"]).unwrap(), b"v");
        assert!(reader.open_stream(&["Empty"]).unwrap().is_empty());
        assert!(reader.exists(&["\u{6}DataSpaces"]));
        assert!(!reader.exists(&["Missing"]));
        assert_eq!(reader.list_streams().len(), 4);
    }

    #[test]
    fn test_large_stream_needs_difat() {
        // More than 109 FAT sectors, so part of the FAT is listed in DIFAT sectors
        let big = pattern(8 * 1024 * 1024, 7);
        let mut writer = OleWriter::new();
        writer.create_stream(&["Big"], &big).unwrap();
        let bytes = writer.to_bytes().unwrap();

        let num_difat = u32::from_le_bytes(bytes[0x48..0x4C].try_into().unwrap());
        assert!(num_difat > 0);
        let reader = OleReader::open(&bytes).unwrap();
        assert_eq!(reader.open_stream(&["Big"]).unwrap(), big);
    }

    #[test]
    fn test_replace_and_invalid_names() {
        let mut writer = OleWriter::new();
        writer.create_stream(&["S"], b"one").unwrap();
        writer.create_stream(&["s"], b"two").unwrap();
        assert!(writer.create_stream(&["a/b"], b"").is_err());
        assert!(writer.create_stream(&[], b"").is_err());
        assert!(writer.create_stream(&["S", "child"], b"").is_err());

        let bytes = writer.to_bytes().unwrap();
        let reader = OleReader::open(&bytes).unwrap();
        assert_eq!(reader.open_stream(&["S"]).unwrap(), b"two");
    }

    #[test]
    fn test_sibling_order() {
        let mut sorted = vec!["Zz".to_string(), "b".to_string(), "Abc".to_string(), "a".to_string()];
        sorted.sort_by(|a, b| compare_names(a, b));
        assert_eq!(sorted, ["a", "b", "Zz", "Abc"]);
    }
}
