use super::consts::*;
use super::error::OleError;
use zerocopy::{FromBytes, LE, U16, U32, U64};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// On-disk compound file header (512 bytes).
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawHeader {
    signature: [u8; 8],
    clsid: [u8; 16],
    minor_version: U16<LE>,
    major_version: U16<LE>,
    byte_order: U16<LE>,
    sector_shift: U16<LE>,
    mini_sector_shift: U16<LE>,
    reserved: [u8; 6],
    num_dir_sectors: U32<LE>,
    num_fat_sectors: U32<LE>,
    first_dir_sector: U32<LE>,
    transaction_signature: U32<LE>,
    mini_stream_cutoff: U32<LE>,
    first_minifat_sector: U32<LE>,
    num_minifat_sectors: U32<LE>,
    first_difat_sector: U32<LE>,
    num_difat_sectors: U32<LE>,
    difat: [U32<LE>; HEADER_DIFAT_ENTRIES],
}

/// On-disk directory entry (128 bytes).
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawDirectoryEntry {
    /// UTF-16LE, null-padded
    name: [u8; 64],
    /// Length of name in bytes including the terminator
    name_len: U16<LE>,
    entry_type: u8,
    node_color: u8,
    sid_left: U32<LE>,
    sid_right: U32<LE>,
    sid_child: U32<LE>,
    clsid: [u8; 16],
    state_bits: U32<LE>,
    creation_time: U64<LE>,
    modified_time: U64<LE>,
    start_sector: U32<LE>,
    stream_size: U64<LE>,
}

#[derive(Debug, Clone)]
struct DirEntry {
    name: String,
    entry_type: u8,
    sid_left: u32,
    sid_right: u32,
    sid_child: u32,
    start_sector: u32,
    size: u64,
}

/// A compound file held in memory.
///
/// The FAT, mini FAT and directory are decoded up front; stream contents
/// are read on request.
#[derive(Debug)]
pub struct OleReader<'a> {
    data: &'a [u8],
    sector_size: usize,
    mini_stream_cutoff: u32,
    fat: Vec<u32>,
    minifat: Vec<u32>,
    entries: Vec<DirEntry>,
    ministream: Vec<u8>,
}

impl<'a> OleReader<'a> {
    pub fn open(data: &'a [u8]) -> Result<Self, OleError> {
        if !is_ole_file(data) {
            return Err(OleError::NotOleFile);
        }
        let header = RawHeader::read_from_bytes(&data[..HEADER_SIZE])
            .map_err(|_| OleError::InvalidHeader("truncated header".to_string()))?;

        if header.byte_order.get() != 0xFFFE {
            return Err(OleError::InvalidHeader("invalid byte order".to_string()));
        }
        let sector_size = match (header.major_version.get(), header.sector_shift.get()) {
            (3, 9) => SECTOR_SIZE_V3,
            (4, 12) => SECTOR_SIZE_V4,
            (major, shift) => {
                return Err(OleError::InvalidHeader(format!(
                    "version {major} with sector shift {shift}"
                )));
            },
        };
        if header.mini_sector_shift.get() != 6 {
            return Err(OleError::InvalidHeader("mini sector size must be 64".to_string()));
        }

        let mut reader = OleReader {
            data,
            sector_size,
            mini_stream_cutoff: header.mini_stream_cutoff.get(),
            fat: Vec::new(),
            minifat: Vec::new(),
            entries: Vec::new(),
            ministream: Vec::new(),
        };
        reader.load_fat(&header)?;
        reader.load_directory(header.first_dir_sector.get())?;
        if header.num_minifat_sectors.get() > 0 {
            reader.load_minifat(header.first_minifat_sector.get())?;
        }
        if let Some(root) = reader.entries.first()
            && root.size > 0
        {
            let (start, size) = (root.start_sector, root.size);
            reader.ministream = reader.read_fat_chain(start, Some(size))?;
        }
        log::trace!(
            "compound file: {} byte sectors, {} FAT entries, {} directory entries",
            sector_size,
            reader.fat.len(),
            reader.entries.len()
        );
        Ok(reader)
    }

    fn sector(&self, id: u32) -> Result<&'a [u8], OleError> {
        let start = (id as usize + 1) * self.sector_size;
        self.data
            .get(start..start + self.sector_size)
            .ok_or_else(|| OleError::Corrupted(format!("sector {id} lies beyond the end of the file")))
    }

    fn load_fat(&mut self, header: &RawHeader) -> Result<(), OleError> {
        let mut fat_sectors: Vec<u32> = header
            .difat
            .iter()
            .map(|s| s.get())
            .take_while(|&s| s != FREESECT && s != ENDOFCHAIN)
            .collect();

        let per_difat = self.sector_size / 4 - 1;
        let mut difat_sector = header.first_difat_sector.get();
        for _ in 0..header.num_difat_sectors.get() {
            if difat_sector > MAXREGSECT {
                break;
            }
            let sector = self.sector(difat_sector)?;
            let ids = words(sector);
            fat_sectors.extend(ids[..per_difat].iter().copied().take_while(|&s| s != FREESECT && s != ENDOFCHAIN));
            difat_sector = ids[per_difat];
        }

        if fat_sectors.len() != header.num_fat_sectors.get() as usize {
            log::trace!(
                "header declares {} FAT sectors, DIFAT lists {}",
                header.num_fat_sectors.get(),
                fat_sectors.len()
            );
        }
        self.fat.reserve(fat_sectors.len() * self.sector_size / 4);
        for id in fat_sectors {
            let sector = self.sector(id)?;
            self.fat.extend(words(sector));
        }
        Ok(())
    }

    fn load_minifat(&mut self, first_sector: u32) -> Result<(), OleError> {
        let bytes = self.read_fat_chain(first_sector, None)?;
        self.minifat = words(&bytes);
        Ok(())
    }

    fn load_directory(&mut self, first_sector: u32) -> Result<(), OleError> {
        let bytes = self.read_fat_chain(first_sector, None)?;
        let version3 = self.sector_size == SECTOR_SIZE_V3;
        for chunk in bytes.chunks_exact(DIRENTRY_SIZE) {
            let raw = RawDirectoryEntry::read_from_bytes(chunk)
                .map_err(|_| OleError::Corrupted("unreadable directory entry".to_string()))?;
            let name_len = (raw.name_len.get() as usize).saturating_sub(2).min(64);
            let (name, _) = encoding_rs::UTF_16LE.decode_without_bom_handling(&raw.name[..name_len]);
            // Version 3 readers must ignore the high half of the size
            let size = if version3 {
                raw.stream_size.get() & 0xFFFF_FFFF
            } else {
                raw.stream_size.get()
            };
            self.entries.push(DirEntry {
                name: name.trim_end_matches('\0').to_string(),
                entry_type: raw.entry_type,
                sid_left: raw.sid_left.get(),
                sid_right: raw.sid_right.get(),
                sid_child: raw.sid_child.get(),
                start_sector: raw.start_sector.get(),
                size,
            });
        }
        match self.entries.first() {
            Some(root) if root.entry_type == STGTY_ROOT => Ok(()),
            _ => Err(OleError::Corrupted("missing root directory entry".to_string())),
        }
    }

    /// Follow a FAT chain, reading at most `size` bytes when given.
    fn read_fat_chain(&self, start: u32, size: Option<u64>) -> Result<Vec<u8>, OleError> {
        let mut out = Vec::with_capacity(size.unwrap_or(self.sector_size as u64) as usize);
        let mut sector = start;
        let mut hops = 0usize;
        while sector != ENDOFCHAIN {
            if hops > self.fat.len() {
                return Err(OleError::Corrupted(format!("FAT chain from sector {start} loops")));
            }
            let next = *self
                .fat
                .get(sector as usize)
                .ok_or_else(|| OleError::Corrupted(format!("sector {sector} outside the FAT")))?;
            out.extend_from_slice(self.sector(sector)?);
            sector = next;
            hops += 1;
            if let Some(size) = size
                && out.len() as u64 >= size
            {
                break;
            }
        }
        if let Some(size) = size {
            if (out.len() as u64) < size {
                return Err(OleError::Corrupted(format!("stream from sector {start} is truncated")));
            }
            out.truncate(size as usize);
        }
        Ok(out)
    }

    fn read_minifat_chain(&self, start: u32, size: u64) -> Result<Vec<u8>, OleError> {
        let mut out = Vec::with_capacity(size as usize);
        let mut sector = start;
        let mut hops = 0usize;
        while sector != ENDOFCHAIN && (out.len() as u64) < size {
            if hops > self.minifat.len() {
                return Err(OleError::Corrupted(format!("mini FAT chain from sector {start} loops")));
            }
            let next = *self
                .minifat
                .get(sector as usize)
                .ok_or_else(|| OleError::Corrupted(format!("mini sector {sector} outside the mini FAT")))?;
            let offset = sector as usize * MINI_SECTOR_SIZE;
            let chunk = self
                .ministream
                .get(offset..offset + MINI_SECTOR_SIZE)
                .ok_or_else(|| OleError::Corrupted(format!("mini sector {sector} beyond the mini stream")))?;
            out.extend_from_slice(chunk);
            sector = next;
            hops += 1;
        }
        if (out.len() as u64) < size {
            return Err(OleError::Corrupted(format!("mini stream from sector {start} is truncated")));
        }
        out.truncate(size as usize);
        Ok(out)
    }

    /// Find the entry at `path`, comparing names case-insensitively.
    fn find(&self, path: &[&str]) -> Option<&DirEntry> {
        let mut entry = self.entries.first()?;
        for name in path {
            entry = self.find_child(entry.sid_child, name)?;
        }
        Some(entry)
    }

    fn find_child(&self, root: u32, name: &str) -> Option<&DirEntry> {
        let wanted = name.to_uppercase();
        // Iterative walk; sibling trees in the wild are not always ordered
        let mut stack = vec![root];
        let mut visited = 0usize;
        while let Some(sid) = stack.pop() {
            if sid == NOSTREAM || visited > self.entries.len() {
                continue;
            }
            visited += 1;
            let entry = self.entries.get(sid as usize)?;
            if entry.entry_type != STGTY_EMPTY && entry.name.to_uppercase() == wanted {
                return Some(entry);
            }
            stack.push(entry.sid_left);
            stack.push(entry.sid_right);
        }
        None
    }

    /// Whether a stream or storage exists at `path`.
    pub fn exists(&self, path: &[&str]) -> bool {
        self.find(path).is_some()
    }

    /// Contents of the stream at `path`.
    pub fn open_stream(&self, path: &[&str]) -> Result<Vec<u8>, OleError> {
        let entry = self
            .find(path)
            .filter(|e| e.entry_type == STGTY_STREAM)
            .ok_or_else(|| OleError::StreamNotFound(path.join("/")))?;
        if entry.size == 0 {
            return Ok(Vec::new());
        }
        if entry.size < self.mini_stream_cutoff as u64 {
            self.read_minifat_chain(entry.start_sector, entry.size)
        } else {
            self.read_fat_chain(entry.start_sector, Some(entry.size))
        }
    }

    /// Paths of all streams, storages walked in directory order.
    pub fn list_streams(&self) -> Vec<Vec<String>> {
        let mut out = Vec::new();
        if let Some(root) = self.entries.first() {
            self.collect(root.sid_child, &mut Vec::new(), &mut out, 0);
        }
        out
    }

    fn collect(&self, sid: u32, path: &mut Vec<String>, out: &mut Vec<Vec<String>>, depth: usize) {
        if sid == NOSTREAM || depth > self.entries.len() {
            return;
        }
        let Some(entry) = self.entries.get(sid as usize) else {
            return;
        };
        self.collect(entry.sid_left, path, out, depth + 1);
        path.push(entry.name.clone());
        match entry.entry_type {
            STGTY_STREAM => out.push(path.clone()),
            STGTY_STORAGE => self.collect(entry.sid_child, path, out, depth + 1),
            _ => {},
        }
        path.pop();
        self.collect(entry.sid_right, path, out, depth + 1);
    }
}

fn words(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Check for the compound file signature.
pub fn is_ole_file(data: &[u8]) -> bool {
    data.len() >= HEADER_SIZE && data.starts_with(MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_ole() {
        assert!(matches!(OleReader::open(b"PK\x03\x04rest"), Err(OleError::NotOleFile)));
        let mut bytes = vec![0u8; 1024];
        bytes[..8].copy_from_slice(MAGIC);
        assert!(matches!(OleReader::open(&bytes), Err(OleError::InvalidHeader(_))));
    }
}
