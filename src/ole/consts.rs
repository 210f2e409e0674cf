//! Compound File Binary format constants.

/// Signature at offset 0 of every compound file
pub const MAGIC: &[u8; 8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

/// Header, FAT-sector array included
pub const HEADER_SIZE: usize = 512;

/// FAT sector ids stored in the header itself
pub const HEADER_DIFAT_ENTRIES: usize = 109;

/// Size of a directory entry in bytes
pub const DIRENTRY_SIZE: usize = 128;

/// Sector size for version 3 files
pub const SECTOR_SIZE_V3: usize = 512;

/// Sector size for version 4 files
pub const SECTOR_SIZE_V4: usize = 4096;

pub const MINI_SECTOR_SIZE: usize = 64;

/// Streams smaller than this live in the mini stream
pub const MINI_STREAM_CUTOFF: u32 = 4096;

// Special sector ids
/// Maximum regular sector ID
pub const MAXREGSECT: u32 = 0xFFFFFFFA;
/// Denotes a DIFAT sector in a FAT
pub const DIFSECT: u32 = 0xFFFFFFFC;
/// Denotes a FAT sector in a FAT
pub const FATSECT: u32 = 0xFFFFFFFD;
/// End of a sector chain
pub const ENDOFCHAIN: u32 = 0xFFFFFFFE;
/// Unallocated sector
pub const FREESECT: u32 = 0xFFFFFFFF;

/// No sibling or child
pub const NOSTREAM: u32 = 0xFFFFFFFF;

// Directory entry types
pub const STGTY_EMPTY: u8 = 0;
pub const STGTY_STORAGE: u8 = 1;
pub const STGTY_STREAM: u8 = 2;
pub const STGTY_ROOT: u8 = 5;

/// Longest entry name in UTF-16 code units, terminator excluded
pub const MAX_NAME_UNITS: usize = 31;
