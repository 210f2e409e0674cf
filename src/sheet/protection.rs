//! Worksheet and workbook protection.
//!
//! Excel's sheet and workbook protection is advisory: the password is stored
//! as a 16-bit XOR hash and only gates editing in the UI.

use bitflags::bitflags;

bitflags! {
    /// `sheetProtection` attributes. A set bit means the action is locked.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ProtectionFlags: u32 {
        /// Sheet protection is on
        const SHEET = 0x0001;
        const OBJECTS = 0x0002;
        const SCENARIOS = 0x0004;
        const FORMAT_CELLS = 0x0008;
        const FORMAT_COLUMNS = 0x0010;
        const FORMAT_ROWS = 0x0020;
        const INSERT_COLUMNS = 0x0040;
        const INSERT_ROWS = 0x0080;
        const INSERT_HYPERLINKS = 0x0100;
        const DELETE_COLUMNS = 0x0200;
        const DELETE_ROWS = 0x0400;
        const SELECT_LOCKED_CELLS = 0x0800;
        const SORT = 0x1000;
        const AUTO_FILTER = 0x2000;
        const PIVOT_TABLES = 0x4000;
        const SELECT_UNLOCKED_CELLS = 0x8000;
    }
}

/// Attribute name and flag, in schema order.
pub const PROTECTION_ATTRIBUTES: [(&str, ProtectionFlags); 16] = [
    ("sheet", ProtectionFlags::SHEET),
    ("objects", ProtectionFlags::OBJECTS),
    ("scenarios", ProtectionFlags::SCENARIOS),
    ("formatCells", ProtectionFlags::FORMAT_CELLS),
    ("formatColumns", ProtectionFlags::FORMAT_COLUMNS),
    ("formatRows", ProtectionFlags::FORMAT_ROWS),
    ("insertColumns", ProtectionFlags::INSERT_COLUMNS),
    ("insertRows", ProtectionFlags::INSERT_ROWS),
    ("insertHyperlinks", ProtectionFlags::INSERT_HYPERLINKS),
    ("deleteColumns", ProtectionFlags::DELETE_COLUMNS),
    ("deleteRows", ProtectionFlags::DELETE_ROWS),
    ("selectLockedCells", ProtectionFlags::SELECT_LOCKED_CELLS),
    ("sort", ProtectionFlags::SORT),
    ("autoFilter", ProtectionFlags::AUTO_FILTER),
    ("pivotTables", ProtectionFlags::PIVOT_TABLES),
    ("selectUnlockedCells", ProtectionFlags::SELECT_UNLOCKED_CELLS),
];

impl ProtectionFlags {
    /// Attribute values when an attribute is absent.
    pub const SCHEMA_DEFAULTS: ProtectionFlags = ProtectionFlags::FORMAT_CELLS
        .union(ProtectionFlags::FORMAT_COLUMNS)
        .union(ProtectionFlags::FORMAT_ROWS)
        .union(ProtectionFlags::INSERT_COLUMNS)
        .union(ProtectionFlags::INSERT_ROWS)
        .union(ProtectionFlags::INSERT_HYPERLINKS)
        .union(ProtectionFlags::DELETE_COLUMNS)
        .union(ProtectionFlags::DELETE_ROWS)
        .union(ProtectionFlags::SORT)
        .union(ProtectionFlags::AUTO_FILTER)
        .union(ProtectionFlags::PIVOT_TABLES);
}

/// Protection settings of one worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SheetProtection {
    /// Legacy hash as four uppercase hex digits
    pub password_hash: Option<String>,
    pub flags: ProtectionFlags,
    /// Hash attributes of the SHA-based scheme (`algorithmName`, `hashValue`,
    /// `saltValue`, `spinCount`), kept as read
    pub(crate) hash_attributes: Vec<(String, String)>,
}

impl SheetProtection {
    /// Protection with Excel's default locks and an optional password.
    pub fn new(password: Option<&str>) -> Self {
        Self {
            password_hash: password.map(hash_legacy_password),
            flags: ProtectionFlags::SCHEMA_DEFAULTS | ProtectionFlags::SHEET,
            hash_attributes: Vec::new(),
        }
    }

    #[inline]
    pub fn is_protected(&self) -> bool {
        self.flags.contains(ProtectionFlags::SHEET)
    }

    /// Allow or forbid an action (clears or sets the lock bit).
    pub fn allow(&mut self, action: ProtectionFlags, allowed: bool) {
        self.flags.set(action, !allowed);
    }
}

/// Locks on the workbook structure (`workbookProtection`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct WorkbookProtection {
    /// Sheets cannot be added, removed, moved, renamed or unhidden
    pub lock_structure: bool,
    /// Workbook windows keep their size and position
    pub lock_windows: bool,
    /// Revision tracking cannot be turned off
    pub lock_revision: bool,
    /// Legacy hash of the workbook password
    pub password_hash: Option<String>,
    /// Legacy hash of the revisions password
    pub revisions_password_hash: Option<String>,
    /// SHA-scheme attributes (`workbookHashValue`, `revisionsSaltValue`, ...),
    /// kept as read
    pub(crate) hash_attributes: Vec<(String, String)>,
}

impl WorkbookProtection {
    /// Lock the structure, hashing `password` with the legacy hash.
    pub fn new(password: Option<&str>) -> Self {
        Self {
            lock_structure: true,
            password_hash: password.map(hash_legacy_password),
            ..Self::default()
        }
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.lock_structure || self.lock_windows || self.lock_revision
    }
}

/// Legacy 16-bit worksheet password hash (ECMA-376 Part 4, 14.7.1).
///
/// ```rust
/// use litchi_xlsx::sheet::protection::hash_legacy_password;
///
/// assert_eq!(hash_legacy_password("abc"), "CC1A");
/// ```
pub fn hash_legacy_password(password: &str) -> String {
    let mut hash: u32 = 0;
    let mut len: u32 = 0;
    for (i, ch) in password.chars().enumerate() {
        let shifted = (ch as u32 & 0xFFFF) << ((i + 1) % 32);
        let rotated_out = shifted >> 15;
        hash ^= (shifted & 0x7FFF) | (rotated_out & 0x7FFF);
        len += 1;
    }
    hash ^= len;
    hash ^= 0xCE4B;
    format!("{:04X}", hash & 0xFFFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_legacy_password() {
        assert_eq!(hash_legacy_password("abc"), "CC1A");
        assert_eq!(hash_legacy_password("password"), "83AF");
        assert_eq!(hash_legacy_password(""), "CE4B");
    }

    #[test]
    fn test_allow_clears_lock() {
        let mut protection = SheetProtection::new(Some("abc"));
        assert!(protection.is_protected());
        assert!(protection.flags.contains(ProtectionFlags::SORT));
        protection.allow(ProtectionFlags::SORT, true);
        assert!(!protection.flags.contains(ProtectionFlags::SORT));
        assert_eq!(protection.password_hash.as_deref(), Some("CC1A"));
    }

    #[test]
    fn test_workbook_protection_locks_structure() {
        let protection = WorkbookProtection::new(Some("password"));
        assert!(protection.lock_structure && !protection.lock_windows);
        assert_eq!(protection.password_hash.as_deref(), Some("83AF"));
        assert!(!WorkbookProtection::default().is_locked());
    }
}
