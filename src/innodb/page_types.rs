//! InnoDB page type definitions.
//!
//! Maps the 2-byte page type field (bytes 24-25 of the FIL header) to a
//! [`PageType`] enum. Each variant carries its MySQL source name and a
//! human-readable description via [`PageType::name`]/[`PageType::description`].
//!
//! Covers page types from INDEX (17855) and SDI (17853) data pages through
//! the bookkeeping page types (UNDO, INODE, XDES) and the BLOB/LOB overflow
//! page family, uncompressed and compressed.

use serde::Serialize;
use std::fmt;

/// InnoDB page types, keyed by the 2-byte value at `FIL_PAGE_TYPE`.
///
/// Values are from `fil0fil.h` in MySQL source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PageType {
    /// Freshly allocated, type field not initialized (FIL_PAGE_TYPE_ALLOCATED = 0)
    Allocated,
    /// Unused page type marker (FIL_PAGE_TYPE_UNUSED = 1)
    Unused,
    /// Undo log page (FIL_PAGE_UNDO_LOG = 2)
    UndoLog,
    /// File segment inode (FIL_PAGE_INODE = 3)
    Inode,
    /// Insert buffer free list (FIL_PAGE_IBUF_FREE_LIST = 4)
    IbufFreeList,
    /// Insert buffer bitmap (FIL_PAGE_IBUF_BITMAP = 5)
    IbufBitmap,
    /// System internal page (FIL_PAGE_TYPE_SYS = 6)
    Sys,
    /// Transaction system header (FIL_PAGE_TYPE_TRX_SYS = 7)
    TrxSys,
    /// File space header, page 0 of each tablespace (FIL_PAGE_TYPE_FSP_HDR = 8)
    FspHdr,
    /// Extent descriptor (FIL_PAGE_TYPE_XDES = 9)
    Xdes,
    /// Uncompressed BLOB page (FIL_PAGE_TYPE_BLOB = 10)
    Blob,
    /// First compressed BLOB page (FIL_PAGE_TYPE_ZBLOB = 11)
    ZBlob,
    /// Subsequent compressed BLOB page (FIL_PAGE_TYPE_ZBLOB2 = 12)
    ZBlob2,
    /// Unknown/reserved (FIL_PAGE_TYPE_UNKNOWN = 13)
    Unknown,
    /// Compressed page (FIL_PAGE_COMPRESSED = 14)
    Compressed,
    /// Encrypted page (FIL_PAGE_ENCRYPTED = 15)
    Encrypted,
    /// Compressed and encrypted page (FIL_PAGE_COMPRESSED_AND_ENCRYPTED = 16)
    CompressedEncrypted,
    /// Encrypted R-tree page (FIL_PAGE_ENCRYPTED_RTREE = 17)
    EncryptedRtree,
    /// Uncompressed SDI BLOB page (FIL_PAGE_SDI_BLOB = 18, MySQL 8.0+)
    SdiBlob,
    /// Compressed SDI BLOB page (FIL_PAGE_SDI_ZBLOB = 19, MySQL 8.0+)
    SdiZblob,
    /// Legacy doublewrite buffer page (FIL_PAGE_TYPE_LEGACY_DBLWR = 20, MySQL 8.0+)
    LegacyDblwr,
    /// Rollback segment array page (FIL_PAGE_TYPE_RSEG_ARRAY = 21, MySQL 8.0+)
    RsegArray,
    /// LOB index page (FIL_PAGE_TYPE_LOB_INDEX = 22, MySQL 8.0+)
    LobIndex,
    /// LOB data page (FIL_PAGE_TYPE_LOB_DATA = 23, MySQL 8.0+)
    LobData,
    /// LOB first page (FIL_PAGE_TYPE_LOB_FIRST = 24, MySQL 8.0+)
    LobFirst,
    /// First page of compressed LOB (FIL_PAGE_TYPE_ZLOB_FIRST = 25, MySQL 8.0+)
    ZlobFirst,
    /// Data pages of compressed LOB (FIL_PAGE_TYPE_ZLOB_DATA = 26, MySQL 8.0+)
    ZlobData,
    /// Index pages of compressed LOB (FIL_PAGE_TYPE_ZLOB_INDEX = 27, MySQL 8.0+)
    ZlobIndex,
    /// Fragment pages of compressed LOB (FIL_PAGE_TYPE_ZLOB_FRAG = 28, MySQL 8.0+)
    ZlobFrag,
    /// Index of fragment pages for compressed LOB (FIL_PAGE_TYPE_ZLOB_FRAG_ENTRY = 29, MySQL 8.0+)
    ZlobFragEntry,
    /// SDI index page (FIL_PAGE_SDI = 17853, MySQL 8.0+)
    Sdi,
    /// R-tree index page for spatial indexes (FIL_PAGE_RTREE = 17854)
    Rtree,
    /// B+Tree index page for table and index data (FIL_PAGE_INDEX = 17855)
    Index,
}

impl PageType {
    /// Parse a page type from a u16 value read from the FIL header.
    ///
    /// # Examples
    ///
    /// ```
    /// use idb::innodb::page_types::PageType;
    ///
    /// let page_type = PageType::from_u16(17855);
    /// assert_eq!(page_type, PageType::Index);
    ///
    /// let fsp = PageType::from_u16(8);
    /// assert_eq!(fsp, PageType::FspHdr);
    ///
    /// let unknown = PageType::from_u16(9999);
    /// assert_eq!(unknown, PageType::Unknown);
    /// ```
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => PageType::Allocated,
            1 => PageType::Unused,
            2 => PageType::UndoLog,
            3 => PageType::Inode,
            4 => PageType::IbufFreeList,
            5 => PageType::IbufBitmap,
            6 => PageType::Sys,
            7 => PageType::TrxSys,
            8 => PageType::FspHdr,
            9 => PageType::Xdes,
            10 => PageType::Blob,
            11 => PageType::ZBlob,
            12 => PageType::ZBlob2,
            13 => PageType::Unknown,
            14 => PageType::Compressed,
            15 => PageType::Encrypted,
            16 => PageType::CompressedEncrypted,
            17 => PageType::EncryptedRtree,
            18 => PageType::SdiBlob,
            19 => PageType::SdiZblob,
            20 => PageType::LegacyDblwr,
            21 => PageType::RsegArray,
            22 => PageType::LobIndex,
            23 => PageType::LobData,
            24 => PageType::LobFirst,
            25 => PageType::ZlobFirst,
            26 => PageType::ZlobData,
            27 => PageType::ZlobIndex,
            28 => PageType::ZlobFrag,
            29 => PageType::ZlobFragEntry,
            17853 => PageType::Sdi,
            17854 => PageType::Rtree,
            17855 => PageType::Index,
            _ => PageType::Unknown,
        }
    }

    /// Returns the raw u16 value of this page type.
    pub fn as_u16(self) -> u16 {
        match self {
            PageType::Allocated => 0,
            PageType::Unused => 1,
            PageType::UndoLog => 2,
            PageType::Inode => 3,
            PageType::IbufFreeList => 4,
            PageType::IbufBitmap => 5,
            PageType::Sys => 6,
            PageType::TrxSys => 7,
            PageType::FspHdr => 8,
            PageType::Xdes => 9,
            PageType::Blob => 10,
            PageType::ZBlob => 11,
            PageType::ZBlob2 => 12,
            PageType::Unknown => 13,
            PageType::Compressed => 14,
            PageType::Encrypted => 15,
            PageType::CompressedEncrypted => 16,
            PageType::EncryptedRtree => 17,
            PageType::SdiBlob => 18,
            PageType::SdiZblob => 19,
            PageType::LegacyDblwr => 20,
            PageType::RsegArray => 21,
            PageType::LobIndex => 22,
            PageType::LobData => 23,
            PageType::LobFirst => 24,
            PageType::ZlobFirst => 25,
            PageType::ZlobData => 26,
            PageType::ZlobIndex => 27,
            PageType::ZlobFrag => 28,
            PageType::ZlobFragEntry => 29,
            PageType::Sdi => 17853,
            PageType::Rtree => 17854,
            PageType::Index => 17855,
        }
    }

    /// Returns (name, description) for this page type.
    fn metadata(self) -> (&'static str, &'static str) {
        match self {
            PageType::Allocated => ("ALLOCATED", "Freshly allocated, type not initialized"),
            PageType::Unused => ("UNUSED", "Unused page type marker"),
            PageType::UndoLog => ("UNDO_LOG", "Stores previous values of modified records"),
            PageType::Inode => ("INODE", "Bookkeeping for file segments"),
            PageType::IbufFreeList => ("IBUF_FREE_LIST", "Insert buffer free space management"),
            PageType::IbufBitmap => ("IBUF_BITMAP", "Insert buffer merge bitmap"),
            PageType::Sys => ("SYS", "System internal page"),
            PageType::TrxSys => ("TRX_SYS", "Transaction system header"),
            PageType::FspHdr => ("FSP_HDR", "File space header (page 0)"),
            PageType::Xdes => ("XDES", "Extent descriptor"),
            PageType::Blob => ("BLOB", "Uncompressed externally-stored column data"),
            PageType::ZBlob => ("ZBLOB", "Compressed externally-stored column data, first page"),
            PageType::ZBlob2 => (
                "ZBLOB2",
                "Compressed externally-stored column data, subsequent page",
            ),
            PageType::Unknown => ("UNKNOWN", "Unrecognized page type"),
            PageType::Compressed => ("COMPRESSED", "Page stored in compressed format"),
            PageType::Encrypted => ("ENCRYPTED", "Page stored in encrypted format"),
            PageType::CompressedEncrypted => (
                "COMPRESSED_ENCRYPTED",
                "Page stored in compressed and encrypted format",
            ),
            PageType::EncryptedRtree => ("ENCRYPTED_RTREE", "Encrypted R-tree spatial index page"),
            PageType::SdiBlob => ("SDI_BLOB", "Uncompressed SDI overflow data"),
            PageType::SdiZblob => ("SDI_ZBLOB", "Compressed SDI overflow data"),
            PageType::LegacyDblwr => ("LEGACY_DBLWR", "Legacy doublewrite buffer page"),
            PageType::RsegArray => ("RSEG_ARRAY", "Rollback segment array page"),
            PageType::LobIndex => ("LOB_INDEX", "Index page for uncompressed large objects"),
            PageType::LobData => ("LOB_DATA", "Data page for uncompressed large objects"),
            PageType::LobFirst => ("LOB_FIRST", "First page of an uncompressed large object"),
            PageType::ZlobFirst => ("ZLOB_FIRST", "First page of a compressed large object"),
            PageType::ZlobData => ("ZLOB_DATA", "Data page for compressed large objects"),
            PageType::ZlobIndex => ("ZLOB_INDEX", "Index page for compressed large objects"),
            PageType::ZlobFrag => ("ZLOB_FRAG", "Fragment page for compressed large objects"),
            PageType::ZlobFragEntry => (
                "ZLOB_FRAG_ENTRY",
                "Index of fragment pages for compressed large objects",
            ),
            PageType::Sdi => ("SDI", "Serialized Dictionary Information metadata"),
            PageType::Index => ("INDEX", "B+Tree index data"),
            PageType::Rtree => ("RTREE", "Spatial R-tree index data"),
        }
    }

    /// Returns the name of this page type as used in MySQL source.
    ///
    /// # Examples
    ///
    /// ```
    /// use idb::innodb::page_types::PageType;
    ///
    /// assert_eq!(PageType::Index.name(), "INDEX");
    /// assert_eq!(PageType::FspHdr.name(), "FSP_HDR");
    /// assert_eq!(PageType::Sdi.name(), "SDI");
    /// ```
    pub fn name(self) -> &'static str {
        self.metadata().0
    }

    /// Returns a human-readable description of this page type.
    pub fn description(self) -> &'static str {
        self.metadata().1
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
