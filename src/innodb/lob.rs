//! Large object (BLOB/LOB) overflow page assembly.
//!
//! InnoDB stores column values too large for the on-page 768-byte prefix on
//! dedicated overflow pages, linked via [`OverflowPagePointer`]. Old-style
//! BLOB pages (page types 10-12) use a simple 8-byte header
//! ([`BlobPageHeader`]) with the data length and next-page pointer, chained
//! until `FIL_NULL`. MySQL 8.0+ introduces structured LOB first pages (type
//! 24, `LOB_FIRST`) with a richer header; this crate does not reassemble the
//! new layout and instead reports it so callers can decide whether to treat
//! it as a hard error or a soft null, per [`crate::decode_config::DecodeConfig`].

use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;

use crate::innodb::constants::{BTR_EXTERN_FIELD_REF_SIZE, FIL_NULL, FIL_PAGE_DATA, FIL_PAGE_TYPE};
use crate::innodb::page_types::PageType;
use crate::page_store::PageStore;
use crate::IdbError;

const LOB_HDR_PART_LEN: usize = 0;
const LOB_HDR_NEXT_PAGE_NO: usize = 4;
const LOB_HDR_SIZE: usize = 8;

/// A 20-byte `BTR_EXTERN_FIELD_REF` pointing at an overflow page chain.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OverflowPagePointer {
    /// Space ID the overflow pages live in.
    pub space_id: u32,
    /// First page number of the overflow chain.
    pub page_number: u32,
    /// Byte offset within that page where the chain's data begins.
    pub page_offset: u32,
    /// Total length of the externally-stored value, in bytes.
    pub total_length: u64,
}

impl OverflowPagePointer {
    /// Parse a 20-byte external field reference.
    ///
    /// # Examples
    ///
    /// ```
    /// use idb::innodb::lob::OverflowPagePointer;
    /// use byteorder::{BigEndian, ByteOrder};
    ///
    /// let mut buf = vec![0u8; 20];
    /// BigEndian::write_u32(&mut buf[0..], 1);
    /// BigEndian::write_u32(&mut buf[4..], 55);
    /// BigEndian::write_u32(&mut buf[8..], 128);
    /// BigEndian::write_u64(&mut buf[12..], 4000);
    ///
    /// let ptr = OverflowPagePointer::parse(&buf).unwrap();
    /// assert_eq!(ptr.space_id, 1);
    /// assert_eq!(ptr.page_number, 55);
    /// assert_eq!(ptr.total_length, 4000);
    /// ```
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < BTR_EXTERN_FIELD_REF_SIZE {
            return None;
        }
        Some(OverflowPagePointer {
            space_id: BigEndian::read_u32(&data[0..4]),
            page_number: BigEndian::read_u32(&data[4..8]),
            page_offset: BigEndian::read_u32(&data[8..12]),
            total_length: BigEndian::read_u64(&data[12..20]),
        })
    }
}

/// Parsed old-style BLOB page header.
#[derive(Debug, Clone, Serialize)]
pub struct BlobPageHeader {
    /// Number of data bytes stored on this page.
    pub part_len: u32,
    /// Page number of the next BLOB page (FIL_NULL if last).
    pub next_page_no: u32,
}

impl BlobPageHeader {
    /// Parse an old-style BLOB page header from a full page buffer.
    pub fn parse(page_data: &[u8]) -> Option<Self> {
        let base = FIL_PAGE_DATA;
        if page_data.len() < base + LOB_HDR_SIZE {
            return None;
        }
        let d = &page_data[base..];
        Some(BlobPageHeader {
            part_len: BigEndian::read_u32(&d[LOB_HDR_PART_LEN..]),
            next_page_no: BigEndian::read_u32(&d[LOB_HDR_NEXT_PAGE_NO..]),
        })
    }

    /// Returns true if there is a next page in the chain.
    pub fn has_next(&self) -> bool {
        self.next_page_no != FIL_NULL && self.next_page_no != 0
    }
}

/// Parsed new-style LOB first page header (MySQL 8.0+, page type `LOB_FIRST`).
#[derive(Debug, Clone, Serialize)]
pub struct LobFirstPageHeader {
    /// LOB version.
    pub version: u8,
    /// LOB flags.
    pub flags: u8,
    /// Total uncompressed data length of the LOB.
    pub data_len: u32,
    /// Transaction ID that created the LOB.
    pub trx_id: u64,
}

const LOB_FIRST_VERSION: usize = 0;
const LOB_FIRST_FLAGS: usize = 1;
const LOB_FIRST_DATA_LEN: usize = 2;
const LOB_FIRST_TRX_ID: usize = 6;
const LOB_FIRST_HDR_SIZE: usize = 12;

impl LobFirstPageHeader {
    /// Parse a LOB first page header from a full page buffer.
    pub fn parse(page_data: &[u8]) -> Option<Self> {
        let base = FIL_PAGE_DATA;
        if page_data.len() < base + LOB_FIRST_HDR_SIZE {
            return None;
        }
        let d = &page_data[base..];
        let trx_id = if d.len() >= LOB_FIRST_TRX_ID + 6 {
            let mut buf = [0u8; 8];
            buf[2..8].copy_from_slice(&d[LOB_FIRST_TRX_ID..LOB_FIRST_TRX_ID + 6]);
            BigEndian::read_u64(&buf)
        } else {
            0
        };
        Some(LobFirstPageHeader {
            version: d[LOB_FIRST_VERSION],
            flags: d[LOB_FIRST_FLAGS],
            data_len: BigEndian::read_u32(&d[LOB_FIRST_DATA_LEN..]),
            trx_id,
        })
    }
}

fn page_type_of(page_data: &[u8]) -> Option<PageType> {
    if page_data.len() < FIL_PAGE_TYPE + 2 {
        return None;
    }
    Some(PageType::from_u16(BigEndian::read_u16(
        &page_data[FIL_PAGE_TYPE..],
    )))
}

/// Walk an old-style BLOB page chain starting at `start_page`, assembling the
/// full payload. Returns [`IdbError::UnsupportedLobFormat`] if the chain's
/// first page is a new-style `LOB_FIRST` page (MySQL 8.0+ large LOB layout);
/// callers decide whether that is fatal via
/// [`crate::decode_config::DecodeConfig::throw_on_unsupported_new_lob`].
pub fn walk_blob_chain<S: PageStore>(
    store: &mut S,
    start_page: u32,
    max_pages: usize,
) -> Result<Vec<u8>, IdbError> {
    let mut payload = Vec::new();
    let mut current = start_page;

    for _ in 0..max_pages {
        if current == FIL_NULL || current == 0 {
            break;
        }

        let page_data = store.load(current)?;

        if let Some(PageType::LobFirst) = page_type_of(&page_data) {
            return Err(IdbError::UnsupportedLobFormat(format!(
                "page {} is a new-style LOB_FIRST page",
                current
            )));
        }

        let hdr = BlobPageHeader::parse(&page_data).ok_or_else(|| {
            IdbError::MalformedRecord(format!("page {} is not a valid BLOB page", current))
        })?;

        let base = FIL_PAGE_DATA + LOB_HDR_SIZE;
        let part_len = hdr.part_len as usize;
        if base + part_len > page_data.len() {
            return Err(IdbError::MalformedRecord(format!(
                "BLOB page {} part_len {} exceeds page bounds",
                current, part_len
            )));
        }
        payload.extend_from_slice(&page_data[base..base + part_len]);

        if !hdr.has_next() {
            break;
        }
        current = hdr.next_page_no;
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_page_pointer_parse() {
        let mut buf = vec![0u8; 20];
        BigEndian::write_u32(&mut buf[0..], 3);
        BigEndian::write_u32(&mut buf[4..], 99);
        BigEndian::write_u32(&mut buf[8..], 0);
        BigEndian::write_u64(&mut buf[12..], 5000);

        let ptr = OverflowPagePointer::parse(&buf).unwrap();
        assert_eq!(ptr.space_id, 3);
        assert_eq!(ptr.page_number, 99);
        assert_eq!(ptr.total_length, 5000);
    }

    #[test]
    fn test_blob_page_header_parse() {
        let mut page = vec![0u8; 256];
        let base = FIL_PAGE_DATA;
        BigEndian::write_u32(&mut page[base + LOB_HDR_PART_LEN..], 8000);
        BigEndian::write_u32(&mut page[base + LOB_HDR_NEXT_PAGE_NO..], 42);

        let hdr = BlobPageHeader::parse(&page).unwrap();
        assert_eq!(hdr.part_len, 8000);
        assert_eq!(hdr.next_page_no, 42);
        assert!(hdr.has_next());
    }

    #[test]
    fn test_blob_page_header_no_next() {
        let mut page = vec![0u8; 256];
        let base = FIL_PAGE_DATA;
        BigEndian::write_u32(&mut page[base + LOB_HDR_PART_LEN..], 5000);
        BigEndian::write_u32(&mut page[base + LOB_HDR_NEXT_PAGE_NO..], FIL_NULL);

        let hdr = BlobPageHeader::parse(&page).unwrap();
        assert_eq!(hdr.part_len, 5000);
        assert!(!hdr.has_next());
    }

    #[test]
    fn test_lob_first_page_header_parse() {
        let mut page = vec![0u8; 256];
        let base = FIL_PAGE_DATA;
        page[base + LOB_FIRST_VERSION] = 1;
        page[base + LOB_FIRST_FLAGS] = 0;
        BigEndian::write_u32(&mut page[base + LOB_FIRST_DATA_LEN..], 100_000);
        let trx_bytes = 12345u64.to_be_bytes();
        page[base + LOB_FIRST_TRX_ID..base + LOB_FIRST_TRX_ID + 6]
            .copy_from_slice(&trx_bytes[2..8]);

        let hdr = LobFirstPageHeader::parse(&page).unwrap();
        assert_eq!(hdr.version, 1);
        assert_eq!(hdr.data_len, 100_000);
        assert_eq!(hdr.trx_id, 12345);
    }

    struct FakeStore {
        pages: std::collections::HashMap<u32, Vec<u8>>,
    }

    impl PageStore for FakeStore {
        fn load(&mut self, page_no: u32) -> Result<Vec<u8>, IdbError> {
            self.pages
                .get(&page_no)
                .cloned()
                .ok_or_else(|| IdbError::Argument(format!("no such page {}", page_no)))
        }
        fn page_size(&self) -> u32 {
            256
        }
    }

    fn blob_page(page_type: u16, part_len: u32, next: u32, payload: &[u8]) -> Vec<u8> {
        let mut page = vec![0u8; 256];
        BigEndian::write_u16(&mut page[FIL_PAGE_TYPE..], page_type);
        let base = FIL_PAGE_DATA;
        BigEndian::write_u32(&mut page[base + LOB_HDR_PART_LEN..], part_len);
        BigEndian::write_u32(&mut page[base + LOB_HDR_NEXT_PAGE_NO..], next);
        page[base + LOB_HDR_SIZE..base + LOB_HDR_SIZE + payload.len()].copy_from_slice(payload);
        page
    }

    #[test]
    fn test_walk_blob_chain_assembles_payload() {
        let mut pages = std::collections::HashMap::new();
        pages.insert(10, blob_page(10, 4, FIL_NULL, b"abcd"));
        let mut store = FakeStore { pages };

        let payload = walk_blob_chain(&mut store, 10, 10).unwrap();
        assert_eq!(payload, b"abcd");
    }

    #[test]
    fn test_walk_blob_chain_follows_chain() {
        let mut pages = std::collections::HashMap::new();
        pages.insert(10, blob_page(10, 3, 11, b"foo"));
        pages.insert(11, blob_page(10, 3, FIL_NULL, b"bar"));
        let mut store = FakeStore { pages };

        let payload = walk_blob_chain(&mut store, 10, 10).unwrap();
        assert_eq!(payload, b"foobar");
    }

    #[test]
    fn test_walk_blob_chain_rejects_lob_first() {
        let mut pages = std::collections::HashMap::new();
        pages.insert(10, blob_page(24, 0, FIL_NULL, b""));
        let mut store = FakeStore { pages };

        let err = walk_blob_chain(&mut store, 10, 10).unwrap_err();
        assert!(matches!(err, IdbError::UnsupportedLobFormat(_)));
    }
}
