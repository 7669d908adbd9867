//! `IndexPage`: the validated view over a raw INDEX page buffer.
//!
//! Wraps a page's bytes together with its parsed [`FilHeader`] and
//! [`IndexHeader`], and exposes the pieces [`crate::innodb::record_decoder`]
//! and [`crate::page_search`] need: the page directory, the infimum/supremum
//! offsets, and the sibling page link.

use byteorder::{BigEndian, ByteOrder};

use crate::innodb::constants::*;
use crate::innodb::index::IndexHeader;
use crate::innodb::page::FilHeader;
use crate::innodb::page_types::PageType;
use crate::page_store::PageStore;
use crate::IdbError;

/// Maximum number of SDI pages an index-page load is allowed to skip over
/// before giving up.
const MAX_SDI_SKIPS: u32 = 2;

/// A validated, parsed view over one INDEX page's raw bytes.
#[derive(Debug, Clone)]
pub struct IndexPage {
    data: Vec<u8>,
    fil_header: FilHeader,
    index_header: IndexHeader,
}

impl IndexPage {
    /// Parse and validate a raw page buffer as an INDEX page.
    ///
    /// Returns [`IdbError::PageTypeMismatch`] if the page's FIL header type
    /// is not `INDEX`. Callers that want to transparently skip past `SDI`
    /// pages should use [`load_index_page`] instead.
    pub fn parse(data: Vec<u8>) -> Result<Self, IdbError> {
        let fil_header = FilHeader::parse(&data)
            .ok_or_else(|| IdbError::MalformedRecord("page too short for FIL header".into()))?;
        if fil_header.page_type != PageType::Index {
            return Err(IdbError::PageTypeMismatch(format!(
                "expected INDEX page, found {}",
                fil_header.page_type
            )));
        }
        let index_header = IndexHeader::parse(&data)
            .ok_or_else(|| IdbError::MalformedRecord("page too short for INDEX header".into()))?;
        Ok(IndexPage {
            data,
            fil_header,
            index_header,
        })
    }

    /// The parsed FIL header.
    pub fn fil_header(&self) -> &FilHeader {
        &self.fil_header
    }

    /// The parsed INDEX page header.
    pub fn header(&self) -> &IndexHeader {
        &self.index_header
    }

    /// True if this page is a leaf (level 0) page.
    pub fn is_leaf(&self) -> bool {
        self.index_header.is_leaf()
    }

    /// Byte offset of the infimum record's origin within the page.
    pub fn infimum(&self) -> usize {
        PAGE_NEW_INFIMUM
    }

    /// Byte offset of the supremum record's origin within the page.
    pub fn supremum(&self) -> usize {
        PAGE_NEW_SUPREMUM
    }

    /// This page's own page number, from the FIL header.
    pub fn page_number(&self) -> u32 {
        self.fil_header.page_number
    }

    /// The next sibling leaf page in the doubly-linked list, or `None` if
    /// this is the last page at its level.
    pub fn next_sibling_page(&self) -> Option<u32> {
        if self.fil_header.has_next() {
            Some(self.fil_header.next_page)
        } else {
            None
        }
    }

    /// Directory slot offsets, in logical order: slot 0 points at the
    /// infimum record, the last slot points at the supremum record. Slots
    /// are physically stored backward from the page trailer.
    pub fn directory_slots(&self) -> Vec<u16> {
        let page_size = self.data.len();
        let trailer_start = page_size - SIZE_FIL_TRAILER;
        let n = self.index_header.n_dir_slots as usize;
        let mut slots = Vec::with_capacity(n);
        for i in 0..n {
            let addr = trailer_start - (i + 1) * PAGE_DIR_SLOT_SIZE;
            slots.push(BigEndian::read_u16(&self.data[addr..addr + 2]));
        }
        slots
    }

    /// The raw page bytes, for [`crate::innodb::record_decoder::RecordDecoder`]
    /// to read fields and record headers out of directly.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// A cursor positioned at the start of the record body (immediately
    /// after the FIL/INDEX/FSEG headers), for sequential field decoding.
    pub fn cursor(&self) -> std::io::Cursor<&[u8]> {
        std::io::Cursor::new(&self.data[..])
    }
}

/// Load the INDEX page at `page_no`, transparently skipping past `SDI`
/// pages (up to [`MAX_SDI_SKIPS`] of them) by advancing to the next page
/// number. Any other page type mismatch is reported immediately.
pub fn load_index_page<S: PageStore>(store: &mut S, page_no: u32) -> Result<IndexPage, IdbError> {
    let mut current = page_no;
    for skips in 0..=MAX_SDI_SKIPS {
        let data = store.load(current)?;
        let fil_header = FilHeader::parse(&data)
            .ok_or_else(|| IdbError::MalformedRecord("page too short for FIL header".into()))?;
        if fil_header.page_type == PageType::Sdi && skips < MAX_SDI_SKIPS {
            current += 1;
            continue;
        }
        return IndexPage::parse(data);
    }
    Err(IdbError::PageTypeMismatch(format!(
        "page {} and its successors are SDI pages, exceeded {} skips",
        page_no, MAX_SDI_SKIPS
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_index_page(page_no: u32, level: u16, n_dir_slots: u16, next_page: u32) -> Vec<u8> {
        let mut page = vec![0u8; 16384];
        BigEndian::write_u32(&mut page[FIL_PAGE_OFFSET..], page_no);
        BigEndian::write_u32(&mut page[FIL_PAGE_PREV..], FIL_NULL);
        BigEndian::write_u32(&mut page[FIL_PAGE_NEXT..], next_page);
        BigEndian::write_u16(&mut page[FIL_PAGE_TYPE..], PageType::Index.as_u16());

        let base = FIL_PAGE_DATA;
        BigEndian::write_u16(&mut page[base + PAGE_N_DIR_SLOTS..], n_dir_slots);
        BigEndian::write_u16(&mut page[base + PAGE_LEVEL..], level);
        BigEndian::write_u16(&mut page[base + PAGE_N_HEAP..], 0x8000 | 2);
        BigEndian::write_u64(&mut page[base + PAGE_INDEX_ID..], 7);

        let trailer_start = page.len() - SIZE_FIL_TRAILER;
        BigEndian::write_u16(
            &mut page[trailer_start - PAGE_DIR_SLOT_SIZE..],
            PAGE_NEW_INFIMUM as u16,
        );
        BigEndian::write_u16(
            &mut page[trailer_start - 2 * PAGE_DIR_SLOT_SIZE..],
            PAGE_NEW_SUPREMUM as u16,
        );
        page
    }

    #[test]
    fn test_parse_rejects_non_index_page() {
        let mut page = vec![0u8; 16384];
        BigEndian::write_u16(&mut page[FIL_PAGE_TYPE..], PageType::FspHdr.as_u16());
        let err = IndexPage::parse(page).unwrap_err();
        assert!(matches!(err, IdbError::PageTypeMismatch(_)));
    }

    #[test]
    fn test_parse_accepts_index_page() {
        let page = build_index_page(3, 0, 2, FIL_NULL);
        let idx = IndexPage::parse(page).unwrap();
        assert!(idx.is_leaf());
        assert_eq!(idx.page_number(), 3);
        assert_eq!(idx.next_sibling_page(), None);
    }

    #[test]
    fn test_directory_slots_logical_order() {
        let page = build_index_page(3, 0, 2, FIL_NULL);
        let idx = IndexPage::parse(page).unwrap();
        let slots = idx.directory_slots();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0] as usize, PAGE_NEW_INFIMUM);
        assert_eq!(slots[1] as usize, PAGE_NEW_SUPREMUM);
    }

    #[test]
    fn test_next_sibling_page_present() {
        let page = build_index_page(3, 0, 2, 4);
        let idx = IndexPage::parse(page).unwrap();
        assert_eq!(idx.next_sibling_page(), Some(4));
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
            16384
        }
    }

    fn sdi_page() -> Vec<u8> {
        let mut page = vec![0u8; 16384];
        BigEndian::write_u16(&mut page[FIL_PAGE_TYPE..], PageType::Sdi.as_u16());
        page
    }

    #[test]
    fn test_load_index_page_skips_single_sdi_page() {
        let mut pages = std::collections::HashMap::new();
        pages.insert(3, sdi_page());
        pages.insert(4, build_index_page(4, 0, 2, FIL_NULL));
        let mut store = FakeStore { pages };

        let page = load_index_page(&mut store, 3).unwrap();
        assert_eq!(page.page_number(), 4);
    }

    #[test]
    fn test_load_index_page_fails_after_max_skips() {
        let mut pages = std::collections::HashMap::new();
        pages.insert(3, sdi_page());
        pages.insert(4, sdi_page());
        pages.insert(5, sdi_page());
        let mut store = FakeStore { pages };

        let err = load_index_page(&mut store, 3).unwrap_err();
        assert!(matches!(err, IdbError::PageTypeMismatch(_)));
    }
}
