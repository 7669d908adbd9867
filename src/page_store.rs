//! The `PageStore` collaborator: loads pages by number.
//!
//! This is the one I/O boundary the query core depends on. The concrete,
//! file-backed implementation is [`crate::innodb::tablespace::Tablespace`].

use crate::IdbError;

/// Loads fixed-size pages from a tablespace by page number.
///
/// `load` must be idempotent: calling it twice with the same `page_no`
/// returns equivalent bytes, since the query core assumes a single logical
/// file snapshot for the duration of a traversal.
pub trait PageStore {
    /// Load page `page_no` as a full page-sized buffer.
    fn load(&mut self, page_no: u32) -> Result<Vec<u8>, IdbError>;

    /// The page size, in bytes, this store was opened with.
    fn page_size(&self) -> u32;
}

impl PageStore for crate::innodb::tablespace::Tablespace {
    fn load(&mut self, page_no: u32) -> Result<Vec<u8>, IdbError> {
        self.read_page(page_no as u64)
    }

    fn page_size(&self) -> u32 {
        self.page_size()
    }
}
