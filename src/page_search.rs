//! Directory-slot binary search plus linear probe, over a single [`IndexPage`].
//!
//! [`TreeNavigator`](crate::tree_navigator::TreeNavigator) drives repeated
//! calls to [`search_page`] while descending from the root to a leaf;
//! [`search_page`] itself only ever looks at one page.

use std::cmp::Ordering;

use crate::decode_config::DecodeConfig;
use crate::innodb::field_decode::FieldValue;
use crate::innodb::index_page::IndexPage;
use crate::innodb::record_decoder::{LeafRecord, NodePtrRecord, Record, RecordDecoder, SystemKind};
use crate::key_comparator::KeyComparator;
use crate::page_store::PageStore;
use crate::table_def::TableDef;
use crate::IdbError;

/// Outcome of searching a single page for a key.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// Leaf page: the exact record matching the key.
    Found(LeafRecord),
    /// Leaf page: no exact match. Carries the closest record with a key
    /// greater than the target, if one exists before supremum.
    NotFound { closest: Option<LeafRecord> },
    /// Non-leaf page: descend into this child page number.
    Descend(u32),
}

/// Search `page` for `key`, using `comparator` to order composite keys.
///
/// Runs the directory binary search to find a starting slot, then linear
/// probes forward along the record chain from there.
pub fn search_page<S: PageStore, T: TableDef, C: KeyComparator>(
    store: &mut S,
    page: &IndexPage,
    table: &T,
    comparator: &C,
    key: &[FieldValue],
    config: DecodeConfig,
) -> Result<SearchOutcome, IdbError> {
    let decoder = RecordDecoder::new(page, table, config);
    let slots = page.directory_slots();
    if slots.is_empty() {
        return Err(IdbError::MalformedRecord("page has no directory slots".into()));
    }

    let mut lo: i64 = 0;
    let mut hi: i64 = slots.len() as i64 - 1;
    let mut probe_from = slots[0] as usize;

    while lo <= hi {
        let mid = ((lo + hi) / 2) as usize;
        let rec = decoder.decode(store, slots[mid] as usize)?;
        let c = match &rec {
            Record::System(SystemKind::Infimum, _) => Ordering::Less,
            Record::System(SystemKind::Supremum, _) => Ordering::Greater,
            _ => comparator.compare(rec.key().unwrap_or(&[]), key),
        };
        match c {
            Ordering::Greater => hi = mid as i64 - 1,
            Ordering::Less => lo = mid as i64 + 1,
            Ordering::Equal => {
                probe_from = slots[mid] as usize;
                return linear_probe(store, page, &decoder, comparator, key, probe_from);
            }
        }
    }
    probe_from = slots[(lo - 1).max(0) as usize] as usize;
    linear_probe(store, page, &decoder, comparator, key, probe_from)
}

/// Walk the record chain forward from `start_offset`, classifying the first
/// record that settles the search.
fn linear_probe<S: PageStore, T: TableDef, C: KeyComparator>(
    store: &mut S,
    page: &IndexPage,
    decoder: &RecordDecoder<T>,
    comparator: &C,
    key: &[FieldValue],
    start_offset: usize,
) -> Result<SearchOutcome, IdbError> {
    let is_leaf = page.is_leaf();

    // `prev` tracks the last decoded NodePtr record on non-leaf pages; `None`
    // means "prev is the infimum sentinel", matching the documented corner
    // case for keys smaller than the page's smallest separator.
    let mut prev_node_ptr: Option<NodePtrRecord> = None;
    let mut curr_offset = start_offset;

    loop {
        let curr = decoder.decode(store, curr_offset)?;
        match curr {
            Record::System(SystemKind::Infimum, next) => {
                curr_offset = next;
                continue;
            }
            Record::System(SystemKind::Supremum, _) => {
                if is_leaf {
                    return Ok(SearchOutcome::NotFound { closest: None });
                }
                return descend_via(prev_node_ptr, None);
            }
            Record::Leaf(leaf) => {
                let c = comparator.compare(&leaf.key, key);
                match c {
                    Ordering::Equal => return Ok(SearchOutcome::Found(leaf)),
                    Ordering::Greater => return Ok(SearchOutcome::NotFound { closest: Some(leaf) }),
                    Ordering::Less => {
                        curr_offset = leaf.next_record_offset;
                        continue;
                    }
                }
            }
            Record::NodePtr(node_ptr) => {
                let c = comparator.compare(&node_ptr.key, key);
                match c {
                    Ordering::Equal => return Ok(SearchOutcome::Descend(node_ptr.child_page_number)),
                    Ordering::Greater => return descend_via(prev_node_ptr, Some(node_ptr)),
                    Ordering::Less => {
                        curr_offset = node_ptr.next_record_offset;
                        prev_node_ptr = Some(node_ptr);
                        continue;
                    }
                }
            }
        }
    }
}

/// Resolve which child to descend into: `prev` if it exists, else `curr`
/// (the documented corner case for keys below the smallest separator).
fn descend_via(
    prev: Option<NodePtrRecord>,
    curr: Option<NodePtrRecord>,
) -> Result<SearchOutcome, IdbError> {
    if let Some(p) = prev {
        return Ok(SearchOutcome::Descend(p.child_page_number));
    }
    if let Some(c) = curr {
        return Ok(SearchOutcome::Descend(c.child_page_number));
    }
    Err(IdbError::MalformedRecord(
        "non-leaf page has no node-pointer records to descend into".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innodb::constants::*;
    use crate::innodb::page_types::PageType;
    use crate::key_comparator::LexicographicComparator;
    use crate::table_def::StaticTableDef;
    use byteorder::{BigEndian, ByteOrder};
    use std::collections::HashMap;

    struct FakeStore {
        pages: HashMap<u32, Vec<u8>>,
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

    /// Build a leaf page with a handful of ordinary INT-key records chained
    /// infimum -> ... -> supremum, with a two-slot directory (infimum,
    /// supremum) so binary search always starts the probe at infimum.
    fn build_leaf_page(page_no: u32, keys: &[i32]) -> Vec<u8> {
        let mut page = vec![0u8; 16384];
        BigEndian::write_u32(&mut page[FIL_PAGE_OFFSET..], page_no);
        BigEndian::write_u32(&mut page[FIL_PAGE_PREV..], FIL_NULL);
        BigEndian::write_u32(&mut page[FIL_PAGE_NEXT..], FIL_NULL);
        BigEndian::write_u16(&mut page[FIL_PAGE_TYPE..], PageType::Index.as_u16());

        let base = FIL_PAGE_DATA;
        BigEndian::write_u16(&mut page[base + PAGE_N_DIR_SLOTS..], 2);
        BigEndian::write_u16(&mut page[base + PAGE_LEVEL..], 0);
        BigEndian::write_u16(&mut page[base + PAGE_N_HEAP..], 0x8000 | (keys.len() as u16 + 2));
        BigEndian::write_u16(&mut page[base + PAGE_N_RECS..], keys.len() as u16);
        BigEndian::write_u64(&mut page[base + PAGE_INDEX_ID..], 1);

        let record_stride = 30usize;
        let mut origin = PAGE_NEW_SUPREMUM + record_stride;

        // Wire infimum -> first record.
        let infimum_first_origin = origin;
        write_record(&mut page, PAGE_NEW_INFIMUM, 2, (infimum_first_origin as i64 - PAGE_NEW_INFIMUM as i64) as i16);

        for (i, &k) in keys.iter().enumerate() {
            let next_origin = if i + 1 < keys.len() {
                origin + record_stride
            } else {
                PAGE_NEW_SUPREMUM
            };
            let rel = next_origin as i64 - origin as i64;
            write_record(&mut page, origin, 0, rel as i16);
            BigEndian::write_u32(&mut page[origin..], (k as u32) ^ 0x8000_0000);
            origin += record_stride;
        }

        let trailer_start = page.len() - SIZE_FIL_TRAILER;
        BigEndian::write_u16(&mut page[trailer_start - PAGE_DIR_SLOT_SIZE..], PAGE_NEW_INFIMUM as u16);
        BigEndian::write_u16(
            &mut page[trailer_start - 2 * PAGE_DIR_SLOT_SIZE..],
            PAGE_NEW_SUPREMUM as u16,
        );
        page
    }

    fn write_record(page: &mut [u8], origin: usize, rec_type: u8, next_offset: i16) {
        let extra_start = origin - REC_N_NEW_EXTRA_BYTES;
        page[extra_start] = 0;
        BigEndian::write_u16(&mut page[extra_start + 1..], (1u16 << 3) | rec_type as u16);
        BigEndian::write_i16(&mut page[extra_start + 3..], next_offset);
    }

    #[test]
    fn test_search_finds_exact_match() {
        let page = IndexPage::parse(build_leaf_page(3, &[10, 20, 30])).unwrap();
        let table = StaticTableDef::int_primary_key("id");
        let comparator = LexicographicComparator;
        let mut store = FakeStore { pages: HashMap::new() };

        let outcome = search_page(&mut store, &page, &table, &comparator, &[FieldValue::Int(20)], DecodeConfig::default()).unwrap();
        match outcome {
            SearchOutcome::Found(rec) => {
                assert!(matches!(rec.key[0], FieldValue::Int(20)));
            }
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn test_search_not_found_returns_closest_greater() {
        let page = IndexPage::parse(build_leaf_page(3, &[10, 20, 30])).unwrap();
        let table = StaticTableDef::int_primary_key("id");
        let comparator = LexicographicComparator;
        let mut store = FakeStore { pages: HashMap::new() };

        let outcome = search_page(&mut store, &page, &table, &comparator, &[FieldValue::Int(15)], DecodeConfig::default()).unwrap();
        match outcome {
            SearchOutcome::NotFound { closest: Some(rec) } => {
                assert!(matches!(rec.key[0], FieldValue::Int(20)));
            }
            other => panic!("expected NotFound{{closest: Some}}, got {:?}", other),
        }
    }

    #[test]
    fn test_search_not_found_past_largest_key() {
        let page = IndexPage::parse(build_leaf_page(3, &[10, 20, 30])).unwrap();
        let table = StaticTableDef::int_primary_key("id");
        let comparator = LexicographicComparator;
        let mut store = FakeStore { pages: HashMap::new() };

        let outcome = search_page(&mut store, &page, &table, &comparator, &[FieldValue::Int(99)], DecodeConfig::default()).unwrap();
        assert!(matches!(outcome, SearchOutcome::NotFound { closest: None }));
    }
}
