//! Lazy cursor over a half-open leaf-page range.
//!
//! Follows [`IndexPage::next_sibling_page`](crate::innodb::index_page::IndexPage::next_sibling_page)
//! from the lower bound's leaf to the upper bound's leaf, decoding one page
//! at a time and filtering its records against the range predicate.

use std::cmp::Ordering;
use std::collections::VecDeque;

use crate::bounds::{Bound, Operator};
use crate::innodb::index_page::load_index_page;
use crate::innodb::record::walk_compact_records;
use crate::innodb::record_decoder::{LeafRecord, Record, RecordDecoder};
use crate::key_comparator::{KeyComparator, LexicographicComparator};
use crate::page_store::PageStore;
use crate::table_def::TableDef;
use crate::tree_navigator::{validate_key, TreeNavigator};
use crate::IdbError;

enum State {
    /// `range_bounds` / equality check not yet run.
    NotStarted,
    /// The `lower == upper` optimization: at most one record to yield.
    SinglePoint(Option<LeafRecord>),
    /// Walking the leaf sibling chain.
    Scanning {
        current_page: Option<u32>,
        end_page: u32,
        pending: VecDeque<LeafRecord>,
    },
    /// Either exhausted or the range was empty / short-circuited.
    Done,
}

/// Yields every record in `[lower, upper]` in ascending primary-key order.
pub struct RangeIterator<'a, S: PageStore, T: TableDef, C: KeyComparator = LexicographicComparator> {
    navigator: &'a mut TreeNavigator<S, T, C>,
    lower: Bound,
    upper: Bound,
    state: State,
}

impl<'a, S: PageStore, T: TableDef, C: KeyComparator> RangeIterator<'a, S, T, C> {
    /// Validates `lower`/`upper` against the table's primary-key shape and
    /// rejects an inverted range before any page is touched.
    pub fn new(
        navigator: &'a mut TreeNavigator<S, T, C>,
        lower: Bound,
        upper: Bound,
    ) -> Result<Self, IdbError> {
        let pk_count = navigator.table().pk_column_count();
        if !lower.is_unbounded() {
            validate_key(&lower.key, pk_count)?;
        }
        if !upper.is_unbounded() {
            validate_key(&upper.key, pk_count)?;
        }
        if !lower.is_unbounded() && !upper.is_unbounded() {
            if navigator.compare_keys(&lower.key, &upper.key) == Ordering::Greater {
                return Err(IdbError::Argument(format!(
                    "range bounds are inverted: lower key {:?} is greater than upper key {:?}",
                    lower.key, upper.key
                )));
            }
        }
        Ok(RangeIterator {
            navigator,
            lower,
            upper,
            state: State::NotStarted,
        })
    }

    fn ensure_started(&mut self) -> Result<(), IdbError> {
        if !matches!(self.state, State::NotStarted) {
            return Ok(());
        }

        if !self.lower.is_unbounded() && !self.upper.is_unbounded() {
            let same_key =
                self.navigator.compare_keys(&self.lower.key, &self.upper.key) == Ordering::Equal;
            if same_key {
                let admits_equality = self.lower.op.is_inclusive() && self.upper.op.is_inclusive();
                self.state = if admits_equality {
                    State::SinglePoint(self.navigator.point_lookup(&self.lower.key)?)
                } else {
                    State::Done
                };
                return Ok(());
            }
        }

        let (start_page, end_page) = self.navigator.range_bounds(&self.lower, &self.upper)?;
        let pending = self.load_and_filter_page(start_page, true, start_page == end_page)?;
        self.state = match pending {
            None => State::Done,
            Some(recs) => State::Scanning {
                current_page: Some(start_page),
                end_page,
                pending: recs,
            },
        };
        Ok(())
    }

    /// Decode `page_no` and, for a boundary page, filter its records against
    /// the active bounds. Interior pages (`apply_lower == apply_upper ==
    /// false`) lie entirely within `[lower, upper]` by B+Tree key ordering
    /// and are emitted unfiltered — only the start and end leaf pages of a
    /// scan ever need the bound predicate.
    ///
    /// Returns `None` when the upper-only short-circuit fires (scanning
    /// should stop for good, not just skip this page).
    fn load_and_filter_page(
        &mut self,
        page_no: u32,
        apply_lower: bool,
        apply_upper: bool,
    ) -> Result<Option<VecDeque<LeafRecord>>, IdbError> {
        let page = load_index_page(self.navigator.store_mut(), page_no)?;
        let infos = walk_compact_records(page.data());
        let declared = page.header().n_recs as usize;
        if declared != infos.len() {
            self.navigator.push_warning(format!(
                "page {}: chained {} record(s) but index header declares {}",
                page_no,
                infos.len(),
                declared
            ));
        }

        let mut out = VecDeque::new();
        let mut short_circuit = false;
        {
            let (store, table, comparator, config) = self.navigator.parts();
            let decoder = RecordDecoder::new(&page, table, config);
            for info in &infos {
                let rec = decoder.decode(store, info.offset)?;
                let leaf = match rec {
                    Record::Leaf(leaf) => leaf,
                    Record::NodePtr(_) => {
                        return Err(IdbError::MalformedRecord(
                            "range scan reached a non-leaf page".into(),
                        ))
                    }
                    Record::System(..) => continue,
                };

                if !apply_lower && !apply_upper {
                    out.push_back(leaf);
                    continue;
                }

                let lower_ok = !apply_lower
                    || self.lower.is_unbounded()
                    || satisfies(comparator.compare(&leaf.key, &self.lower.key), self.lower.op, true);
                let upper_ok = !apply_upper
                    || self.upper.is_unbounded()
                    || satisfies(comparator.compare(&leaf.key, &self.upper.key), self.upper.op, false);

                if lower_ok && upper_ok {
                    out.push_back(leaf);
                } else if apply_upper && self.lower.is_unbounded() && !upper_ok {
                    short_circuit = true;
                    break;
                }
            }
        }

        if short_circuit {
            Ok(if out.is_empty() { None } else { Some(out) })
        } else {
            Ok(Some(out))
        }
    }

    fn advance_page(&mut self) -> Result<(), IdbError> {
        let (current_page, end_page) = match &self.state {
            State::Scanning { current_page, end_page, .. } => (*current_page, *end_page),
            _ => return Ok(()),
        };

        let Some(current_page) = current_page else {
            self.state = State::Done;
            return Ok(());
        };

        if current_page == end_page {
            self.state = State::Done;
            return Ok(());
        }

        let page = load_index_page(self.navigator.store_mut(), current_page)?;
        let next_page = page.next_sibling_page();

        let next = match next_page {
            Some(p) => p,
            None => {
                self.state = State::Done;
                return Ok(());
            }
        };

        match self.load_and_filter_page(next, false, next == end_page)? {
            None => self.state = State::Done,
            Some(recs) => {
                self.state = State::Scanning {
                    current_page: Some(next),
                    end_page,
                    pending: recs,
                };
            }
        }
        Ok(())
    }
}

/// Whether a comparison result satisfies an operator. `is_lower` picks the
/// Gt/Gte vs. Lt/Lte half of [`Operator`] that is meaningful on this side.
fn satisfies(cmp: Ordering, op: Operator, is_lower: bool) -> bool {
    match (op, is_lower) {
        (Operator::Gte, true) => cmp != Ordering::Less,
        (Operator::Gt, true) => cmp == Ordering::Greater,
        (Operator::Lte, false) => cmp != Ordering::Greater,
        (Operator::Lt, false) => cmp == Ordering::Less,
        (Operator::Nop, _) => true,
        _ => true,
    }
}

impl<'a, S: PageStore, T: TableDef, C: KeyComparator> Iterator for RangeIterator<'a, S, T, C> {
    type Item = Result<LeafRecord, IdbError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Err(e) = self.ensure_started() {
            self.state = State::Done;
            return Some(Err(e));
        }

        loop {
            match &mut self.state {
                State::NotStarted => unreachable!("ensure_started always leaves NotStarted"),
                State::SinglePoint(slot) => {
                    let rec = slot.take();
                    self.state = State::Done;
                    return rec.map(Ok);
                }
                State::Done => return None,
                State::Scanning { pending, .. } => {
                    if let Some(rec) = pending.pop_front() {
                        return Some(Ok(rec));
                    }
                }
            }

            if let Err(e) = self.advance_page() {
                self.state = State::Done;
                return Some(Err(e));
            }
            if matches!(self.state, State::Done) {
                return None;
            }
        }
    }
}
