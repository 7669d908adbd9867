//! `idxq range` subcommand: a bounded scan across leaf pages.

use crate::bounds::{Bound, Operator};
use crate::cli::{load_table_def, parse_key, print_record, ColumnNames};
use crate::decode_config::DecodeConfig;
use crate::innodb::tablespace::Tablespace;
use crate::range_iterator::RangeIterator;
use crate::tree_navigator::TreeNavigator;
use crate::IdbError;

pub struct RangeOptions {
    pub file: String,
    pub table_id: u64,
    pub lower: Vec<String>,
    pub lower_op: String,
    pub upper: Vec<String>,
    pub upper_op: String,
    pub page_size: Option<u32>,
    pub strict_lob: bool,
}

pub fn execute(opts: &RangeOptions) -> Result<(), IdbError> {
    let mut ts = match opts.page_size {
        Some(ps) => Tablespace::open_with_page_size(&opts.file, ps)?,
        None => Tablespace::open(&opts.file)?,
    };

    let table = load_table_def(&mut ts, opts.table_id)?;
    let names = ColumnNames::from_table(&table);

    let lower = build_bound(&opts.lower, &opts.lower_op, true)?;
    let upper = build_bound(&opts.upper, &opts.upper_op, false)?;

    let config = DecodeConfig {
        throw_on_unsupported_new_lob: opts.strict_lob,
    };
    let mut nav = TreeNavigator::new(ts, table, config);

    let iter = RangeIterator::new(&mut nav, lower, upper)?;
    let mut count = 0usize;
    for rec in iter {
        print_record(&names, &rec?);
        count += 1;
    }
    for w in nav.warnings() {
        eprintln!("warning: {}", w);
    }
    eprintln!("{} row(s)", count);
    Ok(())
}

fn build_bound(raw: &[String], op_name: &str, is_lower: bool) -> Result<Bound, IdbError> {
    if raw.is_empty() {
        return Ok(Bound::unbounded());
    }
    let op = match op_name {
        "gt" if is_lower => Operator::Gt,
        "gte" if is_lower => Operator::Gte,
        "lt" if !is_lower => Operator::Lt,
        "lte" if !is_lower => Operator::Lte,
        other => {
            return Err(IdbError::Argument(format!(
                "invalid {} operator: {}",
                if is_lower { "lower" } else { "upper" },
                other
            )))
        }
    };
    Ok(Bound::new(op, parse_key(raw)))
}
