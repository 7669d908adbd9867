//! `idxq lookup` subcommand: a single point query.

use crate::cli::{load_table_def, parse_key, print_record, ColumnNames};
use crate::decode_config::DecodeConfig;
use crate::innodb::field_decode::FieldValue;
use crate::innodb::tablespace::Tablespace;
use crate::tree_navigator::TreeNavigator;
use crate::IdbError;

pub struct LookupOptions {
    pub file: String,
    pub table_id: u64,
    pub key: Vec<String>,
    pub page_size: Option<u32>,
    pub strict_lob: bool,
}

pub fn execute(opts: &LookupOptions) -> Result<(), IdbError> {
    let mut ts = match opts.page_size {
        Some(ps) => Tablespace::open_with_page_size(&opts.file, ps)?,
        None => Tablespace::open(&opts.file)?,
    };

    let table = load_table_def(&mut ts, opts.table_id)?;
    let names = ColumnNames::from_table(&table);
    let key: Vec<FieldValue> = parse_key(&opts.key);

    let config = DecodeConfig {
        throw_on_unsupported_new_lob: opts.strict_lob,
    };
    let mut nav = TreeNavigator::new(ts, table, config);

    let found = nav.point_lookup(&key)?;
    for w in nav.warnings() {
        eprintln!("warning: {}", w);
    }
    match found {
        Some(rec) => {
            print_record(&names, &rec);
            Ok(())
        }
        None => {
            eprintln!("no row found for key {:?}", key);
            Ok(())
        }
    }
}
