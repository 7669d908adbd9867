//! Read-only B+Tree index query engine for InnoDB tablespace files.
//!
//! `innodb-index-core` (library name `idb`) decodes a primary-key clustered
//! index directly out of an InnoDB `.ibd` file's bytes and answers point and
//! range queries without a running server. It does not write, repair, or
//! validate tablespaces — see [`innodb::tablespace::Tablespace`] for the
//! read-only file layer this is built on.
//!
//! # Quick example
//!
//! ```no_run
//! use idb::innodb::tablespace::Tablespace;
//! use idb::table_def::StaticTableDef;
//! use idb::tree_navigator::TreeNavigator;
//! use idb::decode_config::DecodeConfig;
//!
//! let ts = Tablespace::open("table.ibd").unwrap();
//! let table = StaticTableDef::int_primary_key("id");
//! let mut nav = TreeNavigator::new(ts, table, DecodeConfig::default());
//! let row = nav.point_lookup(&[idb::field_decode::FieldValue::Int(42)]).unwrap();
//! println!("{:?}", row);
//! ```
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`innodb::tablespace`] | File I/O, page size detection, page iteration |
//! | [`innodb::page`] | FIL header/trailer, FSP header parsing |
//! | [`innodb::page_types`] | Page type enum with names and descriptions |
//! | [`innodb::index`] | INDEX page header (B+Tree header, FSEG) |
//! | [`innodb::index_page`] | Directory slots, infimum/supremum, sibling pages |
//! | [`innodb::record`] | Compact record header and next-record chain walk |
//! | [`innodb::record_decoder`] | Full record decode: fields, nulls, overflow |
//! | [`innodb::field_decode`] | Per-type column value decoding |
//! | [`innodb::lob`] | Overflow/BLOB page chain assembly |
//! | [`innodb::schema`] | SDI (embedded dictionary) deserialization structs |
//! | [`innodb::sdi`] | SDI page location and decompression |
//! | [`innodb::constants`] | InnoDB page/record byte-offset constants |
//! | [`page_store`] | `PageStore` collaborator trait |
//! | [`table_def`] | `TableDef` collaborator trait and implementations |
//! | [`key_comparator`] | Composite primary-key comparison |
//! | [`bounds`] | Range bound operators |
//! | [`page_search`] | Directory-slot binary search + linear probe |
//! | [`tree_navigator`] | Root-to-leaf descent, point lookup, full traversal |
//! | [`range_iterator`] | Lazy cross-leaf range cursor |
//! | [`decode_config`] | Decoder configuration knobs |
//! | [`cli`] | `idxq` subcommands (feature `cli`) |
//!
//! ## Feature flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli` | on | Builds the `idxq` binary's subcommand plumbing. |

#[cfg(feature = "cli")]
pub mod cli;
pub mod innodb;

pub mod bounds;
pub mod decode_config;
pub mod key_comparator;
pub mod page_search;
pub mod page_store;
pub mod range_iterator;
pub mod table_def;
pub mod tree_navigator;

pub use innodb::field_decode;

use thiserror::Error;

/// Errors returned by `idb` operations.
#[derive(Error, Debug)]
pub enum IdbError {
    /// An I/O error occurred (file open, read, seek, or write failure).
    #[error("I/O error: {0}")]
    Io(String),

    /// A parse error occurred (malformed binary data or unexpected values).
    #[error("Parse error: {0}")]
    Parse(String),

    /// An invalid argument was supplied (out-of-range page number, bad option, etc.).
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// A page was expected to be one type (e.g. INDEX) but was another.
    #[error("page type mismatch: {0}")]
    PageTypeMismatch(String),

    /// A record's on-page encoding violates the format's invariants.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// A LOB_FIRST (new-format) overflow page was encountered and
    /// `throw_on_unsupported_new_lob` is set.
    #[error("unsupported LOB format: {0}")]
    UnsupportedLobFormat(String),

    /// A decoded record's shape disagrees with the supplied `TableDef`.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),
}

impl From<std::io::Error> for IdbError {
    fn from(e: std::io::Error) -> Self {
        IdbError::Io(e.to_string())
    }
}
