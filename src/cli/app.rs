//! `idxq` command-line surface: argument parsing only.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "idxq")]
#[command(about = "Point and range queries over an InnoDB clustered index")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Look up a single row by primary key.
    Lookup {
        /// Path to the InnoDB data file (.ibd).
        #[arg(short, long)]
        file: String,

        /// SDI object id of the table to query.
        #[arg(long = "table-id")]
        table_id: u64,

        /// Primary-key column value. Repeat for a composite key, in column
        /// order.
        #[arg(long)]
        key: Vec<String>,

        /// Override page size (default: auto-detect).
        #[arg(long = "page-size")]
        page_size: Option<u32>,

        /// Throw instead of soft-failing on unsupported (new-format) LOBs.
        #[arg(long = "strict-lob")]
        strict_lob: bool,
    },

    /// Scan rows whose primary key falls within a bound.
    Range {
        /// Path to the InnoDB data file (.ibd).
        #[arg(short, long)]
        file: String,

        /// SDI object id of the table to query.
        #[arg(long = "table-id")]
        table_id: u64,

        /// Lower-bound key component(s). Omit for an unbounded lower side.
        #[arg(long)]
        lower: Vec<String>,

        /// Lower-bound operator: gt, gte. Defaults to gte.
        #[arg(long = "lower-op", default_value = "gte")]
        lower_op: String,

        /// Upper-bound key component(s). Omit for an unbounded upper side.
        #[arg(long)]
        upper: Vec<String>,

        /// Upper-bound operator: lt, lte. Defaults to lte.
        #[arg(long = "upper-op", default_value = "lte")]
        upper_op: String,

        /// Override page size (default: auto-detect).
        #[arg(long = "page-size")]
        page_size: Option<u32>,

        /// Throw instead of soft-failing on unsupported (new-format) LOBs.
        #[arg(long = "strict-lob")]
        strict_lob: bool,
    },
}
