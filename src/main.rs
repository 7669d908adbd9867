#[cfg(not(feature = "cli"))]
compile_error!("The `idxq` binary requires the `cli` feature. Build with `--features cli`.");

use clap::Parser;
use std::process;

use idb::cli;
use idb::cli::app::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Lookup {
            file,
            table_id,
            key,
            page_size,
            strict_lob,
        } => cli::lookup::execute(&cli::lookup::LookupOptions {
            file,
            table_id,
            key,
            page_size,
            strict_lob,
        }),

        Commands::Range {
            file,
            table_id,
            lower,
            lower_op,
            upper,
            upper_op,
            page_size,
            strict_lob,
        } => cli::range::execute(&cli::range::RangeOptions {
            file,
            table_id,
            lower,
            lower_op,
            upper,
            upper_op,
            page_size,
            strict_lob,
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
