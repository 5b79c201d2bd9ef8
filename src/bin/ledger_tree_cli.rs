use std::{env, process};

use ledger_tree::{cli, init};

fn main() {
    init();

    if let Err(err) = cli::run_cli(env::args().skip(1)) {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
