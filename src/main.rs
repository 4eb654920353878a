use clap::{arg, crate_version, value_parser, Command};
use log::info;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process;

use ordtreap::Treap;

pub fn open_file<P>(filename: P) -> io::Result<BufReader<File>>
where
    P: AsRef<Path>,
{
    let f = File::open(filename)?;
    Ok(BufReader::new(f))
}

fn main() {
    // Generate a CLI, and get the input and treap parameters
    let params = Command::new("ordtreap")
        .version(crate_version!())
        .about("Run a stream of numbered insert, remove, rank, select, predecessor and successor operations against a treap")
        .arg(arg!([FILE] "A text file containing the operation count followed by one `<opcode> <value>` pair per operation. Reads standard input when omitted").value_parser(value_parser!(PathBuf)))
        .arg(arg!(-s --seed <SEED> "Seed for the node priority generator. The same seed and input always produce the same tree shape").required(false).value_parser(value_parser!(u64)))
        .arg(arg!(-i --infinity <INF> "Magnitude of the sentinel values printed when a query has no answer: -INF for a missing predecessor, INF for a missing successor or rank").default_value("2000000010").value_parser(value_parser!(i64).range(1..)))
        .arg(arg!(-v --verbose ... "Log more detail; repeat for debug and trace output. RUST_LOG takes precedence"))
        .get_matches();

    let level = match params.get_count("verbose") {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::init_from_env(env_logger::Env::default().default_filter_or(level));

    let infinity = *params.get_one::<i64>("infinity").unwrap();
    let mut builder = Treap::<i64>::builder().bounds(-infinity, infinity);
    if let Some(seed) = params.get_one::<u64>("seed") {
        builder = builder.seed(*seed);
    }
    let mut treap = match builder.build() {
        Ok(treap) => treap,
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    };

    let input: Box<dyn BufRead> = match params.get_one::<PathBuf>("FILE") {
        Some(path) => match open_file(path) {
            Ok(reader) => Box::new(reader),
            Err(err) => {
                eprintln!("Error: couldn't read {}: {err}", path.display());
                process::exit(1);
            }
        },
        None => Box::new(io::stdin().lock()),
    };
    let stdout = io::stdout();
    let mut output = BufWriter::new(stdout.lock());

    match ordtreap::run(input, &mut output, &mut treap) {
        Ok(executed) => info!(
            "executed {executed} operations, {} elements stored",
            treap.len()
        ),
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    }
}
