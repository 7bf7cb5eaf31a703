//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = homerank_cli::run() {
        eprintln!("homerank: {err}");
        std::process::exit(1);
    }
}
