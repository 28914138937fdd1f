//! Binary entrypoint for the zipfix tool

use colored::Colorize;

fn main() {
    if let Err(e) = zipfix::cli::run() {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
