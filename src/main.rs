mod calendar;
mod cli;
mod constants;
mod domain;
mod storage;

fn main() {
    cli::run_cli();
}
