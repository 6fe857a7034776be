use clap::Parser;
use std::process;

mod cli;

fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = cli::Cli::parse();
    match args.run() {
        Ok(output) => println!("{output}"),
        Err(err) => {
            eprintln!("{err:#}");
            process::exit(1);
        }
    }
}
