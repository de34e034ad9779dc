use clap::Parser;
use smtp_tls::config::{Cli, Config, USAGE};
use std::io;
use std::process::exit;

fn main() {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(_) => {
            println!("{}", USAGE);
            exit(1);
        }
    };
    let config = Config::from_cli(cli);

    let result = smtp_tls::run(&config, &mut io::stdout().lock());
    if let Err(err) = result {
        println!("{}", err);
        exit(1);
    }
}
