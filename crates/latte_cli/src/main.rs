use structopt::StructOpt;

use latte_cli::Options;

fn main() {
    env_logger::init();
    let options = Options::from_args();
    std::process::exit(latte_cli::run(options));
}
