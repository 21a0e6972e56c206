use clap::Parser;
use eyre::Result;

use spsctl::CliOpts;

fn main() -> Result<()> {
    let opts = CliOpts::parse();

    spsctl::init()?;
    spsctl::banner();

    spsctl::cli(opts)
}
