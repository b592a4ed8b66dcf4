mod app;
mod catalog;
mod config;
mod error;
mod logging;
mod lyrics;
mod media;
mod mpris;
mod playback;
mod remote;
mod runtime;
mod session;
mod ui;

use anyhow::bail;

use runtime::{Invocation, USAGE};

fn main() -> anyhow::Result<()> {
    match runtime::parse_args(std::env::args().skip(1)) {
        Ok(Invocation::Run { book }) => runtime::run(book),
        Ok(Invocation::PrintConfig) => {
            print!("{}", runtime::default_config_toml()?);
            Ok(())
        }
        Ok(Invocation::Help) => {
            println!("{USAGE}");
            Ok(())
        }
        Err(msg) => bail!("{msg}\n\n{USAGE}"),
    }
}
