use crate::catalog::Book;
use crate::config;

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Start the player, optionally on a specific book.
    Run { book: Option<Book> },
    /// Print the default configuration as TOML and exit.
    PrintConfig,
    Help,
}

pub const USAGE: &str = "usage: nceplay [BOOK]\n       nceplay --print-config\n\nBOOK is 1-4.";

/// Parse `args` (without the program name).
pub fn parse_args<I, S>(args: I) -> Result<Invocation, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut book = None;
    for arg in args {
        match arg.as_ref() {
            "--print-config" => return Ok(Invocation::PrintConfig),
            "-h" | "--help" => return Ok(Invocation::Help),
            other => {
                if book.is_some() {
                    return Err(format!("unexpected argument: {other}"));
                }
                let parsed = other
                    .parse::<u8>()
                    .ok()
                    .and_then(Book::from_number)
                    .ok_or_else(|| format!("invalid book {other:?}: expected 1-4"))?;
                book = Some(parsed);
            }
        }
    }
    Ok(Invocation::Run { book })
}

/// Load settings; problems are reported through the returned warning and
/// never prevent startup.
pub fn load_settings() -> (config::Settings, Option<String>) {
    config::Settings::load_or_default()
}

/// The default configuration rendered as TOML.
pub fn default_config_toml() -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(&config::Settings::default())
}
