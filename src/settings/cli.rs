use super::Parser;

/// Session token lifecycle service.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Settings file; defaults to settings/dev.toml (debug) or settings/release.toml.
    #[arg(long)]
    pub settings: Option<String>,
}
