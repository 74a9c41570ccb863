use super::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "Session and signed-token lifecycle service")]
pub struct Cli {
    /// Path to the settings file, without or with its extension.
    #[arg(long)]
    pub settings: Option<String>,
}
