use crate::provider::Provider;
use clap::Parser;

/// gcauto: write a conventional commit message for the pending changes with an AI CLI
#[derive(Parser, Debug)]
#[command(name = "gcauto", version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// AI command line tool used to write the message
    #[arg(short, long, value_enum, default_value_t = Provider::Claude, env = "GCAUTO_MODEL")]
    pub model: Provider,

    /// commit without asking for confirmation (also skips file selection)
    #[arg(short, long)]
    pub yes: bool,

    /// print the prompt sent to the AI
    #[arg(long)]
    pub debug_prompt: bool,

    /// print the raw response from the AI
    #[arg(long)]
    pub debug_response: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
