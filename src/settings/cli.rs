use super::Parser;
use clap::Subcommand;

#[derive(Parser, Debug)]
#[command(about = "Issue, verify, list and revoke session tokens")]
pub struct Cli {
    #[arg(long)]
    pub settings: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Issue a new token for a user and print it
    Generate {
        user_id: String,
        #[arg(long, default_value = "")]
        details: String,
    },
    /// Check a token; exits non-zero when it is not valid
    Verify { token: String },
    /// Print a user's sessions as JSON
    List { user_id: String },
    /// Delete a session by identifier
    Revoke { identifier: String },
}
