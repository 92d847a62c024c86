use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Print a bearer token for the given user id and exit.
    #[arg(long, value_name = "USER_ID")]
    pub issue_token: Option<i64>,
    /// Do not apply database migrations on startup.
    #[arg(long, default_value_t = false)]
    pub skip_migrations: bool,
}
