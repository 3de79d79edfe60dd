use clap::Parser;
use std::path::PathBuf;

/// pgscript - run batched SQL scripts against PostgreSQL
///
/// Each `\go`-separated batch runs in its own transaction. The first failing
/// batch is rolled back and stops the run; earlier batches stay committed.
#[derive(Parser, Debug)]
#[command(name = "pgscript")]
#[command(about = "Run SQL scripts with batch, templating and version directives")]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Path to config file with database credentials
    #[arg(short = 'C', long, default_value = "config.json")]
    pub config: PathBuf,

    /// Path to the SQL script to run
    #[arg(short = 'D', long = "data")]
    pub data: PathBuf,

    /// Set value. Must be in format -V name,value (repeatable)
    ///
    /// The script refers to a value as `##name##`.
    #[arg(short = 'V', long = "val", value_name = "NAME,VALUE")]
    pub values: Vec<String>,

    /// Dry-run mode: list the batches the script would run without
    /// connecting to the database.
    ///
    /// `\needver` and `\db` are logged instead of performed.
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
