use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};

use crate::formats::OutputFormat;
use crate::section::Section;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log debug output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Page through a listing and merge it with previously saved stories.
    Stories(StoriesArgs),
    /// Fetch one item page and rebuild its comment threads.
    Discussion(DiscussionArgs),
}

#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Forum root URL.
    #[arg(long, env = "HN_BASE_URL", default_value = crate::config::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Account to log in as; also the default id for user sections.
    #[arg(short, long, env = "HN_USER", default_value = "")]
    pub user: String,

    /// Account password. Without it requests are anonymous.
    #[arg(short, long, env = "HN_PASSWORD")]
    pub password: Option<Password>,

    /// User-Agent header sent with every request.
    #[arg(long, default_value = crate::config::DEFAULT_USER_AGENT)]
    pub user_agent: String,
}

#[derive(Debug, Args)]
pub struct StoriesArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Site area to page through.
    #[arg(short, long, value_enum, default_value_t = Section::Frontpage)]
    pub section: Section,

    /// User id for favorites/submissions/upvoted (default: --user).
    #[arg(long)]
    pub id: Option<String>,

    /// Maximum number of new stories to collect.
    #[arg(short, long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub max_stories: Option<usize>,

    /// Saved JSON array of stories to front-load new content onto ("-" for stdin).
    #[arg(short, long, conflicts_with = "edit_in_place")]
    pub existing: Option<String>,

    /// Saved JSON array of stories to update in place ("-" for stdin/stdout).
    #[arg(short = 'i', long)]
    pub edit_in_place: Option<String>,

    /// Output file (default: stdout).
    #[arg(long, conflicts_with = "edit_in_place")]
    pub out: Option<String>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,
}

#[derive(Debug, Args)]
pub struct DiscussionArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Item id of the story or comment whose replies to fetch.
    #[arg(long)]
    pub id: u64,

    /// Emit comments as a flat list in page order instead of a tree.
    #[arg(long)]
    pub flat: bool,

    /// Output file (default: stdout).
    #[arg(long)]
    pub out: Option<String>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,
}

/// Keeps the password out of `Debug` output (the parsed CLI is logged).
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

impl FromStr for Password {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser as _;

    use super::*;

    #[test]
    fn password_is_redacted_in_debug_output() {
        let cli = Cli::parse_from(["hn-slurp", "stories", "-p", "hunter2", "-u", "jay"]);
        let debug = format!("{cli:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("Password(***)"));
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let result = Cli::try_parse_from(["hn-slurp", "-q", "-v", "discussion", "--id", "1"]);
        assert!(result.is_err());
    }

    #[test]
    fn stories_defaults() {
        let cli = Cli::parse_from(["hn-slurp", "stories"]);
        let Command::Stories(args) = cli.command else {
            panic!("expected stories command");
        };
        assert_eq!(args.section, Section::Frontpage);
        assert_eq!(args.output, OutputFormat::Json);
        assert_eq!(args.max_stories, None);
    }

    #[test]
    fn max_stories_must_be_positive() {
        assert!(Cli::try_parse_from(["hn-slurp", "stories", "-m", "0"]).is_err());

        let cli = Cli::parse_from(["hn-slurp", "stories", "-m", "3"]);
        let Command::Stories(args) = cli.command else {
            panic!("expected stories command");
        };
        assert_eq!(args.max_stories, Some(3));
    }
}
