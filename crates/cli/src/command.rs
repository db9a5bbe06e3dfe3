//! Command-line parsing for `almanac-sync`.

use anyhow::{anyhow, bail, Context};
use uuid::Uuid;

/// Default number of runs listed by `runs`.
pub const DEFAULT_RUN_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run one source, or every configured source for `None`.
    Sync { source: Option<String>, watch: bool },
    /// Queue a pending run for later.
    Enqueue { source: String },
    /// Start a queued run, or retry a finished one.
    Resume { run_id: Uuid, watch: bool },
    Runs { source: Option<String>, limit: usize },
    Logs { run_id: Uuid },
    Sources,
    Health,
    Help,
}

impl Command {
    /// Parse the arguments that follow the program name.
    pub fn parse<I, S>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args: Vec<String> = args.into_iter().map(Into::into).collect();
        let watch = take_flag(&mut args, "--watch");
        let limit = take_option(&mut args, "--limit")?
            .map(|raw| raw.parse::<usize>().with_context(|| format!("invalid --limit '{raw}'")))
            .transpose()?;

        let mut rest = args.into_iter();
        let task = rest.next();
        let operand = rest.next();
        if let Some(extra) = rest.next() {
            bail!("unexpected argument '{extra}'");
        }

        match (task.as_deref(), operand) {
            (Some("sync"), Some(source)) if source == "all" => Ok(Self::Sync { source: None, watch }),
            (Some("sync"), Some(source)) => Ok(Self::Sync { source: Some(source), watch }),
            (Some("sync"), None) => Err(anyhow!("sync needs a source name or 'all'")),
            (Some("enqueue"), Some(source)) => Ok(Self::Enqueue { source }),
            (Some("enqueue"), None) => Err(anyhow!("enqueue needs a source name")),
            (Some("resume"), Some(id)) => Ok(Self::Resume { run_id: parse_run_id(&id)?, watch }),
            (Some("resume"), None) => Err(anyhow!("resume needs a run id")),
            (Some("runs"), source) => {
                Ok(Self::Runs { source, limit: limit.unwrap_or(DEFAULT_RUN_LIMIT) })
            }
            (Some("logs"), Some(id)) => Ok(Self::Logs { run_id: parse_run_id(&id)? }),
            (Some("logs"), None) => Err(anyhow!("logs needs a run id")),
            (Some("sources"), None) => Ok(Self::Sources),
            (Some("health"), None) => Ok(Self::Health),
            (Some("help" | "--help" | "-h") | None, _) => Ok(Self::Help),
            (Some(unknown), _) => Err(anyhow!("unknown command '{unknown}'")),
        }
    }
}

fn parse_run_id(raw: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(raw).with_context(|| format!("'{raw}' is not a run id"))
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|arg| arg != flag);
    args.len() != before
}

fn take_option(args: &mut Vec<String>, name: &str) -> anyhow::Result<Option<String>> {
    let Some(index) = args.iter().position(|arg| arg == name) else {
        return Ok(None);
    };
    if index + 1 >= args.len() {
        bail!("{name} needs a value");
    }
    let value = args.remove(index + 1);
    args.remove(index);
    Ok(Some(value))
}

pub fn usage() -> &'static str {
    "Almanac sync engine

USAGE:
    almanac-sync <COMMAND> [OPTIONS]

COMMANDS:
    sync <source|all> [--watch]   Run one source, or every configured source
    enqueue <source>              Queue a pending run
    resume <run-id> [--watch]     Start a queued run (finished runs are retried)
    runs [source] [--limit N]     List recent runs
    logs <run-id>                 Show the log of one run
    sources                       List configured sources
    health                        Check the database connection
    help                          Show this message

ENVIRONMENT:
    ALMANAC_DB_PATH, ALMANAC_DB_POOL_SIZE   Configure from the environment
    ALMANAC_LOG_FORMAT=json                 Emit JSON log lines
    RUST_LOG                                Log filter (default: info)"
}
