//! Structured command parsing for the interactive prompt.

use queuectl_jobs::{JobId, JobState};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Value used when `set max-retries` has no valid number.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Errors raised while parsing a command line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Blank line.
    #[error("Empty command")]
    Empty,

    /// Not a recognised command.
    #[error("Invalid command '{0}', enter a valid command (try 'help')")]
    Unknown(String),

    /// Enqueue payload is not valid JSON or lacks `command`.
    #[error("Invalid job payload: {0}")]
    InvalidPayload(String),

    /// `list` without `--state <state>`.
    #[error("Usage: list --state pending|processing|failed|dead|completed")]
    MissingState,

    /// Unknown state name.
    #[error("Invalid state '{0}', expected pending, processing, failed, dead or completed")]
    InvalidState(String),

    /// `dlq retry` without an id.
    #[error("Usage: dlq retry <id>")]
    MissingJobId,

    /// Non-numeric job id.
    #[error("Invalid job id '{0}'")]
    InvalidJobId(String),
}

/// Payload of `enqueue <json>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnqueueRequest {
    /// Program or shell snippet to run.
    pub command: String,

    /// Extra arguments appended to `command`, separated by spaces.
    #[serde(default)]
    pub args: Vec<String>,
}

impl EnqueueRequest {
    /// The full command line stored on the job.
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

impl FromStr for EnqueueRequest {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let request: Self =
            serde_json::from_str(s).map_err(|e| ParseError::InvalidPayload(e.to_string()))?;
        if request.command.trim().is_empty() {
            return Err(ParseError::InvalidPayload(
                "field `command` cannot be empty".to_string(),
            ));
        }
        Ok(request)
    }
}

/// State filter accepted by `list --state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFilter {
    Pending,
    Processing,
    Failed,
    Dead,
    Completed,
}

impl StateFilter {
    /// The job state this filter selects.
    pub fn state(self) -> JobState {
        match self {
            Self::Pending => JobState::Pending,
            Self::Processing => JobState::Processing,
            Self::Failed => JobState::Failed,
            Self::Dead => JobState::Dead,
            Self::Completed => JobState::Completed,
        }
    }
}

impl fmt::Display for StateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.state())
    }
}

impl FromStr for StateFilter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "failed" => Ok(Self::Failed),
            "dead" => Ok(Self::Dead),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseError::InvalidState(s.to_string())),
        }
    }
}

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `enqueue <json>`
    Enqueue(EnqueueRequest),
    /// `status`
    Status,
    /// `list --state <state>`
    List(StateFilter),
    /// `dlq list`
    DlqList,
    /// `dlq retry <id>`
    DlqRetry(JobId),
    /// `set max-retries [n]`
    SetMaxRetries(u32),
    /// `worker start [n]`; `None` when `n` is missing or invalid.
    WorkerStart(Option<usize>),
    /// `worker stop`
    WorkerStop,
    /// `help`
    Help,
    /// `exit`
    Exit,
}

impl Command {
    /// Parse one input line.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(ParseError::Empty);
        };

        match (head, words.next()) {
            ("enqueue", _) => {
                let payload = line["enqueue".len()..].trim();
                payload.parse().map(Self::Enqueue)
            }
            ("status", None) => Ok(Self::Status),
            ("list", Some(flag)) => parse_list(flag, words.next()),
            ("list", None) => Err(ParseError::MissingState),
            ("dlq", Some("list")) => Ok(Self::DlqList),
            ("dlq", Some("retry")) => {
                let raw = words.next().ok_or(ParseError::MissingJobId)?;
                raw.parse()
                    .map(Self::DlqRetry)
                    .map_err(|_| ParseError::InvalidJobId(raw.to_string()))
            }
            ("set", Some("max-retries")) => Ok(Self::SetMaxRetries(number_or_default(
                "max-retries",
                words.next(),
                DEFAULT_MAX_RETRIES,
            ))),
            ("worker", Some("start")) => Ok(Self::WorkerStart(parse_number(
                "worker count",
                words.next(),
            ))),
            ("worker", Some("stop")) => Ok(Self::WorkerStop),
            ("help", None) => Ok(Self::Help),
            ("exit", None) => Ok(Self::Exit),
            _ => Err(ParseError::Unknown(line.to_string())),
        }
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_list(flag: &str, value: Option<&str>) -> Result<Command, ParseError> {
    let state = match flag.strip_prefix("--state") {
        Some("") => value.ok_or(ParseError::MissingState)?,
        Some(rest) => rest.strip_prefix('=').ok_or(ParseError::MissingState)?,
        None => return Err(ParseError::MissingState),
    };
    state.parse().map(Command::List)
}

fn parse_number<T: FromStr>(what: &str, raw: Option<&str>) -> Option<T> {
    let raw = raw?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(value = raw, "Invalid {what}, using default");
            None
        }
    }
}

fn number_or_default<T: FromStr>(what: &str, raw: Option<&str>, default: T) -> T {
    parse_number(what, raw).unwrap_or(default)
}

/// One-line summaries of every command.
pub const HELP: &str = "\
Commands:
  enqueue {\"command\": \"...\", \"args\": [...]}   add a job
  status                                       show every job
  list --state <state>                         pending, processing, failed, dead or completed
  dlq list                                     show dead jobs
  dlq retry <id>                               requeue a dead job
  set max-retries [n]                          retry budget for new jobs (default 10)
  worker start [n]                             start n workers (default from config, 10)
  worker stop                                  stop workers after their current job
  exit                                         stop workers and quit";
