//! Module containing the definition of error types.

use std::{fmt, io, process::ExitStatus, time::Duration};
use thiserror::Error;

/// Reason why an analysis was downgraded to the lightweight inspection.
///
/// These are recovered locally by the orchestrator and only surface as the warning attached to a
/// degraded outcome. The `Display` implementation renders that exact warning string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// The package is larger than the configured threshold, full inspection was never attempted.
    SizeExceeded,
    /// The full inspection did not complete in the given budget.
    Timeout {
        /// Budget in whole seconds.
        seconds: u64,
    },
    /// The inspector reported an error, or its isolated context died without a result.
    InspectorFault {
        /// Inspector error message.
        message: String,
    },
    /// The caller-side ceiling around the whole analysis elapsed.
    CeilingExceeded {
        /// Ceiling in whole seconds.
        seconds: u64,
    },
}

impl Degradation {
    /// Creates a timeout degradation for the given budget.
    pub fn timeout(budget: Duration) -> Self {
        Self::Timeout {
            seconds: budget.as_secs(),
        }
    }

    /// Creates a ceiling degradation for the given ceiling.
    pub fn ceiling(ceiling: Duration) -> Self {
        Self::CeilingExceeded {
            seconds: ceiling.as_secs(),
        }
    }
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeExceeded => write!(f, "size-exceeded"),
            Self::Timeout { seconds } => write!(f, "timeout:{}s", seconds),
            Self::InspectorFault { message } => write!(f, "inspector-error:{}", message),
            Self::CeilingExceeded { seconds } => write!(f, "ceiling-exceeded:{}s", seconds),
        }
    }
}

impl From<InspectorError> for Degradation {
    fn from(e: InspectorError) -> Self {
        Self::InspectorFault {
            message: e.to_string(),
        }
    }
}

/// Errors produced at the package inspector boundary.
#[derive(Debug, Error)]
pub enum InspectorError {
    /// The inspector could not be started.
    #[error("could not start the inspector `{program}`: {source}")]
    Spawn {
        /// Program that was being executed.
        program: String,
        /// Underlying error.
        source: io::Error,
    },
    /// Input/output error while talking to the inspector.
    #[error("inspector I/O error: {0}")]
    Io(#[from] io::Error),
    /// The inspector wrote something that is not a valid reply.
    #[error("malformed inspector reply: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The inspector wrote a reply larger than the accepted size.
    #[error("malformed inspector reply: larger than {limit} bytes")]
    Oversized {
        /// Accepted reply size, in bytes.
        limit: u64,
    },
    /// The inspector itself reported an error (malformed package, unsupported format…).
    #[error("{0}")]
    Reported(String),
    /// The isolated context terminated without writing a result.
    #[error("inspection terminated without a result ({status}){stderr}")]
    Died {
        /// Exit status description.
        status: String,
        /// Last part of the standard error output, prefixed with `: ` when present.
        stderr: String,
    },
}

impl InspectorError {
    /// Builds a `Died` error from the child exit status and its standard error output.
    pub fn died(status: Option<ExitStatus>, stderr: &str) -> Self {
        let status = match status {
            Some(s) => s.to_string(),
            None => String::from("no exit status"),
        };
        let stderr = stderr.trim();
        let stderr = if stderr.is_empty() {
            String::new()
        } else {
            format!(": {}", tail(stderr, 512))
        };

        Self::Died { status, stderr }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value that must be strictly positive was zero.
    #[error("the `{0}` option must be greater than zero")]
    Zero(&'static str),
    /// An option value could not be parsed.
    #[error("invalid value `{value}` for `{option}`")]
    InvalidValue {
        /// Option name.
        option: &'static str,
        /// Offending value.
        value: String,
    },
    /// The full inspection and its grace period do not fit under the analysis ceiling.
    #[error(
        "the hard timeout ({hard_timeout}s) plus the grace period ({grace_period}s) must be \
         shorter than the ceiling ({ceiling}s)"
    )]
    CeilingTooShort {
        /// Full inspection budget, in seconds.
        hard_timeout: u64,
        /// Grace period, in seconds.
        grace_period: u64,
        /// Analysis ceiling, in seconds.
        ceiling: u64,
    },
    /// Invalid criticality name.
    #[error("invalid criticality `{0}`, expected warning, low, medium, high or critical")]
    Criticality(String),
}

/// Gets at most the last `max` bytes of the text, cut at a character boundary.
fn tail(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}
