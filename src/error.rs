use core::fmt;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Pipeline stage a failed statement belonged to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stage {
    Schema,
    Load,
    Transform,
    Report,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Schema => "schema reset",
            Stage::Load => "bulk load",
            Stage::Transform => "transform",
            Stage::Report => "report",
        };
        f.write_str(name)
    }
}

/// Errors that abort a pipeline run. Nothing is retried or rolled back.
#[derive(Debug)]
pub enum PipelineError {
    /// Settings file missing, unreadable or incomplete
    Config(String),
    /// Database unreachable or credentials rejected
    Connection(diesel::ConnectionError),
    /// A statement against `table` failed during `stage`
    Statement {
        stage: Stage,
        table: &'static str,
        source: diesel::result::Error,
    },
    /// Operation not available for the configured SQL dialect
    Unsupported(String),
}

impl PipelineError {
    pub(crate) fn statement(stage: Stage, table: &'static str) -> impl FnOnce(diesel::result::Error) -> Self {
        move |source| PipelineError::Statement { stage, table, source }
    }
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Config(msg) => write!(f, "config error: {}", msg),
            PipelineError::Connection(e) => write!(f, "DB connection failed: {}", e),
            PipelineError::Statement { stage, table, source } => {
                write!(f, "{} failed on table {}: {}", stage, table, source)
            }
            PipelineError::Unsupported(msg) => write!(f, "unsupported: {}", msg),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Connection(e) => Some(e),
            PipelineError::Statement { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<diesel::ConnectionError> for PipelineError {
    fn from(value: diesel::ConnectionError) -> Self {
        PipelineError::Connection(value)
    }
}
