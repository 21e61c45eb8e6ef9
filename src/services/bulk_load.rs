//! Staging load via Redshift `COPY` from S3.
//!
//! Malformed input is handled by the engine options on the command itself:
//! blank and empty strings become NULL, oversized values are truncated.

use crate::config::Config;
use crate::db::ddl::{STAGING_EVENTS, STAGING_SONGS, TableDef};
use crate::error::{PipelineError, Stage};
use crate::utils::sql_literal;
use diesel::PgConnection;
use diesel::connection::SimpleConnection;
use log::{debug, info};
use std::fmt::{self, Display, Formatter};

/// Log events carry their timestamp as epoch milliseconds.
pub const EVENT_TIME_FORMAT: &str = "epochmillisecs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonFormat<'a> {
    /// Map JSON keys onto column names
    Auto,
    /// Map by position through a JSONPaths file
    Paths(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyCommand<'a> {
    pub table: &'static TableDef,
    pub source: &'a str,
    pub iam_role_arn: &'a str,
    pub region: &'a str,
    pub time_format: Option<&'static str>,
    pub json: JsonFormat<'a>,
}

impl<'a> CopyCommand<'a> {
    pub fn staging_events(cfg: &'a Config) -> Self {
        CopyCommand {
            table: &STAGING_EVENTS,
            source: &cfg.s3.log_data,
            iam_role_arn: &cfg.iam_role.arn,
            region: &cfg.s3.region,
            time_format: Some(EVENT_TIME_FORMAT),
            json: JsonFormat::Paths(&cfg.s3.log_jsonpath),
        }
    }

    pub fn staging_songs(cfg: &'a Config) -> Self {
        CopyCommand {
            table: &STAGING_SONGS,
            source: &cfg.s3.song_data,
            iam_role_arn: &cfg.iam_role.arn,
            region: &cfg.s3.region,
            time_format: None,
            json: JsonFormat::Auto,
        }
    }
}

impl Display for CopyCommand<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "COPY {} FROM {}", self.table.name, sql_literal(self.source))?;
        writeln!(f, "CREDENTIALS {}", sql_literal(&format!("aws_iam_role={}", self.iam_role_arn)))?;
        writeln!(f, "REGION {}", sql_literal(self.region))?;
        if let Some(time_format) = self.time_format {
            writeln!(f, "TIMEFORMAT AS {}", sql_literal(time_format))?;
        }
        writeln!(f, "TRUNCATECOLUMNS BLANKSASNULL EMPTYASNULL")?;
        match self.json {
            JsonFormat::Auto => write!(f, "FORMAT AS JSON 'auto';"),
            JsonFormat::Paths(path) => write!(f, "FORMAT AS JSON {};", sql_literal(path)),
        }
    }
}

/// The two staging loads in execution order.
pub fn copy_commands(cfg: &Config) -> [CopyCommand<'_>; 2] {
    [CopyCommand::staging_events(cfg), CopyCommand::staging_songs(cfg)]
}

/// Run both COPY commands. Redshift only; callers gate on
/// `Dialect::supports_bulk_load` before connecting.
pub fn load_staging_tables(conn: &mut PgConnection, cfg: &Config) -> Result<(), PipelineError> {
    for command in copy_commands(cfg) {
        let sql = command.to_string();
        info!("Loading {} from {}", command.table.name, command.source);
        debug!("Load: {}", sql);
        conn.batch_execute(&sql)
            .map_err(PipelineError::statement(Stage::Load, command.table.name))?;
        info!("Data has successfully been loaded to the {} table!", command.table.name);
    }
    Ok(())
}
