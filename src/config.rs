//! Runtime configuration read from an INI-style settings file (`dwh.cfg`).
//!
//! Recognised sections and keys:
//! - `[CLUSTER]`: `HOST`, `DB_NAME`, `DB_USER`, `DB_PASSWORD`, `DB_PORT`, optional `DIALECT`
//! - `[IAM_ROLE]`: `ARN`
//! - `[S3]`: `LOG_DATA`, `LOG_JSONPATH`, `SONG_DATA`, optional `REGION`
//!
//! Keys are case-insensitive. Values may be wrapped in single or double quotes.

use crate::db::ddl::Dialect;
use crate::error::PipelineError;
use crate::utils::{libpq_value, strip_matching_quotes};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "dwh.cfg";
pub const DEFAULT_REGION: &str = "us-west-2";

#[derive(Debug, Clone)]
pub struct Config {
    pub cluster: ClusterConfig,
    pub iam_role: IamRoleConfig,
    pub s3: S3Config,
}

#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub host: String,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    pub db_port: u16,
    /// SQL flavour used when rendering DDL. Redshift unless overridden.
    pub dialect: Dialect,
}

#[derive(Debug, Clone)]
pub struct IamRoleConfig {
    /// Role the warehouse assumes to read the source bucket.
    pub arn: String,
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub log_data: String,
    pub log_jsonpath: String,
    pub song_data: String,
    pub region: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct RawConfig {
    cluster: RawCluster,
    iam_role: RawIamRole,
    s3: RawS3,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct RawCluster {
    host: String,
    db_name: String,
    db_user: String,
    db_password: String,
    db_port: String,
    #[serde(default)]
    dialect: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct RawIamRole {
    arn: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct RawS3 {
    log_data: String,
    log_jsonpath: String,
    song_data: String,
    #[serde(default)]
    region: Option<String>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let text = fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&text).map_err(|e| match e {
            PipelineError::Config(msg) => PipelineError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn parse(text: &str) -> Result<Self, PipelineError> {
        let sections = parse_sections(text).map_err(PipelineError::Config)?;
        let raw: RawConfig = serde_path_to_error::deserialize(Value::Object(sections))
            .map_err(|e| {
                let path = e.path().to_string();
                if path == "." {
                    PipelineError::Config(e.inner().to_string())
                } else {
                    PipelineError::Config(format!("{}: {}", path, e.inner()))
                }
            })?;
        Self::from_raw(raw).map_err(PipelineError::Config)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, String> {
        let RawConfig { cluster, iam_role, s3 } = raw;

        let db_port = required("CLUSTER.DB_PORT", &cluster.db_port)?
            .parse::<u16>()
            .map_err(|_| format!("CLUSTER.DB_PORT must be a port number, got {:?}", cluster.db_port))?;
        let dialect = match cluster.dialect.as_deref().map(str::trim) {
            None | Some("") => Dialect::Redshift,
            Some(name) => name.parse::<Dialect>()?,
        };
        let region = match s3.region.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_REGION.to_string(),
            Some(r) => r.to_string(),
        };

        Ok(Config {
            cluster: ClusterConfig {
                host: required("CLUSTER.HOST", &cluster.host)?,
                db_name: required("CLUSTER.DB_NAME", &cluster.db_name)?,
                db_user: required("CLUSTER.DB_USER", &cluster.db_user)?,
                db_password: required("CLUSTER.DB_PASSWORD", &cluster.db_password)?,
                db_port,
                dialect,
            },
            iam_role: IamRoleConfig {
                arn: required("IAM_ROLE.ARN", &iam_role.arn)?,
            },
            s3: S3Config {
                log_data: required("S3.LOG_DATA", &s3.log_data)?,
                log_jsonpath: required("S3.LOG_JSONPATH", &s3.log_jsonpath)?,
                song_data: required("S3.SONG_DATA", &s3.song_data)?,
                region,
            },
        })
    }
}

impl ClusterConfig {
    /// libpq keyword/value connection string.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} dbname={} user={} password={} port={}",
            libpq_value(&self.host),
            libpq_value(&self.db_name),
            libpq_value(&self.db_user),
            libpq_value(&self.db_password),
            self.db_port
        )
    }
}

fn required(name: &str, value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(format!("{} must not be empty", name))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Parse INI text into `{ SECTION: { KEY: value } }`.
fn parse_sections(text: &str) -> Result<Map<String, Value>, String> {
    let mut sections: Map<String, Value> = Map::new();
    let mut current: Option<String> = None;

    for (index, line) in text.lines().enumerate() {
        let lineno = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix('[') {
            let name = rest
                .strip_suffix(']')
                .map(str::trim)
                .ok_or_else(|| format!("line {}: unterminated section header", lineno))?;
            if name.is_empty() {
                return Err(format!("line {}: empty section name", lineno));
            }
            if sections.contains_key(name) {
                return Err(format!("line {}: section [{}] defined more than once", lineno, name));
            }
            sections.insert(name.to_string(), Value::Object(Map::new()));
            current = Some(name.to_string());
            continue;
        }

        let (key, value) = parse_assignment(trimmed).map_err(|e| format!("line {}: {}", lineno, e))?;
        let section_name = current
            .as_deref()
            .ok_or_else(|| format!("line {}: key {} appears before any [section] header", lineno, key))?;
        let Some(Value::Object(section)) = sections.get_mut(section_name) else {
            return Err(format!("line {}: section [{}] is not a table", lineno, section_name));
        };
        if section.contains_key(&key) {
            return Err(format!("line {}: key {} repeated in section [{}]", lineno, key, section_name));
        }
        section.insert(key, Value::String(value));
    }

    Ok(sections)
}

fn parse_assignment(line: &str) -> Result<(String, String), String> {
    let split_at = line
        .find(['=', ':'])
        .ok_or_else(|| "expected `key = value`".to_string())?;
    let key = line[..split_at].trim();
    if key.is_empty() {
        return Err("key name cannot be empty".to_string());
    }
    if key.chars().any(char::is_whitespace) {
        return Err(format!("key name contains whitespace: {}", key));
    }
    let value = strip_matching_quotes(line[split_at + 1..].trim());
    Ok((key.to_ascii_uppercase(), value.to_string()))
}
