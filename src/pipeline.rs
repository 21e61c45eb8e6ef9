//! Top-level drivers behind the three binaries. Each owns exactly one
//! connection and releases it on every exit path.

use crate::config::{ClusterConfig, Config};
use crate::error::PipelineError;
use crate::services::{bulk_load, report, schema_reset, transform};
use crate::utils::format_elapsed;
use diesel::PgConnection;
use diesel::prelude::*;
use log::{info, warn};
use std::time::Instant;

pub fn connect(cluster: &ClusterConfig) -> Result<PgConnection, PipelineError> {
    let conn = PgConnection::establish(&cluster.connection_string())?;
    info!(
        "Connected to database {} on {}:{} as {}",
        cluster.db_name, cluster.host, cluster.db_port, cluster.db_user
    );
    Ok(conn)
}

/// Open a connection, run `f`, and close the connection whatever `f` returns.
fn with_connection<T>(
    cfg: &Config,
    f: impl FnOnce(&mut PgConnection) -> Result<T, PipelineError>,
) -> Result<T, PipelineError> {
    let mut conn = connect(&cfg.cluster)?;
    let result = f(&mut conn);
    drop(conn);
    info!("Database connection closed");
    result
}

/// Drop and recreate the seven tables.
pub fn build_schema(cfg: &Config) -> Result<(), PipelineError> {
    with_connection(cfg, |conn| {
        let started = Instant::now();
        info!("Resetting schema ({} dialect)", cfg.cluster.dialect);
        schema_reset::reset(conn, cfg.cluster.dialect)?;
        info!("Schema reset complete in {}", format_elapsed(started.elapsed()));
        Ok(())
    })
}

/// Bulk load both staging tables, then populate the fact and dimension tables.
pub fn run_etl(cfg: &Config) -> Result<(), PipelineError> {
    if !cfg.cluster.dialect.supports_bulk_load() {
        return Err(PipelineError::Unsupported(format!(
            "the ETL run loads from S3 and needs the redshift dialect (configured: {})",
            cfg.cluster.dialect
        )));
    }

    with_connection(cfg, |conn| {
        let started = Instant::now();
        info!("Loading staging tables");
        bulk_load::load_staging_tables(conn, cfg)?;
        info!("Staging load complete in {}", format_elapsed(started.elapsed()));

        let started = Instant::now();
        info!("Populating fact and dimension tables");
        let inserted = transform::insert_tables(conn)?;
        let total: usize = inserted.iter().map(|(_, rows)| rows).sum();
        info!(
            "Transform complete in {}: {} row(s) across {} table(s)",
            format_elapsed(started.elapsed()),
            total,
            inserted.len()
        );
        Ok(())
    })
}

/// Print schema, row counts and the analytic answers.
pub fn analyze(cfg: &Config) -> Result<(), PipelineError> {
    with_connection(cfg, |conn| {
        let drift = report::run(conn)?;
        if drift > 0 {
            warn!("{} schema difference(s) found; run create-tables to rebuild", drift);
        }
        Ok(())
    })
}
