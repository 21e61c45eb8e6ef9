use crate::db::ddl::{Dialect, TABLES};
use crate::error::{PipelineError, Stage};
use diesel::PgConnection;
use diesel::connection::SimpleConnection;
use log::{debug, info};

/// Drop every table of the star schema that exists. Tables carry no foreign
/// keys, so the order does not matter.
pub fn drop_tables(conn: &mut PgConnection) -> Result<(), PipelineError> {
    for table in TABLES {
        let sql = table.drop_sql();
        debug!("Schema: {}", sql);
        conn.batch_execute(&sql)
            .map_err(PipelineError::statement(Stage::Schema, table.name))?;
    }
    info!("Dropped {} table(s) if present", TABLES.len());
    Ok(())
}

pub fn create_tables(conn: &mut PgConnection, dialect: Dialect) -> Result<(), PipelineError> {
    for table in TABLES {
        let sql = table.create_sql(dialect);
        debug!("Schema: {}", sql);
        conn.batch_execute(&sql)
            .map_err(PipelineError::statement(Stage::Schema, table.name))?;
        info!("The {} table has successfully been created!", table.name);
    }
    Ok(())
}

/// Full rebuild: drop then create all seven tables.
pub fn reset(conn: &mut PgConnection, dialect: Dialect) -> Result<(), PipelineError> {
    drop_tables(conn)?;
    create_tables(conn, dialect)
}
