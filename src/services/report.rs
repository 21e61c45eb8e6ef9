//! Read-only diagnostics over a loaded warehouse: column catalog, row counts,
//! the time span of recorded plays and a handful of canned analytic questions.

use crate::db::ddl::{TABLES, TableDef};
use crate::error::{PipelineError, Stage};
use crate::schema;
use crate::utils::sql_literal;
use chrono::NaiveDateTime;
use diesel::PgConnection;
use diesel::dsl::{max, min};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable, Text};
use log::{info, warn};

#[derive(Debug, QueryableByName)]
struct RowCount {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

#[derive(Debug, QueryableByName)]
struct Answer {
    #[diesel(sql_type = Nullable<Text>)]
    answer: Option<String>,
}

/// One row of `information_schema.columns` for a star-schema table.
#[derive(Debug, Clone, PartialEq, Eq, QueryableByName)]
pub struct CatalogColumn {
    #[diesel(sql_type = Text)]
    pub table_name: String,
    #[diesel(sql_type = Text)]
    pub column_name: String,
    #[diesel(sql_type = Text)]
    pub data_type: String,
    #[diesel(sql_type = Text)]
    pub is_nullable: String,
}

#[derive(Debug, Clone, Copy)]
pub struct AnalyticQuery {
    pub question: &'static str,
    pub sql: &'static str,
}

pub static ANALYTIC_QUERIES: [AnalyticQuery; 4] = [
    AnalyticQuery {
        question: "What is the most played song of all time?",
        sql: "
            SELECT dS.title AS answer
            FROM fact_songplays AS fS
            JOIN dim_songs AS dS
            ON fS.song_id = dS.song_id
            GROUP BY dS.title
            ORDER BY COUNT(fS.songplay_id) DESC
            LIMIT 1;
        ",
    },
    AnalyticQuery {
        question: "When is the highest usage time of day by hour for songs?",
        sql: "
            SELECT CAST(dT.hour AS VARCHAR) AS answer
            FROM fact_songplays AS fS
            JOIN dim_time AS dT
            ON fS.start_time = dT.start_time
            GROUP BY dT.hour
            ORDER BY COUNT(fS.songplay_id) DESC
            LIMIT 1;
        ",
    },
    AnalyticQuery {
        question: "Who are the top 3 most popular artists?",
        sql: "
            SELECT dA.name AS answer
            FROM fact_songplays AS fS
            JOIN dim_artists AS dA
            ON fS.artist_id = dA.artist_id
            GROUP BY dA.name
            ORDER BY COUNT(fS.songplay_id) DESC
            LIMIT 3;
        ",
    },
    AnalyticQuery {
        question: "Which five users listen to songs the most between midnight and 1 AM?",
        sql: "
            SELECT dU.first_name || ' ' || dU.last_name AS answer
            FROM fact_songplays AS fS
            JOIN dim_time AS dT
            ON fS.start_time = dT.start_time
            JOIN dim_users AS dU
            ON fS.user_id = dU.user_id
            WHERE dT.hour = 0
            GROUP BY dU.first_name, dU.last_name
            ORDER BY COUNT(fS.songplay_id) DESC
            LIMIT 5;
        ",
    },
];

fn catalog_sql() -> String {
    let names = TABLES.iter().map(|t| sql_literal(t.name)).collect::<Vec<_>>().join(", ");
    format!(
        "SELECT CAST(table_name AS VARCHAR) AS table_name,
                CAST(column_name AS VARCHAR) AS column_name,
                CAST(data_type AS VARCHAR) AS data_type,
                CAST(is_nullable AS VARCHAR) AS is_nullable
         FROM information_schema.columns
         WHERE table_schema = current_schema() AND table_name IN ({})
         ORDER BY table_name, ordinal_position;",
        names
    )
}

/// Columns of the seven tables as the database reports them.
pub fn check_schema(conn: &mut PgConnection) -> Result<Vec<CatalogColumn>, PipelineError> {
    diesel::sql_query(catalog_sql())
        .load(conn)
        .map_err(PipelineError::statement(Stage::Report, "information_schema.columns"))
}

/// Differences between the declared tables and what the catalog reports.
/// Empty when every table exists with exactly the declared columns, types and
/// nullability.
pub fn schema_drift(actual: &[CatalogColumn]) -> Vec<String> {
    let mut drift = Vec::new();
    for table in TABLES {
        let found = actual.iter().filter(|c| c.table_name == table.name).collect::<Vec<_>>();
        if found.is_empty() {
            drift.push(format!("{}: table missing", table.name));
            continue;
        }
        drift.extend(table_drift(table, &found));
    }
    drift
}

fn table_drift(table: &TableDef, found: &[&CatalogColumn]) -> Vec<String> {
    let mut drift = Vec::new();
    for declared in table.columns {
        let Some(column) = found.iter().find(|c| c.column_name == declared.name) else {
            drift.push(format!("{}.{}: column missing", table.name, declared.name));
            continue;
        };
        if column.data_type != declared.ty.catalog_name() {
            drift.push(format!(
                "{}.{}: type {} (declared {})",
                table.name,
                declared.name,
                column.data_type,
                declared.ty.catalog_name()
            ));
        }
        let nullable = column.is_nullable.eq_ignore_ascii_case("YES");
        if nullable == declared.not_null {
            drift.push(format!(
                "{}.{}: nullable={} (declared not_null={})",
                table.name, declared.name, nullable, declared.not_null
            ));
        }
    }
    for column in found {
        if table.column(&column.column_name).is_none() {
            drift.push(format!("{}.{}: undeclared column", table.name, column.column_name));
        }
    }
    drift
}

/// `(table, rows)` for every table in catalog order.
pub fn count_rows(conn: &mut PgConnection) -> Result<Vec<(&'static str, i64)>, PipelineError> {
    let mut counts = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let row: RowCount = diesel::sql_query(table.count_sql())
            .get_result(conn)
            .map_err(PipelineError::statement(Stage::Report, table.name))?;
        counts.push((table.name, row.count));
    }
    Ok(counts)
}

/// Earliest and latest play in the fact table; `None` while it is empty.
pub fn songplay_window(conn: &mut PgConnection) -> Result<Option<(NaiveDateTime, NaiveDateTime)>, PipelineError> {
    use schema::fact_songplays::dsl as F;

    let (first, last): (Option<NaiveDateTime>, Option<NaiveDateTime>) = F::fact_songplays
        .select((min(F::start_time), max(F::start_time)))
        .get_result(conn)
        .map_err(PipelineError::statement(Stage::Report, "fact_songplays"))?;
    Ok(first.zip(last))
}

pub fn run_analytic_query(conn: &mut PgConnection, query: &AnalyticQuery) -> Result<Vec<String>, PipelineError> {
    let rows: Vec<Answer> = diesel::sql_query(query.sql)
        .load(conn)
        .map_err(PipelineError::statement(Stage::Report, "fact_songplays"))?;
    Ok(rows
        .into_iter()
        .map(|r| r.answer.unwrap_or_else(|| "(unknown)".to_string()))
        .collect())
}

/// Print the whole report. Returns the number of schema drift findings.
pub fn run(conn: &mut PgConnection) -> Result<usize, PipelineError> {
    let columns = check_schema(conn)?;
    info!("Schema: {} column(s) across {} table(s)", columns.len(), TABLES.len());
    for c in &columns {
        info!("  {}.{} {} (nullable: {})", c.table_name, c.column_name, c.data_type, c.is_nullable);
    }
    let drift = schema_drift(&columns);
    for finding in &drift {
        warn!("Schema drift: {}", finding);
    }

    for (table, count) in count_rows(conn)? {
        info!("The {} table has {} row(s)", table, count);
    }

    match songplay_window(conn)? {
        Some((first, last)) => info!("Songplays span {} to {}", first, last),
        None => info!("Songplays: none recorded"),
    }

    for query in &ANALYTIC_QUERIES {
        let answers = run_analytic_query(conn, query)?;
        info!("{}", query.question);
        if answers.is_empty() {
            info!("  (no data)");
        }
        for (rank, answer) in answers.iter().enumerate() {
            info!("  {}. {}", rank + 1, answer);
        }
    }

    Ok(drift.len())
}
