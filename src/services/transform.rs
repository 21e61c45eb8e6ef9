//! Staging-to-warehouse transform: one `INSERT ... SELECT DISTINCT` per
//! target table. Each statement commits on its own; a failure part-way leaves
//! the tables already populated in place.

use crate::db::ddl::{DIM_ARTISTS, DIM_SONGS, DIM_TIME, DIM_USERS, FACT_SONGPLAYS, TableDef};
use crate::error::{PipelineError, Stage};
use diesel::PgConnection;
use diesel::prelude::*;
use log::{debug, info};

// Only NextSong events are plays. Every one yields a fact row, even with a NULL
// timestamp or no catalog match.
pub const SONGPLAY_INSERT: &str = "
    INSERT INTO fact_songplays (start_time, user_id, level, song_id,
                                artist_id, session_id, location, user_agent)
    SELECT DISTINCT e.ts AS start_time, e.user_id, e.level,
                    s.song_id, s.artist_id, e.session_id,
                    e.location, e.user_agent
    FROM staging_events AS e
    LEFT JOIN staging_songs AS s
    ON e.song = s.title AND e.artist = s.artist_name
    WHERE e.page = 'NextSong';
";

// A user seen with two subscription levels yields two rows.
pub const USER_INSERT: &str = "
    INSERT INTO dim_users (user_id, first_name, last_name, gender, level)
    SELECT DISTINCT user_id, first_name, last_name, gender, level
    FROM staging_events
    WHERE user_id IS NOT NULL AND page = 'NextSong';
";

pub const SONG_INSERT: &str = "
    INSERT INTO dim_songs (song_id, title, artist_id, year, duration)
    SELECT DISTINCT song_id, title, artist_id, year, duration
    FROM staging_songs
    WHERE song_id IS NOT NULL;
";

pub const ARTIST_INSERT: &str = "
    INSERT INTO dim_artists (artist_id, name, location, latitude, longitude)
    SELECT DISTINCT artist_id, artist_name AS name,
                    artist_location AS location,
                    artist_latitude AS latitude,
                    artist_longitude AS longitude
    FROM staging_songs
    WHERE artist_id IS NOT NULL;
";

// WEEK is the ISO-8601 week number, DOW counts from Sunday = 0 on both engines.
pub const TIME_INSERT: &str = "
    INSERT INTO dim_time (start_time, hour, day, week, month, year, weekday)
    SELECT DISTINCT ts AS start_time,
                    CAST(EXTRACT(HOUR FROM ts) AS INTEGER) AS hour,
                    CAST(EXTRACT(DAY FROM ts) AS INTEGER) AS day,
                    CAST(EXTRACT(WEEK FROM ts) AS INTEGER) AS week,
                    CAST(EXTRACT(MONTH FROM ts) AS INTEGER) AS month,
                    CAST(EXTRACT(YEAR FROM ts) AS INTEGER) AS year,
                    CAST(EXTRACT(DOW FROM ts) AS INTEGER) AS weekday
    FROM staging_events
    WHERE ts IS NOT NULL AND page = 'NextSong';
";

/// Insert statements in execution order: fact first, then the dimensions.
pub static INSERTS: [(&TableDef, &str); 5] = [
    (&FACT_SONGPLAYS, SONGPLAY_INSERT),
    (&DIM_USERS, USER_INSERT),
    (&DIM_SONGS, SONG_INSERT),
    (&DIM_ARTISTS, ARTIST_INSERT),
    (&DIM_TIME, TIME_INSERT),
];

/// Run every insert; returns `(table, rows inserted)` in execution order.
pub fn insert_tables(conn: &mut PgConnection) -> Result<Vec<(&'static str, usize)>, PipelineError> {
    let mut inserted = Vec::with_capacity(INSERTS.len());
    for (table, sql) in INSERTS {
        debug!("Transform: {}", sql.trim());
        let rows = diesel::sql_query(sql)
            .execute(conn)
            .map_err(PipelineError::statement(Stage::Transform, table.name))?;
        info!(
            "Data has successfully been loaded to the {} table! ({} row(s))",
            table.name, rows
        );
        inserted.push((table.name, rows));
    }
    Ok(inserted)
}
