#![allow(dead_code)]

use chrono::{Datelike, NaiveDateTime, Timelike};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::PgConnection;
use songplays_dwh::db::ddl::Dialect;
use songplays_dwh::db::models::{StagingEvent, StagingSong, TimeSlot};
use songplays_dwh::schema::{staging_events, staging_songs};
use songplays_dwh::services::schema_reset;

/// Connect to `TEST_DATABASE_URL` and switch to a fresh schema named `schema`.
///
/// Returns `None` when no test database is configured, so callers can skip.
pub fn connect(schema: &str) -> Option<PgConnection> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            eprintln!("TEST_DATABASE_URL not set; skipping {schema}");
            return None;
        }
    };
    let mut conn = PgConnection::establish(&url).expect("connect to TEST_DATABASE_URL");
    conn.batch_execute(&format!(
        "DROP SCHEMA IF EXISTS {schema} CASCADE; CREATE SCHEMA {schema}; SET search_path TO {schema};"
    ))
    .expect("isolated test schema");
    Some(conn)
}

/// Fresh schema with all seven tables created for plain PostgreSQL.
pub fn warehouse(schema: &str) -> Option<PgConnection> {
    let mut conn = connect(schema)?;
    schema_reset::reset(&mut conn, Dialect::Postgres).expect("schema reset");
    Some(conn)
}

pub fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("timestamp literal")
}

pub fn play(at: &str, user_id: i32, song: &str, artist: &str) -> StagingEvent {
    StagingEvent {
        artist: Some(artist.to_string()),
        auth: Some("Logged In".to_string()),
        first_name: Some(format!("First{user_id}")),
        last_name: Some(format!("Last{user_id}")),
        gender: Some("F".to_string()),
        level: Some("free".to_string()),
        page: Some("NextSong".to_string()),
        session_id: Some(1),
        song: Some(song.to_string()),
        ts: Some(ts(at)),
        user_id: Some(user_id),
        ..Default::default()
    }
}

pub fn catalog_song(song_id: &str, title: &str, artist_id: &str, artist_name: &str) -> StagingSong {
    StagingSong {
        num_songs: Some(1),
        artist_id: Some(artist_id.to_string()),
        artist_name: Some(artist_name.to_string()),
        song_id: Some(song_id.to_string()),
        title: Some(title.to_string()),
        duration: Some(200.0),
        year: Some(2000),
        ..Default::default()
    }
}

pub fn seed_events(conn: &mut PgConnection, rows: &[StagingEvent]) {
    diesel::insert_into(staging_events::table)
        .values(rows)
        .execute(conn)
        .expect("seed staging_events");
}

pub fn seed_songs(conn: &mut PgConnection, rows: &[StagingSong]) {
    diesel::insert_into(staging_songs::table)
        .values(rows)
        .execute(conn)
        .expect("seed staging_songs");
}

fn read_jsonl<T: serde::de::DeserializeOwned>(path: &str) -> Vec<T> {
    std::fs::read_to_string(path)
        .expect("fixture present")
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("fixture row"))
        .collect()
}

pub fn fixture_events() -> Vec<StagingEvent> {
    read_jsonl("tests/data/staging_events.jsonl")
}

pub fn fixture_songs() -> Vec<StagingSong> {
    read_jsonl("tests/data/staging_songs.jsonl")
}

/// Calendar fields for `ts`: ISO week, weekday counted from Sunday = 0.
pub fn expected_time_slot(ts: NaiveDateTime) -> TimeSlot {
    TimeSlot {
        start_time: ts,
        hour: ts.hour() as i32,
        day: ts.day() as i32,
        week: ts.iso_week().week() as i32,
        month: ts.month() as i32,
        year: ts.year(),
        weekday: ts.weekday().num_days_from_sunday() as i32,
    }
}
