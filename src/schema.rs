//! Handwritten Diesel schema declarations mirroring `db::ddl`.
//!
//! The tables are created by the schema reset stage, not by migrations. These
//! declarations only exist so rows can be read and seeded in a type-safe way.
//! Staging tables have no primary key in the database; Diesel needs one, so a
//! pseudo key is declared.

diesel::table! {
    staging_events (ts) {
        artist -> Nullable<Varchar>,
        auth -> Nullable<Varchar>,
        first_name -> Nullable<Varchar>,
        gender -> Nullable<Varchar>,
        item_in_session -> Nullable<Int4>,
        last_name -> Nullable<Varchar>,
        length -> Nullable<Float8>,
        level -> Nullable<Varchar>,
        location -> Nullable<Varchar>,
        method -> Nullable<Varchar>,
        page -> Nullable<Varchar>,
        registration -> Nullable<Int8>,
        session_id -> Nullable<Int4>,
        song -> Nullable<Varchar>,
        status -> Nullable<Int4>,
        ts -> Nullable<Timestamp>,
        user_agent -> Nullable<Varchar>,
        user_id -> Nullable<Int4>,
    }
}

diesel::table! {
    staging_songs (song_id) {
        num_songs -> Nullable<Int4>,
        artist_id -> Nullable<Varchar>,
        artist_latitude -> Nullable<Float8>,
        artist_longitude -> Nullable<Float8>,
        artist_location -> Nullable<Varchar>,
        artist_name -> Nullable<Varchar>,
        song_id -> Nullable<Varchar>,
        title -> Nullable<Varchar>,
        duration -> Nullable<Float8>,
        year -> Nullable<Int4>,
    }
}

diesel::table! {
    fact_songplays (songplay_id) {
        songplay_id -> Int4,
        start_time -> Nullable<Timestamp>,
        user_id -> Nullable<Int4>,
        level -> Nullable<Varchar>,
        song_id -> Nullable<Varchar>,
        artist_id -> Nullable<Varchar>,
        session_id -> Nullable<Int4>,
        location -> Nullable<Varchar>,
        user_agent -> Nullable<Varchar>,
    }
}

diesel::table! {
    dim_users (user_id) {
        user_id -> Int4,
        first_name -> Nullable<Varchar>,
        last_name -> Nullable<Varchar>,
        gender -> Nullable<Varchar>,
        level -> Nullable<Varchar>,
    }
}

diesel::table! {
    dim_songs (song_id) {
        song_id -> Varchar,
        title -> Nullable<Varchar>,
        artist_id -> Nullable<Varchar>,
        year -> Nullable<Int4>,
        duration -> Nullable<Float8>,
    }
}

diesel::table! {
    dim_artists (artist_id) {
        artist_id -> Varchar,
        name -> Nullable<Varchar>,
        location -> Nullable<Varchar>,
        latitude -> Nullable<Float8>,
        longitude -> Nullable<Float8>,
    }
}

diesel::table! {
    dim_time (start_time) {
        start_time -> Timestamp,
        hour -> Int4,
        day -> Int4,
        week -> Int4,
        month -> Int4,
        year -> Int4,
        weekday -> Int4,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    staging_events,
    staging_songs,
    fact_songplays,
    dim_users,
    dim_songs,
    dim_artists,
    dim_time,
);
