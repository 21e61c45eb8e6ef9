//! Schema reset and transform against a live PostgreSQL.
//!
//! Ignored by default. Run with `TEST_DATABASE_URL=... cargo test -- --ignored`;
//! each test works in its own schema.

mod common;

use diesel::prelude::*;
use songplays_dwh::db::ddl::{Dialect, TABLES};
use songplays_dwh::db::models::{Artist, Song, Songplay, StagingEvent, TimeSlot, User};
use songplays_dwh::schema::{dim_artists, dim_songs, dim_time, dim_users, fact_songplays};
use songplays_dwh::services::{report, schema_reset, transform};

#[test]
#[ignore = "needs TEST_DATABASE_URL"]
fn schema_reset_creates_declared_tables() {
    let Some(mut conn) = common::warehouse("dwh_test_schema") else {
        return;
    };

    let columns = report::check_schema(&mut conn).expect("catalog");
    let declared: usize = TABLES.iter().map(|t| t.columns.len()).sum();
    assert_eq!(columns.len(), declared);
    assert_eq!(report::schema_drift(&columns), Vec::<String>::new());

    let song_id = columns
        .iter()
        .find(|c| c.table_name == "fact_songplays" && c.column_name == "song_id")
        .expect("fact_songplays.song_id");
    assert_eq!(song_id.is_nullable, "YES");
}

#[test]
#[ignore = "needs TEST_DATABASE_URL"]
fn schema_reset_is_idempotent() {
    let Some(mut conn) = common::warehouse("dwh_test_idempotent") else {
        return;
    };
    common::seed_events(&mut conn, &common::fixture_events());
    let before = report::check_schema(&mut conn).expect("catalog");

    schema_reset::reset(&mut conn, Dialect::Postgres).expect("second reset");
    let after = report::check_schema(&mut conn).expect("catalog");
    assert_eq!(before, after);

    let counts = report::count_rows(&mut conn).expect("counts");
    assert!(counts.iter().all(|(_, n)| *n == 0), "{counts:?}");
}

#[test]
#[ignore = "needs TEST_DATABASE_URL"]
fn drop_tables_tolerates_missing_tables() {
    let Some(mut conn) = common::connect("dwh_test_drop") else {
        return;
    };
    schema_reset::drop_tables(&mut conn).expect("drop on empty schema");
    schema_reset::drop_tables(&mut conn).expect("drop twice");
}

#[test]
#[ignore = "needs TEST_DATABASE_URL"]
fn transform_populates_every_table() {
    let Some(mut conn) = common::warehouse("dwh_test_transform") else {
        return;
    };
    common::seed_events(&mut conn, &common::fixture_events());
    common::seed_songs(&mut conn, &common::fixture_songs());

    let inserted = transform::insert_tables(&mut conn).expect("transform");
    assert_eq!(
        inserted,
        [
            ("fact_songplays", 5),
            ("dim_users", 4),
            ("dim_songs", 2),
            ("dim_artists", 2),
            ("dim_time", 5),
        ]
    );

    let counts = report::count_rows(&mut conn).expect("counts");
    assert_eq!(
        counts,
        [
            ("staging_events", 7),
            ("staging_songs", 3),
            ("fact_songplays", 5),
            ("dim_users", 4),
            ("dim_songs", 2),
            ("dim_artists", 2),
            ("dim_time", 5),
        ]
    );
}

#[test]
#[ignore = "needs TEST_DATABASE_URL"]
fn unmatched_plays_keep_null_song_and_artist() {
    let Some(mut conn) = common::warehouse("dwh_test_left_join") else {
        return;
    };
    common::seed_events(&mut conn, &common::fixture_events());
    common::seed_songs(&mut conn, &common::fixture_songs());
    transform::insert_tables(&mut conn).expect("transform");

    let plays: Vec<Songplay> = fact_songplays::table
        .select(Songplay::as_select())
        .order(fact_songplays::start_time.asc())
        .load(&mut conn)
        .expect("fact rows");
    let matched = plays.iter().filter(|p| p.song_id.is_some()).count();
    assert_eq!(plays.len(), 5);
    assert_eq!(matched, 3);

    let mr_jones = plays
        .iter()
        .find(|p| p.start_time == Some(common::ts("2018-11-01 21:05:52")))
        .expect("unmatched play kept");
    assert_eq!(mr_jones.song_id, None);
    assert_eq!(mr_jones.artist_id, None);
    assert_eq!(mr_jones.user_id, Some(8));
    assert_eq!(mr_jones.session_id, Some(139));

    for p in plays.iter().filter(|p| p.song_id.is_some()) {
        assert_eq!(p.song_id.as_deref(), Some("SONHOTT12A8C13493C"));
        assert_eq!(p.artist_id.as_deref(), Some("ARTDQRC1187FB4EFD4"));
    }
}

#[test]
#[ignore = "needs TEST_DATABASE_URL"]
fn identical_plays_collapse_to_one_fact_row() {
    let Some(mut conn) = common::warehouse("dwh_test_fact_dedup") else {
        return;
    };
    let event = common::play("2018-11-03 10:00:00", 3, "Song", "Band");
    common::seed_events(&mut conn, &[event.clone(), event]);
    transform::insert_tables(&mut conn).expect("transform");

    let total: i64 = fact_songplays::table.count().get_result(&mut conn).expect("count");
    assert_eq!(total, 1);
}

#[test]
#[ignore = "needs TEST_DATABASE_URL"]
fn users_dimension_keeps_level_changes() {
    let Some(mut conn) = common::warehouse("dwh_test_users") else {
        return;
    };
    common::seed_events(&mut conn, &common::fixture_events());
    transform::insert_tables(&mut conn).expect("transform");

    let users: Vec<User> = dim_users::table
        .select(User::as_select())
        .order((dim_users::user_id.asc(), dim_users::level.asc()))
        .load(&mut conn)
        .expect("users");
    let ids = users.iter().map(|u| u.user_id).collect::<Vec<_>>();
    assert_eq!(ids, [8, 10, 26, 26]);
    let ryan_levels = users
        .iter()
        .filter(|u| u.user_id == 26)
        .map(|u| u.level.as_deref().unwrap_or_default())
        .collect::<Vec<_>>();
    assert_eq!(ryan_levels, ["free", "paid"]);
    // The logged-out event has no user id and a non-play page.
    assert!(users.iter().all(|u| u.first_name.is_some()));
}

#[test]
#[ignore = "needs TEST_DATABASE_URL"]
fn time_dimension_uses_iso_week_and_sunday_based_weekday() {
    let Some(mut conn) = common::warehouse("dwh_test_time") else {
        return;
    };
    common::seed_events(&mut conn, &common::fixture_events());
    transform::insert_tables(&mut conn).expect("transform");

    let slots: Vec<TimeSlot> = dim_time::table
        .select(TimeSlot::as_select())
        .order(dim_time::start_time.asc())
        .load(&mut conn)
        .expect("time rows");
    assert_eq!(slots.len(), 5);

    let known = slots
        .iter()
        .find(|s| s.start_time == common::ts("2018-11-01 21:05:52"))
        .expect("known timestamp");
    assert_eq!(
        (known.hour, known.day, known.week, known.month, known.year, known.weekday),
        (21, 1, 44, 11, 2018, 4)
    );

    for slot in &slots {
        assert_eq!(*slot, common::expected_time_slot(slot.start_time));
    }
}

#[test]
#[ignore = "needs TEST_DATABASE_URL"]
fn single_matching_play_end_to_end() {
    let Some(mut conn) = common::warehouse("dwh_test_end_to_end") else {
        return;
    };
    common::seed_events(
        &mut conn,
        &[common::play("2018-11-01 21:05:52", 7, "Test Song", "Test Artist")],
    );
    common::seed_songs(
        &mut conn,
        &[common::catalog_song("SOABC123", "Test Song", "ARABC123", "Test Artist")],
    );
    transform::insert_tables(&mut conn).expect("transform");

    let plays: Vec<Songplay> = fact_songplays::table
        .select(Songplay::as_select())
        .load(&mut conn)
        .expect("fact rows");
    assert_eq!(plays.len(), 1);
    assert_eq!(plays[0].song_id.as_deref(), Some("SOABC123"));
    assert_eq!(plays[0].artist_id.as_deref(), Some("ARABC123"));
    assert_eq!(plays[0].user_id, Some(7));

    let users: Vec<User> = dim_users::table
        .filter(dim_users::user_id.eq(7))
        .select(User::as_select())
        .load(&mut conn)
        .expect("users");
    assert_eq!(users.len(), 1);
}

#[test]
#[ignore = "needs TEST_DATABASE_URL"]
fn analytic_queries_answer_over_fixture() {
    let Some(mut conn) = common::warehouse("dwh_test_analytics") else {
        return;
    };
    common::seed_events(&mut conn, &common::fixture_events());
    common::seed_songs(&mut conn, &common::fixture_songs());
    transform::insert_tables(&mut conn).expect("transform");

    let answers = report::ANALYTIC_QUERIES
        .iter()
        .map(|q| report::run_analytic_query(&mut conn, q).expect("analytic query"))
        .collect::<Vec<_>>();
    assert_eq!(answers[0], ["You Gotta Be"]);
    assert_eq!(answers[1], ["0"]);
    assert_eq!(answers[2], ["Des'ree"]);
    assert_eq!(answers[3], ["Ryan Smith", "Sylvie Cruz"]);

    let window = report::songplay_window(&mut conn).expect("window");
    assert_eq!(
        window,
        Some((common::ts("2018-11-01 21:01:46"), common::ts("2018-11-02 00:40:00")))
    );
}

#[test]
#[ignore = "needs TEST_DATABASE_URL"]
fn songplay_window_is_empty_before_transform() {
    let Some(mut conn) = common::warehouse("dwh_test_window") else {
        return;
    };
    assert_eq!(report::songplay_window(&mut conn).expect("window"), None);
}

#[test]
#[ignore = "needs TEST_DATABASE_URL"]
fn play_without_timestamp_keeps_fact_row_but_no_time_row() {
    let Some(mut conn) = common::warehouse("dwh_test_null_ts") else {
        return;
    };
    let untimed = StagingEvent {
        ts: None,
        ..common::play("2018-11-01 21:05:52", 5, "Song", "Band")
    };
    let timed = common::play("2018-11-03 10:00:00", 6, "Other", "Band");
    common::seed_events(&mut conn, &[untimed, timed]);
    transform::insert_tables(&mut conn).expect("transform");

    let plays: Vec<Songplay> = fact_songplays::table
        .select(Songplay::as_select())
        .order(fact_songplays::user_id.asc())
        .load(&mut conn)
        .expect("fact rows");
    assert_eq!(plays.len(), 2);
    assert_eq!((plays[0].user_id, plays[0].start_time), (Some(5), None));
    assert_eq!(plays[1].start_time, Some(common::ts("2018-11-03 10:00:00")));

    let slots: Vec<TimeSlot> = dim_time::table
        .select(TimeSlot::as_select())
        .load(&mut conn)
        .expect("time rows");
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].start_time, common::ts("2018-11-03 10:00:00"));
}

#[test]
#[ignore = "needs TEST_DATABASE_URL"]
fn catalog_dimensions_skip_null_keys_and_collapse_artists() {
    let Some(mut conn) = common::warehouse("dwh_test_catalog") else {
        return;
    };
    common::seed_songs(&mut conn, &common::fixture_songs());
    transform::insert_tables(&mut conn).expect("transform");

    let songs: Vec<Song> = dim_songs::table
        .select(Song::as_select())
        .order(dim_songs::song_id.asc())
        .load(&mut conn)
        .expect("songs");
    let ids = songs.iter().map(|s| s.song_id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, ["SOAOIBZ12AB01815BE", "SONHOTT12A8C13493C"]);
    assert_eq!(songs[1].title.as_deref(), Some("You Gotta Be"));
    assert_eq!(songs[1].artist_id.as_deref(), Some("ARTDQRC1187FB4EFD4"));

    let artists: Vec<Artist> = dim_artists::table
        .select(Artist::as_select())
        .order(dim_artists::artist_id.asc())
        .load(&mut conn)
        .expect("artists");
    assert_eq!(artists.len(), 2);
    let xx = &artists[0];
    assert_eq!(xx.artist_id, "ARQ9BO41187FB5CF1F");
    assert_eq!(xx.name.as_deref(), Some("The xx"));
    assert_eq!(xx.location.as_deref(), Some("London"));
    assert_eq!(xx.latitude, Some(51.50632));
    assert_eq!(artists[1].name.as_deref(), Some("Des'ree"));
    assert_eq!(artists[1].latitude, None);
}
