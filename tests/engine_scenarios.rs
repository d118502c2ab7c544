use std::fs;
use std::path::PathBuf;

use nhl_shot_features::batch::{RawGame, run_batch};
use nhl_shot_features::config::EngineConfig;
use nhl_shot_features::features::{FeatureAssembler, ShotFeatureRow};
use nhl_shot_features::payload::parse_game_json;
use nhl_shot_features::timeline::{GameTimeline, ScanBound};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn fixture_timeline() -> GameTimeline {
    let raw = read_fixture("game_2019020001.json");
    parse_game_json(&raw, None)
        .expect("fixture should parse")
        .timeline
}

fn rows_with(config: &EngineConfig) -> Vec<ShotFeatureRow> {
    FeatureAssembler::new(config).assemble(&fixture_timeline())
}

fn row_for_event(rows: &[ShotFeatureRow], event_id: u64) -> &ShotFeatureRow {
    rows.iter()
        .find(|r| r.event_id == Some(event_id))
        .expect("row for event should exist")
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn emits_one_row_per_shot_and_goal_in_timeline_order() {
    let rows = rows_with(&EngineConfig::default());
    let ids: Vec<_> = rows.iter().map(|r| r.event_id.unwrap()).collect();
    assert_eq!(ids, vec![103, 104, 106, 109, 111, 112]);
    assert!(rows.iter().all(|r| r.game_id == 2019020001));
    assert!(rows.iter().all(|r| r.season == Some(2019)));
    assert!(rows.iter().all(|r| r.game_type == "regular"));
}

#[test]
fn follow_up_shot_is_a_rebound() {
    let rows = rows_with(&EngineConfig::default());
    let second = row_for_event(&rows, 104);
    assert_eq!(second.last_event_type.as_deref(), Some("shot-on-goal"));
    assert_eq!(second.last_event_x, Some(20.0));
    assert_eq!(second.last_event_y, Some(10.0));
    assert_eq!(second.time_since_last_event, Some(4));
    assert_eq!(second.rebound, 1);
    assert!(approx(second.distance_from_last_event.unwrap(), 5.385));
    assert!(approx(second.event_speed.unwrap(), 5.385 / 4.0));
    assert_eq!(second.attacking_goal, "right");
    assert!(approx(second.distance_from_net.unwrap(), 64.0_f64.hypot(12.0)));

    let expected_change = 12.0_f64.atan2(64.0).to_degrees() - 10.0_f64.atan2(69.0).to_degrees();
    assert!(approx(second.angle_change.unwrap(), expected_change));
}

#[test]
fn first_shot_follows_the_faceoff() {
    let rows = rows_with(&EngineConfig::default());
    let first = row_for_event(&rows, 103);
    assert_eq!(first.last_event_type.as_deref(), Some("faceoff"));
    assert_eq!(first.time_since_last_event, Some(10));
    assert_eq!(first.rebound, 0);
    assert_eq!(first.angle_change, Some(0.0));
    assert!(approx(first.distance_from_last_event.unwrap(), 20.0_f64.hypot(10.0)));
}

#[test]
fn shot_after_a_block_is_not_a_rebound() {
    let rows = rows_with(&EngineConfig::default());
    let away = row_for_event(&rows, 106);
    assert_eq!(away.last_event_type.as_deref(), Some("blocked-shot"));
    assert_eq!(away.rebound, 0);
    assert_eq!(away.angle_change, Some(0.0));
    assert_eq!(away.is_home, 0);
    assert_eq!(away.attacking_goal, "left");
    assert!(approx(away.distance_from_net.unwrap(), 19.0_f64.hypot(5.0)));
}

#[test]
fn power_play_goal_carries_manpower_context() {
    let rows = rows_with(&EngineConfig::default());
    let goal = row_for_event(&rows, 109);
    assert_eq!(goal.is_goal, 1);
    assert_eq!(goal.empty_net, 0);
    assert_eq!(goal.friendly_player_count, 5);
    assert_eq!(goal.opponent_player_count, 4);
    assert_eq!(goal.player_count_diff, 1);
    assert_eq!(goal.time_since_power_play, 40);
    assert_eq!(goal.time_since_last_event, Some(40));
    assert_eq!(goal.shot_type.as_deref(), Some("tip-in"));
}

#[test]
fn rows_name_the_shooter_goalie_and_team() {
    let rows = rows_with(&EngineConfig::default());
    let goal = row_for_event(&rows, 109);
    assert_eq!(goal.shooter_id, Some(8479318));
    assert_eq!(goal.shooter_name.as_deref(), Some("Auston Matthews"));
    assert_eq!(goal.goalie_id, Some(8471679));
    assert_eq!(goal.goalie_name.as_deref(), Some("Carey Price"));
    assert_eq!(goal.team_name.as_deref(), Some("Toronto Maple Leafs"));

    let away = row_for_event(&rows, 106);
    assert_eq!(away.shooter_name.as_deref(), Some("Jeff Petry"));
    assert_eq!(away.goalie_name.as_deref(), Some("Frederik Andersen"));
    assert_eq!(away.team_name.as_deref(), Some("Montréal Canadiens"));
}

#[test]
fn names_missing_from_roster_stay_empty() {
    let rows = rows_with(&EngineConfig::default());
    let shot = row_for_event(&rows, 111);
    assert_eq!(shot.shooter_id, Some(8480012));
    assert_eq!(shot.shooter_name, None);
    assert_eq!(shot.goalie_name.as_deref(), Some("Michael Hutchinson"));

    let empty_net = row_for_event(&rows, 112);
    assert_eq!(empty_net.goalie_id, None);
    assert_eq!(empty_net.goalie_name, None);
}

#[test]
fn shot_without_coordinates_keeps_temporal_context() {
    let rows = rows_with(&EngineConfig::default());
    let shot = row_for_event(&rows, 111);
    assert_eq!(shot.period, 2);
    assert_eq!(shot.time_since_last_event, Some(3));
    assert_eq!(shot.distance_from_net, None);
    assert_eq!(shot.shot_angle, None);
    assert_eq!(shot.distance_from_last_event, None);
    assert_eq!(shot.event_speed, None);
    assert_eq!(shot.rebound, 0);
}

#[test]
fn empty_net_goal_with_no_predecessor_in_period() {
    let rows = rows_with(&EngineConfig::default());
    let goal = row_for_event(&rows, 112);
    assert_eq!(goal.empty_net, 1);
    assert_eq!(goal.last_event_type, None);
    assert_eq!(goal.time_since_last_event, None);
    assert_eq!(goal.distance_from_last_event, None);
    assert_eq!(goal.event_speed, None);
    assert_eq!(goal.rebound, 0);
    assert_eq!(goal.friendly_player_count, 5);
    assert_eq!(goal.opponent_player_count, 6);
    assert_eq!(goal.player_count_diff, -1);
    assert_eq!(goal.time_since_power_play, 0);
    assert_eq!(goal.game_time_seconds, 2 * 1200 + 1180);
}

#[test]
fn exclusive_bound_skips_same_second_and_target() {
    let config = EngineConfig {
        scan_bound: ScanBound::Exclusive,
        ..EngineConfig::default()
    };
    let rows = rows_with(&config);
    let second = row_for_event(&rows, 104);
    assert_eq!(second.last_event_type.as_deref(), Some("faceoff"));
    assert_eq!(second.time_since_last_event, Some(14));
    assert_eq!(second.rebound, 0);
}

#[test]
fn angle_change_is_bounded_everywhere() {
    for bound in [ScanBound::Inclusive, ScanBound::Exclusive] {
        let config = EngineConfig {
            scan_bound: bound,
            include_missed_shots: true,
            ..EngineConfig::default()
        };
        for row in rows_with(&config) {
            if let Some(change) = row.angle_change {
                assert!((0.0..=180.0).contains(&change), "angle change {change}");
            }
            if row.rebound == 0 {
                assert_eq!(row.angle_change, Some(0.0));
            }
        }
    }
}

#[test]
fn assembling_twice_is_identical() {
    let timeline = fixture_timeline();
    let assembler = FeatureAssembler::new(&EngineConfig::default());
    assert_eq!(assembler.assemble(&timeline), assembler.assemble(&timeline));
}

#[test]
fn batch_skips_game_without_plays_and_continues() {
    let games = vec![
        RawGame {
            game_id: Some(2019020002),
            origin: "game_missing_plays.json".to_string(),
            body: read_fixture("game_missing_plays.json"),
        },
        RawGame {
            game_id: Some(2019020001),
            origin: "game_2019020001.json".to_string(),
            body: read_fixture("game_2019020001.json"),
        },
    ];
    let out = run_batch(&games, &EngineConfig::default());
    assert_eq!(out.games_processed, 1);
    assert_eq!(out.rows.len(), 6);
    assert!(out.rows.iter().all(|r| r.game_id == 2019020001));
    assert_eq!(out.events_dropped, 1);
    assert_eq!(out.skipped.len(), 1);
    assert_eq!(out.skipped[0].game, "2019020002");
    assert_eq!(out.skipped[0].kind, "MalformedPayload");
    assert!(out.skipped[0].reason.contains("plays"));

    let again = run_batch(&games, &EngineConfig::default().with_parallelism(1));
    assert_eq!(out.digest, again.digest);
}
