use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, params};

use crate::batch::BatchOutput;
use crate::features::ShotFeatureRow;

const CACHE_DIR: &str = "nhl_shot_features";
const DB_FILE: &str = "shot_features.sqlite";

#[derive(Debug, Clone)]
pub struct StoredBatch {
    pub run_id: i64,
    pub rows_upserted: usize,
    pub games_skipped: usize,
    pub digest: String,
}

pub fn default_db_path() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR).join(DB_FILE));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR).join(DB_FILE))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS shots (
            game_id INTEGER NOT NULL,
            event_index INTEGER NOT NULL,
            season INTEGER NULL,
            game_type TEXT NOT NULL,
            event_id INTEGER NULL,
            period INTEGER NOT NULL,
            period_time_seconds INTEGER NOT NULL,
            game_time_seconds INTEGER NOT NULL,
            event_type TEXT NOT NULL,
            team_id INTEGER NULL,
            team_name TEXT NULL,
            shooter_id INTEGER NULL,
            shooter_name TEXT NULL,
            goalie_id INTEGER NULL,
            goalie_name TEXT NULL,
            is_home INTEGER NOT NULL,
            x_coord REAL NULL,
            y_coord REAL NULL,
            shot_type TEXT NULL,
            zone_code TEXT NULL,
            attacking_goal TEXT NOT NULL,
            distance_from_net REAL NULL,
            shot_angle REAL NULL,
            last_event_type TEXT NULL,
            last_event_x REAL NULL,
            last_event_y REAL NULL,
            time_since_last_event INTEGER NULL,
            distance_from_last_event REAL NULL,
            rebound INTEGER NOT NULL,
            angle_change REAL NULL,
            event_speed REAL NULL,
            friendly_player_count INTEGER NOT NULL,
            opponent_player_count INTEGER NOT NULL,
            player_count_diff INTEGER NOT NULL,
            time_since_power_play INTEGER NOT NULL,
            empty_net INTEGER NOT NULL,
            is_goal INTEGER NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (game_id, event_index)
        );
        CREATE INDEX IF NOT EXISTS idx_shots_season ON shots(season);
        CREATE INDEX IF NOT EXISTS idx_shots_is_goal ON shots(is_goal);

        CREATE TABLE IF NOT EXISTS batch_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            games_processed INTEGER NOT NULL,
            games_skipped INTEGER NOT NULL,
            events_dropped INTEGER NOT NULL,
            rows_upserted INTEGER NOT NULL,
            digest TEXT NOT NULL,
            skipped_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn record_batch(conn: &mut Connection, output: &BatchOutput) -> Result<StoredBatch> {
    let started_at = Utc::now().to_rfc3339();
    let skipped_json = serde_json::to_string(&output.skipped).unwrap_or_else(|_| "[]".to_string());

    // Run row and shot rows commit together or not at all.
    let tx = conn.transaction().context("begin shots transaction")?;
    tx.execute(
        "INSERT INTO batch_runs(started_at, finished_at, games_processed, games_skipped, events_dropped, rows_upserted, digest, skipped_json)
         VALUES (?1, NULL, ?2, ?3, ?4, 0, ?5, ?6)",
        params![
            started_at,
            output.games_processed as i64,
            output.skipped.len() as i64,
            output.events_dropped as i64,
            output.digest,
            skipped_json
        ],
    )
    .context("insert batch run")?;
    let run_id = tx.last_insert_rowid();

    let mut rows_upserted = 0usize;
    for row in &output.rows {
        upsert_row(&tx, row)?;
        rows_upserted += 1;
    }

    tx.execute(
        "UPDATE batch_runs SET finished_at = ?1, rows_upserted = ?2 WHERE run_id = ?3",
        params![Utc::now().to_rfc3339(), rows_upserted as i64, run_id],
    )
    .context("update batch run")?;
    tx.commit().context("commit shots transaction")?;

    Ok(StoredBatch {
        run_id,
        rows_upserted,
        games_skipped: output.skipped.len(),
        digest: output.digest.clone(),
    })
}

fn upsert_row(tx: &rusqlite::Transaction<'_>, r: &ShotFeatureRow) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO shots (
            game_id, event_index, season, game_type, event_id,
            period, period_time_seconds, game_time_seconds, event_type, team_id,
            team_name, shooter_id, shooter_name, goalie_id, goalie_name,
            is_home, x_coord, y_coord, shot_type, zone_code,
            attacking_goal, distance_from_net, shot_angle, last_event_type, last_event_x,
            last_event_y, time_since_last_event, distance_from_last_event, rebound, angle_change,
            event_speed, friendly_player_count, opponent_player_count, player_count_diff, time_since_power_play,
            empty_net, is_goal, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9, ?10,
            ?11, ?12, ?13, ?14, ?15,
            ?16, ?17, ?18, ?19, ?20,
            ?21, ?22, ?23, ?24, ?25,
            ?26, ?27, ?28, ?29, ?30,
            ?31, ?32, ?33, ?34, ?35,
            ?36, ?37, ?38
        )
        ON CONFLICT(game_id, event_index) DO UPDATE SET
            season = excluded.season,
            game_type = excluded.game_type,
            event_id = excluded.event_id,
            period = excluded.period,
            period_time_seconds = excluded.period_time_seconds,
            game_time_seconds = excluded.game_time_seconds,
            event_type = excluded.event_type,
            team_id = excluded.team_id,
            team_name = excluded.team_name,
            shooter_id = excluded.shooter_id,
            shooter_name = excluded.shooter_name,
            goalie_id = excluded.goalie_id,
            goalie_name = excluded.goalie_name,
            is_home = excluded.is_home,
            x_coord = excluded.x_coord,
            y_coord = excluded.y_coord,
            shot_type = excluded.shot_type,
            zone_code = excluded.zone_code,
            attacking_goal = excluded.attacking_goal,
            distance_from_net = excluded.distance_from_net,
            shot_angle = excluded.shot_angle,
            last_event_type = excluded.last_event_type,
            last_event_x = excluded.last_event_x,
            last_event_y = excluded.last_event_y,
            time_since_last_event = excluded.time_since_last_event,
            distance_from_last_event = excluded.distance_from_last_event,
            rebound = excluded.rebound,
            angle_change = excluded.angle_change,
            event_speed = excluded.event_speed,
            friendly_player_count = excluded.friendly_player_count,
            opponent_player_count = excluded.opponent_player_count,
            player_count_diff = excluded.player_count_diff,
            time_since_power_play = excluded.time_since_power_play,
            empty_net = excluded.empty_net,
            is_goal = excluded.is_goal,
            updated_at = excluded.updated_at
        "#,
        params![
            r.game_id as i64,
            r.event_index,
            r.season,
            r.game_type,
            r.event_id.map(|id| id as i64),
            r.period,
            r.period_time_seconds,
            r.game_time_seconds,
            r.event_type,
            r.team_id,
            r.team_name,
            r.shooter_id.map(|id| id as i64),
            r.shooter_name,
            r.goalie_id.map(|id| id as i64),
            r.goalie_name,
            r.is_home,
            r.x_coord,
            r.y_coord,
            r.shot_type,
            r.zone_code,
            r.attacking_goal,
            r.distance_from_net,
            r.shot_angle,
            r.last_event_type,
            r.last_event_x,
            r.last_event_y,
            r.time_since_last_event,
            r.distance_from_last_event,
            r.rebound,
            r.angle_change,
            r.event_speed,
            r.friendly_player_count,
            r.opponent_player_count,
            r.player_count_diff,
            r.time_since_power_play,
            r.empty_net,
            r.is_goal,
            Utc::now().to_rfc3339(),
        ],
    )
    .context("upsert shot row")?;
    Ok(())
}

pub fn load_rows(conn: &Connection, season: Option<u32>) -> Result<Vec<ShotFeatureRow>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                game_id, season, game_type, event_index, event_id,
                period, period_time_seconds, game_time_seconds, event_type, team_id,
                team_name, shooter_id, shooter_name, goalie_id, goalie_name,
                is_home, x_coord, y_coord, shot_type, zone_code,
                attacking_goal, distance_from_net, shot_angle, last_event_type, last_event_x,
                last_event_y, time_since_last_event, distance_from_last_event, rebound, angle_change,
                event_speed, friendly_player_count, opponent_player_count, player_count_diff, time_since_power_play,
                empty_net, is_goal
            FROM shots
            WHERE ?1 IS NULL OR season = ?1
            ORDER BY game_id ASC, event_index ASC
            "#,
        )
        .context("prepare load shots query")?;

    let rows = stmt
        .query_map(params![season], |row| {
            Ok(ShotFeatureRow {
                game_id: row.get::<_, i64>(0)? as u64,
                season: row.get(1)?,
                game_type: row.get(2)?,
                event_index: row.get(3)?,
                event_id: row.get::<_, Option<i64>>(4)?.map(|id| id as u64),
                period: row.get(5)?,
                period_time_seconds: row.get(6)?,
                game_time_seconds: row.get(7)?,
                event_type: row.get(8)?,
                team_id: row.get(9)?,
                team_name: row.get(10)?,
                shooter_id: row.get::<_, Option<i64>>(11)?.map(|id| id as u64),
                shooter_name: row.get(12)?,
                goalie_id: row.get::<_, Option<i64>>(13)?.map(|id| id as u64),
                goalie_name: row.get(14)?,
                is_home: row.get(15)?,
                x_coord: row.get(16)?,
                y_coord: row.get(17)?,
                shot_type: row.get(18)?,
                zone_code: row.get(19)?,
                attacking_goal: row.get(20)?,
                distance_from_net: row.get(21)?,
                shot_angle: row.get(22)?,
                last_event_type: row.get(23)?,
                last_event_x: row.get(24)?,
                last_event_y: row.get(25)?,
                time_since_last_event: row.get(26)?,
                distance_from_last_event: row.get(27)?,
                rebound: row.get(28)?,
                angle_change: row.get(29)?,
                event_speed: row.get(30)?,
                friendly_player_count: row.get(31)?,
                opponent_player_count: row.get(32)?,
                player_count_diff: row.get(33)?,
                time_since_power_play: row.get(34)?,
                empty_net: row.get(35)?,
                is_goal: row.get(36)?,
            })
        })
        .context("query load shots")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode shot row")?);
    }
    Ok(out)
}

pub fn count_batch_runs(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM batch_runs", [], |row| row.get(0))
        .context("count batch runs")
}
