use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::FeatureError;
use crate::features::{FeatureAssembler, ShotFeatureRow};
use crate::payload;

#[derive(Debug, Clone)]
pub struct RawGame {
    pub game_id: Option<u64>,
    pub origin: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedGame {
    pub game: String,
    pub origin: String,
    pub kind: String,
    pub reason: String,
}

impl SkippedGame {
    pub fn from_error(origin: &str, err: &FeatureError) -> Self {
        let (game, reason) = match err {
            FeatureError::MalformedPayload { game, reason } => (game.clone(), reason.clone()),
            FeatureError::MalformedEvent { game, reason, .. } => (game.clone(), reason.clone()),
        };
        Self {
            game,
            origin: origin.to_string(),
            kind: err.kind().to_string(),
            reason,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    pub rows: Vec<ShotFeatureRow>,
    pub skipped: Vec<SkippedGame>,
    pub games_processed: usize,
    pub events_dropped: usize,
    /// Hex SHA-256 over the rows; equal inputs give equal digests.
    pub digest: String,
}

struct GameOutcome {
    rows: Vec<ShotFeatureRow>,
    events_dropped: usize,
}

/// Rows come back grouped by game in input order. A game whose payload cannot
/// be parsed is reported in `skipped` and does not affect the others.
pub fn run_batch(games: &[RawGame], config: &EngineConfig) -> BatchOutput {
    let assembler = FeatureAssembler::new(config);
    let outcomes: Vec<Result<GameOutcome, SkippedGame>> = with_pool(config.parallelism, || {
        games
            .par_iter()
            .map(|game| process_game(game, &assembler))
            .collect()
    });

    let mut out = BatchOutput::default();
    for outcome in outcomes {
        match outcome {
            Ok(game) => {
                out.games_processed += 1;
                out.events_dropped += game.events_dropped;
                out.rows.extend(game.rows);
            }
            Err(skipped) => out.skipped.push(skipped),
        }
    }
    out.digest = rows_digest(&out.rows);

    info!(
        games = games.len(),
        processed = out.games_processed,
        skipped = out.skipped.len(),
        rows = out.rows.len(),
        events_dropped = out.events_dropped,
        "feature batch finished"
    );
    out
}

fn process_game(game: &RawGame, assembler: &FeatureAssembler) -> Result<GameOutcome, SkippedGame> {
    let parsed = payload::parse_game_json(&game.body, game.game_id).map_err(|err| {
        warn!(origin = %game.origin, error = %err, "skipping game");
        SkippedGame::from_error(&game.origin, &err)
    })?;
    for dropped in &parsed.dropped {
        warn!(origin = %game.origin, error = %dropped, "dropping play");
    }
    let rows = assembler.assemble(&parsed.timeline);
    debug!(
        game_id = parsed.timeline.game_id(),
        events = parsed.timeline.len(),
        rows = rows.len(),
        "game assembled"
    );
    Ok(GameOutcome {
        rows,
        events_dropped: parsed.dropped.len(),
    })
}

pub fn rows_digest(rows: &[ShotFeatureRow]) -> String {
    let mut hasher = Sha256::new();
    for row in rows {
        // Rows hold only plain data; serialization cannot fail.
        if let Ok(line) = serde_json::to_vec(row) {
            hasher.update(&line);
        }
        hasher.update(b"\n");
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn with_pool<T>(threads: usize, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(action),
        Err(_) => action(),
    }
}
