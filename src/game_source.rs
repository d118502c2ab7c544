use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::warn;

use crate::batch::{RawGame, SkippedGame};

#[derive(Debug, Default)]
pub struct SourceScan {
    pub games: Vec<RawGame>,
    pub unreadable: Vec<SkippedGame>,
}

pub fn load_cached_games(root: &Path) -> Result<SourceScan> {
    if !root.is_dir() {
        return Err(anyhow!("game cache dir {} does not exist", root.display()));
    }
    let mut paths = Vec::new();
    collect_json_files(root, &mut paths)
        .with_context(|| format!("scan game cache dir {}", root.display()))?;
    paths.sort();

    let mut scan = SourceScan::default();
    for path in paths {
        let origin = path.display().to_string();
        let game_id = game_id_from_path(&path);
        match fs::read_to_string(&path) {
            Ok(body) => scan.games.push(RawGame {
                game_id,
                origin,
                body,
            }),
            Err(err) => {
                warn!(origin = %origin, error = %err, "unreadable game file");
                scan.unreadable.push(SkippedGame {
                    game: game_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| origin.clone()),
                    origin,
                    kind: "MalformedPayload".to_string(),
                    reason: format!("read failed: {err}"),
                });
            }
        }
    }
    Ok(scan)
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let path = entry.context("read dir entry")?.path();
        if path.is_dir() {
            collect_json_files(&path, out)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        {
            out.push(path);
        }
    }
    Ok(())
}

pub fn game_id_from_path(path: &Path) -> Option<u64> {
    path.file_stem()?.to_str()?.trim().parse::<u64>().ok()
}
