use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use nhl_shot_features::feature_store;
use nhl_shot_features::features::ShotFeatureRow;

const DISTANCE_BUCKET_FEET: f64 = 10.0;
const MAX_DISTANCE_BUCKETS: usize = 10;

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    shots: usize,
    goals: usize,
}

impl Tally {
    fn push(&mut self, row: &ShotFeatureRow) {
        self.shots += 1;
        self.goals += usize::from(row.is_goal);
    }

    fn rate(&self) -> f64 {
        if self.shots == 0 {
            0.0
        } else {
            self.goals as f64 / self.shots as f64
        }
    }
}

fn main() -> Result<()> {
    let db_path = parse_db_path_arg()
        .or_else(feature_store::default_db_path)
        .context("unable to resolve sqlite path")?;
    let season = parse_u32_arg("--season");

    let conn = feature_store::open_db(&db_path)?;
    let rows = feature_store::load_rows(&conn, season)?;
    if rows.is_empty() {
        return Err(anyhow!("no shot rows stored in {}", db_path.display()));
    }

    let mut overall = Tally::default();
    let mut rebound = [Tally::default(); 2];
    let mut empty_net = [Tally::default(); 2];
    // short-handed, even, power play
    let mut strength = [Tally::default(); 3];
    let mut distance = vec![Tally::default(); MAX_DISTANCE_BUCKETS + 1];

    for row in &rows {
        overall.push(row);
        rebound[usize::from(row.rebound.min(1))].push(row);
        empty_net[usize::from(row.empty_net.min(1))].push(row);
        let idx = match row.player_count_diff {
            d if d < 0 => 0,
            0 => 1,
            _ => 2,
        };
        strength[idx].push(row);
        if let Some(d) = row.distance_from_net {
            let bucket = ((d / DISTANCE_BUCKET_FEET) as usize).min(MAX_DISTANCE_BUCKETS);
            distance[bucket].push(row);
        }
    }

    println!("Shot feature report");
    println!("DB: {}", db_path.display());
    if let Some(season) = season {
        println!("Season: {season}");
    }
    print_tally("all shots", overall);
    print_tally("rebounds", rebound[1]);
    print_tally("non-rebounds", rebound[0]);
    print_tally("empty net", empty_net[1]);
    print_tally("short-handed", strength[0]);
    print_tally("even strength", strength[1]);
    print_tally("power play", strength[2]);
    println!("By distance:");
    for (idx, tally) in distance.iter().enumerate() {
        if tally.shots == 0 {
            continue;
        }
        let start = idx as f64 * DISTANCE_BUCKET_FEET;
        let label = if idx == MAX_DISTANCE_BUCKETS {
            format!("{start:>3.0}+ ft")
        } else {
            format!("{start:>3.0}-{:<3.0} ft", start + DISTANCE_BUCKET_FEET)
        };
        print_tally(&label, *tally);
    }
    Ok(())
}

fn print_tally(label: &str, tally: Tally) {
    println!(
        "  {label:<16} shots={:>7} goals={:>6} rate={:.3}",
        tally.shots,
        tally.goals,
        tally.rate()
    );
}

fn parse_db_path_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--db=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--db"
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(PathBuf::from(next));
        }
    }
    None
}

fn parse_u32_arg(name: &str) -> Option<u32> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}="))
            && let Ok(v) = raw.trim().parse::<u32>()
        {
            return Some(v);
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && let Ok(v) = next.trim().parse::<u32>()
        {
            return Some(v);
        }
    }
    None
}
