/// Best-score persistence.
///
/// A single integer under the key `robofire-highscore`, stored as a
/// `key=value` line in `highscore.dat`. The file lives next to the
/// executable when that directory is writable, otherwise under
/// `~/.local/share/robofire`.
///
/// I/O problems never reach the caller: they are logged and the store
/// behaves as if no best score existed.

use std::path::{Path, PathBuf};

const SCORE_KEY: &str = "robofire-highscore";
const SCORE_FILE: &str = "highscore.dat";

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

fn save_dir() -> PathBuf {
    // 1. Try exe directory (works for local/portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // System installs won't be writable
            let test_path = parent.join(".write_test_robofire");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home (~/.local/share/robofire)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/robofire");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. Fallback to CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ══════════════════════════════════════════════════════════════
// Store
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct BestScoreStore {
    path: PathBuf,
}

impl BestScoreStore {
    /// Store in the default save directory.
    pub fn open() -> Self {
        Self::at(save_dir().join(SCORE_FILE))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        BestScoreStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current best, 0 when nothing usable is stored.
    pub fn load(&self) -> u32 {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => parse_best(&content).unwrap_or_else(|| {
                log::warn!("ignoring malformed {}", self.path.display());
                0
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => {
                log::warn!("could not read {}: {e}", self.path.display());
                0
            }
        }
    }

    /// Record a finished run. Returns the best score after the update.
    pub fn submit(&self, score: u32) -> u32 {
        let best = self.load();
        if score <= best {
            return best;
        }
        match std::fs::write(&self.path, format!("{SCORE_KEY}={score}\n")) {
            Ok(()) => log::info!("new best score {score}"),
            Err(e) => log::warn!("could not write {}: {e}", self.path.display()),
        }
        score
    }
}

fn parse_best(content: &str) -> Option<u32> {
    content
        .lines()
        .find_map(|line| line.trim().strip_prefix(SCORE_KEY)?.strip_prefix('='))
        .and_then(|val| val.trim().parse().ok())
}
