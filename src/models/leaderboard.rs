use std::borrow::Cow;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::Result;

pub const HEADER: &str = "Name,Score,TimeTaken(s),Timestamp";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);
const LOCK_POLL: Duration = Duration::from_millis(10);
const STALE_LOCK_AGE: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardRecord {
    pub name: String,
    pub score: u32,
    pub time_taken_secs: u32,
    pub timestamp: NaiveDateTime,
}

impl LeaderboardRecord {
    fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{}\n",
            quote_field(&self.name),
            self.score,
            self.time_taken_secs,
            self.timestamp.format(TIMESTAMP_FORMAT)
        )
    }

    fn from_csv_row(line: &str) -> std::result::Result<Self, String> {
        let fields = split_row(line)?;
        let [name, score, time_taken, timestamp]: [String; 4] = fields
            .try_into()
            .map_err(|f: Vec<String>| format!("expected 4 fields, found {}", f.len()))?;

        let score = score
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("bad score '{}': {}", score, e))?;
        let time_taken_secs = time_taken
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("bad time taken '{}': {}", time_taken, e))?;
        let timestamp = NaiveDateTime::parse_from_str(timestamp.trim(), TIMESTAMP_FORMAT)
            .map_err(|e| format!("bad timestamp '{}': {}", timestamp, e))?;

        Ok(Self {
            name,
            score,
            time_taken_secs,
            timestamp,
        })
    }
}

/// Append-only store of finished rounds.
pub trait Leaderboard {
    fn append(&self, record: &LeaderboardRecord) -> Result<()>;

    /// Every record in insertion order. A store that was never written is empty.
    fn records(&self) -> Result<Vec<LeaderboardRecord>>;

    /// Best `n` records: highest score first, faster time on equal score.
    fn top_n(&self, n: usize) -> Result<Vec<LeaderboardRecord>> {
        let mut records = self.records()?;
        rank(&mut records);
        records.truncate(n);
        Ok(records)
    }
}

// Stable, so full ties keep insertion order.
pub fn rank(records: &mut [LeaderboardRecord]) {
    records.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.time_taken_secs.cmp(&b.time_taken_secs))
    });
}

#[derive(Debug, Clone)]
pub struct CsvLeaderboard {
    path: PathBuf,
    lock_timeout: Duration,
}

impl CsvLeaderboard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name: OsString = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Writes the full table to `dest`. Returns the number of records exported.
    pub fn export(&self, dest: &Path) -> Result<usize> {
        let count = self.records()?.len();
        if self.path.exists() {
            fs::copy(&self.path, dest)?;
        } else {
            fs::write(dest, format!("{}\n", HEADER))?;
        }
        info!("Exported {} leaderboard record(s) to {}", count, dest.display());
        Ok(count)
    }
}

impl Leaderboard for CsvLeaderboard {
    fn append(&self, record: &LeaderboardRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let _lock = WriteLock::acquire(self.lock_path(), self.lock_timeout)?;

        let mut file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut chunk = String::new();
        if file.metadata()?.len() == 0 {
            chunk.push_str(HEADER);
            chunk.push('\n');
        } else if !ends_with_newline(&mut file)? {
            // Keep the last existing row intact.
            warn!("{} does not end with a newline", self.path.display());
            chunk.push('\n');
        }
        chunk.push_str(&record.to_csv_row());

        file.write_all(chunk.as_bytes())?;
        file.sync_data()?;

        info!(
            "Saved result for {} (score {}, {}s) to {}",
            record.name,
            record.score,
            record.time_taken_secs,
            self.path.display()
        );
        Ok(())
    }

    fn records(&self) -> Result<Vec<LeaderboardRecord>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (number, line) in contents.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || (number == 0 && line == HEADER) {
                continue;
            }
            match LeaderboardRecord::from_csv_row(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    "Skipping malformed row {} in {}: {}",
                    number + 1,
                    self.path.display(),
                    e
                ),
            }
        }
        Ok(records)
    }
}

fn ends_with_newline(file: &mut fs::File) -> io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Cross-process writer lock held as a `create_new` lock file. The file holds
/// the owner's token; only the owner removes it on drop.
struct WriteLock {
    path: PathBuf,
    token: String,
}

impl WriteLock {
    fn acquire(path: PathBuf, timeout: Duration) -> io::Result<Self> {
        let token = lock_token();
        let deadline = Instant::now() + timeout;
        let mut waiting = false;

        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let lock = Self { path, token };
                    if let Err(e) = file.write_all(lock.token.as_bytes()) {
                        let _ = fs::remove_file(&lock.path);
                        return Err(e);
                    }
                    return Ok(lock);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if is_stale(&path) {
                        break_stale_lock(&path, &token);
                        continue;
                    }
                    if Instant::now() >= deadline {
                        return Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            format!("timed out waiting for lock {}", path.display()),
                        ));
                    }
                    if !waiting {
                        debug!("Waiting for leaderboard lock {}", path.display());
                        waiting = true;
                    }
                    thread::sleep(LOCK_POLL);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        match fs::read_to_string(&self.path) {
            Ok(owner) if owner == self.token => {
                let _ = fs::remove_file(&self.path);
            }
            _ => warn!("Leaderboard lock {} is no longer ours", self.path.display()),
        }
    }
}

fn lock_token() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());
    format!(
        "{}-{}-{}",
        std::process::id(),
        nanos,
        COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}

// Claims a stale lock by renaming it to a name only this waiter uses, so two
// waiters can never both remove it. A lock that turns out to be fresh after the
// rename was taken over by a live writer in between and is put back.
fn break_stale_lock(path: &Path, token: &str) {
    let owner = fs::read_to_string(path).unwrap_or_default();

    let mut claimed: OsString = path.as_os_str().to_owned();
    claimed.push(format!(".stale-{}", token));
    let claimed = PathBuf::from(claimed);

    if fs::rename(path, &claimed).is_err() {
        return;
    }

    let still_stale = is_stale(&claimed)
        && fs::read_to_string(&claimed).map_or(false, |content| content == owner);
    if still_stale {
        warn!("Removed stale leaderboard lock {}", path.display());
    } else if fs::hard_link(&claimed, path).is_err() {
        warn!("Could not restore leaderboard lock {}", path.display());
    }
    let _ = fs::remove_file(&claimed);
}

fn is_stale(path: &Path) -> bool {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .map_or(false, |age| age > STALE_LOCK_AGE)
}

fn quote_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

fn split_row(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else {
            match c {
                '"' if field.is_empty() => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut field)),
                _ => field.push(c),
            }
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(field);
    Ok(fields)
}

#[cfg(test)]
pub mod testing {
    use std::cell::{Cell, RefCell};
    use std::io;

    use super::{Leaderboard, LeaderboardRecord};
    use crate::models::error::Result;

    /// In-memory store whose appends can be made to fail.
    #[derive(Debug, Default)]
    pub struct MemoryLeaderboard {
        pub appended: RefCell<Vec<LeaderboardRecord>>,
        pub fail_appends: Cell<bool>,
    }

    impl Leaderboard for MemoryLeaderboard {
        fn append(&self, record: &LeaderboardRecord) -> Result<()> {
            if self.fail_appends.get() {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only store").into());
            }
            self.appended.borrow_mut().push(record.clone());
            Ok(())
        }

        fn records(&self) -> Result<Vec<LeaderboardRecord>> {
            Ok(self.appended.borrow().clone())
        }
    }
}
