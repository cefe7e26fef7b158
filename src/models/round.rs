use std::fmt;

use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::container::{classify, Container};
use super::dataset::{self, Token};
use super::error::{GameError, Result, StateError};
use super::leaderboard::{Leaderboard, LeaderboardRecord};

pub const DEFAULT_ROUND_SECONDS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NotStarted,
    Running,
    Ended,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::NotStarted => "not started",
            Status::Running => "running",
            Status::Ended => "ended",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    TimeUp,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Token moved into the container at `index`.
    Correct { index: usize },
    /// Token went back to the end of the pool.
    Wrong { expected: Container },
}

/// One timed play session. The caller owns it and drives it with
/// `start`, `place`, `tick` and `end`.
pub struct Round<L: Leaderboard, C: Clock> {
    leaderboard: L,
    clock: C,
    rng: StdRng,
    limit_secs: u32,
    status: Status,
    player: String,
    started_at: Option<DateTime<Local>>,
    ended_at: Option<DateTime<Local>>,
    end_reason: Option<EndReason>,
    score: u32,
    dataset: Vec<Token>,
    available: Vec<Token>,
    containers: [Vec<Token>; 5],
    // One-shot guard for the leaderboard write, re-armed by start.
    finalized: bool,
    unsaved: Option<LeaderboardRecord>,
}

impl<L: Leaderboard, C: Clock> Round<L, C> {
    pub fn new(limit_secs: u32, leaderboard: L, clock: C) -> Self {
        Self {
            leaderboard,
            clock,
            rng: StdRng::from_entropy(),
            limit_secs,
            status: Status::NotStarted,
            player: String::new(),
            started_at: None,
            ended_at: None,
            end_reason: None,
            score: 0,
            dataset: Vec::new(),
            available: Vec::new(),
            containers: Default::default(),
            finalized: false,
            unsaved: None,
        }
    }

    pub fn start(&mut self, name: &str) -> Result<()> {
        let name = validate_name(name)?;
        let dataset = dataset::generate(&mut self.rng);
        self.begin(name, dataset);
        Ok(())
    }

    /// Starts with a fixed dataset instead of a generated one.
    pub fn start_with(&mut self, name: &str, dataset: Vec<Token>) -> Result<()> {
        let name = validate_name(name)?;
        self.begin(name, dataset);
        Ok(())
    }

    fn begin(&mut self, name: String, dataset: Vec<Token>) {
        if self.status == Status::Running {
            info!("Restarting round for {}, discarding score {}", self.player, self.score);
        }

        self.player = name;
        self.available = dataset.clone();
        self.dataset = dataset;
        self.containers = Default::default();
        self.score = 0;
        self.started_at = Some(self.clock.now());
        self.ended_at = None;
        self.end_reason = None;
        self.finalized = false;
        self.unsaved = None;
        self.status = Status::Running;

        info!(
            "Round started for {} with {} tokens, {}s limit",
            self.player,
            self.dataset.len(),
            self.limit_secs
        );
    }

    pub fn place(&mut self, text: &str, target: Container) -> Result<Placement> {
        self.tick()?;
        if self.status != Status::Running {
            return Err(StateError::NotRunning(self.status).into());
        }

        let position = self
            .available
            .iter()
            .position(|t| t.text == text)
            .ok_or_else(|| StateError::TokenUnavailable(text.to_string()))?;
        let token = self.available.remove(position);

        let expected = classify(&token.text);
        if expected == target {
            let container = &mut self.containers[target.index()];
            let index = container.len();
            container.push(token);
            self.score += 1;
            debug!("Placed '{}' in {} at {}; score {}", text, target, index, self.score);
            Ok(Placement::Correct { index })
        } else {
            debug!("'{}' is not {}; returned to pool", text, target);
            self.available.push(token);
            Ok(Placement::Wrong { expected })
        }
    }

    /// Polls the clock and ends the round once the time limit is reached.
    pub fn tick(&mut self) -> Result<Status> {
        if self.status == Status::Running && self.elapsed_secs() >= i64::from(self.limit_secs) {
            self.finish(EndReason::TimeUp)?;
        }
        Ok(self.status)
    }

    /// Stops a running round. Returns the record written by this call, if any.
    pub fn end(&mut self) -> Result<Option<LeaderboardRecord>> {
        match self.status {
            Status::NotStarted | Status::Ended => Ok(None),
            Status::Running => self.finish(EndReason::Stopped),
        }
    }

    fn finish(&mut self, reason: EndReason) -> Result<Option<LeaderboardRecord>> {
        let now = self.clock.now();
        let elapsed = self.elapsed_secs_at(now);

        self.status = Status::Ended;
        self.ended_at = Some(now);
        self.end_reason = Some(reason);
        info!(
            "Round ended for {} ({:?}) with score {}",
            self.player, reason, self.score
        );

        if self.finalized {
            return Ok(None);
        }
        self.finalized = true;

        let time_taken = elapsed.clamp(0, i64::from(self.limit_secs)) as u32;
        let record = LeaderboardRecord {
            name: self.player.clone(),
            score: self.score,
            time_taken_secs: time_taken,
            timestamp: now.naive_local(),
        };

        match self.leaderboard.append(&record) {
            Ok(()) => Ok(Some(record)),
            Err(e) => {
                warn!("Failed to save result for {}: {}", record.name, e);
                self.unsaved = Some(record);
                Err(e)
            }
        }
    }

    /// Retries the leaderboard write after a failed save.
    pub fn save_pending(&mut self) -> Result<Option<LeaderboardRecord>> {
        let Some(record) = self.unsaved.take() else {
            return Ok(None);
        };
        match self.leaderboard.append(&record) {
            Ok(()) => Ok(Some(record)),
            Err(e) => {
                self.unsaved = Some(record);
                Err(e)
            }
        }
    }

    fn elapsed_secs_at(&self, now: DateTime<Local>) -> i64 {
        match self.started_at {
            Some(start) => now.signed_duration_since(start).num_seconds(),
            None => 0,
        }
    }

    /// Whole seconds since start, frozen once the round has ended.
    pub fn elapsed_secs(&self) -> i64 {
        let now = match self.ended_at {
            Some(ended) => ended,
            None => self.clock.now(),
        };
        self.elapsed_secs_at(now)
    }

    pub fn remaining_secs(&self) -> u32 {
        match self.status {
            Status::NotStarted => self.limit_secs,
            Status::Running | Status::Ended => {
                let left = i64::from(self.limit_secs) - self.elapsed_secs();
                left.clamp(0, i64::from(self.limit_secs)) as u32
            }
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn limit_secs(&self) -> u32 {
        self.limit_secs
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn dataset(&self) -> &[Token] {
        &self.dataset
    }

    pub fn available(&self) -> &[Token] {
        &self.available
    }

    pub fn container(&self, container: Container) -> &[Token] {
        &self.containers[container.index()]
    }

    pub fn unsaved_record(&self) -> Option<&LeaderboardRecord> {
        self.unsaved.as_ref()
    }

    pub fn leaderboard(&self) -> &L {
        &self.leaderboard
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GameError::Validation("player name must not be empty".to_string()));
    }
    if name.chars().any(char::is_control) {
        return Err(GameError::Validation(
            "player name must not contain control characters".to_string(),
        ));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::clock::ManualClock;
    use crate::models::dataset::{from_texts, DATASET_SIZE};
    use crate::models::leaderboard::testing::MemoryLeaderboard;

    fn round() -> (Round<MemoryLeaderboard, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let round = Round::new(DEFAULT_ROUND_SECONDS, MemoryLeaderboard::default(), clock.clone());
        (round, clock)
    }

    fn sample() -> Vec<Token> {
        from_texts(["3.5", "42", "True", "Q", "Hello", "7", "Hello"])
    }

    fn appended(round: &Round<MemoryLeaderboard, ManualClock>) -> Vec<LeaderboardRecord> {
        round.leaderboard().appended.borrow().clone()
    }

    fn assert_conserved<L: Leaderboard, C: Clock>(round: &Round<L, C>) {
        let mut ids: Vec<usize> = round.available().iter().map(|t| t.id).collect();
        for container in Container::ALL {
            ids.extend(round.container(container).iter().map(|t| t.id));
        }
        ids.sort_unstable();
        let mut expected: Vec<usize> = round.dataset().iter().map(|t| t.id).collect();
        expected.sort_unstable();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_new_round_is_not_started() {
        let (round, _) = round();
        assert_eq!(round.status(), Status::NotStarted);
        assert_eq!(round.remaining_secs(), DEFAULT_ROUND_SECONDS);
        assert!(round.available().is_empty());
    }

    #[test]
    fn test_start_generates_full_dataset() {
        let (mut round, _) = round();
        round.start("  Ava ").unwrap();
        assert_eq!(round.status(), Status::Running);
        assert_eq!(round.player(), "Ava");
        assert_eq!(round.dataset().len(), DATASET_SIZE);
        assert_eq!(round.available(), round.dataset());
        assert_eq!(round.score(), 0);
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let (mut round, _) = round();
        assert!(matches!(round.start(""), Err(GameError::Validation(_))));
        assert!(matches!(round.start("   "), Err(GameError::Validation(_))));
        assert!(matches!(round.start("A\nB"), Err(GameError::Validation(_))));
        assert_eq!(round.status(), Status::NotStarted);
    }

    #[test]
    fn test_empty_name_leaves_running_round_alone() {
        let (mut round, _) = round();
        round.start_with("Ava", sample()).unwrap();
        round.place("42", Container::Integers).unwrap();

        assert!(round.start("").is_err());
        assert_eq!(round.status(), Status::Running);
        assert_eq!(round.player(), "Ava");
        assert_eq!(round.score(), 1);
    }

    #[test]
    fn test_correct_placement() {
        let (mut round, _) = round();
        round.start_with("Ava", sample()).unwrap();

        let placement = round.place("42", Container::Integers).unwrap();
        assert_eq!(placement, Placement::Correct { index: 0 });
        assert_eq!(round.score(), 1);
        assert_eq!(round.container(Container::Integers)[0].text, "42");
        assert!(round.available().iter().all(|t| t.text != "42"));

        let placement = round.place("7", Container::Integers).unwrap();
        assert_eq!(placement, Placement::Correct { index: 1 });
        assert_eq!(round.container(Container::Integers).len(), 2);
        assert_conserved(&round);
    }

    #[test]
    fn test_wrong_placement_returns_token_to_end() {
        let (mut round, _) = round();
        round.start_with("Ava", sample()).unwrap();
        let before = round.available().len();

        let placement = round.place("3.5", Container::Integers).unwrap();
        assert_eq!(placement, Placement::Wrong { expected: Container::Reals });
        assert_eq!(round.score(), 0);
        assert_eq!(round.available().len(), before);
        assert_eq!(round.available().last().unwrap().text, "3.5");
        assert!(round.container(Container::Integers).is_empty());
        assert_conserved(&round);
    }

    #[test]
    fn test_duplicate_texts_are_placed_one_at_a_time() {
        let (mut round, _) = round();
        round.start_with("Ava", sample()).unwrap();

        round.place("Hello", Container::Strings).unwrap();
        round.place("Hello", Container::Strings).unwrap();
        assert_eq!(round.container(Container::Strings).len(), 2);
        assert_ne!(
            round.container(Container::Strings)[0].id,
            round.container(Container::Strings)[1].id
        );

        let err = round.place("Hello", Container::Strings).unwrap_err();
        assert!(matches!(
            err,
            GameError::State(StateError::TokenUnavailable(ref t)) if t == "Hello"
        ));
        assert_eq!(round.score(), 2);
        assert_conserved(&round);
    }

    #[test]
    fn test_unknown_token_is_rejected() {
        let (mut round, _) = round();
        round.start_with("Ava", sample()).unwrap();
        assert!(matches!(
            round.place("99", Container::Integers),
            Err(GameError::State(StateError::TokenUnavailable(_)))
        ));
        assert_eq!(round.status(), Status::Running);
        assert_conserved(&round);
    }

    #[test]
    fn test_place_before_start_is_rejected() {
        let (mut round, _) = round();
        assert!(matches!(
            round.place("42", Container::Integers),
            Err(GameError::State(StateError::NotRunning(Status::NotStarted)))
        ));
        assert_eq!(round.status(), Status::NotStarted);
    }

    #[test]
    fn test_conservation_over_random_play() {
        let (mut round, _) = round();
        round.start("Ava").unwrap();

        for step in 0..60 {
            let Some(token) = round.available().get(step % 3).cloned() else {
                break;
            };
            let target = Container::ALL[step % Container::ALL.len()];
            round.place(&token.text, target).unwrap();
            assert_conserved(&round);
            assert_eq!(
                round.score() as usize,
                Container::ALL.iter().map(|c| round.container(*c).len()).sum::<usize>()
            );
        }
    }

    #[test]
    fn test_tick_times_out_once() {
        let (mut round, clock) = round();
        round.start_with("Ava", sample()).unwrap();
        round.place("42", Container::Integers).unwrap();

        clock.advance_secs(30);
        assert_eq!(round.tick().unwrap(), Status::Running);
        assert_eq!(round.remaining_secs(), 30);

        clock.advance_secs(31);
        assert_eq!(round.tick().unwrap(), Status::Ended);
        assert_eq!(round.tick().unwrap(), Status::Ended);
        assert_eq!(round.end().unwrap(), None);

        let records = appended(&round);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Ava");
        assert_eq!(records[0].score, 1);
        assert_eq!(records[0].time_taken_secs, 60);
        assert_eq!(round.end_reason(), Some(EndReason::TimeUp));
        assert_eq!(round.remaining_secs(), 0);
    }

    #[test]
    fn test_place_after_timeout_is_rejected() {
        let (mut round, clock) = round();
        round.start_with("Ava", sample()).unwrap();
        clock.advance_secs(60);

        assert!(matches!(
            round.place("42", Container::Integers),
            Err(GameError::State(StateError::NotRunning(Status::Ended)))
        ));
        assert_eq!(round.score(), 0);
        assert_eq!(appended(&round).len(), 1);
    }

    #[test]
    fn test_end_is_idempotent() {
        let (mut round, clock) = round();
        round.start_with("Ava", sample()).unwrap();
        clock.advance_millis(12_700);

        let record = round.end().unwrap().unwrap();
        assert_eq!(record.time_taken_secs, 12);
        assert_eq!(round.status(), Status::Ended);
        assert_eq!(round.end_reason(), Some(EndReason::Stopped));

        clock.advance_secs(100);
        assert_eq!(round.end().unwrap(), None);
        assert_eq!(round.tick().unwrap(), Status::Ended);
        assert_eq!(appended(&round).len(), 1);
        assert_eq!(round.elapsed_secs(), 12);
    }

    #[test]
    fn test_end_before_start_writes_nothing() {
        let (mut round, _) = round();
        assert_eq!(round.end().unwrap(), None);
        assert_eq!(round.status(), Status::NotStarted);
        assert!(appended(&round).is_empty());
    }

    #[test]
    fn test_restart_resets_and_rearms_save() {
        let (mut round, clock) = round();
        round.start_with("Ava", sample()).unwrap();
        round.place("42", Container::Integers).unwrap();
        round.end().unwrap();

        round.start_with("Ben", sample()).unwrap();
        assert_eq!(round.status(), Status::Running);
        assert_eq!(round.score(), 0);
        assert_eq!(round.available().len(), sample().len());
        assert!(Container::ALL.iter().all(|c| round.container(*c).is_empty()));
        assert_eq!(round.end_reason(), None);

        clock.advance_secs(5);
        round.end().unwrap();
        let names: Vec<String> = appended(&round).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Ava", "Ben"]);
    }

    #[test]
    fn test_restart_while_running_discards_progress() {
        let (mut round, _) = round();
        round.start_with("Ava", sample()).unwrap();
        round.place("42", Container::Integers).unwrap();

        round.start_with("Ava", sample()).unwrap();
        assert_eq!(round.score(), 0);
        assert!(appended(&round).is_empty());
    }

    #[test]
    fn test_failed_save_is_kept_and_retried() {
        let (mut round, _) = round();
        round.start_with("Ava", sample()).unwrap();
        round.place("True", Container::Booleans).unwrap();
        round.leaderboard().fail_appends.set(true);

        assert!(matches!(round.end(), Err(GameError::Io(_))));
        assert_eq!(round.status(), Status::Ended);
        assert_eq!(round.score(), 1);
        assert_eq!(round.unsaved_record().unwrap().score, 1);

        // Already finalized: ending again does not write a second time.
        assert_eq!(round.end().unwrap(), None);
        assert!(round.save_pending().is_err());
        assert!(round.unsaved_record().is_some());

        round.leaderboard().fail_appends.set(false);
        let saved = round.save_pending().unwrap().unwrap();
        assert_eq!(saved.name, "Ava");
        assert!(round.unsaved_record().is_none());
        assert_eq!(round.save_pending().unwrap(), None);
        assert_eq!(appended(&round).len(), 1);
    }
}
