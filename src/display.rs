use crate::models::leaderboard::TIMESTAMP_FORMAT;
use crate::models::{Container, EndReason, Leaderboard, LeaderboardRecord, Round, SystemClock};

pub fn display_round<L: Leaderboard>(round: &Round<L, SystemClock>) {
    println!("\n{}", "-".repeat(60));
    println!(
        "  Player: {}   Time left: {}s   Score: {}",
        round.player(),
        round.remaining_secs(),
        round.score()
    );
    println!("{}", "-".repeat(60));

    let available: Vec<&str> = round.available().iter().map(|t| t.text.as_str()).collect();
    if available.is_empty() {
        println!("Available: (none left)");
    } else {
        println!("Available: {}", available.join("  "));
    }
    println!();

    for container in Container::ALL {
        let items: Vec<&str> = round
            .container(container)
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        let contents = if items.is_empty() {
            "(empty)".to_string()
        } else {
            items.join(", ")
        };
        println!("  {:<11} {}", container.display_name(), contents);
    }
    println!("{}", "-".repeat(60));
}

pub fn display_result<L: Leaderboard>(round: &Round<L, SystemClock>) {
    println!("\n{}", "=".repeat(60));
    match round.end_reason() {
        Some(EndReason::TimeUp) => println!("  Time's up!"),
        _ => println!("  Game ended."),
    }
    println!("{}", "=".repeat(60));
    println!("  Final score for {}: {}", round.player(), round.score());
    println!(
        "  Time taken: {}s",
        round.elapsed_secs().clamp(0, i64::from(round.limit_secs()))
    );
    println!("{}\n", "=".repeat(60));
}

pub fn display_leaderboard(records: &[LeaderboardRecord]) {
    if records.is_empty() {
        println!("No results yet. Play a round to generate leaderboard entries.");
        return;
    }

    println!(
        "{:>4}  {:<20} {:>5} {:>12}  {}",
        "#", "Name", "Score", "TimeTaken(s)", "Timestamp"
    );
    for (rank, record) in records.iter().enumerate() {
        println!(
            "{:>4}  {:<20} {:>5} {:>12}  {}",
            rank + 1,
            record.name,
            record.score,
            record.time_taken_secs,
            record.timestamp.format(TIMESTAMP_FORMAT)
        );
    }
}

pub fn display_play_help() {
    println!("Type `<value> <container>` to place a value, e.g. `42 integers` or `3.5 real`.");
    println!("Containers: integers (int), reals (real), characters (char), booleans (bool), strings (str).");
    println!("Type `end` to stop early, `help` to see this again.");
}
