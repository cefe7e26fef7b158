use crate::display::display_leaderboard;
use crate::models::{CsvLeaderboard, Leaderboard};

pub fn show_leaderboard(board: &CsvLeaderboard, top: usize, json: bool) {
    let records = match board.top_n(top) {
        Ok(records) => records,
        Err(e) => {
            eprintln!(
                "Could not read leaderboard {}: {}. Showing it as empty.",
                board.path().display(),
                e
            );
            Vec::new()
        }
    };

    if json {
        match serde_json::to_string_pretty(&records) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Failed to serialize leaderboard: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    println!("Leaderboard (Top {})", top);
    println!();
    display_leaderboard(&records);
}
