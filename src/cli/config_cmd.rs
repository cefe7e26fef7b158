use std::path::PathBuf;

use crate::models::config::{self, MAX_ROUND_SECONDS, MIN_ROUND_SECONDS};

pub fn handle_config(seconds: Option<u32>, top: Option<usize>, leaderboard_file: Option<PathBuf>) {
    let mut user_config = config::load_config();

    if seconds.is_none() && top.is_none() && leaderboard_file.is_none() {
        println!("Round length:     {}s", user_config.round_seconds);
        println!("Leaderboard size: {}", user_config.top_n);
        println!("Leaderboard file: {}", user_config.leaderboard_path().display());
        if let Some(ref player) = user_config.last_player {
            println!("Last player:      {}", player);
        }
        println!();
        println!(
            "To change: sortle config [--seconds {}-{}] [--top N] [--leaderboard-file PATH]",
            MIN_ROUND_SECONDS, MAX_ROUND_SECONDS
        );
        return;
    }

    if let Some(seconds) = seconds {
        if let Err(e) = user_config.set_round_seconds(seconds) {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
    if let Some(top) = top {
        if let Err(e) = user_config.set_top_n(top) {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
    if let Some(path) = leaderboard_file {
        user_config.leaderboard_path = Some(path);
    }

    if let Err(e) = config::save_config(&user_config) {
        eprintln!("Failed to save config: {}", e);
        std::process::exit(1);
    }

    println!("Settings saved.");
    println!("Round length:     {}s", user_config.round_seconds);
    println!("Leaderboard size: {}", user_config.top_n);
    println!("Leaderboard file: {}", user_config.leaderboard_path().display());
}
