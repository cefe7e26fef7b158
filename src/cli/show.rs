use crate::models::CsvLeaderboard;

pub fn show_overview(board: &CsvLeaderboard, top: usize) {
    println!("\n{}", "=".repeat(60));
    println!("  SORTLE - Data Type Sorting Game");
    println!("{}\n", "=".repeat(60));

    super::leaderboard::show_leaderboard(board, top, false);

    println!("\n{}", "=".repeat(60));
    println!("Run `sortle play` to start a round");
    println!("Run `sortle export <file>` to download all results");
    println!("{}\n", "=".repeat(60));
}
