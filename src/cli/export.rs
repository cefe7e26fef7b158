use std::path::Path;

use crate::models::CsvLeaderboard;

pub fn export_results(board: &CsvLeaderboard, dest: &Path) {
    match board.export(dest) {
        Ok(count) => println!("Exported {} result(s) to {}", count, dest.display()),
        Err(e) => {
            eprintln!("Failed to export {}: {}", board.path().display(), e);
            std::process::exit(1);
        }
    }
}
