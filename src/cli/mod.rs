mod classify_cmd;
mod config_cmd;
mod export;
mod leaderboard;
mod play;
mod show;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::models::config::{self, UserConfig};
use crate::models::CsvLeaderboard;

#[derive(Parser)]
#[command(name = "sortle")]
#[command(about = "Sort data values into the right type before the clock runs out", long_about = None)]
pub struct Cli {
    /// Leaderboard CSV file to use instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    pub leaderboard: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play one timed round
    Play {
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        seconds: Option<u32>,
    },
    /// Show the best results
    Leaderboard {
        #[arg(short, long)]
        top: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Write the full results table to a CSV file
    Export { dest: PathBuf },
    /// Print which container each value belongs in
    Classify {
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// Show or change settings
    Config {
        #[arg(long)]
        seconds: Option<u32>,
        #[arg(long)]
        top: Option<usize>,
        #[arg(long, value_name = "PATH")]
        leaderboard_file: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) {
    let user_config = config::load_config();
    let board = open_leaderboard(cli.leaderboard, &user_config);

    match cli.command {
        None => show::show_overview(&board, user_config.top_n),
        Some(Commands::Play { name, seconds }) => play::play(user_config, name, seconds, board),
        Some(Commands::Leaderboard { top, json }) => {
            leaderboard::show_leaderboard(&board, top.unwrap_or(user_config.top_n), json)
        }
        Some(Commands::Export { dest }) => export::export_results(&board, &dest),
        Some(Commands::Classify { values }) => classify_cmd::classify_values(&values),
        Some(Commands::Config {
            seconds,
            top,
            leaderboard_file,
        }) => config_cmd::handle_config(seconds, top, leaderboard_file),
    }
}

fn open_leaderboard(path: Option<PathBuf>, user_config: &UserConfig) -> CsvLeaderboard {
    CsvLeaderboard::new(path.unwrap_or_else(|| user_config.leaderboard_path()))
}
