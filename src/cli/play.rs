use std::io::{self, BufRead, Write};

use tracing::warn;

use crate::display::{display_play_help, display_result, display_round};
use crate::models::config::{self, UserConfig};
use crate::models::{
    Container, CsvLeaderboard, GameError, Placement, Round, StateError, Status, SystemClock,
};

type CliRound = Round<CsvLeaderboard, SystemClock>;

pub fn play(
    mut user_config: UserConfig,
    name: Option<String>,
    seconds: Option<u32>,
    board: CsvLeaderboard,
) {
    let results_path = board.path().to_path_buf();

    let mut settings = user_config.clone();
    if let Some(seconds) = seconds {
        if let Err(e) = settings.set_round_seconds(seconds) {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }

    let name = match name.or_else(|| user_config.last_player.clone()) {
        Some(name) => name,
        None => prompt("Enter your name: ").unwrap_or_default(),
    };

    let mut round = Round::new(settings.round_seconds, board, SystemClock);
    if let Err(e) = round.start(&name) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    user_config.last_player = Some(round.player().to_string());
    if let Err(e) = config::save_config(&user_config) {
        warn!("Could not remember player name: {}", e);
    }

    println!(
        "Round started for {}. You have {} seconds.",
        round.player(),
        round.limit_secs()
    );
    display_play_help();

    run_round(&mut round);

    display_result(&round);
    if round.unsaved_record().is_some() {
        if let Err(e) = round.save_pending() {
            eprintln!("Your result was NOT saved: {}", e);
        }
    }
    if round.unsaved_record().is_none() {
        println!("Your result has been saved to {}.", results_path.display());
    }

    println!();
    super::leaderboard::show_leaderboard(round.leaderboard(), settings.top_n, false);
}

fn run_round(round: &mut CliRound) {
    let stdin = io::stdin();

    loop {
        match round.tick() {
            Ok(Status::Running) => {}
            Ok(_) => return,
            Err(e) => {
                eprintln!("Could not save result: {}", e);
                return;
            }
        }

        if round.available().is_empty() {
            end_round(round);
            return;
        }

        display_round(round);
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                end_round(round);
                return;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Failed to read input: {}", e);
                end_round(round);
                return;
            }
        }

        match line.trim() {
            "" => {}
            "end" | "quit" | "q" => {
                end_round(round);
                return;
            }
            "help" => display_play_help(),
            input => place(round, input),
        }
    }
}

fn place(round: &mut CliRound, input: &str) {
    let Some((value, target)) = input.rsplit_once(char::is_whitespace) else {
        println!("Expected `<value> <container>`. Type `help` for examples.");
        return;
    };
    let Some(container) = Container::parse_name(target) else {
        println!("Unknown container '{}'.", target);
        return;
    };
    let value = value.trim();

    match round.place(value, container) {
        Ok(Placement::Correct { index }) => {
            println!("Correct! +1 point ({} -> {}[{}])", value, container, index);
        }
        Ok(Placement::Wrong { .. }) => {
            println!(
                "Wrong container for {}. It has been returned to Available.",
                value
            );
        }
        Err(GameError::State(StateError::NotRunning(_))) => {
            println!("Too late, the round is over.");
        }
        Err(GameError::Io(e)) => eprintln!("Could not save result: {}", e),
        Err(e) => println!("{}", e),
    }
}

fn end_round(round: &mut CliRound) {
    if let Err(e) = round.end() {
        eprintln!("Could not save result: {}", e);
    }
}

fn prompt(message: &str) -> Option<String> {
    print!("{}", message);
    io::stdout().flush().ok()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input).ok()?;
    Some(input.trim().to_string())
}
