use cli_log::*;
use numabal::{App, Config, app::parse_pids};

use std::process::ExitCode;

fn main() -> ExitCode {
    init_cli_log!();
    let args: Vec<String> = std::env::args().skip(1).collect();

    let pids = match parse_pids(&args) {
        Ok(pids) if !pids.is_empty() => pids,
        _ => {
            println!("Usage: numabal PID [PIDs]...");
            return ExitCode::from(1);
        }
    };

    let mut app = App::new(Config::from_env());
    match app.run(&pids) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("numabal: {}", e);
            if e.shows_usage() {
                println!("Usage: numabal PID [PIDs]...");
            }
            std::process::exit(e.exit_code())
        }
    }
}
