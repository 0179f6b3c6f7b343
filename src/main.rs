use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

mod app;
mod scenario;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Headless liquid surface meshing demo")]
struct Args {
    /// Scenario file (TOML). Built-in defaults apply when it is missing.
    #[arg(long, default_value = "scenario.toml")]
    scenario: String,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<String>,

    /// Watch the scenario file and apply changes between ticks
    #[arg(long)]
    watch: bool,

    /// Worker thread count, 0 leaves one core for the tick loop
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Override the scenario's tick count
    #[arg(long)]
    ticks: Option<u32>,

    /// Override the scenario's fill seed
    #[arg(long)]
    seed: Option<i32>,

    /// Override the reveal ceiling (world-cell y)
    #[arg(long)]
    reveal: Option<i32>,

    /// Force fog of war on
    #[arg(long)]
    fog: bool,
}

fn init_logging(args: &Args) {
    if let Some(path) = &args.log_file {
        match std::fs::File::create(path) {
            Ok(file) => {
                let _ = simplelog::WriteLogger::init(
                    log::LevelFilter::Info,
                    simplelog::Config::default(),
                    file,
                );
                return;
            }
            Err(err) => eprintln!("cannot open log file {}: {}", path, err),
        }
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    let mut scenario = match scenario::load_or_default(Path::new(&args.scenario)) {
        Ok(scenario) => scenario,
        Err(err) => {
            log::error!("scenario {}: {}", args.scenario, err);
            return ExitCode::FAILURE;
        }
    };
    if let Some(seed) = args.seed {
        scenario.fill.seed = seed;
    }
    if let Some(reveal) = args.reveal {
        scenario.view.max_reveal_level = reveal;
    }
    if args.fog {
        scenario.view.fog_of_war = true;
    }

    match app::run(&args, scenario) {
        Ok(report) => {
            if report.builds_failed > 0 {
                log::error!("{} chunk builds failed", report.builds_failed);
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            log::error!("fatal: {}", err);
            ExitCode::FAILURE
        }
    }
}
