//! searadar-run: headless radar scenario runner.
//!
//! Usage:
//!   searadar-run scenario --radars 2 --ships 8 --ticks 1440 --weather heavy --output ppi.jsonl
//!   searadar-run default-config > radar.json

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use searadar_broadcast::{spawn_driver, DriverConfig, SessionHub, Subscription};
use searadar_core::commands::ControllerCommand;
use searadar_core::config::RadarConfig;
use searadar_core::enums::Weather;
use searadar_core::events::RadarEvent;
use searadar_core::message::radar_path;
use searadar_core::types::{Position, Velocity};
use searadar_sim::engine::EngineConfig;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "scenario" => cmd_scenario(&args[2..]),
        "default-config" => cmd_default_config(),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!(
        "searadar-run: headless marine radar scenario runner\n\
         \n\
         Commands:\n\
         \n\
         scenario        Run radars over a field of ships and record every broadcast\n\
         \n\
           --config <path>    Radar configuration JSON (default: built-in)\n\
           --radars <N>       Radars on the placement grid (default: 1)\n\
           --ships <N>        Ships scattered around the radars (default: 5)\n\
           --ticks <N>        Ticks to run (default: two rotations)\n\
           --seed <N>         RNG seed (default: 42)\n\
           --weather <w>      clear | light | heavy | fog (default: clear)\n\
           --output <path>    JSON lines output (default: stdout)\n\
         \n\
         default-config  Print the default radar configuration as JSON\n"
    );
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn parse_number<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    match flag_value(args, flag) {
        Some(raw) => match raw.parse() {
            Ok(n) => n,
            Err(_) => {
                eprintln!("Error: {flag} expects a number, got `{raw}`");
                process::exit(1);
            }
        },
        None => default,
    }
}

fn parse_weather(args: &[String]) -> (Weather, bool) {
    match flag_value(args, "--weather").unwrap_or("clear") {
        "clear" => (Weather::Clear, false),
        "light" => (Weather::LightRain, false),
        "heavy" => (Weather::HeavyRain, false),
        "fog" => (Weather::HeavyRain, true),
        other => {
            eprintln!("Error: unknown weather `{other}`");
            process::exit(1);
        }
    }
}

// --- Default config command ---

fn cmd_default_config() {
    match serde_json::to_string_pretty(&RadarConfig::default()) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error serializing config: {e}");
            process::exit(1);
        }
    }
}

// --- Scenario command ---

/// Ships scattered over the strip covered by the placement grid.
fn scatter_ships(rng: &mut ChaCha8Rng, count: usize, radars: u32, max_range: f64) -> Vec<ControllerCommand> {
    let x_max = (radars.max(1) - 1) as f64 * 2.0 * max_range + max_range;
    (0..count)
        .map(|_| {
            let heading = rng.gen_range(0.0..std::f64::consts::TAU);
            let speed = rng.gen_range(3.0..12.0);
            ControllerCommand::AddContact {
                position: Position::new(
                    rng.gen_range(-max_range..x_max),
                    rng.gen_range(-max_range..max_range),
                    0.0,
                ),
                velocity: Velocity::new(speed * heading.sin(), speed * heading.cos(), 0.0),
                radius: rng.gen_range(15.0..60.0),
                reflectivity: rng.gen_range(0.5..2.0),
            }
        })
        .collect()
}

fn cmd_scenario(args: &[String]) {
    let config = match flag_value(args, "--config") {
        Some(path) => match RadarConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading {path}: {e}");
                process::exit(1);
            }
        },
        None => RadarConfig::default(),
    };

    let radars: u32 = parse_number(args, "--radars", 1);
    let ships: usize = parse_number(args, "--ships", 5);
    let ticks: u64 = parse_number(args, "--ticks", 2 * config.rows() as u64);
    let seed: u64 = parse_number(args, "--seed", 42);
    let (weather, foggy) = parse_weather(args);
    let output = flag_value(args, "--output").map(PathBuf::from);

    let mut out: Box<dyn Write> = match &output {
        Some(path) => match File::create(path) {
            Ok(f) => Box::new(BufWriter::new(f)),
            Err(e) => {
                eprintln!("Error creating {}: {e}", path.display());
                process::exit(1);
            }
        },
        None => Box::new(BufWriter::new(io::stdout())),
    };

    // Radar ids are allocated from 0, so the paths are known up front.
    let hub = Arc::new(SessionHub::new());
    let subscriptions: Vec<Subscription> = (0..radars)
        .filter_map(|id| {
            let path = radar_path(id);
            hub.register_path(&path);
            hub.subscribe(&path).ok()
        })
        .collect();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut startup = vec![ControllerCommand::SetWeather { weather, foggy }];
    startup.extend(scatter_ships(&mut rng, ships, radars, config.max_range));
    startup.extend((0..radars).map(|_| ControllerCommand::SpawnRadar {
        config: config.clone(),
        position: None,
    }));

    info!(radars, ships, ticks, seed, ?weather, foggy, "starting scenario");

    let driver_config = DriverConfig {
        engine: EngineConfig {
            seed,
            ..Default::default()
        },
        realtime: false,
        max_ticks: Some(ticks),
        startup,
        ..Default::default()
    };
    let driver = match spawn_driver(driver_config, hub) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error starting driver: {e}");
            process::exit(1);
        }
    };

    let mut written = 0usize;
    let drain = |out: &mut dyn Write| -> io::Result<usize> {
        let mut n = 0;
        for sub in &subscriptions {
            while let Some(frame) = sub.try_recv() {
                writeln!(out, "{frame}")?;
                n += 1;
            }
        }
        Ok(n)
    };

    loop {
        let finished = driver.is_finished();
        for event in driver.events().try_iter() {
            match event {
                RadarEvent::CommandRejected { reason } => warn!(%reason, "scenario command rejected"),
                RadarEvent::ScorerFailed { radar_id, reason } => warn!(radar_id, %reason, "radar failed"),
                _ => {}
            }
        }
        match drain(out.as_mut()) {
            Ok(n) => written += n,
            Err(e) => {
                eprintln!("Error writing output: {e}");
                process::exit(1);
            }
        }
        if finished {
            break;
        }
        std::thread::sleep(Duration::from_millis(2));
    }

    let summary = driver.join();
    match drain(out.as_mut()).and_then(|n| out.flush().map(|()| n)) {
        Ok(n) => written += n,
        Err(e) => {
            eprintln!("Error writing output: {e}");
            process::exit(1);
        }
    }

    info!(
        ticks = summary.ticks,
        sent = summary.broadcast.sent,
        dropped = summary.broadcast.no_subscribers + summary.broadcast.failed,
        messages = written,
        "scenario finished"
    );
}
