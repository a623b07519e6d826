//! Approximate-majority ensemble runner.
//!
//! Runs many independent approximate-majority trajectories and prints the
//! JSON summary on stdout. Logging goes to stderr and is controlled by
//! `RUST_LOG`.

use tracing_subscriber::EnvFilter;

use crnsim::{Ensemble, EnsembleConfig};

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T {
    let Some(raw) = args.get(i + 1) else {
        eprintln!("error: {flag} requires a value");
        std::process::exit(1);
    };
    raw.parse().unwrap_or_else(|_| {
        eprintln!("error: invalid value for {flag}: {raw}");
        std::process::exit(1);
    })
}

fn parse_args() -> EnsembleConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = EnsembleConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--a" | "-a" => config.network.count_a = parse_value(&args, i, "--a"),
            "--b" | "-b" => config.network.count_b = parse_value(&args, i, "--b"),
            "--c" | "-c" => config.network.count_c = parse_value(&args, i, "--c"),
            "--rate" | "-k" => config.network.rate_constant = parse_value(&args, i, "--rate"),
            "--runs" | "-n" => config.runs = parse_value(&args, i, "--runs"),
            "--max-steps" | "-m" => config.max_steps_per_run = parse_value(&args, i, "--max-steps"),
            "--seed" | "-s" => config.seed = parse_value(&args, i, "--seed"),
            "--help" | "-h" => {
                println!("am-ensemble - approximate-majority ensemble runner");
                println!();
                println!("USAGE:");
                println!("    am-ensemble [OPTIONS]");
                println!();
                println!("OPTIONS:");
                println!("    -a, --a <N>            Initial A [default: 10]");
                println!("    -b, --b <N>            Initial B [default: 5]");
                println!("    -c, --c <N>            Initial C [default: 0]");
                println!("    -k, --rate <K>         Rate constant [default: 1e-5]");
                println!("    -n, --runs <N>         Number of runs [default: 100]");
                println!("    -m, --max-steps <N>    Step cap per run [default: 10000]");
                println!("    -s, --seed <S>         Base seed [default: 0]");
                println!("    -h, --help             Print help information");
                std::process::exit(0);
            }
            arg => {
                eprintln!("error: unknown argument: {arg}");
                std::process::exit(1);
            }
        }
        i += 2;
    }

    config
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();

    let config = parse_args();
    let ensemble = match Ensemble::new(config) {
        Ok(ensemble) => ensemble,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    let summary = match ensemble.run() {
        Ok(summary) => summary,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("error: failed to serialize summary: {err}");
            std::process::exit(1);
        }
    }
}
