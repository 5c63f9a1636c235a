use clap::Parser;
use dealer_core::io::{lin, text};
use dealer_engine::builder::NoopObserver;
use dealer_engine::config::GeneratorConfig;
use dealer_engine::driver::{generate_deals, DealSet, Setup};
use dealer_engine::profile::{validate_profile, validate_profile_viability_light, HandProfile};
use rand::Rng;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate constrained bridge deal sets from a hand profile")]
struct Args {
    /// Path to a hand-profile YAML file
    profile: PathBuf,

    /// Number of boards to generate
    #[arg(short, long, default_value_t = 8)]
    boards: u32,

    /// RNG seed; random when omitted
    #[arg(short, long)]
    seed: Option<u64>,

    /// Disable the per-deal N/S-E/W rotation
    #[arg(long)]
    no_rotate: bool,

    /// Write a human-readable TXT rendering here
    #[arg(long)]
    txt: Option<PathBuf>,

    /// Write a BBO LIN file here
    #[arg(long)]
    lin: Option<PathBuf>,

    /// Owner tag recorded in the run summary
    #[arg(long, default_value = "local")]
    owner: String,

    /// Print the run summary as JSON instead of plain text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct RunSummary<'a> {
    profile_name: &'a str,
    owner: &'a str,
    seed: u64,
    boards: usize,
    reseed_count: u32,
    total_seconds: f64,
    board_seconds: &'a [f64],
}

fn load_profile(path: &PathBuf) -> Result<HandProfile, String> {
    let yaml = std::fs::read_to_string(path)
        .map_err(|e| format!("Error: cannot read {}: {}", path.display(), e))?;
    let mut profile: HandProfile =
        serde_yaml::from_str(&yaml).map_err(|e| format!("Error: invalid profile: {}", e))?;
    validate_profile(&mut profile).map_err(|e| format!("Error: invalid profile: {}", e))?;
    validate_profile_viability_light(&profile)
        .map_err(|e| format!("Error: infeasible profile: {}", e))?;
    Ok(profile)
}

fn run(args: &Args) -> Result<(), String> {
    let profile = load_profile(&args.profile)?;

    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let setup = Setup {
        seed,
        output_txt_path: args.txt.clone(),
        output_lin_path: args.lin.clone(),
        owner: args.owner.clone(),
        profile_name: profile.profile_name.clone(),
        timestamp: String::new(),
    };

    let rotate = !args.no_rotate && profile.rotate_by_default;
    let config = GeneratorConfig::default();
    let set: DealSet = generate_deals(
        &profile,
        args.boards,
        rotate,
        setup.seed,
        &config,
        &mut NoopObserver,
    )
    .map_err(|e| format!("Error: {}", e))?;

    if let Some(path) = &setup.output_txt_path {
        text::write_text_file(path, &set.deals)
            .map_err(|e| format!("Error: cannot write {}: {}", path.display(), e))?;
        println!("Wrote {}", path.display());
    }
    if let Some(path) = &setup.output_lin_path {
        lin::write_lin_file(path, &set.deals)
            .map_err(|e| format!("Error: cannot write {}: {}", path.display(), e))?;
        println!("Wrote {}", path.display());
    }
    if setup.output_txt_path.is_none() && setup.output_lin_path.is_none() {
        println!("{}", text::format_deal_set_text(&set.deals));
        println!();
    }

    let total: f64 = set.board_times.iter().sum();
    let summary = RunSummary {
        profile_name: &setup.profile_name,
        owner: &setup.owner,
        seed,
        boards: set.deals.len(),
        reseed_count: set.reseed_count,
        total_seconds: total,
        board_seconds: &set.board_times,
    };
    if args.json {
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| format!("Error: cannot encode summary: {}", e))?;
        println!("{}", json);
    } else {
        println!(
            "{}: {} boards, seed {}, {:.2}s total, {} re-seed(s)",
            summary.profile_name, summary.boards, summary.seed, total, summary.reseed_count,
        );
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
