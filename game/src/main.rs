use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use engine::{GameState, ScoreReport};
use rand::{SeedableRng, rngs::StdRng};
use ultrametric::TraversalController;
use ultrametric::agent::{Strategy, play_session};
use ultrametric::leaderboard::{DEFAULT_LIMIT, Leaderboard};
use ultrametric::logging::init_tracing;
use ultrametric::settings::SettingsStore;

#[derive(Parser)]
#[command(name = "ultrametric", about = "Headless runs of the ultrametric traversal puzzle")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play one or more games with a built-in strategy
    Play(PlayArgs),
    /// Print the effective settings and the file they come from
    Settings,
}

#[derive(Args)]
struct PlayArgs {
    /// Nodes per layer (defaults to the settings file)
    #[arg(long, allow_negative_numbers = true)]
    width: Option<i64>,
    /// Layers below the root (defaults to the settings file)
    #[arg(long, allow_negative_numbers = true)]
    depth: Option<i64>,
    /// Seed for both tree generation and the random strategy
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, value_enum, default_value_t = Strategy::Greedy)]
    strategy: Strategy,
    #[arg(long, default_value_t = 1)]
    games: u32,
    #[arg(long, default_value = "player")]
    username: String,
    /// Emit reports and the leaderboard as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Play(args) => play(args),
        Command::Settings => show_settings(),
    }
}

fn play(args: PlayArgs) -> Result<()> {
    let mut settings = SettingsStore::from_env().load();
    if let Some(width) = args.width {
        settings.width = width;
    }
    if let Some(depth) = args.depth {
        settings.depth = depth;
    }
    if args.seed.is_some() {
        settings.seed = args.seed;
    }
    let dims = settings.dimensions().context("invalid game dimensions")?;

    let mut controller = TraversalController::from_settings(&settings);
    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    let mut leaderboard = Leaderboard::new();
    let mut reports: Vec<ScoreReport> = Vec::new();

    for game in 1..=args.games {
        controller
            .start_game(dims.width(), dims.depth())
            .with_context(|| format!("failed to start game {game}"))?;
        let fingerprint = controller.state().map(GameState::fingerprint);
        let report = play_session(&mut controller, args.strategy, &mut rng)
            .with_context(|| format!("failed to play game {game}"))?;

        if !args.json {
            for record in controller.history() {
                println!(
                    "game {game} move {}: layer {} -> node {}, cost {} (total {})",
                    record.move_number, record.layer, record.node, record.step_cost, record.total_cost
                );
            }
            println!(
                "game {game} complete: cost {} score {}",
                report.total_cost,
                format_score(report.relative_score)
            );
        }

        if report.relative_score.is_some() {
            let username = format!("{}#{game}", args.username);
            leaderboard.submit(&report, &username, fingerprint)?;
        }
        reports.push(report);
    }

    let top = leaderboard.top(dims, DEFAULT_LIMIT);
    if args.json {
        let out = serde_json::json!({ "reports": reports, "leaderboard": top });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if !top.is_empty() {
        println!("leaderboard (depth {}, width {}):", dims.depth(), dims.width());
        for (rank, entry) in top.iter().enumerate() {
            println!(
                "{:>3}. {:<16} cost {:>5}  score {:.2}",
                rank + 1,
                entry.username,
                entry.cost,
                entry.relative_score
            );
        }
    }
    Ok(())
}

fn show_settings() -> Result<()> {
    let store = SettingsStore::from_env();
    let settings = store.load();
    println!("# {}", store.path().display());
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

fn format_score(score: Option<f64>) -> String {
    score.map_or_else(|| "n/a".to_string(), |s| format!("{s:.2}"))
}
