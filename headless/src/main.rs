//! Headless session runner.
//!
//! Plays one session of a built-in mode with a scripted bot, prints a summary
//! and optionally writes the encoded session record.

mod bot;

use std::fs;
use std::path::PathBuf;

use aim_core::{
    EffectTier, GameMode, ModeRecord, Renderer, SessionConfig, SessionLoop, SessionOutcome,
    SessionPhase, TickStatus,
};
use aim_record::SessionRecord;
use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bot::{Bot, Skill};

#[derive(Parser, Debug)]
#[command(name = "aim-headless", about = "Run an aim training session without a window")]
struct Args {
    /// Mode name, e.g. "classic" or "speed-blitz"
    #[arg(long, default_value = "classic")]
    mode: String,

    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Simulated display refresh rate
    #[arg(long, default_value_t = 60.0)]
    tick_hz: f32,

    /// TOML file overriding the session configuration
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Skill::Average)]
    skill: Skill,

    /// Extra frame time added during the middle third of the session
    #[arg(long, default_value_t = 0.0)]
    load_spike_ms: f32,

    /// Write the encoded session record here
    #[arg(long)]
    record_out: Option<PathBuf>,

    /// Print the built-in modes and exit
    #[arg(long)]
    list_modes: bool,
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.list_modes {
        list_modes();
        return Ok(());
    }

    let mode: GameMode = args.mode.parse()?;
    let config = load_config(args.config.as_ref())?;
    anyhow::ensure!(
        args.tick_hz.is_finite() && args.tick_hz > 0.0,
        "--tick-hz must be positive, got {}",
        args.tick_hz
    );

    let (outcome, final_tier) = run(mode, config, &args)?;
    print_summary(&outcome, final_tier);

    if let Some(path) = &args.record_out {
        let bytes = SessionRecord::from(&outcome)
            .to_bytes()
            .context("Failed to encode session record")?;
        fs::write(path, &bytes)
            .with_context(|| format!("Failed to write record to {}", path.display()))?;
        info!("Wrote {} byte record to {}", bytes.len(), path.display());
    }
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = SessionConfig::from_toml_str(&text)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    Ok(config)
}

fn run(
    mode: GameMode,
    config: SessionConfig,
    args: &Args,
) -> Result<(SessionOutcome, EffectTier)> {
    let step_ms = 1000.0 / args.tick_hz;
    let budget_ms = config.quality.budget_ms();
    let mut session = SessionLoop::new(mode.policy(), config, args.seed, ModeRecord::default())
        .with_context(|| format!("Failed to build session for {}", mode))?;
    let duration = session.policy().duration_ms;

    let mut bot = Bot::new(args.skill, args.seed, step_ms);
    let mut frame_rng = StdRng::seed_from_u64(args.seed);

    session.start()?;
    bot.frame_ready(&session.frame_view());

    // Synthetic render cost: comfortably inside budget, plus the optional spike
    let mut frame_ms = budget_ms * 0.5;
    while session.phase() == SessionPhase::Playing {
        let mut input = bot.take_input();
        let status = session.tick(step_ms, frame_ms, &mut input, &mut bot)?;
        if status == TickStatus::Finished {
            break;
        }

        let now = session.now_ms();
        let spike = if now > duration / 3.0 && now < duration * 2.0 / 3.0 {
            args.load_spike_ms
        } else {
            0.0
        };
        frame_ms = budget_ms * frame_rng.gen_range(0.4f32..0.7) + spike;
    }

    debug!(
        "Bot fired {} shots over {} ticks",
        bot.shots_fired(),
        session.tick_count()
    );
    let final_tier = session.quality().tier;
    let outcome = session.finalize()?;
    Ok((outcome, final_tier))
}

fn print_summary(outcome: &SessionOutcome, final_tier: EffectTier) {
    let analytics = &outcome.analytics;
    let grade = outcome
        .score
        .grade
        .map(|grade| grade.to_string())
        .unwrap_or_else(|| "-".to_string());
    let mean = analytics
        .mean_reaction_ms
        .map(|ms| format!("{:.0} ms", ms))
        .unwrap_or_else(|| "-".to_string());

    println!("Mode:             {}", outcome.mode);
    println!("Score:            {}", outcome.score.score);
    println!("Grade:            {}", grade);
    println!(
        "Accuracy:         {:.1}% ({} hits, {} misses, {} expired)",
        analytics.accuracy_percent(),
        analytics.hits,
        analytics.misses,
        analytics.expired
    );
    println!("Mean reaction:    {}", mean);
    println!("Best streak:      {}", outcome.score.best_streak);
    println!("Hits per second:  {:.2}", outcome.hits_per_second);
    println!("Final tier:       {:?}", final_tier);
}

fn list_modes() {
    for mode in GameMode::ALL {
        let policy = mode.policy();
        println!(
            "{:<14} {:<13} {:>3}s  {}",
            mode.name(),
            format!("{:?}", mode.difficulty()),
            (policy.duration_ms / 1000.0) as u32,
            mode.description()
        );
    }
}
