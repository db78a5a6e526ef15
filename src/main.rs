//! Blast Breaker headless runner
//!
//! Plays the generated campaign with the autopilot on a fixed timestep and
//! logs what happened. Handy for soak-testing tuning changes.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fs;
    use std::path::PathBuf;

    use anyhow::{Context, Result};
    use clap::Parser;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use blast_breaker::audio::AudioBridge;
    use blast_breaker::consts::*;
    use blast_breaker::persistence;
    use blast_breaker::sim::{CAMPAIGN_LEVELS, GamePhase, GameState, LevelLayout, TickInput, tick};
    use blast_breaker::{Difficulty, Settings, Tuning};

    /// Stream constant that keeps layout draws apart from the game RNG
    const LAYOUT_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

    #[derive(Parser, Debug)]
    #[command(name = "blast-breaker", about = "Headless autopilot run of the brick-breaker core")]
    struct Args {
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// easy, normal or hard (overrides the settings file)
        #[arg(long)]
        difficulty: Option<String>,
        /// Number of levels to play
        #[arg(long, default_value_t = CAMPAIGN_LEVELS)]
        levels: u32,
        /// Give up on a level after this many simulated seconds
        #[arg(long, default_value_t = 240.0)]
        level_timeout: f32,
        /// Render rate the fixed-step accumulator is fed at
        #[arg(long, default_value_t = 60.0)]
        fps: f32,
        #[arg(long)]
        tuning: Option<PathBuf>,
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Resume from a save instead of starting fresh
        #[arg(long)]
        load: Option<PathBuf>,
        /// Write a save when the run stops
        #[arg(long)]
        save: Option<PathBuf>,
        /// Print the final frame view as JSON
        #[arg(long)]
        dump_view: bool,
    }

    fn load_tuning(args: &Args, settings: &Settings) -> Result<Tuning> {
        let base = match &args.tuning {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("failed to read tuning from {}", path.display()))?;
                Tuning::from_json(&json)?
            }
            None => Tuning::default(),
        };
        Ok(settings.tuning(&base))
    }

    /// Run one level until it ends or times out
    fn play_level(state: &mut GameState, audio: &mut AudioBridge, frame_dt: f32, timeout: f32) {
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        let mut accumulator = 0.0;
        let mut elapsed = 0.0;

        while state.is_running() && elapsed < timeout {
            accumulator += frame_dt;
            elapsed += frame_dt;

            let mut substeps = 0;
            while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                tick(state, &input, SIM_DT);
                accumulator -= SIM_DT;
                substeps += 1;
            }

            state.flush_events(audio);
            // A windowed host would hand these to its mixer
            audio.drain();
        }
    }

    pub fn run() -> Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        let args = Args::parse();

        let mut settings = match &args.settings {
            Some(path) => Settings::load_or_default(path),
            None => Settings::default(),
        };
        if let Some(name) = &args.difficulty {
            settings.difficulty = Difficulty::from_str(name)
                .with_context(|| format!("unknown difficulty {name:?}"))?;
        }
        let tuning = load_tuning(&args, &settings)?;

        let mut state = match &args.load {
            Some(path) => persistence::load_from_file(path)?,
            None => GameState::new(args.seed, tuning),
        };
        let mut layouts = Pcg32::seed_from_u64(state.seed ^ LAYOUT_STREAM);
        let mut audio = AudioBridge::new(&settings);
        let frame_dt = 1.0 / args.fps.max(1.0);
        let last_level = args.levels.max(1);

        log::info!(
            "Blast Breaker: seed {}, difficulty {}, {} levels",
            state.seed,
            settings.difficulty.as_str(),
            last_level
        );

        loop {
            let starting = state.level == 0 || state.phase == GamePhase::LevelComplete;
            if starting {
                if state.level >= last_level {
                    break;
                }
                let mut layout = LevelLayout::generate(state.level + 1, &mut layouts);
                layout.final_level |= layout.number == last_level;
                state.load_level(&layout);
            }

            let level = state.level;
            play_level(&mut state, &mut audio, frame_dt, args.level_timeout);

            match state.phase {
                GamePhase::GameOver => break,
                GamePhase::LevelComplete if state.final_level => break,
                GamePhase::LevelComplete => {}
                _ => {
                    log::warn!("level {level} timed out after {}s", args.level_timeout);
                    break;
                }
            }
        }

        log::info!(
            "run finished: level {}, score {}, lives {}, phase {:?}",
            state.level,
            state.score(),
            state.lives,
            state.phase
        );
        for (cue, count) in audio.tally() {
            log::info!("  {cue:?}: {count}");
        }

        if let Some(path) = &args.save {
            persistence::save_to_file(path, &state)?;
        }
        if args.dump_view {
            let json = serde_json::to_string_pretty(&state.view_with(&settings))
                .context("failed to encode view")?;
            println!("{json}");
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {}
