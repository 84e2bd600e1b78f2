use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lingo_cards::db::{self, SqliteBlobStore};
use lingo_cards::voice::{
    AudioPlayback, GeminiTts, PLAYBACK_SAMPLE_RATE, RenderOutcome, SpeakOutcome, Speaker, samples_to_wav,
};
use lingo_cards::{Catalog, Config, LearnedWordStore, study};

/// Lingo - Flashcard vocabulary trainer with spoken pronunciation
#[derive(Parser)]
#[command(name = "lingo", version, about)]
struct Cli {
    /// Target language code (e.g., "en", "de", "fr")
    #[arg(short, long, env = "LINGO_LANG", global = true)]
    lang: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List levels and lessons for the target language
    Levels,
    /// Study a lesson card by card
    Lesson {
        /// Level code (e.g., "B1")
        level: String,
        /// Lesson id; prompts when omitted
        #[arg(long)]
        lesson: Option<String>,
        /// Disable pronunciation audio
        #[arg(long)]
        mute: bool,
    },
    /// Show learned words, newest first
    Vocab {
        /// Pick learned words to hear
        #[arg(long)]
        listen: bool,
    },
    /// Quiz yourself on learned words
    Review {
        /// Disable pronunciation audio
        #[arg(long)]
        mute: bool,
    },
    /// Speak a phrase in the target language
    Speak {
        /// Text to speak
        text: String,
        /// Write a WAV file instead of playing
        #[arg(long, value_name = "FILE")]
        save: Option<PathBuf>,
    },
    /// Test speaker output
    TestSpeaker,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,lingo_cards=info",
        1 => "info,lingo_cards=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let lang = cli.lang.as_deref();

    match cli.command {
        Command::Levels => {
            let (config, catalog) = load(lang)?;
            let store = open_store(&config)?;
            study::print_levels(&catalog, &store, &config.language);
            Ok(())
        }
        Command::Lesson {
            level,
            lesson,
            mute,
        } => {
            let (config, catalog) = load(lang)?;
            let mut store = open_store(&config)?;
            let speaker = if mute { None } else { build_speaker(&config) };
            study::run_lesson(
                &catalog,
                &mut store,
                speaker.as_ref(),
                &config.language,
                &level,
                lesson.as_deref(),
            )
            .await
        }
        Command::Vocab { listen } => {
            let (config, _) = load(lang)?;
            let store = open_store(&config)?;
            study::print_vocabulary(&store, &config.language);
            if listen {
                let speaker = build_speaker(&config);
                study::listen_vocabulary(&store, speaker.as_ref(), &config.language).await?;
            }
            Ok(())
        }
        Command::Review { mute } => {
            let (config, _) = load(lang)?;
            let store = open_store(&config)?;
            let speaker = if mute { None } else { build_speaker(&config) };
            study::run_review(
                &store,
                speaker.as_ref(),
                &config.language,
                config.quiz,
                &mut rand::thread_rng(),
            )
            .await?;
            Ok(())
        }
        Command::Speak { text, save } => {
            let config = Config::load_with_language(lang)?;
            speak(&config, &text, save.as_deref()).await
        }
        Command::TestSpeaker => test_speaker().await,
    }
}

/// Load configuration and the catalog, checking the target language
fn load(lang: Option<&str>) -> anyhow::Result<(Config, Catalog)> {
    let config = Config::load_with_language(lang)?;
    tracing::debug!(?config, "loaded configuration");

    let catalog = Catalog::embedded()?;
    if !catalog.has_language(&config.language) {
        let known: Vec<&str> = catalog.languages().collect();
        anyhow::bail!(
            "no lessons for language {:?} (available: {})",
            config.language,
            known.join(", ")
        );
    }

    Ok((config, catalog))
}

/// Open the learned-word store in the data directory
fn open_store(config: &Config) -> anyhow::Result<LearnedWordStore> {
    let pool = db::init(config.database_path())?;
    Ok(LearnedWordStore::load(Arc::new(SqliteBlobStore::new(pool))))
}

/// Build a speaker, or `None` when no API key is configured
fn build_speaker(config: &Config) -> Option<Speaker> {
    if config.api_key.is_none() {
        println!("Audio disabled: set GEMINI_API_KEY to hear pronunciations.");
        return None;
    }

    match GeminiTts::new(config.api_key.clone(), &config.tts) {
        Ok(tts) => Some(Speaker::new(Arc::new(tts), AudioPlayback::system())),
        Err(e) => {
            tracing::warn!(error = %e, "speech synthesis unavailable");
            None
        }
    }
}

/// Speak text once, or save it as WAV
#[allow(clippy::future_not_send)]
async fn speak(config: &Config, text: &str, save: Option<&Path>) -> anyhow::Result<()> {
    let tts = GeminiTts::new(config.api_key.clone(), &config.tts)?;
    let speaker = Speaker::new(Arc::new(tts), AudioPlayback::system());

    if let Some(path) = save {
        let buffer = match speaker.render(text, &config.language).await? {
            RenderOutcome::Audio(buffer) => buffer,
            RenderOutcome::NoAudio => {
                println!("The service returned no audio.");
                return Ok(());
            }
            RenderOutcome::Busy => {
                println!("The speaker is busy; try again.");
                return Ok(());
            }
        };
        std::fs::write(path, samples_to_wav(&buffer)?)?;
        println!(
            "Saved {:.1}s of audio to {}",
            buffer.duration().as_secs_f32(),
            path.display()
        );
        return Ok(());
    }

    match speaker.speak(text, &config.language).await {
        SpeakOutcome::Playing(playback) => {
            playback.wait().await;
            Ok(())
        }
        SpeakOutcome::NoAudio => {
            println!("The service returned no audio.");
            Ok(())
        }
        SpeakOutcome::Failed(e) => Err(e.into()),
        SpeakOutcome::Busy => Ok(()),
    }
}

/// Test speaker output with a short tone
async fn test_speaker() -> anyhow::Result<()> {
    println!("Playing a 440Hz tone for 2 seconds at {PLAYBACK_SAMPLE_RATE} Hz...");

    let mut playback = AudioPlayback::system();
    playback
        .play_samples(sine_tone(440.0, 2.0, PLAYBACK_SAMPLE_RATE))?
        .wait()
        .await;

    println!("\nIf you heard the tone, audio output works.");
    println!("Otherwise check `pactl info | grep 'Default Sink'` or pavucontrol.");

    Ok(())
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn sine_tone(frequency: f32, secs: f32, sample_rate: u32) -> Vec<f32> {
    let rate = sample_rate as f32;
    let count = (rate * secs) as usize;
    (0..count)
        .map(|i| (std::f32::consts::TAU * frequency * i as f32 / rate).sin() * 0.3)
        .collect()
}
