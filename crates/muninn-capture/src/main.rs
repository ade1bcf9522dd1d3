//! Muninn CLI: record a capture session and derive summary artifacts.
//!
//! Usage:
//!   cargo run -p muninn-capture -- --record [--duration 30] [--title "Standup"] [--identity ada]
//!
//! Captures line input from stdin for the duration, then stops, runs the
//! extraction pipeline, prints the artifacts, and persists state. With a
//! configured API key the real generation provider is used; otherwise the
//! deterministic placeholder.

use muninn_capture::{CaptureConfig, Recorder, StateFile, UserConfig};
use muninn_voice::{
    ChatClient, ConsoleSynthesis, GenerationBackend, PlaceholderGeneration, StdinCapture,
    SynthesisBackend,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let record = args.next().as_deref() == Some("--record");
    let mut duration_secs: u64 = 30;
    let mut title: Option<String> = None;
    let mut identity: Option<String> = None;

    while let Some(a) = args.next() {
        match a.as_str() {
            "--duration" => {
                if let Some(d) = args.next() {
                    duration_secs = d.parse().unwrap_or(30);
                }
            }
            "--title" => {
                title = args.next();
            }
            "--identity" => {
                identity = args.next();
            }
            _ => {}
        }
    }

    if !record {
        eprintln!("Muninn: Live Capture Sessions");
        eprintln!("  --record            Start recording (default 30s, or --duration N)");
        eprintln!("  --duration N        Recording length in seconds (default 30)");
        eprintln!("  --title \"Name\"      Session title (default timestamped)");
        eprintln!("  --identity NAME     Memory identity (default from user_config.toml)");
        eprintln!();
        eprintln!("Input is read line-by-line from stdin for the duration.");
        eprintln!("Generation key: user_config.toml or MUNINN_LLM_API_KEY / OPENROUTER_API_KEY.");
        eprintln!("State file: MUNINN_STORAGE_PATH or ./data → data/muninn/state.json");
        return Ok(());
    }

    let config = CaptureConfig::from_env();
    let user = UserConfig::load().map_err(|e| format!("user config: {}", e))?;
    let identity = identity.unwrap_or_else(|| user.identity());
    let title = title.unwrap_or_else(|| {
        format!("Session {}", chrono::Local::now().format("%Y-%m-%d %H:%M"))
    });

    let generation: Arc<dyn GenerationBackend> = match user.provider() {
        Some(provider) => {
            info!("using generation model {}", provider.model);
            Arc::new(ChatClient::new(provider)?)
        }
        None => {
            warn!("no API key configured; using placeholder generation");
            Arc::new(PlaceholderGeneration::new())
        }
    };

    let mut recorder = Recorder::open(config, StateFile::new(StateFile::default_path()), generation)
        .map_err(|e| format!("state load: {}", e))?;

    info!("recording '{}' for {}s; type lines, one per capture", title, duration_secs);
    let mut session = recorder.begin(Arc::new(StdinCapture::spawn()))?;

    let log = session.log();
    thread::sleep(Duration::from_secs(duration_secs));
    info!("stopping after {}s with {} entries", duration_secs, log.len());

    let outcome = recorder.finish(&identity, &title, &mut session)?;
    if outcome.report.degraded {
        warn!("capture was degraded during this session; transcript may be incomplete");
    }

    let voice = ConsoleSynthesis;
    let _ = voice.speak(&format!(
        "Recording stopped. Captured {} statements.",
        outcome.report.transcript.len()
    ));

    println!("\n{}", "=".repeat(50));
    println!("SESSION: {} ({:.0}s)", title, outcome.report.duration.as_secs_f64());
    println!("{}", "=".repeat(50));
    print_field("SUMMARY", outcome.extraction.summary.value());
    print_field("ACTION ITEMS", outcome.extraction.action_items.value());
    print_field("PARTICIPANTS", outcome.extraction.participants.value());

    match outcome.persistence {
        None => info!("state saved to {}", StateFile::default_path().display()),
        Some(e) => {
            warn!("first flush failed ({}); retrying once", e);
            recorder.save().map_err(|e| format!("state save: {}", e))?;
        }
    }

    let stats = recorder.stats();
    println!(
        "\n📊 {} sessions on record, {:.1} minutes, {} statements total",
        stats.sessions,
        stats.total_duration_secs / 60.0,
        stats.total_entries
    );
    Ok(())
}

fn print_field(header: &str, value: Option<&str>) {
    println!("\n{}:", header);
    match value {
        Some(v) => println!("{}", v),
        None => println!("(unavailable: generation call failed)"),
    }
}
