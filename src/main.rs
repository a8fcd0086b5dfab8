use anyhow::Context;
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::{info, warn};
use voxchat::client::VoiceChatClient;
use voxchat::config::Settings;
use voxchat::history::HistoryLog;
use voxchat::synth::SynthesisInvoker;
use voxchat::{artifact, capture, playback, render};

#[derive(Parser)]
#[command(name = "voxchat", version, about = "Voice-chat front end and local TTS driver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record a voice message, send it to the server, and play the reply
    Chat,
    /// Synthesize speech from text with the local TTS engine
    Say {
        text: String,
        /// Play the generated audio instead of only printing its path
        #[arg(long)]
        play: bool,
    },
    /// Inspect or clear the conversation history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Remove stale audio artifacts from the temp directory
    Sweep,
}

#[derive(Subcommand)]
enum HistoryAction {
    Show,
    Clear,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let settings = Settings::load().context("failed to load settings")?;
    let retention = Duration::from_secs(settings.artifact_retention_secs);

    // Reclaim anything earlier sessions left behind before creating more.
    match artifact::sweep(retention) {
        Ok(n) if n > 0 => info!(removed = n, "swept stale audio artifacts"),
        Err(e) => warn!(error = %e, "artifact sweep failed"),
        _ => {}
    }

    match cli.command {
        Command::Chat => {
            let client = VoiceChatClient::new(&settings)?;
            let history = client.load_history();

            println!("Recording for {}s...", settings.record_secs);
            let recording = capture::record(Duration::from_secs(settings.record_secs))?;

            let outcome = client.handle_turn(Some(&recording), &history);
            println!("{}", outcome.status.text);
            println!("{}", render::render_history(&outcome.history));

            if let Some(reply) = outcome.reply {
                let path = reply.into_path()?;
                println!("Reply audio: {}", path.display());
                playback::play(&path)?;
            }
        }
        Command::Say { text, play } => {
            let invoker = SynthesisInvoker::new(&settings);
            let path = invoker.synthesize(&text)?;
            println!("{}", path.display());
            if play {
                playback::play(&path)?;
            }
        }
        Command::History { action } => match action {
            HistoryAction::Show => {
                let log = HistoryLog::new(settings.history_path.clone());
                println!("{}", render::render_history(&log.load()));
            }
            HistoryAction::Clear => {
                let client = VoiceChatClient::new(&settings)?;
                let (_, status) = client.clear_history();
                println!("{}", status.text);
            }
        },
        Command::Sweep => {
            let removed = artifact::sweep(retention)?;
            println!("Removed {removed} stale audio files");
        }
    }

    Ok(())
}
