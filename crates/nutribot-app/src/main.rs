//! NutriBot application binary - composition root.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Build the translation, answering and speech backends
//! 3. Create the chat session and a domain event logger
//! 4. Run the line-based chat loop on stdin

mod cli;
mod repl;
mod speech_backend;

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use nutribot_chat::{ChatSession, RejectReason, SubmitOutcome};
use nutribot_core::config::NutribotConfig;
use nutribot_core::events::EventBus;
use nutribot_search::{AnswerClient, HttpAnswerClient};
use nutribot_speech::{NullSpeechEngine, PlaybackController, SpeechEngine};
use nutribot_translate::{GtxTranslationClient, PassthroughTranslator, TranslationClient};

use cli::CliArgs;
use repl::{parse_line, render_turn, Command, HELP};
use speech_backend::CommandSpeechEngine;

/// Log every domain event at debug level until the bus closes.
async fn event_logger(events: EventBus) {
    let mut rx = events.subscribe();
    loop {
        match rx.recv().await {
            Ok(event) => tracing::debug!(kind = event.kind(), event = ?event, "Domain event"),
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Event logger lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Submit one message on a background task and print the reply.
fn spawn_turn(session: Arc<ChatSession>, text: String) {
    tokio::spawn(async move {
        match session.submit(&text).await {
            SubmitOutcome::Answered { turn_id } | SubmitOutcome::Fallback { turn_id, .. } => {
                if let Some(turn) = session.turn(turn_id) {
                    println!("{}", render_turn(&turn, session.playback_status()));
                }
            }
            SubmitOutcome::Rejected(RejectReason::Busy) => {
                println!("Still working on your previous message.");
            }
            SubmitOutcome::Rejected(RejectReason::Empty) => {}
            SubmitOutcome::Discarded => {
                tracing::debug!("Reply arrived after reset and was dropped");
            }
        }
    });
}

/// Handle one parsed command. Returns `false` when the loop should exit.
fn handle_command(session: &Arc<ChatSession>, command: Command) -> bool {
    match command {
        Command::Say(text) => {
            if session.is_processing() {
                println!("Still working on your previous message.");
            } else {
                spawn_turn(Arc::clone(session), text);
            }
        }
        Command::Language(preferred) => {
            println!("Replies will be in: {}", preferred);
            session.set_preferred_language(preferred);
        }
        Command::Speak(target) => {
            let turn_id = target.or_else(|| session.latest_assistant_turn().map(|t| t.id));
            match turn_id {
                Some(id) => match session.toggle_playback(id) {
                    Ok(status) => println!("[{}]", status),
                    Err(e) => println!("{}", e),
                },
                None => println!("Nothing to read aloud yet."),
            }
        }
        Command::New => {
            session.reset();
            println!("Started a new chat.");
        }
        Command::History => {
            let turns = session.turns();
            if turns.is_empty() {
                println!("Ask me for a personalized diet plan!");
            }
            let status = session.playback_status();
            for turn in turns {
                println!("{}", render_turn(&turn, status));
            }
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => return false,
    }
    true
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = NutribotConfig::load_or_default(&config_file);
    if let Some(server) = args.resolve_server() {
        config.answer.base_url = server;
    }

    // Tracing. Logs go to stderr so replies on stdout stay readable.
    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    tracing::info!("Starting NutriBot v{}", env!("CARGO_PKG_VERSION"));
    config.validate()?;
    tracing::info!(path = %config_file.display(), server = %config.answer.base_url, "Configuration loaded");

    // Backends.
    let translator: Arc<dyn TranslationClient> = if args.no_translate {
        tracing::info!("Translation disabled, messages are sent as typed");
        Arc::new(PassthroughTranslator)
    } else {
        Arc::new(GtxTranslationClient::new(&config.translation))
    };
    let answers: Arc<dyn AnswerClient> = Arc::new(HttpAnswerClient::new(&config.answer));
    let engine: Arc<dyn SpeechEngine> = if config.speech.enabled && !args.no_speech {
        Arc::new(CommandSpeechEngine::new(config.speech.command.clone()))
    } else {
        tracing::info!("Read-aloud disabled");
        Arc::new(NullSpeechEngine)
    };

    // Session.
    let events = EventBus::new(config.session.event_capacity);
    tokio::spawn(event_logger(events.clone()));

    let playback = PlaybackController::new(engine, config.speech.quality_markers.clone(), events.clone());
    let preferred = args.resolve_language(&config.session.default_language)?;
    let session = Arc::new(
        ChatSession::new(translator, answers, playback, events)
            .with_preferred_language(preferred),
    );

    println!("NutriBot AI. Ask me for a personalized diet plan! (/help for commands)");

    // Chat loop.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(Some(command)) => {
                if !handle_command(&session, command) {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => println!("{}", e),
        }
    }

    session.stop_playback();
    tracing::info!("Shutting down");
    Ok(())
}
