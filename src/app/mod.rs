//! Console application.
//!
//! Signs in, starts a safety session and feeds it lines from stdin. Lines
//! starting with `:` are commands; anything else is treated as a final
//! transcript chunk from the recognizer.

mod command;
mod setup;

pub use command::Command;
pub use setup::AppError;

use crate::listener::{ChannelTranscriptSource, TranscriptChunk};
use crate::session::SafetySession;
use crate::shutdown;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Transcript lines buffered between stdin and the listener
const CHUNK_BUFFER: usize = 32;

type ChunkSender = mpsc::Sender<Result<TranscriptChunk, crate::listener::ListenerError>>;

/// Run the console until stdin closes or Ctrl+C
pub async fn run_console() -> Result<(), AppError> {
    let settings = setup::load_settings()?;
    if let Err(e) = shutdown::install_ctrlc_handler() {
        crate::warn!("Failed to install Ctrl+C handler: {}", e);
    }

    let auth = setup::sign_in().await?;
    let session = Arc::new(setup::start_session(&auth, &settings)?);

    let (chunk_tx, source) = ChannelTranscriptSource::channel(CHUNK_BUFFER);
    let listener = {
        let session = session.clone();
        tokio::spawn(async move { session.listen(source).await })
    };

    println!("Ready. Type :help for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = shutdown::shutdown_requested() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            crate::debug!("stdin closed");
            break;
        };

        if !handle_command(&session, &chunk_tx, Command::parse(&line)).await {
            break;
        }
    }

    drop(chunk_tx);
    match listener.await {
        Ok(Ok(stats)) => crate::info!(
            "Listener finished: {} chunks, {} matches",
            stats.chunks,
            stats.matches
        ),
        Ok(Err(e)) => crate::warn!("Listener stopped: {}", e),
        Err(e) => crate::error!("Listener task failed: {}", e),
    }

    session.shutdown().await;
    Ok(())
}

/// Apply one console command; returns false when the console should stop
async fn handle_command(session: &SafetySession, chunk_tx: &ChunkSender, command: Command) -> bool {
    match command {
        Command::Empty => {}
        Command::Help => println!("{}", Command::HELP),
        Command::Usage(usage) => println!("usage: {}", usage),
        Command::Unknown(name) => println!("unknown command :{} (try :help)", name),
        Command::SetTrigger(phrase) => match session.set_trigger(&phrase) {
            Ok(phrase) => println!("trigger phrase set to \"{}\"", phrase),
            Err(e) => println!("error: {}", e),
        },
        Command::AddContact { name, phone_number } => {
            match session.add_contact(&name, &phone_number) {
                Ok(contact) => println!(
                    "contact {} {} ({})",
                    contact.id, contact.display_name, contact.phone_number
                ),
                Err(e) => println!("error: {}", e),
            }
        }
        Command::RemoveContact(id) => match session.remove_contact(&id) {
            Ok(contact) => println!("removed {}", contact.display_name),
            Err(e) => println!("error: {}", e),
        },
        Command::Contacts => {
            let contacts = session.contacts();
            if contacts.is_empty() {
                println!("no contacts");
            }
            for contact in contacts {
                println!(
                    "{}  {}  {}",
                    contact.id, contact.display_name, contact.phone_number
                );
            }
        }
        Command::Cancel => match session.cancel_current_alert() {
            Some(id) => println!("cancelling alert {}", id),
            None => println!("no alert in progress"),
        },
        Command::Alerts => {
            let alerts = session.recent_alerts();
            if alerts.is_empty() {
                println!("no alerts");
            }
            for alert in alerts {
                let summary = alert.summary();
                println!(
                    "{}  {:?}  {} sent, {} failed, {} cancelled, {} pending{}",
                    alert.id,
                    alert.state,
                    summary.sent,
                    summary.failed,
                    summary.cancelled,
                    summary.pending,
                    if alert.location_fix.is_some() { "" } else { "  (no location)" }
                );
            }
        }
        Command::Quit => return false,
        Command::Transcript(text) => {
            if chunk_tx
                .send(Ok(TranscriptChunk::final_result(text)))
                .await
                .is_err()
            {
                crate::warn!("Listener is no longer running");
                return false;
            }
        }
    }
    true
}
