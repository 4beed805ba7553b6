use std::io::{
    self,
    BufRead,
    Write,
};

use abecedary::{
    backend::BackendClient,
    config::AppConfig,
    core::Identity,
    decks::DeckId,
    session::{
        SessionController,
        SessionPhase,
        SessionSignal,
    },
    speech::ConsoleSpeech,
    storage::{
        LocalStore,
        ProgressStore,
        RemoteStore,
    },
};

#[tokio::main]
async fn main() {
    let config = AppConfig::load();
    let deck_id = std::env::args()
        .nth(1)
        .and_then(|arg| DeckId::parse(&arg))
        .unwrap_or(DeckId::Uppercase);
    let identity = config.resolved_identity();

    match &identity {
        Identity::Authenticated { user_id } => {
            let client = BackendClient::new(config.backend_url.clone());
            if !client.wait_available(2, 3).await {
                eprintln!("Record store is not responding; try again later.");
                std::process::exit(1);
            }
            let store = RemoteStore::new(client, user_id.clone(), deck_id);
            run_session(SessionController::new(
                store,
                identity.clone(),
                deck_id,
                Box::new(ConsoleSpeech),
            ))
            .await;
        }
        Identity::Guest => {
            let store = LocalStore::new(deck_id);
            run_session(SessionController::new(
                store,
                Identity::Guest,
                deck_id,
                Box::new(ConsoleSpeech),
            ))
            .await;
        }
    }
}

async fn run_session<S: ProgressStore>(mut session: SessionController<S>) {
    if let Err(e) = session.initialize().await {
        eprintln!("Could not load progress: {}", e);
        return;
    }

    println!("Deck: {} ({})", session.deck().name, session.deck().description);
    println!("Stars: {}", session.total_stars());

    let stdin = io::stdin();
    loop {
        for signal in session.poll_signals() {
            session.handle_signal(signal);
        }

        match session.phase() {
            SessionPhase::Empty => {
                println!("No cards to study in this deck.");
                break;
            }
            SessionPhase::Ready => {
                let front = match session.current_card() {
                    Some(card) => card.front_glyph.clone(),
                    None => break,
                };
                println!();
                println!("  ┌───────┐");
                println!("  │   {}   │   ⭐ {}", front, session.total_stars());
                println!("  └───────┘");
                print!("[enter] flip, [q] quit > ");
                let _ = io::stdout().flush();

                let mut line = String::new();
                if stdin.lock().read_line(&mut line).is_err() || line.trim() == "q" {
                    break;
                }
                session.flip();
            }
            SessionPhase::Flipped => {
                if let Some(card) = session.current_card() {
                    println!(
                        "  {} is for {} {}",
                        card.back_glyph, card.example_word, card.back_glyph
                    );
                }
                print!("Did they get it? [y/n/q] > ");
                let _ = io::stdout().flush();

                let mut line = String::new();
                if stdin.lock().read_line(&mut line).is_err() {
                    break;
                }
                match line.trim() {
                    "y" => session.report_outcome(true).await,
                    "n" => session.report_outcome(false).await,
                    "q" => break,
                    _ => continue,
                }

                // Wait out the outcome view, then move on.
                while let Some(signal) = session.next_signal().await {
                    let advanced = signal == SessionSignal::NextCard;
                    session.handle_signal(signal);
                    if advanced {
                        break;
                    }
                }

                if let Some(achievement) = session.pending_achievement() {
                    println!("{}  {}: {}", achievement.icon, achievement.name, achievement.description);
                }
            }
            SessionPhase::Initializing => break,
        }
    }

    println!("See you next time! ⭐ {}", session.total_stars());
}
