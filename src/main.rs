use std::sync::Arc;

use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::BroadcastStream;

use tastetrip::cli::{parse_input, render_affordance, render_message};
use tastetrip::config::WizardConfig;
use tastetrip::itinerary::ItineraryRequest;
use tastetrip::wizard::{
    Message, Preferences, QuestionRegistry, Speaker, Transition, WizardEvent, WizardManager,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("error")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = WizardConfig::load()?;

    eprintln!("✈️  Tastetrip v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Max stay: {} nights", config.max_nights);
    eprintln!("   Type an answer and press Enter. /quit to exit.\n");

    let registry = QuestionRegistry::travel();
    let closing = registry
        .get(registry.last_index())
        .map(|q| q.prompt.clone())
        .unwrap_or_default();
    let today = chrono::Local::now().date_naive();
    let manager = Arc::new(WizardManager::start(registry, config, today));
    let events = BroadcastStream::new(manager.subscribe());

    for message in manager.snapshot().await.transcript.iter() {
        println!("{}", render_message(message));
    }

    // Print assistant turns and completion as they happen.
    let printer = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move {
            let mut events = events;
            while let Some(event) = events.next().await {
                match event {
                    Ok(WizardEvent::MessageAppended { message })
                        if message.speaker == Speaker::Assistant =>
                    {
                        println!("{}", render_message(&message));
                    }
                    Ok(WizardEvent::Typing { active: false }) => {
                        let snapshot = manager.snapshot().await;
                        println!("{}", render_affordance(&snapshot.affordance, snapshot.can_go_back));
                    }
                    Ok(WizardEvent::Completed { preferences }) => {
                        println!("{}", render_message(&Message::assistant(closing.as_str())));
                        print_request(&preferences);
                        eprintln!("\n   `back` to change the last answer, /quit to exit.");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Event stream lagged: {}", e),
                }
            }
        })
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == "/quit" || line == "quit" {
            break;
        }

        let snapshot = manager.snapshot().await;
        let intents = match parse_input(line, &snapshot.affordance) {
            Ok(intents) => intents,
            Err(e) => {
                eprintln!("⚠️  {e}");
                continue;
            }
        };

        for intent in intents {
            match manager.dispatch(intent).await {
                Ok(Transition::Staged) => {
                    let snapshot = manager.snapshot().await;
                    println!("{}", render_affordance(&snapshot.affordance, snapshot.can_go_back));
                }
                Ok(Transition::Retreated { .. }) => {
                    let snapshot = manager.snapshot().await;
                    if let Some(question) = snapshot.transcript.last() {
                        println!("{}", render_message(question));
                    }
                    println!("{}", render_affordance(&snapshot.affordance, snapshot.can_go_back));
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("⚠️  {e}");
                    break;
                }
            }
        }
    }

    manager.shutdown().await;
    printer.abort();
    Ok(())
}

fn print_request(preferences: &Preferences) {
    match ItineraryRequest::from_preferences(preferences) {
        Ok(request) => {
            println!("\n{}", request.interests());
            match request.to_json() {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::warn!("Failed to serialize request: {}", e),
            }
        }
        Err(e) => tracing::warn!("Incomplete preferences: {}", e),
    }
}
