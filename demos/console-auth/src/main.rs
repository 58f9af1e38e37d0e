use std::sync::Arc;

use authloop::prelude::*;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
enum Line {
    Logon {
        username: String,
        password: String,
        passcode: Option<String>,
    },
    Logoff,
    Active,
    Check,
    Status,
    Quit,
    Help,
}

fn parse(line: &str) -> Option<Line> {
    let mut words = line.split_whitespace();
    let cmd = match words.next()? {
        "logon" => Line::Logon {
            username: words.next()?.to_string(),
            password: words.next()?.to_string(),
            passcode: words.next().map(str::to_string),
        },
        "logoff" => Line::Logoff,
        "active" => Line::Active,
        "check" => Line::Check,
        "status" => Line::Status,
        "quit" | "exit" => Line::Quit,
        _ => Line::Help,
    };
    Some(cmd)
}

const HELP: &str = "commands: logon <user> <password> [passcode] | logoff | active | check | status | quit";

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let Some(endpoint_config) = HttpEndpointConfig::from_env() else {
        eprintln!("set AUTHLOOP_ENDPOINT_URL, e.g. https://example.com/zotonic-auth");
        std::process::exit(2);
    };
    let store_path = std::env::var("AUTHLOOP_STORE_PATH")
        .unwrap_or_else(|_| "./authloop-identity.json".to_string());

    tracing::info!(url = %endpoint_config.url, store = %store_path, "starting console auth");

    let endpoint = HttpEndpoint::new(endpoint_config)?;
    let bus = Arc::new(LocalBus::default());
    let auth = AuthWorkerBuilder::new().spawn(endpoint, Arc::clone(&bus), FileStore::new(store_path));

    let mut changes = bus.subscribe(topics::AUTH_USER_ID);
    tokio::spawn(async move {
        while let Some(message) = changes.recv().await {
            match message.decode::<Option<UserId>>() {
                Ok(Some(user_id)) => println!("> logged on as {user_id}"),
                Ok(None) => println!("> anonymous"),
                Err(e) => tracing::warn!(error = %e, "bad auth-user-id payload"),
            }
        }
    });

    auth.start().await?;
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(cmd) = parse(&line) else {
            continue;
        };
        match cmd {
            Line::Logon {
                username,
                password,
                passcode,
            } => {
                let payload = json!({
                    "username": username,
                    "password": password,
                    "passcode": passcode,
                });
                bus.publish(BusMessage::new(topics::LOGON, &payload)?);
            }
            Line::Logoff => {
                bus.publish(BusMessage::new(topics::LOGOFF, &json!({}))?);
            }
            Line::Active => {
                bus.publish(BusMessage::new(
                    topics::RECENT_ACTIVITY,
                    &json!({"is_active": true}),
                )?);
            }
            Line::Check => auth.auth_check().await?,
            Line::Status => {
                let snapshot = auth.snapshot().await?;
                println!(
                    "> {} user={:?} keep_alive={}",
                    snapshot.status(),
                    snapshot.auth().user_id,
                    snapshot.pending_keep_alive()
                );
                if let Some(failure) = snapshot.last_error() {
                    println!("> last error: {failure}");
                }
            }
            Line::Quit => break,
            Line::Help => println!("{HELP}"),
        }
    }

    auth.shutdown().await?;
    Ok(())
}
