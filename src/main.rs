use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use school_chat::common::{ChatCommand, ChatEvent};
use school_chat::config::{self, AppConfig};
use school_chat::network::{ChatClient, HttpTransport};
use school_chat::storage::{self, ProfileDatabase, profile_db::DEFAULT_DB_PATH};
use school_chat::ui::ChatApp;
use school_chat::validation;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "school_chat", version, about = "Polling chat client")]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Chat endpoint URL (overrides config file and CHAT_API_URL)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,
    /// SQLite file holding the cached nickname
    #[arg(long, default_value = DEFAULT_DB_PATH, value_name = "FILE")]
    db: String,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone)]
enum Mode {
    /// Join a room without UI and log incoming messages
    Watch {
        #[arg(long)]
        username: String,
        #[arg(long)]
        room: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    dotenv().ok();
    // Khởi tạo Logger để debug
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config);
    app_config.apply_overrides(std::env::var(config::API_URL_ENV).ok(), cli.api_url.clone());
    if app_config.uses_placeholder_url() {
        log::warn!(
            "No chat endpoint configured; set {} or pass --api-url",
            config::API_URL_ENV
        );
    }

    match cli.mode {
        Some(Mode::Watch { username, room }) => {
            run_watch(app_config, username, room).await;
            Ok(())
        }
        None => run_gui(app_config, &cli.db).await,
    }
}

fn spawn_client(
    app_config: &AppConfig,
) -> (mpsc::Sender<ChatCommand>, mpsc::Receiver<ChatEvent>) {
    // UI -> Network
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // Network -> UI
    let (event_tx, event_rx) = mpsc::channel(100);

    let client = ChatClient::new(
        HttpTransport::new(app_config.api_url.clone()),
        app_config.sync_config(),
        app_config.echo_poll_delay(),
        event_tx,
        cmd_rx,
    );
    tokio::spawn(client.run());

    (cmd_tx, event_rx)
}

async fn run_watch(app_config: AppConfig, username: String, room: Option<String>) {
    let username = match validation::validate_username(&username, app_config.max_username_length)
    {
        Ok(username) => username,
        Err(err) => {
            log::error!("Invalid nickname: {err}");
            return;
        }
    };
    let room = room.unwrap_or_else(|| app_config.default_room.clone());

    let (cmd_tx, mut event_rx) = spawn_client(&app_config);
    if cmd_tx
        .send(ChatCommand::Login { username, room })
        .await
        .is_err()
    {
        log::error!("Chat client stopped before login");
        return;
    }

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(ChatEvent::MessageReceived(message)) => {
                    log::info!("[#{}] <{}> {}", message.room, message.username, message.message);
                }
                Some(ChatEvent::ConnectionChanged(connected)) => {
                    log::info!("{}", if connected { "Connected" } else { "Reconnecting..." });
                }
                Some(ChatEvent::RoomJoined(room)) => log::info!("You joined #{room}"),
                Some(_) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                let _ = cmd_tx.send(ChatCommand::Logout).await;
                break;
            }
        }
    }
}

async fn run_gui(app_config: AppConfig, db_path: &str) -> Result<(), eframe::Error> {
    let profile = match storage::ensure_data_dir(db_path)
        .map_err(|err| err.to_string())
        .and_then(|_| ProfileDatabase::with_path(db_path).map_err(|err| err.to_string()))
    {
        Ok(profile) => Some(profile),
        Err(err) => {
            log::warn!("Username cache unavailable ({db_path}): {err}");
            None
        }
    };

    let (cmd_tx, event_rx) = spawn_client(&app_config);

    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "School Chat",
        options,
        Box::new(move |cc| {
            log::info!("Client started against {}", app_config.api_url);

            Ok(Box::new(ChatApp::new(
                cc,
                &app_config,
                cmd_tx,
                event_rx,
                profile,
            )))
        }),
    )
}
