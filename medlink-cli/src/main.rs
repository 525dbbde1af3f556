use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use medlink::RoomId;
use medlink::client::{
    ClientConfig, ReportFile, ReportsClient, Role, SampleCapture, SessionEvent, Uploader, join_call,
};
use medlink::server::{ServerConfig, serve};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "medlink", version, about = "Call signaling for video consultations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Serve {
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long)]
        listen: Option<SocketAddr>,

        #[arg(long)]
        max_room_members: Option<usize>,
    },
    /// Join a room and report the role the relay assigns.
    Probe {
        room: String,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        relay: Option<String>,
    },
    /// Talk to the reports service.
    Reports {
        #[arg(long, env = "MEDLINK_REPORTS_URL", default_value = "http://127.0.0.1:5000")]
        base: String,

        #[arg(long, env = "MEDLINK_TOKEN")]
        token: String,

        #[command(subcommand)]
        action: ReportsAction,
    },
}

#[derive(Subcommand)]
enum ReportsAction {
    List {
        appointment: String,
    },
    Upload {
        appointment: String,
        file: PathBuf,

        #[arg(long, value_parser = parse_uploader, default_value = "patient")]
        by: Uploader,
    },
}

fn parse_uploader(raw: &str) -> Result<Uploader, String> {
    match raw {
        "doctor" => Ok(Uploader::Doctor),
        "patient" => Ok(Uploader::Patient),
        other => Err(format!("expected doctor or patient, got {other}")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("medlink=info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve {
            config,
            listen,
            max_room_members,
        } => {
            let mut config = match config {
                Some(path) => ServerConfig::load(&path)?,
                None => ServerConfig::default(),
            };
            if let Some(listen) = listen {
                config.listen = listen;
            }
            if max_room_members.is_some() {
                config.max_room_members = max_room_members;
            }

            println!("{}", "🩺 Starting medlink relay...".green().bold());
            println!("   🔌 Listening: ws://{}/ws", config.listen);
            if let Some(cap) = config.max_room_members {
                println!("   👥 Room cap:  {}", cap);
            }
            serve(config).await?;
        }
        Commands::Probe {
            room,
            config,
            relay,
        } => {
            let mut config = load_client_config(config.as_deref())?;
            if let Some(relay) = relay {
                config.relay_url = relay;
            }
            probe(&config, RoomId::new(room)).await?;
        }
        Commands::Reports {
            base,
            token,
            action,
        } => {
            let client = ReportsClient::new(base, token)?;
            match action {
                ReportsAction::List { appointment } => {
                    let reports = client.list(&appointment).await?;
                    if reports.is_empty() {
                        println!("{}", "No reports yet.".yellow());
                    }
                    for (i, report) in reports.iter().enumerate() {
                        println!(
                            "{} {}  {} at {}",
                            format!("#{}", i + 1).cyan(),
                            report.url,
                            report.uploaded_by.as_str(),
                            report.uploaded_at.to_rfc3339()
                        );
                    }
                }
                ReportsAction::Upload {
                    appointment,
                    file,
                    by,
                } => {
                    let report = read_report(&file)?;
                    let url = client.upload(report, &appointment, by).await?;
                    println!("{} {}", "✨ Uploaded:".green().bold(), url);
                }
            }
        }
    }

    Ok(())
}

fn load_client_config(path: Option<&Path>) -> Result<ClientConfig> {
    match path {
        Some(path) => ClientConfig::load(path),
        None => Ok(ClientConfig::default()),
    }
}

fn read_report(path: &Path) -> Result<ReportFile> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("Report path has no file name")?
        .to_owned();
    let mime = match path.extension().and_then(|e| e.to_str()) {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    };
    Ok(ReportFile {
        file_name,
        mime: mime.to_owned(),
        bytes,
    })
}

async fn probe(config: &ClientConfig, room: RoomId) -> Result<()> {
    println!("{}", format!("📡 Joining {} via {}", room, config.relay_url).cyan());
    let (handle, mut events) = join_call(config, room, &SampleCapture::new()).await?;

    let outcome = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(event) = events.recv().await {
            tracing::debug!(?event, "Session event");
            match event {
                SessionEvent::RoleAssigned(role) => return Ok(role),
                SessionEvent::Error(e) => return Err(anyhow::Error::new(e)),
                _ => {}
            }
        }
        bail!("session ended before a role was assigned")
    })
    .await
    .context("No role assigned within 10 seconds")?;

    handle.end_call().await;
    match outcome? {
        Role::Initiator => println!("{}", "✅ Initiator: first in the room".green().bold()),
        Role::Responder => println!("{}", "✅ Responder: someone is already here".green().bold()),
        Role::Unknown => println!("{}", "❔ Role unknown".yellow()),
    }
    Ok(())
}
