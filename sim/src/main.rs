use std::error::Error;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use sim::BoardState;
use stewart::protocol::FrameDecoder;
use stewart::PlatformConfig;

const DEFAULT_PORT: u16 = 16060;
const TELEMETRY_PERIOD: Duration = Duration::from_millis(100);
/// Log every Nth frame at info level.
const LOG_EVERY: u64 = 25;

async fn handle_client(
    socket: TcpStream,
    platform: PlatformConfig,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let peer = socket.peer_addr()?;
    let (mut reader, mut writer) = socket.into_split();

    let mut board = BoardState::new(platform);
    let mut decoder = FrameDecoder::new();
    let mut buffer = vec![0; 1024];
    let mut telemetry_timer = interval(TELEMETRY_PERIOD);
    telemetry_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            read = reader.read(&mut buffer) => {
                let n = read?;
                if n == 0 {
                    break;
                }

                for values in decoder.push(&buffer[..n]) {
                    board.receive(values);
                    if board.frames() % LOG_EVERY == 1 {
                        info!("frame #{} from {}: {:?}", board.frames(), peer, values);
                    } else {
                        debug!("frame #{}: {:?}", board.frames(), values);
                    }
                }
            }
            _ = telemetry_timer.tick() => {
                let line = board.telemetry().to_line();
                writer.write_all(line.as_bytes()).await?;
            }
        }
    }

    info!(
        "{} disconnected after {} frames ({} unreachable)",
        peer,
        board.frames(),
        board.rejected()
    );
    Ok(())
}

async fn start_server(port: u16, platform: PlatformConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Simulated platform board listening on {}", addr);

    loop {
        let (socket, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Failed to accept connection: {}", e);
                continue;
            }
        };
        info!("Host connected from {}", addr);
        let _ = socket.set_nodelay(true);

        let platform = platform.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, platform).await {
                warn!("Error handling host {}: {}", addr, e);
            }
        });
    }
}

/// Usage: `sim [port] [platform.json]`
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let port = match args.next() {
        Some(port) => port.parse()?,
        None => DEFAULT_PORT,
    };
    let platform = match args.next() {
        Some(path) => PlatformConfig::from_json(&tokio::fs::read_to_string(&path).await?)?,
        None => PlatformConfig::default(),
    };
    platform.validate()?;

    start_server(port, platform).await
}
