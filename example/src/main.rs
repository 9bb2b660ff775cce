// Scripted demo: tilt the platform through a few poses, then ease it home.
// Run with: cargo run -p example [-- <host:port>]
// Make sure the simulator is running: cargo run -p sim

use std::time::Duration;

use stewart::drivers::{LinkState, StewartDriver, StewartDriverConfig};
use stewart::{PlatformConfig, Pose, StewartError};
use tokio::time::sleep;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn demo_poses() -> Vec<(&'static str, Pose)> {
    vec![
        ("raise", Pose::from_degrees(0.0, 0.0, 10.0, 0.0, 0.0, 0.0)),
        ("roll", Pose::from_degrees(0.0, 0.0, 10.0, 6.0, 0.0, 0.0)),
        ("pitch", Pose::from_degrees(0.0, 0.0, 10.0, 0.0, -6.0, 0.0)),
        ("twist", Pose::from_degrees(5.0, -5.0, 5.0, 0.0, 0.0, 10.0)),
        ("combined", Pose::from_degrees(10.0, -10.0, 5.0, 3.0, -2.0, 1.0)),
    ]
}

async fn open_driver(target: Option<String>) -> Result<StewartDriver, StewartError> {
    let platform = PlatformConfig::default();

    #[cfg(feature = "serial")]
    if let Some(path) = target.as_deref().filter(|t| t.starts_with("/dev/") || t.starts_with("COM")) {
        let config = StewartDriverConfig {
            serial_path: path.to_string(),
            ..Default::default()
        };
        println!("Opening serial port {} @ {} baud...", path, platform.baud_rate);
        return StewartDriver::open_serial(config, platform).await;
    }

    let mut config = StewartDriverConfig::default();
    if let Some(target) = target {
        let (addr, port) = target
            .rsplit_once(':')
            .ok_or_else(|| StewartError::InvalidConfig(format!("expected host:port, got {}", target)))?;
        config.addr = addr.to_string();
        config.port = port
            .parse()
            .map_err(|_| StewartError::InvalidConfig(format!("invalid port {}", port)))?;
    }

    println!("Connecting to board at {}...", config.connection_url());
    StewartDriver::connect(config, platform).await
}

#[tokio::main]
async fn main() -> Result<(), StewartError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let driver = open_driver(std::env::args().nth(1)).await?;
    println!("Connected successfully");

    let mut telemetry_rx = driver.subscribe_telemetry();
    tokio::spawn(async move {
        while telemetry_rx.changed().await.is_ok() {
            let latest = *telemetry_rx.borrow_and_update();
            if let Some(t) = latest {
                println!(
                    "📥 roll {:6.1}°  pitch {:6.1}°  yaw {:6.1}°  temp {:4.1}°C",
                    t.roll, t.pitch, t.yaw, t.temperature
                );
            }
        }
    });

    for (name, pose) in demo_poses() {
        driver.apply_pose(pose).await?;
        sleep(Duration::from_millis(50)).await;

        let snapshot = driver.snapshot();
        if snapshot.valid {
            info!("{}: horn angles {:.2?}", name, snapshot.alpha_degrees);
        } else {
            warn!("{}: pose is out of reach, not streamed", name);
        }
        if snapshot.saturated.iter().any(|s| *s) {
            warn!("{}: some legs are at full extension", name);
        }
        sleep(Duration::from_secs(1)).await;
    }

    println!("Returning to home...");
    driver.go_home().await?;
    let mut snapshots = driver.subscribe_snapshots();
    while !snapshots.borrow_and_update().pose.is_home() {
        if snapshots.changed().await.is_err() {
            break;
        }
    }
    println!("At home");

    sleep(Duration::from_millis(500)).await;
    if driver.link_state() != LinkState::Streaming {
        warn!("link ended in state {:?}", driver.link_state());
    }
    driver.shutdown().await?;
    sleep(Duration::from_millis(100)).await;

    Ok(())
}
