// Interactive jogging client for the Stewart platform
// Run with: cargo run -p example --bin jog_client
// Make sure the simulator is running: cargo run -p sim

use std::error::Error;
use std::io::{self, Write};
use std::time::Duration;

use stewart::drivers::{StewartDriver, StewartDriverConfig};
use stewart::{PlatformConfig, Pose};
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
    Z,
    Roll,
    Pitch,
    Yaw,
}

impl Axis {
    fn parse(name: &str) -> Option<Axis> {
        match name {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "z" => Some(Axis::Z),
            "roll" | "r" => Some(Axis::Roll),
            "pitch" | "p" => Some(Axis::Pitch),
            "yaw" | "w" => Some(Axis::Yaw),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    fn is_rotation(self) -> bool {
        self.index() >= 3
    }
}

#[derive(Debug, Clone)]
struct JogConfig {
    translation_step: f64, // mm
    rotation_step: f64,    // degrees
}

impl Default for JogConfig {
    fn default() -> Self {
        Self {
            translation_step: 2.0,
            rotation_step: 1.0,
        }
    }
}

/// Returns `pose` moved one step along `axis`.
fn jog(pose: Pose, axis: Axis, positive: bool, config: &JogConfig) -> Pose {
    let step = if axis.is_rotation() {
        config.rotation_step.to_radians()
    } else {
        config.translation_step
    };
    let mut pose = pose;
    *pose.axes_mut()[axis.index()] += if positive { step } else { -step };
    pose
}

fn read_line(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn display_status(driver: &StewartDriver, config: &JogConfig) {
    let snapshot = driver.snapshot();
    let pose = snapshot.pose;
    println!("\n╔════════════════════════════════════════════════╗");
    println!("║ Link:   {:<39}║", format!("{:?}", driver.link_state()));
    println!(
        "║ Pose:   x {:>6.1}  y {:>6.1}  z {:>6.1} mm        ║",
        pose.x, pose.y, pose.z
    );
    println!(
        "║         r {:>6.1}  p {:>6.1}  w {:>6.1} deg       ║",
        pose.roll.to_degrees(),
        pose.pitch.to_degrees(),
        pose.yaw.to_degrees()
    );
    let horns: Vec<String> = snapshot
        .alpha_degrees
        .iter()
        .map(|a| format!("{:.1}", a))
        .collect();
    println!("║ Horns:  {:<39}║", horns.join(" "));
    if let Some(t) = driver.telemetry() {
        println!(
            "║ IMU:    r {:>6.1}  p {:>6.1}  w {:>6.1}  {:>4.1}°C  ║",
            t.roll, t.pitch, t.yaw, t.temperature
        );
    }
    println!(
        "║ Steps:  {:.2} mm / {:.2} deg{:<19}║",
        config.translation_step, config.rotation_step, ""
    );
    println!("╚════════════════════════════════════════════════╝");
}

fn print_help() {
    println!("\n┌─────────────────────────────────────────┐");
    println!("│ MOTION:                                 │");
    println!("│  x+ x- y+ y- z+ z-      translate       │");
    println!("│  r+ r- p+ p- w+ w-      roll/pitch/yaw  │");
    println!("│  home  = ease back to home              │");
    println!("│  stop  = stop homing where it is        │");
    println!("│                                         │");
    println!("│ OTHER:                                  │");
    println!("│  step <mm> <deg> = set jog steps        │");
    println!("│  resume = restart a suspended stream    │");
    println!("│  ?     = help        q = quit           │");
    println!("└─────────────────────────────────────────┘");
}

fn parse_steps(args: &[&str]) -> Result<JogConfig, String> {
    let [mm, deg] = args else {
        return Err("usage: step <mm> <deg>".to_string());
    };
    let translation_step: f64 = mm.parse().map_err(|_| "Invalid number".to_string())?;
    let rotation_step: f64 = deg.parse().map_err(|_| "Invalid number".to_string())?;
    if !(translation_step > 0.0 && translation_step <= 20.0) {
        return Err("Translation step must be between 0 and 20 mm".to_string());
    }
    if !(rotation_step > 0.0 && rotation_step <= 10.0) {
        return Err("Rotation step must be between 0 and 10 degrees".to_string());
    }
    Ok(JogConfig {
        translation_step,
        rotation_step,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("=== Stewart Platform Jogging Client ===\n");

    let driver_settings = StewartDriverConfig::new("127.0.0.1".to_string(), 16060);
    println!("Connecting to board at {}...", driver_settings.connection_url());
    let driver = StewartDriver::connect(driver_settings, PlatformConfig::default()).await?;

    let mut log_rx = driver.subscribe_log();
    tokio::spawn(async move {
        while let Ok(message) = log_rx.recv().await {
            println!("📥 {}", message);
        }
    });

    let mut config = JogConfig::default();
    println!("\n✓ Connected!\n");
    print_help();

    loop {
        display_status(&driver, &config);
        let input = read_line("\nCommand: ")?;
        let words: Vec<&str> = input.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            continue;
        };

        match command {
            "q" | "quit" => {
                println!("\nShutting down...");
                driver.shutdown().await?;
                sleep(Duration::from_millis(100)).await;
                break;
            }
            "?" | "help" => print_help(),
            "home" => driver.go_home().await?,
            "stop" => driver.stop_homing().await?,
            "resume" => driver.resume().await?,
            "step" => match parse_steps(args) {
                Ok(steps) => {
                    config = steps;
                    println!("✓ Steps set");
                }
                Err(e) => println!("Error: {}", e),
            },
            other => {
                let (name, positive) = match other.strip_suffix('+') {
                    Some(name) => (name, true),
                    None => match other.strip_suffix('-') {
                        Some(name) => (name, false),
                        None => (other, true),
                    },
                };
                let Some(axis) = Axis::parse(name) else {
                    println!("Unknown command: '{}'", other);
                    continue;
                };

                let target = jog(driver.snapshot().pose, axis, positive, &config);
                driver.apply_pose(target).await?;
                sleep(Duration::from_millis(50)).await;
                if !driver.snapshot().valid {
                    println!("⚠ Pose is out of reach; horn angles are undefined");
                }
            }
        }
    }

    println!("Disconnected.");
    Ok(())
}
