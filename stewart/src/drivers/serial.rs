use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{duplex, split, AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::{PlatformConfig, StewartError};

use super::{StewartDriver, StewartDriverConfig};

/// Opens a serial port and bridges it to an async byte stream.
///
/// `serialport` is blocking, so two OS threads pump bytes between the port
/// and one end of an in-memory duplex pipe; the returned end plugs straight
/// into [`StewartDriver::attach`]. Read timeouts on the port are expected and
/// ignored. When either direction fails both threads exit, which the driver
/// sees as end-of-stream.
pub fn open_serial_stream(
    path: &str,
    baud_rate: u32,
    read_timeout: Duration,
) -> Result<DuplexStream, StewartError> {
    if path.is_empty() {
        return Err(StewartError::InvalidConfig("Serial port path cannot be empty.".to_string()));
    }

    let mut port = serialport::new(path, baud_rate)
        .timeout(read_timeout)
        .open()
        .map_err(|e| StewartError::SerialPort(format!("{}: {}", path, e)))?;
    let mut reader_port = port
        .try_clone()
        .map_err(|e| StewartError::SerialPort(format!("{}: {}", path, e)))?;

    info!("Opened serial port {} @ {} baud", path, baud_rate);

    let handle = Handle::try_current()
        .map_err(|e| StewartError::SerialPort(format!("no tokio runtime: {}", e)))?;
    let (app_side, bridge_side) = duplex(4096);
    let (mut bridge_read, mut bridge_write) = split(bridge_side);
    let closed = Arc::new(AtomicBool::new(false));

    // board -> host
    let reader_handle = handle.clone();
    let reader_closed = closed.clone();
    std::thread::spawn(move || {
        let mut buf = [0u8; 256];
        while !reader_closed.load(Ordering::Relaxed) {
            match reader_port.read(&mut buf) {
                Ok(0) => continue,
                Ok(n) => {
                    if reader_handle.block_on(bridge_write.write_all(&buf[..n])).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::TimedOut => continue,
                Err(e) => {
                    warn!("serial read failed: {}", e);
                    break;
                }
            }
        }
        reader_closed.store(true, Ordering::Relaxed);
    });

    // host -> board
    std::thread::spawn(move || {
        let mut buf = [0u8; 256];
        while !closed.load(Ordering::Relaxed) {
            let n = match handle.block_on(bridge_read.read(&mut buf)) {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            if let Err(e) = port.write_all(&buf[..n]).and_then(|_| port.flush()) {
                warn!("serial write failed: {}", e);
                break;
            }
        }
        closed.store(true, Ordering::Relaxed);
    });

    Ok(app_side)
}

impl StewartDriver {
    /// Opens `config.serial_path` at the platform's baud rate and starts streaming.
    pub async fn open_serial(
        config: StewartDriverConfig,
        platform: PlatformConfig,
    ) -> Result<StewartDriver, StewartError> {
        platform.validate().map_err(StewartError::InvalidConfig)?;
        let stream = open_serial_stream(&config.serial_path, platform.baud_rate, config.read_timeout)?;
        Self::from_stream(config, platform, stream).await
    }

    /// Reopens the serial port after a transport failure.
    pub async fn reopen_serial(&self, baud_rate: u32) -> Result<(), StewartError> {
        let stream = open_serial_stream(&self.config.serial_path, baud_rate, self.config.read_timeout)?;
        self.attach(stream).await
    }
}
