use std::time::Duration;

use tokio::io::{split, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, timeout, MissedTickBehavior};
#[cfg(feature = "logging")]
use tracing::info;
use tracing::{debug, warn};

use crate::protocol::extract_lines;
use crate::{
    CadenceController, CadenceOutcome, HomingController, HomingState, KinematicsSnapshot,
    PlatformConfig, Pose, StewartError, StewartKinematics, Telemetry,
};

use super::{LinkState, StewartDriverConfig};

type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;
type BoxedWriter = Box<dyn AsyncWrite + Unpin + Send>;

enum ControlCommand {
    ApplyPose(Pose),
    GoHome,
    StopHoming,
    Attach(BoxedReader, BoxedWriter),
    Detach,
    Resume,
    Shutdown,
}

/// Messages from the reader task. `generation` identifies the transport they
/// came from so a replaced link cannot affect its successor.
enum LinkEvent {
    Telemetry { generation: u64, telemetry: Telemetry },
    Closed { generation: u64, reason: String },
}

/// Handle to a running platform driver.
///
/// All kinematics live on a single control task: pose updates, the
/// return-to-home animation and the transmit cadence are serialized there, so
/// the solver state needs no locking. Inbound telemetry is read on a separate
/// task and handed to the control task over a channel before being published.
///
/// Cloning the handle is cheap; every clone talks to the same control task.
#[derive(Debug, Clone)]
pub struct StewartDriver {
    pub config: StewartDriverConfig,
    pub log_channel: broadcast::Sender<String>,
    command_tx: mpsc::Sender<ControlCommand>,
    snapshot_rx: watch::Receiver<KinematicsSnapshot>,
    telemetry_rx: watch::Receiver<Option<Telemetry>>,
    link_rx: watch::Receiver<LinkState>,
}

impl std::fmt::Debug for ControlCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlCommand::ApplyPose(pose) => f.debug_tuple("ApplyPose").field(pose).finish(),
            ControlCommand::GoHome => f.write_str("GoHome"),
            ControlCommand::StopHoming => f.write_str("StopHoming"),
            ControlCommand::Attach(..) => f.write_str("Attach"),
            ControlCommand::Detach => f.write_str("Detach"),
            ControlCommand::Resume => f.write_str("Resume"),
            ControlCommand::Shutdown => f.write_str("Shutdown"),
        }
    }
}

impl StewartDriver {
    /// Starts the control task without a transport.
    ///
    /// The kinematics run and publish snapshots; nothing is transmitted until
    /// a stream is attached.
    ///
    /// # Errors
    ///
    /// Returns `StewartError::InvalidConfig` if either configuration fails
    /// validation.
    pub fn spawn(
        config: StewartDriverConfig,
        platform: PlatformConfig,
    ) -> Result<StewartDriver, StewartError> {
        config.validate().map_err(StewartError::InvalidConfig)?;
        platform.validate().map_err(StewartError::InvalidConfig)?;

        let kinematics = StewartKinematics::from_config(platform);
        let (log_channel, _rx) = broadcast::channel(100);
        let (command_tx, command_rx) = mpsc::channel(config.max_messages);
        let (event_tx, event_rx) = mpsc::channel(config.max_messages);
        let (snapshot_tx, snapshot_rx) = watch::channel(kinematics.snapshot());
        let (telemetry_tx, telemetry_rx) = watch::channel(None);
        let (link_tx, link_rx) = watch::channel(LinkState::Detached);

        let control = ControlLoop {
            config: config.clone(),
            kinematics,
            cadence: CadenceController::new(config.nan_policy),
            homing: HomingController::new(config.homing),
            writer: None,
            reader_task: None,
            generation: 0,
            event_tx,
            log_channel: log_channel.clone(),
            snapshot_tx,
            telemetry_tx,
            link_tx,
        };

        tokio::spawn(control.run(command_rx, event_rx));

        Ok(Self {
            config,
            log_channel,
            command_tx,
            snapshot_rx,
            telemetry_rx,
            link_rx,
        })
    }

    /// Starts the driver on an already open byte stream.
    pub async fn from_stream<S>(
        config: StewartDriverConfig,
        platform: PlatformConfig,
        stream: S,
    ) -> Result<StewartDriver, StewartError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let driver = Self::spawn(config, platform)?;
        driver.attach(stream).await?;
        Ok(driver)
    }

    /// Connects over TCP (simulator or a serial-to-network bridge) and starts streaming.
    ///
    /// # Errors
    ///
    /// Fails with `StewartError::Disconnected` if no connection could be made
    /// after three attempts.
    pub async fn connect(
        config: StewartDriverConfig,
        platform: PlatformConfig,
    ) -> Result<StewartDriver, StewartError> {
        config.validate_tcp().map_err(StewartError::InvalidConfig)?;
        let stream = connect_with_retries(&config.connection_url(), 3).await?;
        Self::from_stream(config, platform, stream).await
    }

    /// Reopens the TCP link after a transport failure.
    pub async fn reconnect(&self) -> Result<(), StewartError> {
        self.config.validate_tcp().map_err(StewartError::InvalidConfig)?;
        let stream = connect_with_retries(&self.config.connection_url(), 3).await?;
        self.attach(stream).await
    }

    /// Replaces the transport. Any previous one is dropped first.
    pub async fn attach<S>(&self, stream: S) -> Result<(), StewartError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = split(stream);
        self.send(ControlCommand::Attach(Box::new(read_half), Box::new(write_half)))
            .await
    }

    pub async fn detach(&self) -> Result<(), StewartError> {
        self.send(ControlCommand::Detach).await
    }

    /// Commands a new pose. Cancels a return-to-home in progress.
    pub async fn apply_pose(&self, pose: Pose) -> Result<(), StewartError> {
        self.send(ControlCommand::ApplyPose(pose)).await
    }

    /// Starts easing the pose back to home.
    pub async fn go_home(&self) -> Result<(), StewartError> {
        self.send(ControlCommand::GoHome).await
    }

    pub async fn stop_homing(&self) -> Result<(), StewartError> {
        self.send(ControlCommand::StopHoming).await
    }

    /// Restarts streaming after a suspension caused by an undefined solve.
    pub async fn resume(&self) -> Result<(), StewartError> {
        self.send(ControlCommand::Resume).await
    }

    /// Stops the control task and drops the transport.
    pub async fn shutdown(&self) -> Result<(), StewartError> {
        self.send(ControlCommand::Shutdown).await
    }

    /// Latest solve.
    pub fn snapshot(&self) -> KinematicsSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<KinematicsSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Latest telemetry line received, if any.
    pub fn telemetry(&self) -> Option<Telemetry> {
        *self.telemetry_rx.borrow()
    }

    pub fn subscribe_telemetry(&self) -> watch::Receiver<Option<Telemetry>> {
        self.telemetry_rx.clone()
    }

    pub fn link_state(&self) -> LinkState {
        *self.link_rx.borrow()
    }

    pub fn subscribe_link_state(&self) -> watch::Receiver<LinkState> {
        self.link_rx.clone()
    }

    pub fn subscribe_log(&self) -> broadcast::Receiver<String> {
        self.log_channel.subscribe()
    }

    async fn send(&self, command: ControlCommand) -> Result<(), StewartError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| StewartError::DriverClosed)
    }
}

struct ControlLoop {
    config: StewartDriverConfig,
    kinematics: StewartKinematics,
    cadence: CadenceController,
    homing: HomingController,

    writer: Option<BoxedWriter>,
    reader_task: Option<JoinHandle<()>>,
    generation: u64,
    event_tx: mpsc::Sender<LinkEvent>,

    log_channel: broadcast::Sender<String>,
    snapshot_tx: watch::Sender<KinematicsSnapshot>,
    telemetry_tx: watch::Sender<Option<Telemetry>>,
    link_tx: watch::Sender<LinkState>,
}

impl ControlLoop {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<ControlCommand>,
        mut events: mpsc::Receiver<LinkEvent>,
    ) {
        let mut send_timer = interval(self.config.send_interval);
        send_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut homing_timer = interval(self.config.homing.interval);
        homing_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let command = match command {
                        None | Some(ControlCommand::Shutdown) => break,
                        Some(command) => command,
                    };
                    let was_animating = self.homing.is_animating();
                    self.handle_command(command).await;
                    if !was_animating && self.homing.is_animating() {
                        homing_timer.reset();
                    }
                }
                _ = send_timer.tick() => self.transmit().await,
                _ = homing_timer.tick(), if self.homing.is_animating() => self.step_homing(),
                Some(event) = events.recv() => self.handle_event(event).await,
            }
        }

        self.drop_transport().await;
        self.log_message("Control task stopped");
    }

    async fn handle_command(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::ApplyPose(pose) => {
                if self.homing.is_animating() {
                    self.homing.cancel();
                    self.log_message("Return to home interrupted by new pose");
                }
                self.kinematics.apply_pose(pose);
                self.publish_snapshot();
            }
            ControlCommand::GoHome => {
                if !self.homing.is_animating() {
                    self.log_message("Returning to home");
                }
                self.homing.request();
            }
            ControlCommand::StopHoming => self.homing.cancel(),
            ControlCommand::Attach(reader, writer) => self.attach(reader, writer).await,
            ControlCommand::Detach => {
                self.drop_transport().await;
                self.cadence.detach();
                self.publish_link_state();
                self.log_message("Transport detached");
            }
            ControlCommand::Resume => {
                if self.cadence.resume() {
                    self.publish_link_state();
                    self.log_message("Streaming resumed");
                }
            }
            ControlCommand::Shutdown => {}
        }
    }

    async fn attach(&mut self, reader: BoxedReader, writer: BoxedWriter) {
        self.drop_transport().await;

        self.generation += 1;
        let generation = self.generation;
        let events = self.event_tx.clone();
        self.reader_task = Some(tokio::spawn(read_telemetry(reader, generation, events)));
        self.writer = Some(writer);

        self.cadence.attach();
        self.publish_link_state();
        self.log_message(format!("Transport attached (link #{})", generation));
    }

    async fn drop_transport(&mut self) {
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.shutdown().await;
        }
    }

    /// One cadence tick: sample the current solve and write it out.
    async fn transmit(&mut self) {
        match self.cadence.tick(&self.kinematics) {
            CadenceOutcome::Transmit(frame) => {
                let Some(writer) = self.writer.as_mut() else {
                    return;
                };
                let result = timeout(self.config.write_timeout, async {
                    writer.write_all(&frame).await?;
                    writer.flush().await
                })
                .await;

                let error = match result {
                    Ok(Ok(())) => return,
                    Ok(Err(e)) => StewartError::FailedToSend(e.to_string()),
                    Err(_) => StewartError::FailedToSend(format!(
                        "write timed out after {:?}",
                        self.config.write_timeout
                    )),
                };
                self.transport_failed(error).await;
            }
            CadenceOutcome::Skipped => {
                debug!("undefined leg angle, skipping transmit tick");
            }
            CadenceOutcome::Suspended => {
                warn!("undefined leg angle, streaming suspended");
                self.publish_link_state();
                self.log_message("Pose has no valid solution; streaming suspended");
            }
            CadenceOutcome::Inactive => {}
        }
    }

    fn step_homing(&mut self) {
        let mut pose = self.kinematics.pose();
        let state = self.homing.tick(&mut pose);
        self.kinematics.apply_pose(pose);
        self.publish_snapshot();

        if state == HomingState::Idle {
            self.log_message("Platform at home");
        }
    }

    async fn handle_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Telemetry { generation, telemetry } => {
                if generation == self.generation {
                    self.telemetry_tx.send_replace(Some(telemetry));
                }
            }
            LinkEvent::Closed { generation, reason } => {
                if generation == self.generation && self.writer.is_some() {
                    self.transport_failed(StewartError::FailedToReceive(reason)).await;
                }
            }
        }
    }

    async fn transport_failed(&mut self, error: StewartError) {
        warn!("transport failed: {}", error);
        self.drop_transport().await;
        self.cadence.fail();
        self.publish_link_state();
        self.log_message(format!("Transport failed: {}", error));
    }

    fn publish_snapshot(&self) {
        self.snapshot_tx.send_replace(self.kinematics.snapshot());
    }

    fn publish_link_state(&self) {
        self.link_tx.send_replace(self.cadence.state());
    }

    fn log_message<T: Into<String>>(&self, message: T) {
        let message = message.into();
        #[cfg(feature = "logging")]
        info!("{}", message);
        let _ = self.log_channel.send(message);
    }
}

/// Reads inbound bytes, splits them into lines and forwards parsed telemetry.
///
/// Malformed lines are dropped. Ends on EOF or a read error, reporting the
/// closure to the control task.
async fn read_telemetry(
    mut reader: BoxedReader,
    generation: u64,
    events: mpsc::Sender<LinkEvent>,
) {
    let mut buf = vec![0; 2048];
    let mut pending = Vec::new();

    let reason = loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break "connection closed".to_string(),
            Ok(n) => n,
            Err(e) => break e.to_string(),
        };

        pending.extend_from_slice(&buf[..n]);
        for line in extract_lines(&mut pending) {
            match Telemetry::parse(&line) {
                Some(telemetry) => {
                    let event = LinkEvent::Telemetry { generation, telemetry };
                    if events.send(event).await.is_err() {
                        return;
                    }
                }
                None => debug!("dropping inbound line: {:?}", line),
            }
        }
    };

    let _ = events.send(LinkEvent::Closed { generation, reason }).await;
}

async fn connect_with_retries(addr: &str, retries: u32) -> Result<TcpStream, StewartError> {
    for attempt in 0..retries {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                let _ = stream.set_nodelay(true);
                return Ok(stream);
            }
            Err(e) => {
                warn!("Failed to connect to {} (attempt {}): {}", addr, attempt + 1, e);
                if attempt + 1 == retries {
                    return Err(StewartError::Disconnected);
                }
                sleep(Duration::from_secs(2)).await;
            }
        }
    }
    Err(StewartError::Disconnected)
}
