//! Frame loop thread that drives the simulation independently of rendering.
//!
//! The renderer never touches the world. Pointer input reaches the loop over
//! an `mpsc` channel and the loop publishes an immutable [`FrameSnapshot`]
//! into a shared slot during every DRAW phase.

use std::{
    sync::{
        mpsc::{self, Receiver, Sender, TryRecvError},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use anyhow::{anyhow, Context, Result};
use garden_defence_core::FramePhase;
use garden_defence_system_builder::BuilderInput;

use crate::simulation::{FrameSnapshot, Simulation};

/// Pause between two frames, in milliseconds, when no override is configured.
pub(crate) const DEFAULT_FRAME_WAIT_MS: u64 = 20;

const DEFAULT_FRAME_WAIT: Duration = Duration::from_millis(DEFAULT_FRAME_WAIT_MS);

/// Shared slot holding the most recently published frame.
pub(crate) type SnapshotSlot = Arc<Mutex<Option<FrameSnapshot>>>;

/// Messages accepted by the frame loop thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LoopMessage {
    /// Latest pointer state sampled by the renderer.
    Input(BuilderInput),
    /// Stop the loop at the next opportunity.
    Shutdown,
}

/// Runtime settings for the frame loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LoopConfig {
    pub(crate) frame_wait: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            frame_wait: DEFAULT_FRAME_WAIT,
        }
    }
}

/// Frame state machine: SETUP, then DRAW, WAIT and UPDATE in a cycle until END.
#[derive(Debug)]
struct FrameMachine {
    phase: FramePhase,
    simulation: Simulation,
    input: BuilderInput,
    last_update: Option<Instant>,
}

impl FrameMachine {
    fn new(simulation: Simulation) -> Self {
        Self {
            phase: FramePhase::Setup,
            simulation,
            input: BuilderInput::default(),
            last_update: None,
        }
    }

    fn phase(&self) -> FramePhase {
        self.phase
    }

    fn receive(&mut self, message: LoopMessage) {
        match message {
            LoopMessage::Input(input) => self.input = input,
            LoopMessage::Shutdown => self.transition(FramePhase::End),
        }
    }

    /// Performs the work of the current phase and moves to the next one.
    fn step(&mut self, now: Instant, slot: &Mutex<Option<FrameSnapshot>>) -> FramePhase {
        match self.phase {
            FramePhase::Setup => {
                self.last_update = Some(now);
                self.transition(FramePhase::Draw);
            }
            FramePhase::Update => {
                let dt = self
                    .last_update
                    .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
                self.last_update = Some(now);
                self.simulation.step(dt, self.input);
                self.transition(FramePhase::Draw);
            }
            FramePhase::Draw => {
                publish(slot, self.simulation.snapshot());
                self.transition(FramePhase::Wait);
            }
            FramePhase::Wait => self.transition(FramePhase::Update),
            FramePhase::End => {}
        }
        self.phase
    }

    fn transition(&mut self, next: FramePhase) {
        if self.phase != next {
            log::debug!("frame loop {:?} -> {:?}", self.phase, next);
            self.phase = next;
        }
    }
}

fn publish(slot: &Mutex<Option<FrameSnapshot>>, snapshot: FrameSnapshot) {
    let mut guard = match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = Some(snapshot);
}

/// Returns a copy of the latest published snapshot, if any.
pub(crate) fn latest_snapshot(slot: &Mutex<Option<FrameSnapshot>>) -> Option<FrameSnapshot> {
    match slot.lock() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Forwards pointer input to the frame loop, warning once if the loop is gone.
#[derive(Debug)]
pub(crate) struct InputForwarder {
    sender: Sender<LoopMessage>,
    disconnected: bool,
}

impl InputForwarder {
    pub(crate) fn new(sender: Sender<LoopMessage>) -> Self {
        Self {
            sender,
            disconnected: false,
        }
    }

    /// Sends `input` and reports whether the frame loop is still listening.
    pub(crate) fn forward(&mut self, input: BuilderInput) -> bool {
        if self.disconnected {
            return false;
        }
        if self.sender.send(LoopMessage::Input(input)).is_err() {
            log::warn!("frame loop stopped; pointer input is no longer delivered");
            self.disconnected = true;
        }
        !self.disconnected
    }
}

/// Handle owned by the render side of a running frame loop.
#[derive(Debug)]
pub(crate) struct LoopHandle {
    sender: Sender<LoopMessage>,
    snapshots: SnapshotSlot,
    thread: JoinHandle<()>,
}

impl LoopHandle {
    pub(crate) fn sender(&self) -> Sender<LoopMessage> {
        self.sender.clone()
    }

    pub(crate) fn snapshots(&self) -> SnapshotSlot {
        Arc::clone(&self.snapshots)
    }

    /// Requests the loop to stop and waits for its thread to finish.
    pub(crate) fn shutdown(self) -> Result<()> {
        let _ = self.sender.send(LoopMessage::Shutdown);
        self.thread
            .join()
            .map_err(|_| anyhow!("frame loop thread panicked"))
    }
}

/// Starts the frame loop on a dedicated thread.
pub(crate) fn spawn(simulation: Simulation, config: LoopConfig) -> Result<LoopHandle> {
    let (sender, receiver) = mpsc::channel::<LoopMessage>();
    let snapshots: SnapshotSlot = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&snapshots);

    let thread = thread::Builder::new()
        .name("garden-defence-frame-loop".into())
        .spawn(move || run(FrameMachine::new(simulation), &receiver, &slot, config))
        .context("failed to spawn frame loop thread")?;

    Ok(LoopHandle {
        sender,
        snapshots,
        thread,
    })
}

fn run(
    mut machine: FrameMachine,
    receiver: &Receiver<LoopMessage>,
    slot: &Mutex<Option<FrameSnapshot>>,
    config: LoopConfig,
) {
    let mut frames: u64 = 0;
    loop {
        loop {
            match receiver.try_recv() {
                Ok(message) => machine.receive(message),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    machine.receive(LoopMessage::Shutdown);
                    break;
                }
            }
        }

        match machine.phase() {
            FramePhase::End => break,
            FramePhase::Wait => thread::sleep(config.frame_wait),
            FramePhase::Update => frames += 1,
            FramePhase::Setup | FramePhase::Draw => {}
        }

        let _ = machine.step(Instant::now(), slot);
    }

    log::info!("frame loop stopped after {frames} updates");
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_defence_core::Coordinate;
    use garden_defence_system_spawning::Config as SpawnConfig;
    use garden_defence_world::{PathPoints, World};

    fn simulation() -> Simulation {
        let path = PathPoints::parse("2 0 300 600 300").expect("valid path");
        Simulation::new(World::new(path), SpawnConfig::new("s9").expect("valid script"))
    }

    #[test]
    fn phases_cycle_after_setup() {
        let mut machine = FrameMachine::new(simulation());
        let slot = Mutex::new(None);
        let start = Instant::now();

        let phases: Vec<FramePhase> = (0..7).map(|_| machine.step(start, &slot)).collect();

        assert_eq!(
            phases,
            vec![
                FramePhase::Draw,
                FramePhase::Wait,
                FramePhase::Update,
                FramePhase::Draw,
                FramePhase::Wait,
                FramePhase::Update,
                FramePhase::Draw,
            ]
        );
    }

    #[test]
    fn update_measures_wall_clock_delta_since_setup() {
        let mut machine = FrameMachine::new(simulation());
        let slot = Mutex::new(None);
        let start = Instant::now();

        let _ = machine.step(start, &slot);
        let _ = machine.step(start, &slot);
        let initial = latest_snapshot(&slot).expect("setup is followed by a draw");
        assert_eq!(initial.frame_counter, 0);
        assert!(initial.enemies.is_empty());

        let _ = machine.step(start, &slot);
        let _ = machine.step(start + Duration::from_secs(1), &slot);
        let _ = machine.step(start + Duration::from_secs(1), &slot);

        let snapshot = latest_snapshot(&slot).expect("draw publishes a snapshot");
        assert_eq!(snapshot.frame_counter, 1);
        assert_eq!(snapshot.enemies.len(), 1);
    }

    #[test]
    fn latest_input_wins() {
        let mut machine = FrameMachine::new(simulation());
        let first = BuilderInput::new(Some(Coordinate::new(1, 1)), false);
        let second = BuilderInput::new(Some(Coordinate::new(2, 2)), true);

        machine.receive(LoopMessage::Input(first));
        machine.receive(LoopMessage::Input(second));

        assert_eq!(machine.input, second);
    }

    #[test]
    fn shutdown_message_ends_the_machine() {
        let mut machine = FrameMachine::new(simulation());
        let slot = Mutex::new(None);

        machine.receive(LoopMessage::Shutdown);

        assert_eq!(machine.step(Instant::now(), &slot), FramePhase::End);
        assert!(latest_snapshot(&slot).is_none());
    }

    #[test]
    fn spawned_loop_publishes_and_stops() {
        let config = LoopConfig {
            frame_wait: Duration::from_millis(1),
        };
        let handle = spawn(simulation(), config).expect("thread spawns");
        let slot = handle.snapshots();

        let deadline = Instant::now() + Duration::from_secs(5);
        while latest_snapshot(&slot).is_none() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }

        assert!(latest_snapshot(&slot).is_some());
        handle.shutdown().expect("loop exits cleanly");
    }

    #[test]
    fn forwarder_stops_after_the_loop_hangs_up() {
        let (sender, receiver) = mpsc::channel();
        let mut forwarder = InputForwarder::new(sender);
        let input = BuilderInput::new(Some(Coordinate::new(3, 4)), false);

        assert!(forwarder.forward(input));
        assert_eq!(receiver.try_recv(), Ok(LoopMessage::Input(input)));

        drop(receiver);

        assert!(!forwarder.forward(input));
        assert!(!forwarder.forward(input));
        assert!(forwarder.disconnected);
    }

    #[test]
    fn default_config_uses_the_default_wait() {
        assert_eq!(
            LoopConfig::default().frame_wait,
            Duration::from_millis(DEFAULT_FRAME_WAIT_MS)
        );
    }

    #[test]
    fn dropped_channel_stops_the_loop() {
        let handle = spawn(simulation(), LoopConfig::default()).expect("thread spawns");
        let LoopHandle { sender, thread, .. } = handle;

        drop(sender);

        thread.join().expect("loop exits once the sender is gone");
    }
}
