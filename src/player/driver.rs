//! Background driver thread
//!
//! Owns a `PlaybackEngine` on a dedicated thread, steps it, and feeds it
//! commands received over a channel between steps.

use super::engine::PlaybackEngine;
use super::state::PlaybackState;
use crate::bus::Command;
use crate::internal_error;
use crate::utils::error::{Result, StereoPlayError};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, warn};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How long a paused engine waits for commands between steps
pub const PAUSE_POLL: Duration = Duration::from_millis(10);

/// Spawns engines onto driver threads
pub struct Driver;

impl Driver {
    /// Run `engine` on a new thread until playback stops. The engine must be
    /// open; it is closed when the thread ends.
    pub fn spawn(engine: PlaybackEngine) -> Result<DriverHandle> {
        let (sender, receiver) = unbounded();
        if let Some(token) = engine.master_token() {
            token.attach_commands(sender.clone());
        }
        let thread = thread::Builder::new()
            .name("stereoplay-driver".to_string())
            .spawn(move || drive(engine, receiver))
            .map_err(|e| internal_error!("failed to spawn driver thread: {}", e))?;
        Ok(DriverHandle { sender, thread })
    }
}

fn apply(engine: &mut PlaybackEngine, command: Command) {
    if let Err(e) = engine.receive_command(command) {
        warn!("Command rejected: {}", e);
    }
}

fn drive(mut engine: PlaybackEngine, commands: Receiver<Command>) -> Result<()> {
    debug!("Driver started");
    let result = run_loop(&mut engine, &commands);
    if let Err(e) = &result {
        error!("Playback failed: {}", e);
    }
    engine.close();
    debug!("Driver finished");
    result
}

fn run_loop(engine: &mut PlaybackEngine, commands: &Receiver<Command>) -> Result<()> {
    let mut connected = true;
    loop {
        while let Ok(command) = commands.try_recv() {
            apply(engine, command);
        }
        let outcome = engine.run_step()?;
        if !outcome.more_work {
            return Ok(());
        }
        let wait = if engine.state() == PlaybackState::Paused {
            PAUSE_POLL
        } else {
            outcome.advisory_sleep
        };
        if wait.is_zero() {
            continue;
        }
        if !connected {
            thread::sleep(wait);
            continue;
        }
        match commands.recv_timeout(wait) {
            Ok(command) => apply(engine, command),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                connected = false;
                thread::sleep(wait);
            }
        }
    }
}

/// Handle to a running driver thread
pub struct DriverHandle {
    sender: Sender<Command>,
    thread: JoinHandle<Result<()>>,
}

impl DriverHandle {
    /// A sender for commands to the driven engine
    pub fn sender(&self) -> Sender<Command> {
        self.sender.clone()
    }

    pub fn send(&self, command: Command) -> Result<()> {
        self.sender
            .send(command)
            .map_err(|_| StereoPlayError::InvalidState("player has stopped".to_string()))
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for playback to end
    pub fn join(self) -> Result<()> {
        drop(self.sender);
        self.thread
            .join()
            .map_err(|_| internal_error!("driver thread panicked"))?
    }
}
