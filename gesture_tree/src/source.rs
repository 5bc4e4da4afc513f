//! Landmark sources — a real recognizer process, a recording, or a simulated
//! hand driven from the window.
//!
//! Every source runs on its own thread and delivers [`SourceMessage`]s over a
//! channel.  The frame loop drains that channel through a [`GestureSession`]
//! without ever blocking.  Tearing the session down stops the thread, kills
//! any recognizer process, and discards whatever was still in flight.

use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use gesture_intent::{
    decode_line, Landmark, LandmarkFrame, RecognizerSample, WireGesture, HAND_LANDMARKS,
    INDEX_TIP, THUMB_TIP, WRIST,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// How often a blocked source wakes to check for cancellation.
const CANCEL_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot start recognizer `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source:  std::io::Error,
    },
    #[error("recognizer did not signal ready (got {0:?})")]
    Handshake(String),
    #[error("cannot open recording {path}: {source}")]
    Replay {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ════════════════════════════════════════════════════════════════════════════
// SourceMessage / CancelToken
// ════════════════════════════════════════════════════════════════════════════

/// What a source hands to the frame loop.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceMessage {
    /// One recognizer result.
    Sample(LandmarkFrame),
    /// Human-readable state of the source, shown in the status bar.
    Status(String),
}

/// Shared stop flag between a session and its source thread.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) { self.0.store(true, Ordering::SeqCst); }
    pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::SeqCst) }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource trait + GestureSession
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver recognizer samples over a channel.
///
/// `run` must return promptly once `cancel` is set or `tx` is closed.
pub trait LandmarkSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<SourceMessage>, cancel: CancelToken);
}

/// Everything drained from a session in one frame.
#[derive(Debug, Default)]
pub struct Drained {
    /// Samples in arrival order.
    pub samples: Vec<LandmarkFrame>,
    /// The most recent status, if any arrived.
    pub status:  Option<String>,
}

/// Handle to a running source.  Dropping it shuts the source down.
pub struct GestureSession {
    rx:     Option<Receiver<SourceMessage>>,
    cancel: CancelToken,
    handle: Option<JoinHandle<()>>,
}

impl GestureSession {
    /// Spawn `source` on its own thread.
    pub fn spawn<S: LandmarkSource>(source: S) -> Self {
        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::default();
        let thread_cancel = cancel.clone();
        let handle = thread::Builder::new()
            .name("landmark-source".into())
            .spawn(move || Box::new(source).run(tx, thread_cancel));

        match handle {
            Ok(handle) => GestureSession { rx: Some(rx), cancel, handle: Some(handle) },
            Err(e) => {
                warn!(error = %e, "could not start landmark source thread");
                GestureSession { rx: None, cancel, handle: None }
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.rx.is_some() && !self.cancel.is_cancelled()
    }

    /// Drain everything queued since the last call.  Never blocks.
    pub fn poll(&mut self) -> Drained {
        let mut out = Drained::default();
        if self.cancel.is_cancelled() {
            return out;
        }
        let Some(rx) = &self.rx else { return out };
        let finished = loop {
            match rx.try_recv() {
                Ok(SourceMessage::Sample(frame)) => out.samples.push(frame),
                Ok(SourceMessage::Status(s))     => out.status = Some(s),
                Err(mpsc::TryRecvError::Empty)        => break false,
                Err(mpsc::TryRecvError::Disconnected) => break true,
            }
        };
        if finished {
            debug!("landmark source finished");
            self.rx = None;
        }
        out
    }

    /// Stop the source and discard anything still in flight.
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        self.rx = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("landmark source thread panicked");
            }
            info!("gesture session stopped");
        }
    }
}

impl Drop for GestureSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Split a byte stream into lines.  Invalid UTF-8 is replaced rather than
/// ending the stream; such a line then fails to decode and is skipped.
fn lossy_lines<R: BufRead>(mut reader: R) -> impl Iterator<Item = std::io::Result<String>> {
    let mut buf = Vec::new();
    std::iter::from_fn(move || {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => None,
            Ok(_) => {
                while matches!(buf.last(), Some(b'\n' | b'\r')) {
                    buf.pop();
                }
                Some(Ok(String::from_utf8_lossy(&buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    })
}

// ════════════════════════════════════════════════════════════════════════════
// CommandLandmarkSource — external recognizer process
// ════════════════════════════════════════════════════════════════════════════

/// Runs a recognizer (camera + hand landmark model) as a child process.
///
/// The child must print `ready_line` once its model is loaded, then one
/// JSON object per camera frame on stdout.  Its stderr is inherited.
pub struct CommandLandmarkSource {
    pub program:    String,
    pub args:       Vec<String>,
    pub ready_line: String,
}

/// Kills the recognizer when the source thread exits, however it exits.
struct ChildGuard(Child);

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

impl CommandLandmarkSource {
    fn start(&self) -> Result<(ChildGuard, Receiver<std::io::Result<String>>), SourceError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| SourceError::Spawn { program: self.program.clone(), source })?;
        let mut guard = ChildGuard(child);

        let stdout = guard
            .0
            .stdout
            .take()
            .ok_or_else(|| SourceError::Handshake("no stdout".to_string()))?;

        // Blocking reads happen on a helper thread so the source loop can keep
        // checking for cancellation.
        let (line_tx, line_rx) = mpsc::channel();
        thread::spawn(move || {
            for line in lossy_lines(BufReader::new(stdout)) {
                let failed = line.is_err();
                if line_tx.send(line).is_err() || failed {
                    return;
                }
            }
        });

        Ok((guard, line_rx))
    }
}

impl LandmarkSource for CommandLandmarkSource {
    fn run(self: Box<Self>, tx: Sender<SourceMessage>, cancel: CancelToken) {
        let _ = tx.send(SourceMessage::Status(format!("starting recognizer `{}`…", self.program)));

        let (_guard, lines) = match self.start() {
            Ok(started) => started,
            Err(e) => {
                warn!(error = %e, "gesture control unavailable");
                let _ = tx.send(SourceMessage::Status(format!("gesture control off: {}", e)));
                return;
            }
        };

        let mut ready = self.ready_line.is_empty();

        while !cancel.is_cancelled() {
            let line = match lines.recv_timeout(CANCEL_POLL) {
                Ok(Ok(line)) => line,
                Ok(Err(e)) => {
                    warn!(error = %e, "recognizer stream failed");
                    let _ = tx.send(SourceMessage::Status(format!("recognizer stream failed: {}", e)));
                    return;
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("recognizer exited");
                    let _ = tx.send(SourceMessage::Status("recognizer exited — gesture control off".into()));
                    return;
                }
            };

            if !ready {
                if line.trim() == self.ready_line {
                    ready = true;
                    info!(program = %self.program, "recognizer ready");
                    let _ = tx.send(SourceMessage::Status("gesture control ready".into()));
                    continue;
                }
                let e = SourceError::Handshake(line);
                warn!(error = %e, "gesture control unavailable");
                let _ = tx.send(SourceMessage::Status(format!("gesture control off: {}", e)));
                return;
            }

            match decode_line(&line) {
                Ok(sample) => {
                    if tx.send(SourceMessage::Sample(sample.into_frame())).is_err() {
                        return;
                    }
                }
                Err(e) => debug!(error = %e, "skipping recognizer line"),
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ReplayLandmarkSource — recorded JSON Lines
// ════════════════════════════════════════════════════════════════════════════

/// Plays back a recording at `fps`, then reports "no hand" until stopped.
pub struct ReplayLandmarkSource {
    pub path: PathBuf,
    pub fps:  f32,
}

impl ReplayLandmarkSource {
    fn open(&self) -> Result<Vec<String>, SourceError> {
        let file = std::fs::File::open(&self.path)
            .map_err(|source| SourceError::Replay { path: self.path.clone(), source })?;
        Ok(lossy_lines(BufReader::new(file)).collect::<Result<Vec<String>, _>>()?)
    }
}

impl LandmarkSource for ReplayLandmarkSource {
    fn run(self: Box<Self>, tx: Sender<SourceMessage>, cancel: CancelToken) {
        let lines = match self.open() {
            Ok(lines) => lines,
            Err(e) => {
                warn!(error = %e, "gesture control unavailable");
                let _ = tx.send(SourceMessage::Status(format!("gesture control off: {}", e)));
                return;
            }
        };
        let interval = Duration::from_secs_f32(1.0 / self.fps.max(1.0));
        info!(path = %self.path.display(), frames = lines.len(), "replaying recording");
        let _ = tx.send(SourceMessage::Status(format!("replaying {}", self.path.display())));

        let frames = lines.iter().filter_map(|l| match decode_line(l) {
            Ok(s) => Some(s.into_frame()),
            Err(e) => {
                debug!(error = %e, "skipping recorded line");
                None
            }
        });

        for frame in frames.chain(std::iter::repeat_with(LandmarkFrame::empty)) {
            if cancel.is_cancelled() || tx.send(SourceMessage::Sample(frame)).is_err() {
                return;
            }
            thread::sleep(interval);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimLandmarkSource — window-driven synthetic hand (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input from the visualizer window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    /// Pointer position, 0.0–1.0 with a top-left origin.  Sent once per
    /// window frame; each one becomes a camera frame.
    Pointer { x: f32, y: f32 },
    KeyDown(SimKey),
    KeyUp(SimKey),
}

/// Simulated hand poses (mapped from minifb keys).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimKey {
    OpenPalm,   // O
    ClosedFist, // F
    Pinch,      // P
    HideHand,   // H
}

/// Held pose keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimPose {
    pub open_palm:   bool,
    pub closed_fist: bool,
    pub pinch:       bool,
    pub hidden:      bool,
}

impl SimPose {
    fn set(&mut self, key: SimKey, down: bool) {
        match key {
            SimKey::OpenPalm   => self.open_palm   = down,
            SimKey::ClosedFist => self.closed_fist = down,
            SimKey::Pinch      => self.pinch       = down,
            SimKey::HideHand   => self.hidden      = down,
        }
    }
}

/// Build the sample a recognizer would report for a hand whose thumb/index
/// midpoint sits at `(x, y)`.
pub fn synthesize_hand(x: f32, y: f32, pose: SimPose) -> RecognizerSample {
    if pose.hidden {
        return RecognizerSample::default();
    }

    let mut landmarks = vec![Landmark::new(x, y + 0.08, 0.0); HAND_LANDMARKS];
    landmarks[WRIST] = Landmark::new(x, y + 0.2, 0.0);
    for (i, lm) in landmarks.iter_mut().enumerate().skip(1) {
        // Fan the finger joints out above the wrist.
        let finger = (i - 1) / 4;
        let joint  = (i - 1) % 4 + 1;
        lm.x = x + (finger as f32 - 2.0) * 0.03;
        lm.y = y + 0.2 - joint as f32 * 0.04;
        lm.z = -0.01 * joint as f32;
    }
    let half = if pose.pinch { 0.01 } else { 0.08 };
    landmarks[THUMB_TIP] = Landmark::new(x - half, y, -0.02);
    landmarks[INDEX_TIP] = Landmark::new(x + half, y, -0.02);

    let (label, score) = if pose.open_palm {
        ("Open_Palm", 0.92)
    } else if pose.closed_fist {
        ("Closed_Fist", 0.9)
    } else {
        ("None", 0.75)
    };

    RecognizerSample {
        landmarks,
        gestures: vec![WireGesture { label: label.to_string(), score }],
    }
}

/// Gesture source driven by [`SimInput`] events from the visualizer window.
pub struct SimLandmarkSource {
    pub rx: Receiver<SimInput>,
}

impl LandmarkSource for SimLandmarkSource {
    fn run(self: Box<Self>, tx: Sender<SourceMessage>, cancel: CancelToken) {
        let _ = tx.send(SourceMessage::Status(
            "simulated hand: move mouse, hold O/F/P/H".into(),
        ));
        let mut pose = SimPose::default();

        while !cancel.is_cancelled() {
            let input = match self.rx.recv_timeout(CANCEL_POLL) {
                Ok(input) => input,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return,
            };
            let sample = match input {
                SimInput::KeyDown(k) => { pose.set(k, true);  continue; }
                SimInput::KeyUp(k)   => { pose.set(k, false); continue; }
                SimInput::Pointer { x, y } => synthesize_hand(x, y, pose),
            };
            if tx.send(SourceMessage::Sample(sample.into_frame())).is_err() {
                return;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
