//! Renderer synchronization state machine
//!
//! Owns one playback handoff from startup probe to the final stop report.
//! The loop is tick-driven: the next poll is scheduled only after the
//! current one finished, so at most one outbound call per session is ever in
//! flight. All session state is owned by the running task; the outside world
//! talks to it through a [`SyncHandle`] and hears back through the
//! [`ProgressReporter`] collaborator and the returned [`SyncReport`].

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::api::{PlayStatus, RendererControl};
use super::{from_renderer_subtitle_index, to_renderer_subtitle_index};
use crate::models::{MediaItem, PlayState, SyncState};
use crate::report::ProgressReporter;
use crate::selection::TrackSelection;

/// Timing and budget knobs for one sync session.
///
/// The defaults allow the renderer device to wake, spin up disks and mount
/// shares before playback is declared dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Position to resume at, if the user picked up mid-item
    pub resume_position_ms: Option<i64>,
    /// Give up on startup when no healthy poll arrived within this budget
    pub startup_timeout: Duration,
    /// Interval between startup detection attempts
    pub startup_retry_interval: Duration,
    /// Interval between steady-state report ticks
    pub heartbeat_interval: Duration,
    /// Shortened interval after a failed poll
    pub error_retry_interval: Duration,
    /// Quick first tick after entering the running state, so track
    /// corrections land before the user settles in
    pub first_correction_delay: Duration,
    /// Consecutive failed polls tolerated before the session dies
    pub max_consecutive_errors: u32,
    /// Skip the startup seek when the renderer is already this close
    pub seek_deadband_ms: i64,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            resume_position_ms: None,
            startup_timeout: Duration::from_secs(20),
            startup_retry_interval: Duration::from_millis(400),
            heartbeat_interval: Duration::from_secs(15),
            error_retry_interval: Duration::from_secs(1),
            first_correction_delay: Duration::from_secs(4),
            max_consecutive_errors: 5,
            seek_deadband_ms: 8000,
        }
    }
}

/// Track correction goals in the renderer's own index space.
///
/// `None` means "no opinion": no command is ever issued for that component
/// and the renderer keeps its own choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackTargets {
    /// Audio track, 0-based
    pub audio: Option<u32>,
    /// Subtitle track, 1-based with 0 meaning off
    pub subtitle: Option<u32>,
}

impl TrackTargets {
    /// Convert a selection result into renderer wire indices
    pub fn from_selection(selection: Option<&TrackSelection<'_>>) -> Self {
        let Some(selection) = selection else {
            return Self::default();
        };
        Self {
            audio: Some(selection.audio.natural_index as u32),
            subtitle: selection
                .subtitle_natural_index()
                .map(to_renderer_subtitle_index),
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Stopped on request, the normal end of playback
    Completed,
    /// The renderer never reached a healthy state within the startup budget;
    /// the caller should abort playback
    StartupTimeout,
    /// The renderer switched to different content mid-session
    ContentChanged,
    /// Too many consecutive poll failures
    PollFailure,
}

/// Terminal summary of a sync session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    /// Position flushed with the stop report: the last renderer-reported
    /// position, or wall-clock session time when none was ever obtained
    pub position_ms: i64,
    /// Last known audio track (renderer space)
    pub audio_index: Option<u32>,
    /// Last known subtitle track, mapped back to the internal space
    /// ([`crate::models::SUBTITLE_DISABLED`] when off or never set)
    pub subtitle_index: Option<i32>,
}

/// Final values a caller can inject when it learned the true end state from
/// somewhere else (e.g. the player app's result payload)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopRequest {
    pub position_ms: Option<i64>,
    pub audio_index: Option<u32>,
    pub subtitle_index: Option<u32>,
}

/// Caller-side handle to a running sync session
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::Sender<StopRequest>,
}

impl SyncHandle {
    /// Ask the session to stop and flush its final report. Safe to call any
    /// number of times, including after the session already finished.
    pub async fn stop(&self, request: StopRequest) {
        let _ = self.tx.send(request).await;
    }
}

/// Mutable per-session state, touched only by the tick loop
struct SyncSession {
    id: Uuid,
    state: SyncState,
    fingerprint: Option<u64>,
    last_position_ms: Option<i64>,
    last_audio_index: Option<u32>,
    last_subtitle_index: Option<u32>,
    play_state: PlayState,
    consecutive_errors: u32,
    started_at: Instant,
}

impl SyncSession {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SyncState::StartupProbe,
            fingerprint: None,
            last_position_ms: None,
            last_audio_index: None,
            last_subtitle_index: None,
            play_state: PlayState::Error,
            consecutive_errors: 0,
            started_at: Instant::now(),
        }
    }

    /// Fold a healthy status snapshot into the session, keeping old values
    /// where the device withheld fields
    fn absorb(&mut self, status: &PlayStatus) {
        self.play_state = status.state;
        if status.position_ms.is_some() {
            self.last_position_ms = status.position_ms;
        }
        if status.audio_index.is_some() {
            self.last_audio_index = status.audio_index;
        }
        if status.subtitle_index.is_some() {
            self.last_subtitle_index = status.subtitle_index;
        }
    }
}

enum Tick {
    Reschedule(Duration),
    Done(SyncOutcome),
}

/// The state machine itself. Construct with [`RendererSync::new`], then
/// drive it to completion with [`RendererSync::run`].
pub struct RendererSync {
    client: Box<dyn RendererControl>,
    reporter: Box<dyn ProgressReporter>,
    item: MediaItem,
    targets: TrackTargets,
    options: SyncOptions,
    session: SyncSession,
    /// First Playing observation seen; corrections and the start report
    /// happen exactly once, at that moment
    started: bool,
    final_report: Option<SyncReport>,
    stop_rx: mpsc::Receiver<StopRequest>,
    // keeps the channel open even when every caller handle is dropped
    _stop_tx: mpsc::Sender<StopRequest>,
}

impl RendererSync {
    pub fn new(
        client: Box<dyn RendererControl>,
        item: MediaItem,
        targets: TrackTargets,
        reporter: Box<dyn ProgressReporter>,
        options: SyncOptions,
    ) -> (Self, SyncHandle) {
        let (tx, rx) = mpsc::channel(4);
        let handle = SyncHandle { tx: tx.clone() };
        let sync = Self {
            client,
            reporter,
            item,
            targets,
            options,
            session: SyncSession::new(),
            started: false,
            final_report: None,
            stop_rx: rx,
            _stop_tx: tx,
        };
        (sync, handle)
    }

    /// Drive the session to its terminal state and flush the stop report.
    ///
    /// Cancellation is cooperative: a [`SyncHandle::stop`] lands between
    /// ticks, cancels the pending sleep and still flushes exactly one final
    /// report.
    pub async fn run(mut self) -> SyncReport {
        debug!("New sync session <{}> for {}", self.session.id, self.item);
        let mut delay = self.options.startup_retry_interval;
        let outcome = loop {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                request = self.stop_rx.recv() => {
                    self.absorb_stop_request(request.unwrap_or_default());
                    break SyncOutcome::Completed;
                }
            }
            match self.tick().await {
                Tick::Reschedule(next) => delay = next,
                Tick::Done(outcome) => break outcome,
            }
        };
        self.finish(outcome).await
    }

    async fn tick(&mut self) -> Tick {
        match self.session.state {
            SyncState::StartupProbe => self.startup_tick().await,
            SyncState::Running => self.running_tick().await,
            SyncState::Stopped => Tick::Done(SyncOutcome::Completed),
        }
    }

    /// Wait for the renderer to come up and show our content
    async fn startup_tick(&mut self) -> Tick {
        match self.client.play_status().await {
            Ok(status) if status.state.is_healthy() => {
                self.session.absorb(&status);
                self.session.fingerprint = status.fingerprint;
                debug!(
                    "Startup probe: renderer running, pos <{:?}> audio <{:?}> sub <{:?}>",
                    self.session.last_position_ms,
                    self.session.last_audio_index,
                    self.session.last_subtitle_index,
                );
                self.initial_seek().await;
                self.session.state = SyncState::Running;
                // quick first report tick so corrections land early
                Tick::Reschedule(self.options.first_correction_delay)
            }
            other => {
                match other {
                    Ok(status) => debug!("Startup probe: renderer not ready <{}>", status.state),
                    Err(e) => debug!("Startup probe failed: {}", e),
                }
                if self.session.started_at.elapsed() >= self.options.startup_timeout {
                    error!("Startup probe timeout reached, giving up");
                    Tick::Done(SyncOutcome::StartupTimeout)
                } else {
                    Tick::Reschedule(self.options.startup_retry_interval)
                }
            }
        }
    }

    /// Steady-state heartbeat: verify identity, correct tracks once, report
    async fn running_tick(&mut self) -> Tick {
        let status = match self.client.play_status().await {
            Ok(status) if status.state.is_healthy() => status,
            Ok(status) => return self.poll_failed(format!("renderer status <{}>", status.state)),
            Err(e) => return self.poll_failed(e.to_string()),
        };
        self.session.consecutive_errors = 0;

        if let (Some(expected), Some(seen)) = (self.session.fingerprint, status.fingerprint) {
            if expected != seen {
                error!(
                    "Renderer content changed, fingerprint <{:x}> expected <{:x}>",
                    seen, expected
                );
                return Tick::Done(SyncOutcome::ContentChanged);
            }
        }
        self.session.absorb(&status);

        if status.state == PlayState::Playing {
            if !self.started {
                self.started = true;
                self.apply_track_correction().await;
                self.reporter
                    .report_start(&self.item, self.session.last_position_ms)
                    .await;
                // quick re-poll to confirm the corrections took
                return Tick::Reschedule(self.options.first_correction_delay);
            }
            if let Some(position) = self.session.last_position_ms {
                self.reporter
                    .report_progress(&self.item, position, false)
                    .await;
            }
        }
        Tick::Reschedule(self.options.heartbeat_interval)
    }

    fn poll_failed(&mut self, reason: String) -> Tick {
        self.session.consecutive_errors += 1;
        if self.session.consecutive_errors > self.options.max_consecutive_errors {
            error!(
                "Renderer status failed {} times, ending session: {}",
                self.session.consecutive_errors, reason
            );
            Tick::Done(SyncOutcome::PollFailure)
        } else {
            debug!(
                "Renderer status error ({}), trying again in {:?}",
                reason, self.options.error_retry_interval
            );
            Tick::Reschedule(self.options.error_retry_interval)
        }
    }

    /// One-shot startup seek, skipped inside the deadband. Best effort.
    async fn initial_seek(&self) {
        let Some(resume) = self.options.resume_position_ms else {
            return;
        };
        if resume <= 0 {
            return;
        }
        let Some(current) = self.session.last_position_ms else {
            return;
        };
        let delta = (current - resume).abs();
        if delta <= self.options.seek_deadband_ms {
            debug!("Seek skipped, within deadband <{}ms>", delta);
            return;
        }
        match self.client.seek(resume).await {
            Ok(()) => debug!("Seek to <{}ms> accepted", resume),
            Err(e) => error!("Seek failed: {}", e),
        }
    }

    /// Push the selected tracks to the renderer, but only for components
    /// whose reported index differs from the target. Best effort.
    async fn apply_track_correction(&mut self) {
        if let (Some(target), Some(current)) = (self.targets.audio, self.session.last_audio_index)
        {
            if target != current {
                match self.client.set_audio_track(target).await {
                    Ok(()) => debug!("Set audio track <{}>", target),
                    Err(e) => error!("Set audio track failed: {}", e),
                }
            }
        }
        if let (Some(target), Some(current)) =
            (self.targets.subtitle, self.session.last_subtitle_index)
        {
            if target != current {
                match self.client.set_subtitle_track(target).await {
                    Ok(()) => debug!("Set subtitle track <{}>", target),
                    Err(e) => error!("Set subtitle track failed: {}", e),
                }
            }
        }
    }

    fn absorb_stop_request(&mut self, request: StopRequest) {
        if let Some(position) = request.position_ms.filter(|p| *p > 0) {
            self.session.last_position_ms = Some(position);
        }
        if request.audio_index.is_some() {
            self.session.last_audio_index = request.audio_index;
        }
        if request.subtitle_index.is_some() {
            self.session.last_subtitle_index = request.subtitle_index;
        }
    }

    /// Flush the terminal report. Idempotent: a second call returns the
    /// cached report without reporting again.
    async fn finish(&mut self, outcome: SyncOutcome) -> SyncReport {
        if let Some(report) = &self.final_report {
            warn!("Sync session <{}> already finished", self.session.id);
            return report.clone();
        }
        self.session.state = SyncState::Stopped;
        let position_ms = match self.session.last_position_ms {
            Some(position) if position > 0 => position,
            // FALLBACK: wall-clock session time, the device never told us
            _ => self.session.started_at.elapsed().as_millis() as i64,
        };
        self.reporter.report_stopped(&self.item, position_ms).await;
        debug!(
            "Sync session <{}> stopped ({:?}) at <{}ms>, last renderer state <{}>",
            self.session.id, outcome, position_ms, self.session.play_state
        );
        let report = SyncReport {
            outcome,
            position_ms,
            audio_index: self.session.last_audio_index,
            subtitle_index: self
                .session
                .last_subtitle_index
                .map(from_renderer_subtitle_index),
        };
        self.final_report = Some(report.clone());
        report
    }
}
