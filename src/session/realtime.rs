//! Continuous real-time translation loop.
//!
//! One background task repeats capture → detect → translate and appends
//! each completed iteration to the output buffer and the history log.
//! Iterations run strictly one after another, so output and history rows
//! land in chronological iteration order.
//!
//! The loop carries an explicit stop contract: a [`CancellationToken`]
//! checked at the top of every iteration and raced against the capture
//! window. A capture already in flight finishes its bounded phrase window,
//! which caps the stop latency at `phrase_time_limit_secs`.
//!
//! Failure policy: capture noise (nothing heard, recognition hiccup) skips
//! the iteration silently; anything else is logged at warn level and the
//! loop continues. Nothing short of cancellation stops it.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::state::SessionEvent;
use super::SessionController;
use crate::catalog::SourceSelection;
use crate::history::Mode;

/// Handle to the running loop: cancel signal plus the task itself.
pub struct RealtimeHandle {
    pub(crate) token: CancellationToken,
    pub(crate) join: JoinHandle<()>,
}

impl SessionController {
    /// Start the background loop. Returns false if one is already running.
    pub fn start_realtime(self: &Arc<Self>) -> bool {
        let mut slot = self.realtime.lock();
        if slot.as_ref().is_some_and(|h| !h.join.is_finished()) {
            return false;
        }

        let token = CancellationToken::new();
        let loop_token = token.clone();
        let this = Arc::clone(self);
        let join = self
            .tracker
            .spawn(async move { this.realtime_loop(loop_token).await });
        *slot = Some(RealtimeHandle { token, join });
        true
    }

    /// Whether the background loop is currently running.
    pub fn realtime_active(&self) -> bool {
        self.realtime
            .lock()
            .as_ref()
            .is_some_and(|h| !h.join.is_finished())
    }

    /// Cancel the loop and wait for it to wind down.
    pub async fn stop_realtime(&self) {
        let handle = self.realtime.lock().take();
        if let Some(handle) = handle {
            handle.token.cancel();
            if let Err(e) = handle.join.await {
                tracing::warn!(error = %e, "real-time task join failed");
            }
        }
    }

    async fn realtime_loop(&self, token: CancellationToken) {
        let _ = self.events.send(SessionEvent::RealtimeStarted);
        self.notice("Real-time translation: listening. Speak clearly.");
        tracing::info!(
            phrase_limit_secs = self.phrase_limit.as_secs(),
            "real-time loop started"
        );

        loop {
            if token.is_cancelled() {
                break;
            }

            let capture = Arc::clone(&self.providers.capture);
            let limit = Some(self.phrase_limit);
            let captured = tokio::select! {
                _ = token.cancelled() => break,
                joined = tokio::task::spawn_blocking(move || capture.capture(limit)) => joined,
            };

            let transcript = match captured {
                Ok(Ok(transcript)) => transcript,
                Ok(Err(e)) if e.is_capture_noise() => {
                    tracing::debug!(error = %e, "iteration skipped");
                    continue;
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "real-time capture failed");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "capture task failed");
                    continue;
                }
            };

            let (source, target) = {
                let s = self.state.lock();
                (s.source, s.target)
            };
            let (provider_source, logged_source) = match source {
                SourceSelection::Fixed(lang) => (source, lang.code().to_string()),
                SourceSelection::Auto => {
                    let detection = self.providers.detector.detect(&transcript);
                    (
                        detection.provider_source(),
                        detection.logged_code().to_string(),
                    )
                }
            };

            let translated = match self
                .providers
                .translator
                .translate(&transcript, provider_source, target)
                .await
            {
                Ok(translated) => translated,
                Err(e) => {
                    tracing::warn!(error = %e, "real-time translation failed");
                    continue;
                }
            };

            {
                let mut s = self.state.lock();
                s.output
                    .push_str(&format!("\nYou: {transcript}\n→ {translated}\n"));
            }
            if let Err(e) =
                self.append_history(Mode::RealTime, &logged_source, target, &transcript, &translated)
            {
                tracing::warn!(error = %e, "real-time history append failed");
            }
        }

        tracing::info!("real-time loop stopped");
        let _ = self.events.send(SessionEvent::RealtimeStopped);
    }
}
