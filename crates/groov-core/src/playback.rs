//! Transport buttons and the audio seam.
//!
//! The renderer never touches audio. The front-end drives a
//! [`PlaybackController`], polls it once per frame and forwards the
//! [`PlaybackEvent`]s to the renderer.

use std::path::Path;

use crate::error::TransportError;

/// Audio file player provided by the host.
pub trait AudioTransport {
    fn open(&mut self, path: &Path) -> Result<(), TransportError>;
    fn play(&mut self) -> Result<(), TransportError>;
    fn stop(&mut self);
    /// Back to the start of the loaded file.
    fn rewind(&mut self);
    fn is_playing(&self) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Starting,
    Playing,
    Stopping,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started,
    Stopped,
}

pub struct PlaybackController<T: AudioTransport> {
    transport: T,
    state: TransportState,
    loaded: bool,
    /// A poll already saw `Starting` without sound.
    start_pending: bool,
}

impl<T: AudioTransport> PlaybackController<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: TransportState::Stopped,
            loaded: false,
            start_pending: false,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn can_play(&self) -> bool {
        self.loaded && matches!(self.state, TransportState::Stopped | TransportState::Stopping)
    }

    pub fn can_stop(&self) -> bool {
        matches!(self.state, TransportState::Starting | TransportState::Playing)
    }

    /// Loads a file and parks the transport.
    pub fn open(&mut self, path: &Path) -> Result<(), TransportError> {
        self.transport.open(path)?;
        self.loaded = true;
        log::info!("loaded {}", path.display());
        self.change_state(TransportState::Stopping)?;
        Ok(())
    }

    pub fn play(&mut self) -> Result<(), TransportError> {
        if !self.loaded {
            return Err(TransportError::NothingLoaded);
        }
        self.change_state(TransportState::Starting)
    }

    pub fn stop(&mut self) {
        // Stopping never fails.
        let _ = self.change_state(TransportState::Stopping);
    }

    pub fn toggle(&mut self) -> Result<(), TransportError> {
        if self.can_stop() {
            self.stop();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Reconciles with what the transport is actually doing. A start gets
    /// one poll to take effect; after that silence means stopped.
    pub fn poll(&mut self) -> Option<PlaybackEvent> {
        let playing = self.transport.is_playing();
        match (self.state, playing) {
            (TransportState::Playing, true) | (TransportState::Stopped, false) => None,
            (TransportState::Starting, false) if !self.start_pending => {
                self.start_pending = true;
                None
            }
            (_, true) => {
                let _ = self.change_state(TransportState::Playing);
                Some(PlaybackEvent::Started)
            }
            (_, false) => {
                let _ = self.change_state(TransportState::Stopped);
                Some(PlaybackEvent::Stopped)
            }
        }
    }

    fn change_state(&mut self, next: TransportState) -> Result<(), TransportError> {
        if next == self.state {
            return Ok(());
        }
        log::info!("transport {:?} -> {:?}", self.state, next);
        self.state = next;
        self.start_pending = false;
        match next {
            TransportState::Stopped => self.transport.rewind(),
            TransportState::Playing => {}
            TransportState::Starting => {
                if let Err(e) = self.transport.play() {
                    log::warn!("playback failed to start: {e}");
                    self.state = TransportState::Stopped;
                    return Err(e);
                }
            }
            TransportState::Stopping => self.transport.stop(),
        }
        Ok(())
    }
}
