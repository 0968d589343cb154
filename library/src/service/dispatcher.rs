use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::error::LibraryError;
use crate::model::object::ObjectRef;
use crate::service::debounce::Debouncer;
use crate::service::engine::ProjectEngine;
use crate::service::handlers::write_project;

/// Notifications for the surrounding editor.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// The preview must be redrawn.
    RefreshPreview,
    /// Audio waveforms of these objects must be recomputed from `file_id`.
    RecomputeWaveform {
        file_id: String,
        object_ids: Vec<String>,
    },
    /// An edit batch finished; views drop their cell selection.
    ClearSelection,
    /// Text for the caption editor. Empty when the selection changed.
    CaptionLoaded(String),
}

/// A saved edit waiting to be committed: the minimal document subtree that
/// changed, and whether the object's audio waveform depends on it.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingChange {
    pub target: ObjectRef,
    /// Property being edited, `None` for edits spanning many properties.
    pub property_key: Option<String>,
    pub partial: Map<String, Value>,
    pub waveform_file_id: Option<String>,
}

impl PendingChange {
    pub fn new(target: ObjectRef, property_key: Option<String>, partial: Map<String, Value>) -> Self {
        Self {
            target,
            property_key,
            partial,
            waveform_file_id: None,
        }
    }

    /// Marks the change as affecting the waveform when the volume of an
    /// object with cached audio data changed.
    pub fn with_waveform_of(mut self, document: &Map<String, Value>) -> Self {
        if self.property_key.as_deref() != Some("volume") {
            return self;
        }
        let has_audio_data = document
            .get("ui")
            .and_then(|ui| ui.get("audio_data"))
            .and_then(Value::as_array)
            .is_some_and(|data| !data.is_empty());
        if has_audio_data {
            self.waveform_file_id = document.get("file_id").and_then(|id| match id {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });
        }
        self
    }
}

pub struct ChangeDispatcher {
    sender: Sender<EditorEvent>,
    waveform_timer: Debouncer,
    pending_waveforms: BTreeMap<String, Vec<String>>,
}

impl ChangeDispatcher {
    pub fn new(sender: Sender<EditorEvent>, waveform_delay: Duration) -> Self {
        Self {
            sender,
            waveform_timer: Debouncer::new(waveform_delay),
            pending_waveforms: BTreeMap::new(),
        }
    }

    pub fn channel(waveform_delay: Duration) -> (Self, Receiver<EditorEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Self::new(sender, waveform_delay), receiver)
    }

    /// Persists the change and asks for a preview refresh.
    pub fn commit<E: ProjectEngine>(
        &mut self,
        project: &Arc<RwLock<E>>,
        change: PendingChange,
        now: Instant,
    ) -> Result<(), LibraryError> {
        let PendingChange {
            target,
            property_key,
            partial,
            waveform_file_id,
        } = change;
        {
            let mut engine = write_project(project)?;
            engine.persist(&target, partial)?;
        }
        info!(
            "Item {}: saved {}",
            target,
            property_key.as_deref().unwrap_or("keyframes")
        );

        if let Some(file_id) = waveform_file_id {
            let ids = self.pending_waveforms.entry(file_id).or_default();
            if !ids.contains(&target.id) {
                ids.push(target.id.clone());
            }
            self.waveform_timer.start(now);
        }
        self.emit(EditorEvent::RefreshPreview);
        Ok(())
    }

    /// Emits the queued waveform requests once the delay elapsed.
    pub fn poll(&mut self, now: Instant) {
        if self.waveform_timer.poll(now) {
            self.flush_waveforms();
        }
    }

    /// Emits the queued waveform requests immediately.
    pub fn flush_waveforms(&mut self) {
        self.waveform_timer.cancel();
        for (file_id, object_ids) in std::mem::take(&mut self.pending_waveforms) {
            debug!("Recompute waveform of {} for {:?}", file_id, object_ids);
            self.emit(EditorEvent::RecomputeWaveform { file_id, object_ids });
        }
    }

    pub fn has_pending_waveforms(&self) -> bool {
        self.waveform_timer.is_pending()
    }

    pub fn clear_selection(&self) {
        self.emit(EditorEvent::ClearSelection);
    }

    pub fn caption_loaded(&self, text: String) {
        self.emit(EditorEvent::CaptionLoaded(text));
    }

    fn emit(&self, event: EditorEvent) {
        if let Err(err) = self.sender.send(event) {
            warn!("Event receiver closed, dropping {:?}", err.0);
        }
    }
}
