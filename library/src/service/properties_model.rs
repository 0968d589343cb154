//! The property inspector's model: which objects are selected, which frame
//! of them is shown, and the rows built from their properties.
//!
//! Time is passed in by the caller (`now`), so selection and waveform delays
//! are driven by [`PropertiesModel::tick`].

use log::{debug, info, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use crate::animation::{BezierHandles, Interpolation};
use crate::config::EditorSettings;
use crate::editor::defaults::ScaleLimits;
use crate::editor::keyframe_editor::ColorIntent;
use crate::error::LibraryError;
use crate::locale::Locale;
use crate::model::color::Rgba;
use crate::model::object::{ObjectKind, ObjectRef};
use crate::model::property::{PropertyType, RawProperty, parse_raw_properties};
use crate::projection::{
    DisplayRow, ProjectionContext, TypedValue, merge_selection, parse_input, project_property,
};
use crate::service::debounce::Debouncer;
use crate::service::dispatcher::{ChangeDispatcher, EditorEvent, PendingChange};
use crate::service::engine::ProjectEngine;
use crate::service::handlers::{KeyframeHandler, PropertyTarget, read_project};
use crate::service::updates::{ActionType, Subscription, UpdateHub};

/// One row of the inspector.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRow {
    pub key: String,
    pub raw: RawProperty,
    /// Tracked object whose overlay the row came from.
    pub object_id: Option<String>,
    pub display: DisplayRow,
    /// Objects an edit of this row applies to.
    pub targets: Vec<ObjectRef>,
}

/// What the user entered for a row.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueInput {
    /// Text typed into the value cell, parsed for the row's type.
    Text(String),
    /// A value picked from a menu, such as a choice or a file.
    Override(Value),
    /// Resets the value (an empty source for readers).
    Clear,
}

/// Outcome of an edit applied to every selected object.
#[derive(Debug, Default)]
pub struct EditReport {
    pub updated: Vec<ObjectRef>,
    pub skipped: Vec<(ObjectRef, LibraryError)>,
}

impl EditReport {
    pub fn changed(&self) -> bool {
        !self.updated.is_empty()
    }
}

pub struct PropertiesModel<E: ProjectEngine> {
    project: Arc<RwLock<E>>,
    locale: Locale,
    limits: ScaleLimits,
    dispatcher: ChangeDispatcher,
    subscription: Subscription,
    selected: Vec<ObjectRef>,
    selected_parent: Option<ObjectRef>,
    next_selection: Vec<ObjectRef>,
    selection_timer: Debouncer,
    hidden_properties: &'static [&'static str],
    playhead: i64,
    frame_number: i64,
    rows: Vec<PropertyRow>,
    row_index: HashMap<String, usize>,
    new_item: bool,
    ignore_update_signal: bool,
    filter: String,
    previous_filter: String,
}

impl<E: ProjectEngine> PropertiesModel<E> {
    /// Creates the model and the receiving end of its editor events.
    pub fn new(
        project: Arc<RwLock<E>>,
        hub: &UpdateHub,
        settings: &EditorSettings,
    ) -> (Self, Receiver<EditorEvent>) {
        let (dispatcher, events) = ChangeDispatcher::channel(settings.waveform_debounce());
        let model = Self {
            project,
            locale: Locale::new(settings.locale.clone()),
            limits: settings.scale_limits(),
            dispatcher,
            subscription: hub.subscribe(),
            selected: Vec::new(),
            selected_parent: None,
            next_selection: Vec::new(),
            selection_timer: Debouncer::new(settings.selection_debounce()),
            hidden_properties: &[],
            playhead: 1,
            frame_number: 1,
            rows: Vec::new(),
            row_index: HashMap::new(),
            new_item: true,
            ignore_update_signal: false,
            filter: String::new(),
            previous_filter: String::new(),
        };
        (model, events)
    }

    pub fn rows(&self) -> &[PropertyRow] {
        &self.rows
    }

    pub fn row(&self, key: &str) -> Option<&PropertyRow> {
        self.row_index.get(key).and_then(|&i| self.rows.get(i))
    }

    pub fn selected(&self) -> &[ObjectRef] {
        &self.selected
    }

    /// Local frame of the first selected object (1-based).
    pub fn frame_number(&self) -> i64 {
        self.frame_number
    }

    pub fn is_updating(&self) -> bool {
        self.ignore_update_signal
    }

    /// Queues a new selection. It is applied once the selection delay passes,
    /// except that clearing a non-empty selection applies at once.
    pub fn update_item(&mut self, selection: Vec<ObjectRef>, now: Instant) -> Result<(), LibraryError> {
        self.next_selection = selection;
        if self.next_selection.is_empty() && !self.selected.is_empty() {
            self.selection_timer.cancel();
            self.update_item_timeout()
        } else {
            self.selection_timer.start(now);
            Ok(())
        }
    }

    /// Applies the queued selection.
    pub fn update_item_timeout(&mut self) -> Result<(), LibraryError> {
        let selection = std::mem::take(&mut self.next_selection);
        self.selected.clear();
        self.selected_parent = None;
        self.hidden_properties = &[];

        if !selection.is_empty() {
            {
                let engine = read_project(&self.project)?;
                for object in selection {
                    if object.resolve(&*engine).is_none() {
                        debug!("Selected {} no longer exists", object);
                        continue;
                    }
                    if object.kind == ObjectKind::Effect {
                        self.hidden_properties = object.kind.hidden_base_properties();
                        self.selected_parent = engine.parent_clip(&object);
                    }
                    debug!("Update item: {}", object.kind.as_str());
                    self.selected.push(object);
                }
            }
            self.update_frame(self.playhead, false)?;
            self.new_item = true;
        }
        self.update_model()
    }

    /// Fires due timers and applies pending project changes.
    pub fn tick(&mut self, now: Instant) -> Result<(), LibraryError> {
        if self.selection_timer.poll(now) {
            self.update_item_timeout()?;
        }
        self.dispatcher.poll(now);
        self.handle_updates()
    }

    /// Refreshes the rows when the project reported a change to a clip or an
    /// effect.
    pub fn handle_updates(&mut self) -> Result<(), LibraryError> {
        let relevant = self.subscription.drain().into_iter().any(|action| {
            matches!(action.action_type, ActionType::Update | ActionType::Insert)
                && action.targets(&["clips", "effects"])
        });
        if relevant {
            debug!("Project changed, refreshing properties");
            self.update_model()?;
        }
        Ok(())
    }

    /// Maps a timeline playhead frame to the local frame of the selection.
    /// Effects follow their parent clip. The result stays within the clip.
    pub fn update_frame(&mut self, playhead: i64, reload_model: bool) -> Result<(), LibraryError> {
        self.playhead = playhead;
        let Some(first) = self.selected.first() else {
            return Ok(());
        };
        let clip = if first.kind == ObjectKind::Effect {
            match &self.selected_parent {
                Some(parent) => parent,
                None => return Ok(()),
            }
        } else {
            first
        };

        let (timing, fps) = {
            let engine = read_project(&self.project)?;
            (engine.timing(clip), engine.frame_rate().to_f64())
        };
        let Some(timing) = timing else {
            return Ok(());
        };
        if fps <= 0.0 {
            return Ok(());
        }

        let requested_time = (playhead - 1) as f64 / fps;
        let time_diff = (requested_time - timing.position) + timing.start;
        let new_frame_number = (time_diff * fps).round() as i64 + 1;
        if new_frame_number == self.frame_number {
            return Ok(());
        }

        let min_frame_number = (timing.start * fps).round() as i64 + 1;
        let max_frame_number = (timing.end * fps).round() as i64 + 1;
        self.frame_number = new_frame_number.max(min_frame_number).min(max_frame_number);
        debug!("Update frame to {}", self.frame_number);

        if reload_model {
            self.update_model()?;
        }
        Ok(())
    }

    /// Hides rows whose translated label does not contain `filter`.
    pub fn set_filter(&mut self, filter: impl Into<String>) -> Result<(), LibraryError> {
        self.filter = filter.into();
        self.update_model()
    }

    /// Builds the rows for the current selection and frame, or refreshes the
    /// existing rows in place.
    pub fn update_model(&mut self) -> Result<(), LibraryError> {
        if self.ignore_update_signal {
            debug!("ignoring update signal, because we are already in an update...");
            return Ok(());
        }
        self.ignore_update_signal = true;
        let result = self.rebuild_rows();
        self.ignore_update_signal = false;
        result
    }

    fn rebuild_rows(&mut self) -> Result<(), LibraryError> {
        debug!("updating clip properties model.");
        if self.selected.is_empty() {
            self.rows.clear();
            self.row_index.clear();
            return Ok(());
        }

        let (selections, tracks) = {
            let engine = read_project(&self.project)?;
            let mut selections = Vec::with_capacity(self.selected.len());
            for object in &self.selected {
                match engine.properties_at(object, self.frame_number) {
                    Some(raw) => selections.push(parse_raw_properties(&raw)),
                    None => warn!("{} has no properties at frame {}", object, self.frame_number),
                }
            }
            (selections, engine.tracks())
        };
        let merged = merge_selection(selections);

        let mut properties: Vec<(String, RawProperty)> = merged.properties.into_iter().collect();
        properties.sort_by(|a, b| a.1.name.cmp(&b.1.name));

        if self.previous_filter != self.filter {
            self.previous_filter = self.filter.clone();
            self.new_item = true;
        }
        if self.new_item {
            self.rows.clear();
            self.row_index.clear();
            self.dispatcher.caption_loaded(String::new());
        }

        let ctx = ProjectionContext {
            locale: &self.locale,
            tracks: &tracks,
        };
        let filter = self.filter.to_lowercase();
        for (key, raw) in properties {
            let label = self.locale.translate(&raw.name);
            if !filter.is_empty() && !label.to_lowercase().contains(&filter) {
                continue;
            }
            if self.hidden_properties.contains(&key.as_str()) {
                continue;
            }

            let object_id = if merged.overlay_keys.contains(&key) {
                merged.overlay_id.clone()
            } else {
                None
            };
            let display = project_property(&raw, &ctx);

            if self.new_item {
                if raw.property_type == PropertyType::Caption {
                    self.dispatcher.caption_loaded(raw.memo.clone());
                }
                self.row_index.insert(key.clone(), self.rows.len());
                self.rows.push(PropertyRow {
                    key,
                    raw,
                    object_id,
                    display,
                    targets: self.selected.clone(),
                });
            } else if let Some(&index) = self.row_index.get(&key) {
                let row = &mut self.rows[index];
                row.raw = raw;
                row.object_id = object_id;
                row.display = display;
                row.targets = self.selected.clone();
            }
        }

        self.new_item = false;
        Ok(())
    }

    fn target_row(&self, key: &str) -> Result<PropertyRow, LibraryError> {
        self.row(key)
            .cloned()
            .ok_or_else(|| LibraryError::InvalidArgument(format!("no property row {}", key)))
    }

    fn commit(&mut self, change: Option<PendingChange>, now: Instant) -> Result<bool, LibraryError> {
        match change {
            Some(change) => {
                self.dispatcher.commit(&self.project, change, now)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Files the outcome of one object's edit. Only lock failures abort.
    fn record(
        report: &mut EditReport,
        object: &ObjectRef,
        outcome: Result<bool, LibraryError>,
    ) -> Result<(), LibraryError> {
        match outcome {
            Ok(true) => report.updated.push(object.clone()),
            Ok(false) => {}
            Err(err @ LibraryError::MissingOverlayData { .. }) => {
                debug!("No clip data found for this object id: {}", err);
                report.skipped.push((object.clone(), err));
            }
            Err(err @ LibraryError::Runtime(_)) => return Err(err),
            Err(err) => {
                warn!("Skipping {}: {}", object, err);
                report.skipped.push((object.clone(), err));
            }
        }
        Ok(())
    }

    fn finish_batch(&mut self) -> Result<(), LibraryError> {
        self.dispatcher.clear_selection();
        self.handle_updates()
    }

    /// Writes a value (or an interpolation change) of the row `key` to every
    /// selected object.
    ///
    /// Text is parsed once before any object is touched; a parse failure is
    /// returned and nothing is written.
    pub fn value_updated(
        &mut self,
        key: &str,
        input: ValueInput,
        interpolation: Option<(Interpolation, Option<BezierHandles>)>,
        now: Instant,
    ) -> Result<EditReport, LibraryError> {
        if self.ignore_update_signal {
            return Ok(EditReport::default());
        }
        let row = self.target_row(key)?;
        let value = match input {
            ValueInput::Text(text) => {
                parse_input(&row.key, row.raw.property_type, &text, &self.locale).inspect_err(|err| {
                    warn!("{}", err);
                })?
            }
            ValueInput::Override(value) => TypedValue::from_json(&value),
            ValueInput::Clear => Some(TypedValue::Text(String::new())),
        };

        let mut report = EditReport::default();
        for object in &row.targets {
            info!(
                "{} for {} changed to {:?} at frame {} with interpolation: {:?} at closest x: {}",
                row.key, object.id, value, self.frame_number, interpolation, row.raw.closest_point_x
            );
            let target = PropertyTarget {
                object,
                key: &row.key,
                property_type: row.raw.property_type,
                overlay_id: row.object_id.as_deref(),
            };
            let outcome = KeyframeHandler::update_value(
                &self.project,
                &target,
                self.frame_number,
                value.as_ref(),
                interpolation,
                &self.limits,
            )
            .and_then(|change| self.commit(change, now));
            Self::record(&mut report, object, outcome)?;
        }
        self.finish_batch()?;
        Ok(report)
    }

    /// Sets a color (or clears it, with `None`) at the current frame, or
    /// changes the interpolation of its channels.
    pub fn color_update(
        &mut self,
        key: &str,
        color: Option<Rgba>,
        interpolation: Option<(Interpolation, Option<BezierHandles>)>,
        now: Instant,
    ) -> Result<EditReport, LibraryError> {
        if self.ignore_update_signal {
            return Ok(EditReport::default());
        }
        let row = self.target_row(key)?;
        let intent = match (interpolation, color) {
            (Some((mode, handles)), _) => ColorIntent::SetInterpolation { mode, handles },
            (None, Some(rgba)) => ColorIntent::SetColor(rgba),
            (None, None) => ColorIntent::Clear,
        };

        let mut report = EditReport::default();
        for object in &row.targets {
            let target = PropertyTarget {
                object,
                key: &row.key,
                property_type: row.raw.property_type,
                overlay_id: row.object_id.as_deref(),
            };
            let outcome =
                KeyframeHandler::update_color(&self.project, &target, self.frame_number, &intent)
                    .and_then(|change| self.commit(change, now));
            Self::record(&mut report, object, outcome)?;
        }
        self.finish_batch()?;
        Ok(report)
    }

    /// Removes the point of row `key` at the current frame, or its closest
    /// point, from every selected object.
    pub fn remove_keyframe(&mut self, key: &str, now: Instant) -> Result<EditReport, LibraryError> {
        if self.ignore_update_signal {
            return Ok(EditReport::default());
        }
        let row = self.target_row(key)?;
        let mut report = EditReport::default();
        for object in &row.targets {
            let target = PropertyTarget {
                object,
                key: &row.key,
                property_type: row.raw.property_type,
                overlay_id: row.object_id.as_deref(),
            };
            let outcome = KeyframeHandler::remove_keyframe(
                &self.project,
                &target,
                self.frame_number,
                row.raw.closest_point_x,
            )
            .and_then(|change| self.commit(change, now));
            Self::record(&mut report, object, outcome)?;
        }
        self.finish_batch()?;
        Ok(report)
    }

    /// Moves all points at local frame `from` to `to` on every selected object.
    pub fn move_keyframes(&mut self, from: i64, to: i64, now: Instant) -> Result<EditReport, LibraryError> {
        if self.ignore_update_signal {
            return Ok(EditReport::default());
        }
        let mut report = EditReport::default();
        for object in self.selected.clone() {
            let outcome = KeyframeHandler::move_keyframes(&self.project, &object, from, to)
                .and_then(|change| self.commit(change, now));
            Self::record(&mut report, &object, outcome)?;
        }
        self.finish_batch()?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::memory::MemoryProject;
    use serde_json::json;
    use std::time::Duration;

    fn model() -> (PropertiesModel<MemoryProject>, Receiver<EditorEvent>) {
        let hub = UpdateHub::new();
        let project = MemoryProject::from_value(json!({
            "fps": {"num": 30, "den": 1},
            "width": 1280,
            "height": 720,
            "clips": [{
                "id": "C1",
                "position": 2.0,
                "start": 1.0,
                "end": 5.0,
                "alpha": {"Points": [{"co": {"X": 1, "Y": 1.0}, "interpolation": 1}]},
                "effects": [{"id": "E1", "class_name": "Blur", "horizontal_radius": {"Points": []}}]
            }]
        }))
        .unwrap()
        .with_hub(hub.clone());
        PropertiesModel::new(Arc::new(RwLock::new(project)), &hub, &EditorSettings::default())
    }

    #[test]
    fn selection_waits_for_the_debounce() {
        let (mut model, _events) = model();
        let t0 = Instant::now();
        model.update_item(vec![ObjectRef::clip("C1")], t0).unwrap();
        model.tick(t0 + Duration::from_millis(50)).unwrap();
        assert!(model.rows().is_empty());
        model.tick(t0 + Duration::from_millis(100)).unwrap();
        assert!(model.row("alpha").is_some());
    }

    #[test]
    fn clearing_the_selection_applies_at_once() {
        let (mut model, _events) = model();
        let t0 = Instant::now();
        model.update_item(vec![ObjectRef::clip("C1")], t0).unwrap();
        model.tick(t0 + Duration::from_millis(100)).unwrap();
        model.update_item(Vec::new(), t0 + Duration::from_millis(110)).unwrap();
        assert!(model.rows().is_empty());
        assert!(model.selected().is_empty());
    }

    #[test]
    fn playhead_maps_to_clamped_local_frame() {
        let (mut model, _events) = model();
        model.update_item(vec![ObjectRef::clip("C1")], Instant::now()).unwrap();
        model.update_item_timeout().unwrap();

        // 3s on the timeline is 1s into the clip, which starts 1s into its source.
        model.update_frame(91, true).unwrap();
        assert_eq!(model.frame_number(), 61);
        model.update_frame(1, true).unwrap();
        assert_eq!(model.frame_number(), 31);
        model.update_frame(1000, true).unwrap();
        assert_eq!(model.frame_number(), 151);
    }

    #[test]
    fn effects_hide_timeline_properties() {
        let (mut model, _events) = model();
        model.update_item(vec![ObjectRef::effect("E1")], Instant::now()).unwrap();
        model.update_item_timeout().unwrap();
        assert!(model.row("horizontal_radius").is_some());
        assert!(model.row("position").is_none());
        assert!(model.row("duration").is_none());
    }

    #[test]
    fn filter_hides_non_matching_labels() {
        let (mut model, _events) = model();
        model.update_item(vec![ObjectRef::clip("C1")], Instant::now()).unwrap();
        model.update_item_timeout().unwrap();
        model.set_filter("ALP").unwrap();
        assert_eq!(model.rows().len(), 1);
        assert_eq!(model.rows()[0].key, "alpha");
    }

    #[test]
    fn edits_are_ignored_while_rows_rebuild() {
        let (mut model, _events) = model();
        model.update_item(vec![ObjectRef::clip("C1")], Instant::now()).unwrap();
        model.update_item_timeout().unwrap();
        let before = model.project.read().unwrap().to_json().unwrap();

        model.ignore_update_signal = true;
        let now = Instant::now();
        let reports = [
            model.value_updated("alpha", ValueInput::Text("0.5".into()), None, now).unwrap(),
            model.color_update("alpha", Some(Rgba::opaque(1, 2, 3)), None, now).unwrap(),
            model.remove_keyframe("alpha", now).unwrap(),
            model.move_keyframes(1, 20, now).unwrap(),
        ];
        assert!(reports.iter().all(|report| !report.changed()));
        assert_eq!(model.project.read().unwrap().to_json().unwrap(), before);
    }
}
