use crate::connection::Connection;
use crate::error::{FlapiError, Result};
use crate::handle::{Handle, HandleType};
use crate::models::options::{InsertPosition, NewSceneOptions, OpenFlag};
use crate::models::scene_path::ScenePath;
use serde_json::json;
use std::collections::HashMap;

/// Scene lifecycle and timeline editing.
impl Connection {
    /// Open an existing scene. NotFound when nothing matches the path,
    /// Permission when the flags conflict with server policy.
    pub fn open_scene(&mut self, path: &ScenePath, flags: &[OpenFlag]) -> Result<Handle> {
        let result = self.call(
            None,
            "Scene.open_scene",
            json!({
                "scenepath": path,
                "flags": flags,
            }),
        )?;
        self.take_handle(&result, HandleType::Scene)
    }

    /// Create a new persistent scene at the given path.
    pub fn new_scene(&mut self, path: &ScenePath, options: &NewSceneOptions) -> Result<Handle> {
        options.validate()?;
        let result = self.call(
            None,
            "Scene.new_scene",
            json!({
                "scenepath": path,
                "options": options,
            }),
        )?;
        self.take_handle(&result, HandleType::Scene)
    }

    /// Create a non-persistent in-memory scene. Options are validated
    /// client-side; nothing reaches the server if they are incomplete.
    pub fn temporary_scene(&mut self, options: &NewSceneOptions) -> Result<Handle> {
        options.validate()?;
        let result = self.call(
            None,
            "Scene.temporary_scene",
            json!({ "options": options }),
        )?;
        self.take_handle(&result, HandleType::Scene)
    }

    pub fn save_scene(&mut self, scene: &Handle) -> Result<()> {
        self.check_handle(scene, HandleType::Scene)?;
        self.call(Some(scene.id()), "Scene.save_scene", json!({}))?;
        Ok(())
    }

    /// Close the scene on the server. The handle itself stays registered
    /// until released.
    pub fn close_scene(&mut self, scene: &Handle) -> Result<()> {
        self.check_handle(scene, HandleType::Scene)?;
        self.call(Some(scene.id()), "Scene.close_scene", json!({}))?;
        Ok(())
    }

    /// Begin a named edit delta. Edits between start and end are grouped
    /// into one undoable step.
    pub fn start_delta(&mut self, scene: &Handle, name: &str) -> Result<()> {
        self.check_handle(scene, HandleType::Scene)?;
        self.call(
            Some(scene.id()),
            "Scene.start_delta",
            json!({ "name": name }),
        )?;
        Ok(())
    }

    pub fn end_delta(&mut self, scene: &Handle) -> Result<()> {
        self.check_handle(scene, HandleType::Scene)?;
        self.call(Some(scene.id()), "Scene.end_delta", json!({}))?;
        Ok(())
    }

    /// Abandon the open delta, rolling back its edits.
    pub fn cancel_delta(&mut self, scene: &Handle) -> Result<()> {
        self.check_handle(scene, HandleType::Scene)?;
        self.call(Some(scene.id()), "Scene.cancel_delta", json!({}))?;
        Ok(())
    }

    /// Insert source material described by a sequence descriptor into the
    /// scene, producing a shot. `relative_to` anchors before/after
    /// positions; `input_colourspace` of None means auto-detect from the
    /// descriptor; `output_format` of None keeps the scene's working format.
    pub fn insert_sequence(
        &mut self,
        scene: &Handle,
        sequence: &Handle,
        position: InsertPosition,
        relative_to: Option<&Handle>,
        input_colourspace: Option<&str>,
        output_format: Option<&str>,
    ) -> Result<Handle> {
        self.check_handle(scene, HandleType::Scene)?;
        self.check_handle(sequence, HandleType::SequenceDescriptor)?;
        if position.requires_anchor() && relative_to.is_none() {
            return Err(FlapiError::InvalidOptions(format!(
                "insert position {:?} requires a shot to anchor to",
                position
            )));
        }
        if let Some(anchor) = relative_to {
            self.check_handle(anchor, HandleType::Shot)?;
        }

        let result = self.call(
            Some(scene.id()),
            "Scene.insert_sequence",
            json!({
                "seq": { "_handle": "SequenceDescriptor", "_id": sequence.id() },
                "position": position,
                "relativeTo": relative_to.map(|h| json!({ "_handle": "Shot", "_id": h.id() })),
                "colourSpace": input_colourspace,
                "format": output_format,
            }),
        )?;
        self.take_handle(&result, HandleType::Shot)
    }

    /// Fetch string metadata values for a shot, keyed by metadata name.
    pub fn shot_metadata(
        &mut self,
        shot: &Handle,
        keys: &[&str],
    ) -> Result<HashMap<String, String>> {
        self.check_handle(shot, HandleType::Shot)?;
        let result = self.call(
            Some(shot.id()),
            "Shot.get_metadata_strings",
            json!({ "mdKeys": keys }),
        )?;
        serde_json::from_value(result)
            .map_err(|e| FlapiError::Protocol(format!("expected metadata strings: {}", e)))
    }
}
