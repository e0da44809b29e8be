use crate::connection::{BusyPolicy, Connection};
use crate::error::{FlapiError, Result};
use crate::handle::{Handle, HandleType};
use crate::models::deliverable::RenderDeliverable;
use crate::models::status::{RenderLogItem, RenderStatus};
use serde_json::json;
use tracing::debug;

/// Render setup assembly and processor control.
impl Connection {
    /// Create an empty render setup to accumulate a job description.
    pub fn create_render_setup(&mut self) -> Result<Handle> {
        let result = self.call(None, "RenderSetup.create", json!({}))?;
        self.take_handle(&result, HandleType::RenderSetup)
    }

    /// Point the setup at the scene whose shots will be rendered.
    pub fn render_set_scene(&mut self, setup: &Handle, scene: &Handle) -> Result<()> {
        self.check_handle(setup, HandleType::RenderSetup)?;
        self.check_handle(scene, HandleType::Scene)?;
        self.call(
            Some(setup.id()),
            "RenderSetup.set_scene",
            json!({ "scene": { "_handle": "Scene", "_id": scene.id() } }),
        )?;
        Ok(())
    }

    /// Append one deliverable to the setup.
    pub fn add_deliverable(&mut self, setup: &Handle, deliverable: &RenderDeliverable) -> Result<()> {
        self.check_handle(setup, HandleType::RenderSetup)?;
        self.call(
            Some(setup.id()),
            "RenderSetup.add_deliverable",
            json!({ "deliverable": deliverable }),
        )?;
        Ok(())
    }

    /// The render processor. There is one per server process; the handle is
    /// fetched once and cached for the life of this session.
    pub fn render_processor(&mut self) -> Result<Handle> {
        if let Some(processor) = self.processor {
            return Ok(processor);
        }
        let result = self.call(None, "RenderProcessor.get", json!({}))?;
        let processor = self.take_handle(&result, HandleType::RenderProcessor)?;
        self.processor = Some(processor);
        Ok(processor)
    }

    /// Submit the setup and return immediately; progress is observed via
    /// [`render_progress`](Connection::render_progress) or the poller. A busy
    /// processor yields AlreadyRunning, or is stopped first under
    /// [`BusyPolicy::Preempt`].
    pub fn start_render(&mut self, processor: &Handle, setup: &Handle) -> Result<()> {
        self.check_handle(processor, HandleType::RenderProcessor)?;
        self.check_handle(setup, HandleType::RenderSetup)?;

        let start = |conn: &mut Connection| {
            conn.call(
                Some(processor.id()),
                "RenderProcessor.start",
                json!({ "renderSetup": { "_handle": "RenderSetup", "_id": setup.id() } }),
            )
            .map(|_| ())
        };

        match start(self) {
            Err(FlapiError::AlreadyRunning) if self.busy_policy() == BusyPolicy::Preempt => {
                debug!("processor busy, stopping current job first");
                self.stop_render(processor)?;
                start(self)
            }
            other => other,
        }
    }

    /// One fresh progress snapshot.
    pub fn render_progress(&mut self, processor: &Handle) -> Result<RenderStatus> {
        self.check_handle(processor, HandleType::RenderProcessor)?;
        let result = self.call(Some(processor.id()), "RenderProcessor.get_progress", json!({}))?;
        serde_json::from_value(result)
            .map_err(|e| FlapiError::Protocol(format!("bad render status: {}", e)))
    }

    /// Log entries accumulated by the processor for the current job.
    pub fn render_log(&mut self, processor: &Handle) -> Result<Vec<RenderLogItem>> {
        self.check_handle(processor, HandleType::RenderProcessor)?;
        let result = self.call(Some(processor.id()), "RenderProcessor.get_log", json!({}))?;
        serde_json::from_value(result)
            .map_err(|e| FlapiError::Protocol(format!("bad render log: {}", e)))
    }

    /// Stop the job the processor is currently running, if any.
    pub fn stop_render(&mut self, processor: &Handle) -> Result<()> {
        self.check_handle(processor, HandleType::RenderProcessor)?;
        self.call(Some(processor.id()), "RenderProcessor.stop", json!({}))?;
        Ok(())
    }
}
