use crate::connection::Connection;
use crate::error::{FlapiError, Result};
use crate::handle::{Handle, HandleType};
use serde_json::{json, Value};

/// Job database operations. These address jobs and scenes by name on a
/// database host; none of them hold server-side state beyond the format set
/// handle.
impl Connection {
    /// Names of all jobs on the given database host. An empty list is a
    /// valid answer, not an error.
    pub fn get_jobs(&mut self, host: &str) -> Result<Vec<String>> {
        let result = self.call(None, "JobManager.get_jobs", json!({ "host": host }))?;
        decode_names(result)
    }

    /// Names of the scenes in a job, optionally under one folder.
    pub fn get_scenes(
        &mut self,
        host: &str,
        job: &str,
        folder: Option<&str>,
    ) -> Result<Vec<String>> {
        let result = self.call(
            None,
            "JobManager.get_scenes",
            json!({ "host": host, "jobname": job, "folder": folder }),
        )?;
        decode_names(result)
    }

    pub fn job_exists(&mut self, host: &str, job: &str) -> Result<bool> {
        let result = self.call(
            None,
            "JobManager.job_exists",
            json!({ "host": host, "jobname": job }),
        )?;
        decode_flag(result)
    }

    pub fn create_job(&mut self, host: &str, job: &str) -> Result<()> {
        self.call(
            None,
            "JobManager.create_job",
            json!({ "host": host, "jobname": job }),
        )?;
        Ok(())
    }

    pub fn scene_exists(&mut self, host: &str, job: &str, scene: &str) -> Result<bool> {
        let result = self.call(
            None,
            "JobManager.scene_exists",
            json!({ "host": host, "jobname": job, "scenename": scene }),
        )?;
        decode_flag(result)
    }

    /// Delete a scene. `ignore_locks` forces deletion even when another
    /// host still holds the scene open.
    pub fn delete_scene(
        &mut self,
        host: &str,
        job: &str,
        scene: &str,
        ignore_locks: bool,
    ) -> Result<()> {
        self.call(
            None,
            "JobManager.delete_scene",
            json!({
                "host": host,
                "jobname": job,
                "scenename": scene,
                "ignoreLocks": ignore_locks as i32,
            }),
        )?;
        Ok(())
    }

    /// The global (installation-wide) format set.
    pub fn global_formats(&mut self) -> Result<Handle> {
        let result = self.call(None, "FormatSet.global_formats", json!({}))?;
        self.take_handle(&result, HandleType::FormatSet)
    }

    /// Names of every colour space defined in a format set.
    pub fn colour_space_names(&mut self, formats: &Handle) -> Result<Vec<String>> {
        self.check_handle(formats, HandleType::FormatSet)?;
        let result = self.call(
            Some(formats.id()),
            "FormatSet.get_colour_space_names",
            json!({}),
        )?;
        decode_names(result)
    }

    /// Define a new named format in a format set.
    pub fn add_format(
        &mut self,
        formats: &Handle,
        name: &str,
        description: &str,
        width: i64,
        height: i64,
        pixel_aspect: f64,
    ) -> Result<Handle> {
        self.check_handle(formats, HandleType::FormatSet)?;
        let result = self.call(
            Some(formats.id()),
            "FormatSet.add_format",
            json!({
                "name": name,
                "description": description,
                "width": width,
                "height": height,
                "pixelAspectRatio": pixel_aspect,
            }),
        )?;
        self.take_handle(&result, HandleType::Format)
    }
}

fn decode_names(value: Value) -> Result<Vec<String>> {
    serde_json::from_value(value)
        .map_err(|e| FlapiError::Protocol(format!("expected a list of names: {}", e)))
}

fn decode_flag(value: Value) -> Result<bool> {
    // The service reports booleans as 0/1.
    match value {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_i64().unwrap_or(0) != 0),
        other => Err(FlapiError::Protocol(format!(
            "expected a boolean, got {}",
            other
        ))),
    }
}
