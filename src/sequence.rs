use crate::connection::Connection;
use crate::error::{FlapiError, Result};
use crate::handle::{Handle, HandleType};
use serde_json::{json, Value};

/// Sequence descriptor lookup. A descriptor identifies a run of frames (or a
/// movie) on disk that can be inserted into a scene.
impl Connection {
    /// Find descriptors matching a file path or template. A movie yields one
    /// descriptor; an image template can yield several. Empty is a valid
    /// answer when nothing on disk matches.
    pub fn sequences_for_template(
        &mut self,
        template: &str,
        start_frame: Option<i64>,
        end_frame: Option<i64>,
    ) -> Result<Vec<Handle>> {
        let result = self.call(
            None,
            "SequenceDescriptor.get_for_template",
            json!({
                "template": template,
                "start": start_frame,
                "end": end_frame,
            }),
        )?;
        let items = match result {
            Value::Null => Vec::new(),
            Value::Array(items) => items,
            other => {
                return Err(FlapiError::Protocol(format!(
                    "expected a list of sequence descriptors, got {}",
                    other
                )))
            }
        };
        items
            .iter()
            .map(|item| self.take_handle(item, HandleType::SequenceDescriptor))
            .collect()
    }

    pub fn sequence_width(&mut self, sequence: &Handle) -> Result<i64> {
        self.sequence_dimension(sequence, "SequenceDescriptor.get_width")
    }

    pub fn sequence_height(&mut self, sequence: &Handle) -> Result<i64> {
        self.sequence_dimension(sequence, "SequenceDescriptor.get_height")
    }

    fn sequence_dimension(&mut self, sequence: &Handle, method: &str) -> Result<i64> {
        self.check_handle(sequence, HandleType::SequenceDescriptor)?;
        let result = self.call(Some(sequence.id()), method, json!({}))?;
        result
            .as_i64()
            .ok_or_else(|| FlapiError::Protocol(format!("{} returned {}", method, result)))
    }
}
