use crate::error::{FlapiError, Result};
use serde::{Deserialize, Serialize};

/// Field order of the scene's working format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FieldOrder {
    // The service spells progressive as "None".
    #[default]
    #[serde(rename = "None")]
    Progressive,
    #[serde(rename = "upper")]
    UpperFirst,
    #[serde(rename = "lower")]
    LowerFirst,
}

/// Options for creating a new or temporary scene. Format and colourspace are
/// required; validation happens client-side before any remote call is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSceneOptions {
    pub format: String,
    pub colourspace: String,
    pub frame_rate: f64,
    pub field_order: FieldOrder,
}

impl Default for NewSceneOptions {
    fn default() -> Self {
        NewSceneOptions {
            format: String::new(),
            colourspace: String::new(),
            frame_rate: 24.0,
            field_order: FieldOrder::default(),
        }
    }
}

impl NewSceneOptions {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.format.is_empty() {
            return Err(FlapiError::InvalidOptions(
                "scene options require a format name".to_owned(),
            ));
        }
        if self.colourspace.is_empty() {
            return Err(FlapiError::InvalidOptions(
                "scene options require a working colourspace".to_owned(),
            ));
        }
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(FlapiError::InvalidOptions(format!(
                "bad frame rate {}",
                self.frame_rate
            )));
        }
        Ok(())
    }
}

/// Flags controlling how a scene is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpenFlag {
    #[serde(rename = "readonly")]
    ReadOnly,
    /// Discard any unsaved changes left by a previous editor.
    #[serde(rename = "discard")]
    Discard,
    /// Recover unsaved changes instead of discarding them.
    #[serde(rename = "recover")]
    Recover,
    #[serde(rename = "ignorerevision")]
    IgnoreRevision,
}

/// Where an insert operation places new material in the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertPosition {
    #[serde(rename = "start")]
    Start,
    #[serde(rename = "end")]
    End,
    #[serde(rename = "before")]
    Before,
    #[serde(rename = "after")]
    After,
}

impl InsertPosition {
    /// Before/after are relative to an existing shot and need an anchor.
    pub fn requires_anchor(&self) -> bool {
        matches!(self, InsertPosition::Before | InsertPosition::After)
    }
}
