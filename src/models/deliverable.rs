use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How the frame number in rendered file names is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FrameNumberMode {
    /// Scene frame number.
    #[default]
    #[serde(rename = "F")]
    SceneFrame,
    /// Frame number within the shot.
    #[serde(rename = "G")]
    ShotFrame,
    /// Record timecode expressed as a frame number.
    #[serde(rename = "T")]
    SceneTimecode,
    #[serde(rename = "H")]
    ShotTimecode,
}

/// Settings for one rendered output within a render setup. Built by value,
/// then handed to [`crate::render`]; the server never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RenderDeliverable {
    pub name: String,
    pub disabled: bool,
    pub is_movie: bool,
    /// Output file type, e.g. "EXR" or "ProRes".
    pub file_type: String,
    pub movie_codec: Option<String>,
    pub output_directory: PathBuf,
    pub file_name_prefix: String,
    pub file_name_postfix: String,
    /// Zero-padded width of the frame number in file names.
    pub file_name_num_digits: u32,
    pub file_name_number: FrameNumberMode,
    pub file_name_extension: String,
    /// Named format to render to; empty means the scene's working format.
    pub render_format: String,
    pub render_colour_space: Option<String>,
}

impl Default for RenderDeliverable {
    fn default() -> Self {
        RenderDeliverable {
            name: String::new(),
            disabled: false,
            is_movie: false,
            file_type: String::new(),
            movie_codec: None,
            output_directory: PathBuf::new(),
            file_name_prefix: String::new(),
            file_name_postfix: String::new(),
            file_name_num_digits: 7,
            file_name_number: FrameNumberMode::default(),
            file_name_extension: String::new(),
            render_format: String::new(),
            render_colour_space: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wire_field_names_are_pascal_case() {
        let deliverable = RenderDeliverable {
            name: "Render to EXR".to_owned(),
            file_type: "EXR".to_owned(),
            output_directory: PathBuf::from("/mnt/renders"),
            file_name_prefix: "render_".to_owned(),
            file_name_extension: ".exr".to_owned(),
            render_format: "Netflix 3840x2160".to_owned(),
            render_colour_space: Some("ACES_lin".to_owned()),
            ..Default::default()
        };
        let v = serde_json::to_value(&deliverable).unwrap();
        assert_eq!(v["FileType"], "EXR");
        assert_eq!(v["FileNameNumDigits"], 7);
        assert_eq!(v["FileNameNumber"], "F");
        assert_eq!(v["RenderColourSpace"], "ACES_lin");
    }
}
