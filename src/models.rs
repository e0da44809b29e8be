// location of a job or scene within the database
pub mod scene_path;

// scene creation and editing options
pub mod options;

// description of one rendered output
pub mod deliverable;

// render progress snapshots and processor log entries
pub mod status;
