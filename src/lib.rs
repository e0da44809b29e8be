// error taxonomy shared by every operation
pub mod error;

// session transport to the flapi service
pub mod connection;

// spawn and attach to a local flapid process
pub mod launch;

// tracking of server-owned object handles
pub mod handle;

// job database operations (jobs, scenes, formats)
pub mod jobs;

// scene lifecycle and timeline editing
pub mod scene;

// sequence descriptor lookup
pub mod sequence;

// render setup and processor control
pub mod render;

// progress polling for long-running renders
pub mod poller;

// value objects passed to and from the service
pub mod models;

pub use connection::{Config, Connection};
pub use error::{FlapiError, Result};
pub use handle::{Handle, HandleType};
pub use launch::LaunchOptions;
pub use poller::{CancelToken, PollOptions, RenderOutcome};
