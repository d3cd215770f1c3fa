use std::path::PathBuf;

/// Default number of transcript lines attached to a status.
pub const DEFAULT_TAIL_LINES: usize = 100;

/// Storage locations and limits of the lifecycle engine.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// Where job templates live (`<name>.conf`).
    pub templates_dir: PathBuf,
    /// Where rendered instances live (`<name>_<id>.conf`).
    ///
    /// Rendered paths are handed to the supervisor, so this should be absolute.
    pub instances_dir: PathBuf,
    /// Where instance transcripts are written by the supervised programs.
    pub transcripts_dir: PathBuf,
    /// Transcript lines attached to each status.
    pub log_tail_lines: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("templates"),
            instances_dir: PathBuf::from("instances"),
            transcripts_dir: PathBuf::from("/tmp"),
            log_tail_lines: DEFAULT_TAIL_LINES,
        }
    }
}
