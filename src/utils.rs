use crate::error::PipelineError;
use std::path::PathBuf;

const DATA_DIR_NAME: &str = "wxflights";

/// `<platform data dir>/wxflights`, e.g. `~/.local/share/wxflights` on Linux.
pub fn get_data_dir() -> Result<PathBuf, PipelineError> {
    dirs::data_local_dir()
        .map(|p| p.join(DATA_DIR_NAME))
        .ok_or(PipelineError::DataDirResolution)
}
