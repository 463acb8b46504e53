use crate::gl_helper::GLErrorWrapper;
use std::fmt::{Display, Formatter};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl Display for ShaderStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Why a GPU program could not be built.  The `log` fields carry the driver's
/// diagnostic text verbatim.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to compile GLSL {stage} shader:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("Failed to construct GLSL program:\n{log}")]
    Link { log: String },

    #[error("GL error {0}")]
    Gl(#[from] GLErrorWrapper),
}

impl BuildError {
    /// The driver diagnostic, if the driver produced one
    pub fn driver_log(&self) -> Option<&str> {
        match self {
            BuildError::Compile { log, .. } | BuildError::Link { log } => Some(log),
            BuildError::Gl(_) => None,
        }
    }
}
