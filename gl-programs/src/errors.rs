use gl_thin::errors::BuildError;
use gl_thin::gl_helper::GLErrorWrapper;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    /// Asking for a built-in program that was never registered is a programming error.
    #[error("GLProgramFactory: failed to find program {0}")]
    Lookup(String),

    #[error("failed to open GL program file {}: {source}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("GL program file {} contains a NUL byte", path.display())]
    InteriorNul { path: PathBuf },

    #[error("failed to build GL program {program}: {source}")]
    Build {
        program: String,
        #[source]
        source: BuildError,
    },

    #[error("GL program {0} has not been created")]
    NotCreated(String),

    #[error("GL error {0}")]
    Gl(#[from] GLErrorWrapper),
}

impl ProgramError {
    pub fn is_lookup(&self) -> bool {
        matches!(self, ProgramError::Lookup(_))
    }
}
