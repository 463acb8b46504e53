//! Reading GPU program text from the program directory.

use crate::errors::ProgramError;
use std::ffi::CString;
use std::path::{Path, PathBuf};

/// File names are used verbatim, relative to the program directory.
pub fn program_path(program_dir: &Path, filename: &str) -> PathBuf {
    program_dir.join(filename)
}

/// Raw bytes, no terminator; ARB program strings carry an explicit length.
pub fn read_program_source(program_dir: &Path, filename: &str) -> Result<Vec<u8>, ProgramError> {
    let path = program_path(program_dir, filename);
    std::fs::read(&path).map_err(|source| ProgramError::Source { path, source })
}

/// NUL-terminated, which is how GLSL sources are handed to the compiler.
pub fn read_glsl_source(program_dir: &Path, filename: &str) -> Result<CString, ProgramError> {
    let bytes = read_program_source(program_dir, filename)?;
    CString::new(bytes).map_err(|_| ProgramError::InteriorNul {
        path: program_path(program_dir, filename),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gl-programs-{}-{}", tag, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_is_a_source_error() {
        let dir = scratch_dir("missing");
        match read_program_source(&dir, "nope.glp") {
            Err(ProgramError::Source { path, .. }) => assert!(path.ends_with("nope.glp")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn glsl_source_is_nul_terminated() {
        let dir = scratch_dir("glsl");
        std::fs::write(dir.join("a.glsl"), "void main() {}").unwrap();
        let source = read_glsl_source(&dir, "a.glsl").unwrap();
        assert_eq!(source.as_bytes_with_nul().last(), Some(&0));
        assert_eq!(source.as_bytes(), b"void main() {}");

        let raw = read_program_source(&dir, "a.glsl").unwrap();
        assert_eq!(raw.len(), "void main() {}".len());
    }

    #[test]
    fn embedded_nul_is_rejected_for_glsl() {
        let dir = scratch_dir("nul");
        std::fs::write(dir.join("b.glsl"), b"void\0main").unwrap();
        assert!(matches!(
            read_glsl_source(&dir, "b.glsl"),
            Err(ProgramError::InteriorNul { .. })
        ));
    }
}
