use crate::errors::ProgramError;
use crate::source::{program_path, read_program_source};
use crate::{GLProgram, ProgramKind};
use gl::types::GLuint;
use gl_thin::device::{ArbTarget, GraphicsDevice};
use std::path::PathBuf;

/// A vertex + fragment pair of ARB assembly programs
pub struct ArbProgram {
    name: String,
    program_dir: PathBuf,
    vertex_file: String,
    fragment_file: String,
    vertex: Option<GLuint>,
    fragment: Option<GLuint>,
}

impl ArbProgram {
    pub fn new(
        name: impl Into<String>,
        program_dir: impl Into<PathBuf>,
        vertex_file: impl Into<String>,
        fragment_file: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            program_dir: program_dir.into(),
            vertex_file: vertex_file.into(),
            fragment_file: fragment_file.into(),
            vertex: None,
            fragment: None,
        }
    }

    pub fn vertex_file(&self) -> &str {
        &self.vertex_file
    }

    pub fn fragment_file(&self) -> &str {
        &self.fragment_file
    }

    pub fn handles(&self) -> Option<(GLuint, GLuint)> {
        self.vertex.zip(self.fragment)
    }

    fn load(
        &self,
        device: &mut dyn GraphicsDevice,
        target: ArbTarget,
        filename: &str,
    ) -> Result<GLuint, ProgramError> {
        let source = read_program_source(&self.program_dir, filename)?;
        let load = device.load_arb_program(target, &source)?;

        if let Some(err) = load.error {
            // legacy ARB errors are not fatal; the program just won't run
            log::error!(
                "GL program error: {}({}): \n\n{}",
                program_path(&self.program_dir, filename).display(),
                err.position,
                err.message
            );
        }

        Ok(load.handle)
    }
}

impl GLProgram for ArbProgram {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProgramKind {
        ProgramKind::Arb
    }

    fn create(&mut self, device: &mut dyn GraphicsDevice) -> Result<(), ProgramError> {
        if self.is_created() {
            return Ok(());
        }

        let vertex = self.load(device, ArbTarget::Vertex, &self.vertex_file)?;
        let fragment = match self.load(device, ArbTarget::Fragment, &self.fragment_file) {
            Ok(fragment) => fragment,
            Err(e) => {
                device.delete_arb_program(vertex);
                return Err(e);
            }
        };

        log::debug!(
            "created ARB program {} ({} / {})",
            self.name,
            self.vertex_file,
            self.fragment_file
        );
        self.vertex = Some(vertex);
        self.fragment = Some(fragment);
        Ok(())
    }

    fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(vertex) = self.vertex.take() {
            device.delete_arb_program(vertex);
        }
        if let Some(fragment) = self.fragment.take() {
            device.delete_arb_program(fragment);
        }
    }

    fn is_created(&self) -> bool {
        self.vertex.is_some() && self.fragment.is_some()
    }

    fn enable(&self, device: &mut dyn GraphicsDevice) -> Result<(), ProgramError> {
        let (vertex, fragment) = self
            .handles()
            .ok_or_else(|| ProgramError::NotCreated(self.name.clone()))?;
        device.bind_arb_program(ArbTarget::Vertex, Some(vertex))?;
        device.bind_arb_program(ArbTarget::Fragment, Some(fragment))?;
        Ok(())
    }

    fn disable(&self, device: &mut dyn GraphicsDevice) -> Result<(), ProgramError> {
        device.bind_arb_program(ArbTarget::Vertex, None)?;
        device.bind_arb_program(ArbTarget::Fragment, None)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gl_thin::HeadlessDevice;
    use std::path::Path;

    fn program_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("arb-program-{}-{}", tag, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("v.glp"), "!!ARBvp1.0\nEND\n").unwrap();
        std::fs::write(dir.join("f.glp"), "!!ARBfp1.0\nEND\n").unwrap();
        std::fs::write(dir.join("broken_fp.glp"), "MOV result.color, 1;\n").unwrap();
        dir
    }

    fn created(dir: &Path, fragment: &str, device: &mut HeadlessDevice) -> ArbProgram {
        let mut program = ArbProgram::new("test", dir, "v.glp", fragment);
        program.create(device).unwrap();
        program
    }

    #[test]
    fn create_destroy_round_trip() {
        let dir = program_dir("cycle");
        let mut device = HeadlessDevice::new();
        let mut program = created(&dir, "f.glp", &mut device);
        assert!(program.is_created());
        assert_eq!(device.live_programs(), 2);

        // second create is a no-op
        program.create(&mut device).unwrap();
        assert_eq!(device.compiles(), 2);

        program.destroy(&mut device);
        assert!(!program.is_created());
        assert_eq!(device.live_programs(), 0);
    }

    #[test]
    fn driver_rejection_is_logged_not_fatal() {
        let dir = program_dir("rejected");
        let mut device = HeadlessDevice::new();
        let program = created(&dir, "broken_fp.glp", &mut device);
        assert!(program.is_created());
    }

    #[test]
    fn missing_fragment_file_releases_vertex_program() {
        let dir = program_dir("missing");
        let mut device = HeadlessDevice::new();
        let mut program = ArbProgram::new("test", &dir, "v.glp", "absent.glp");
        assert!(matches!(
            program.create(&mut device),
            Err(ProgramError::Source { .. })
        ));
        assert!(!program.is_created());
        assert_eq!(device.live_programs(), 0);
    }

    #[test]
    fn enable_binds_both_targets() {
        let dir = program_dir("enable");
        let mut device = HeadlessDevice::new();
        let program = created(&dir, "f.glp", &mut device);
        program.enable(&mut device).unwrap();
        let (vertex, fragment) = program.handles().unwrap();
        assert_eq!(device.bound_arb_program(ArbTarget::Vertex), Some(vertex));
        assert_eq!(device.bound_arb_program(ArbTarget::Fragment), Some(fragment));

        program.disable(&mut device).unwrap();
        assert_eq!(device.bound_arb_program(ArbTarget::Vertex), None);
    }
}
