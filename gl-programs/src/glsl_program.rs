use crate::errors::ProgramError;
use crate::source::read_glsl_source;
use crate::{GLProgram, ProgramKind};
use gl::types::GLuint;
use gl_thin::device::GraphicsDevice;
use std::path::PathBuf;

pub struct GlslProgram {
    name: String,
    program_dir: PathBuf,
    vertex_file: String,
    fragment_file: String,
    attributes: Vec<(GLuint, &'static str)>,
    handle: Option<GLuint>,
}

impl GlslProgram {
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
            attributes: Vec::new(),
            handle: None,
        }
    }

    /// Attribute locations to bind before linking
    pub fn with_attributes(mut self, attributes: &[(GLuint, &'static str)]) -> Self {
        self.attributes.extend_from_slice(attributes);
        self
    }

    pub fn vertex_file(&self) -> &str {
        &self.vertex_file
    }

    pub fn fragment_file(&self) -> &str {
        &self.fragment_file
    }

    pub fn attributes(&self) -> &[(GLuint, &'static str)] {
        &self.attributes
    }

    pub fn handle(&self) -> Option<GLuint> {
        self.handle
    }
}

impl GLProgram for GlslProgram {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProgramKind {
        ProgramKind::Glsl
    }

    fn create(&mut self, device: &mut dyn GraphicsDevice) -> Result<(), ProgramError> {
        if self.handle.is_some() {
            return Ok(());
        }

        let vertex = read_glsl_source(&self.program_dir, &self.vertex_file)?;
        let fragment = read_glsl_source(&self.program_dir, &self.fragment_file)?;

        let handle = device
            .build_glsl_program(&vertex, &fragment, &self.attributes)
            .map_err(|source| ProgramError::Build {
                program: self.name.clone(),
                source,
            })?;

        log::debug!("created GLSL program {} = {}", self.name, handle);
        self.handle = Some(handle);
        Ok(())
    }

    fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(handle) = self.handle.take() {
            device.delete_glsl_program(handle);
        }
    }

    fn is_created(&self) -> bool {
        self.handle.is_some()
    }

    fn enable(&self, device: &mut dyn GraphicsDevice) -> Result<(), ProgramError> {
        let handle = self
            .handle
            .ok_or_else(|| ProgramError::NotCreated(self.name.clone()))?;
        device.use_glsl_program(Some(handle))?;
        Ok(())
    }

    fn disable(&self, device: &mut dyn GraphicsDevice) -> Result<(), ProgramError> {
        device.use_glsl_program(None)?;
        Ok(())
    }
}
