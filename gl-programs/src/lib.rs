use gl_thin::device::GraphicsDevice;

pub mod arb_program;
pub mod bump_program;
pub mod depth_fill_program;
pub mod errors;
pub mod factory;
pub mod glsl_program;
pub mod source;

pub use errors::ProgramError;
pub use factory::{GLProgramFactory, ProgramKey};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProgramKind {
    /// `GL_ARB_vertex_program` / `GL_ARB_fragment_program` assembly
    Arb,
    Glsl,
}

/// A GPU program that can be created and destroyed as the GL context comes and goes.
pub trait GLProgram {
    fn name(&self) -> &str;

    fn kind(&self) -> ProgramKind;

    /// Compile and link.  Calling this on a created program does nothing.
    fn create(&mut self, device: &mut dyn GraphicsDevice) -> Result<(), ProgramError>;

    /// Release the GPU objects.  Safe to call on a program that was never created.
    fn destroy(&mut self, device: &mut dyn GraphicsDevice);

    fn is_created(&self) -> bool;

    fn enable(&self, device: &mut dyn GraphicsDevice) -> Result<(), ProgramError>;

    fn disable(&self, device: &mut dyn GraphicsDevice) -> Result<(), ProgramError>;
}
