pub mod arb;
pub mod device;
pub mod errors;
pub mod gl_helper;
pub mod headless;

pub use device::{GlDevice, GraphicsDevice};
pub use errors::BuildError;
pub use gl_helper::GLErrorWrapper;
pub use headless::HeadlessDevice;
