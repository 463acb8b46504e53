//! Material definitions, the textures and GPU programs they draw with, and
//! the [`ShaderSystem`] that ties them to the life of a GL context.

pub mod config;
pub mod image;
pub mod library;
pub mod material;
pub mod observer;
pub mod parser;
pub mod shader;
pub mod system;
pub mod texture_manager;

pub use config::{ConfigError, ShaderSystemConfig};
pub use image::ImageError;
pub use library::{LoadReport, ShaderLibrary};
pub use material::{MaterialFlags, MaterialStage, ShaderDefinition, StageBlend};
pub use observer::{ModuleObserver, SharedObserver};
pub use parser::{parse_material_source, ParseError};
pub use shader::Shader;
pub use system::{ShaderSystem, ShaderSystemError};
pub use texture_manager::{GLTextureManager, Texture, TextureKey};

pub use gl_programs::{GLProgram, GLProgramFactory, ProgramError, ProgramKey, ProgramKind};
pub use gl_thin::{GlDevice, GraphicsDevice, HeadlessDevice};
