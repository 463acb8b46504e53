use crate::config::ShaderSystemConfig;
use crate::library::{LoadReport, ShaderLibrary};
use crate::observer::{ModuleObserver, ObserverList, SharedObserver};
use crate::shader::Shader;
use crate::texture_manager::{GLTextureManager, TextureKey};
use gl_programs::{GLProgram, GLProgramFactory, ProgramError, ProgramKey};
use gl_thin::device::GraphicsDevice;
use gl_thin::gl_helper::GLErrorWrapper;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ShaderSystemError {
    #[error("the shader system is not realised")]
    NotRealised,
    #[error("GL error: {0}")]
    Gl(#[from] GLErrorWrapper),
}

/// Front door to materials, textures and GPU programs.
///
/// Nothing touches the GPU until `realise()`; `unrealise()` gives back every
/// GPU object but keeps the parsed definitions, so realising again is cheap.
pub struct ShaderSystem<D: GraphicsDevice> {
    config: ShaderSystemConfig,
    device: D,
    library: ShaderLibrary,
    textures: GLTextureManager,
    programs: GLProgramFactory,
    observers: ObserverList,
    realised: bool,
    last_load: LoadReport,
}

impl<D: GraphicsDevice> ShaderSystem<D> {
    pub fn new(config: ShaderSystemConfig, mut device: D) -> Self {
        let mut programs = GLProgramFactory::new(config.program_dir());
        if config.use_glsl {
            programs.set_using_glsl(true, &mut device);
        }
        Self {
            config,
            device,
            library: ShaderLibrary::new(),
            textures: GLTextureManager::new(),
            programs,
            observers: ObserverList::default(),
            realised: false,
            last_load: LoadReport::default(),
        }
    }

    pub fn config(&self) -> &ShaderSystemConfig {
        &self.config
    }

    pub fn is_realised(&self) -> bool {
        self.realised
    }

    pub fn realise(&mut self) {
        if self.realised {
            return;
        }
        if !self.library.is_loaded() {
            self.load_materials();
        }
        self.programs.realise(&mut self.device);
        self.realise_shaders();
        self.realised = true;
        log::debug!(
            "shader system realised: {} definitions, {} textures",
            self.library.definition_count(),
            self.textures.len()
        );
        self.observers.realise();
    }

    pub fn unrealise(&mut self) {
        if !self.realised {
            return;
        }
        self.observers.unrealise();
        self.unrealise_shaders();
        self.textures.unrealise(&mut self.device);
        self.programs.unrealise(&mut self.device);
        self.realised = false;
    }

    /// Re-read every material file, keeping the realised state.
    pub fn refresh(&mut self) {
        let was_realised = self.realised;
        self.unrealise();
        self.library.clear();
        self.load_materials();
        if was_realised {
            self.realise();
        }
    }

    fn load_materials(&mut self) {
        self.last_load = self.library.load_material_files(
            &self.config.base_path,
            &self.config.material_dir,
            &self.config.material_extension,
        );
    }

    /// What the most recent pass over the material files found
    pub fn last_load_report(&self) -> &LoadReport {
        &self.last_load
    }

    fn realise_shaders(&mut self) {
        let config = &self.config;
        let resolve = |reference: &str| config.resolve_image(reference);
        for shader in self.library.active_shaders_mut() {
            if let Err(e) = shader.realise(
                &mut self.textures,
                &mut self.device,
                &resolve,
                config.lighting_enabled,
            ) {
                log::error!("failed to realise shader {}: {}", shader.name(), e);
            }
        }
    }

    fn unrealise_shaders(&mut self) {
        for shader in self.library.active_shaders_mut() {
            shader.unrealise(&mut self.textures, &mut self.device);
        }
    }

    /// The shader for `name`, realised if the system is.  Unknown names get the
    /// not-found stub, so this never fails.
    pub fn get_shader_for_name(&mut self, name: &str) -> &Shader {
        if !self.library.is_loaded() {
            self.load_materials();
        }
        let config = &self.config;
        let shader = self.library.find_shader(name);
        if self.realised && !shader.is_realised() {
            let resolve = |reference: &str| config.resolve_image(reference);
            if let Err(e) = shader.realise(
                &mut self.textures,
                &mut self.device,
                &resolve,
                config.lighting_enabled,
            ) {
                log::error!("failed to realise shader {}: {}", name, e);
            }
        }
        shader
    }

    /// Every defined shader name, sorted
    pub fn foreach_shader_name<F: FnMut(&str)>(&self, mut f: F) {
        for name in self.library.definition_names() {
            f(name);
        }
    }

    pub fn active_shaders(&self) -> impl Iterator<Item = &Shader> + '_ {
        self.library.active_shaders()
    }

    /// A realised system realises a newly attached observer straight away.
    /// Attaching an observer twice changes nothing.
    pub fn attach(&mut self, observer: SharedObserver) {
        if self.observers.attach(observer.clone()) && self.realised {
            observer.borrow_mut().realise();
        }
    }

    pub fn detach(&mut self, observer: &SharedObserver) {
        if self.observers.detach(observer) && self.realised {
            observer.borrow_mut().unrealise();
        }
    }

    pub fn is_lighting_enabled(&self) -> bool {
        self.config.lighting_enabled
    }

    pub fn set_lighting_enabled(&mut self, enabled: bool) {
        if self.config.lighting_enabled == enabled {
            return;
        }
        if self.realised {
            self.unrealise_shaders();
        }
        self.config.lighting_enabled = enabled;
        if self.realised {
            self.realise_shaders();
        }
    }

    pub fn set_using_glsl(&mut self, use_glsl: bool) {
        self.config.use_glsl = use_glsl;
        self.programs.set_using_glsl(use_glsl, &mut self.device);
    }

    pub fn texture_prefix(&self) -> &str {
        &self.config.texture_prefix
    }

    /// Load an image outside any material.  Relative paths resolve against
    /// `base_path`.  The caller owns one reference; hand it back with
    /// [`Self::release_texture`].  The key goes stale on `unrealise()`.
    pub fn load_texture_from_file(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<TextureKey, ShaderSystemError> {
        if !self.realised {
            return Err(ShaderSystemError::NotRealised);
        }
        let path = self.config.base_path.join(path);
        Ok(self.textures.get_binding(&path, &mut self.device)?)
    }

    pub fn release_texture(&mut self, key: TextureKey) {
        self.textures.release(key, &mut self.device);
    }

    pub fn library(&self) -> &ShaderLibrary {
        &self.library
    }

    pub fn texture_manager(&self) -> &GLTextureManager {
        &self.textures
    }

    pub fn program_factory(&self) -> &GLProgramFactory {
        &self.programs
    }

    pub fn get_program(
        &mut self,
        vertex_file: &str,
        fragment_file: &str,
    ) -> Result<ProgramKey, ProgramError> {
        self.programs
            .get_program(vertex_file, fragment_file, &mut self.device)
    }

    pub fn get_built_in_program(&self, name: &str) -> Result<&dyn GLProgram, ProgramError> {
        self.programs.get_built_in_program(name)
    }

    pub fn enable_built_in_program(&mut self, name: &str) -> Result<(), ProgramError> {
        self.programs
            .get_built_in_program(name)?
            .enable(&mut self.device)
    }

    pub fn disable_built_in_program(&mut self, name: &str) -> Result<(), ProgramError> {
        self.programs
            .get_built_in_program(name)?
            .disable(&mut self.device)
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

impl<D: GraphicsDevice> ModuleObserver for ShaderSystem<D> {
    fn realise(&mut self) {
        ShaderSystem::realise(self);
    }

    fn unrealise(&mut self) {
        ShaderSystem::unrealise(self);
    }
}
