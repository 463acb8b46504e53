use crate::material::ShaderDefinition;
use crate::texture_manager::{GLTextureManager, TextureKey};
use gl_thin::device::GraphicsDevice;
use gl_thin::gl_helper::GLErrorWrapper;
use std::path::PathBuf;
use std::rc::Rc;

/// Textures a realised shader holds
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderBindings {
    pub editor_image: Option<TextureKey>,
    pub diffuse: Option<TextureKey>,
    pub bump: Option<TextureKey>,
    pub specular: Option<TextureKey>,
}

impl ShaderBindings {
    fn keys(&self) -> impl Iterator<Item = TextureKey> + '_ {
        [self.editor_image, self.diffuse, self.bump, self.specular]
            .into_iter()
            .flatten()
    }
}

/// A material in use by the renderer.
pub struct Shader {
    name: String,
    definition: Rc<ShaderDefinition>,
    valid: bool,
    bindings: Option<ShaderBindings>,
}

impl Shader {
    pub fn new(definition: Rc<ShaderDefinition>) -> Self {
        Self {
            name: definition.name.clone(),
            definition,
            valid: true,
            bindings: None,
        }
    }

    /// Stand-in for a name with no definition; renders with the placeholder texture.
    pub fn not_found(name: &str) -> Self {
        Self {
            name: name.to_string(),
            definition: Rc::new(ShaderDefinition::not_found(name)),
            valid: false,
            bindings: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> &ShaderDefinition {
        &self.definition
    }

    pub fn shader_file_name(&self) -> &str {
        &self.definition.file
    }

    pub fn description(&self) -> &str {
        &self.definition.description
    }

    /// false for the not-found stub
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_realised(&self) -> bool {
        self.bindings.is_some()
    }

    pub fn bindings(&self) -> Option<&ShaderBindings> {
        self.bindings.as_ref()
    }

    pub fn editor_texture(&self) -> Option<TextureKey> {
        self.bindings.as_ref().and_then(|b| b.editor_image)
    }

    /// Acquire the textures this shader draws with.  `resolve` maps an image
    /// reference from the material to a file.
    ///
    /// The editor image is always bound, falling back to the placeholder.  The
    /// interaction maps are only bound with lighting on.
    pub fn realise(
        &mut self,
        textures: &mut GLTextureManager,
        device: &mut dyn GraphicsDevice,
        resolve: &dyn Fn(&str) -> PathBuf,
        lighting_enabled: bool,
    ) -> Result<(), GLErrorWrapper> {
        if self.is_realised() {
            return Ok(());
        }

        let mut bindings = ShaderBindings::default();
        let result = self.acquire(&mut bindings, textures, device, resolve, lighting_enabled);
        if result.is_err() {
            for key in bindings.keys() {
                textures.release(key, device);
            }
            return result;
        }

        self.bindings = Some(bindings);
        Ok(())
    }

    fn acquire(
        &self,
        bindings: &mut ShaderBindings,
        textures: &mut GLTextureManager,
        device: &mut dyn GraphicsDevice,
        resolve: &dyn Fn(&str) -> PathBuf,
        lighting_enabled: bool,
    ) -> Result<(), GLErrorWrapper> {
        let definition = &self.definition;

        bindings.editor_image = Some(match definition.editor_image_reference() {
            Some(reference) if self.valid => textures.get_binding(&resolve(reference), device)?,
            _ => textures.get_placeholder(device)?,
        });

        if lighting_enabled && self.valid {
            for (slot, reference) in [
                (&mut bindings.diffuse, &definition.diffuse),
                (&mut bindings.bump, &definition.bump),
                (&mut bindings.specular, &definition.specular),
            ] {
                if let Some(reference) = reference {
                    *slot = Some(textures.get_binding(&resolve(reference), device)?);
                }
            }
        }
        Ok(())
    }

    pub fn unrealise(&mut self, textures: &mut GLTextureManager, device: &mut dyn GraphicsDevice) {
        if let Some(bindings) = self.bindings.take() {
            for key in bindings.keys() {
                textures.release(key, device);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gl_thin::HeadlessDevice;

    fn resolve_nowhere(reference: &str) -> PathBuf {
        PathBuf::from("/nowhere").join(reference)
    }

    fn wood() -> Rc<ShaderDefinition> {
        let mut def = ShaderDefinition::new("textures/wood", "wood.mtr");
        def.description = "oak planks".into();
        def.diffuse = Some("textures/wood_d.png".into());
        def.bump = Some("textures/wood_local.png".into());
        Rc::new(def)
    }

    #[test]
    fn not_found_shader_uses_the_placeholder() {
        let mut device = HeadlessDevice::new();
        let mut textures = GLTextureManager::new();
        let mut shader = Shader::not_found("textures/missing");
        assert!(!shader.is_valid());
        assert_eq!(shader.name(), "textures/missing");

        shader
            .realise(&mut textures, &mut device, &resolve_nowhere, true)
            .unwrap();
        let key = shader.editor_texture().unwrap();
        assert_eq!(textures.key_for_path(std::path::Path::new("$placeholder")), Some(key));
    }

    #[test]
    fn interaction_maps_need_lighting() {
        let mut device = HeadlessDevice::new();
        let mut textures = GLTextureManager::new();

        let mut unlit = Shader::new(wood());
        unlit
            .realise(&mut textures, &mut device, &resolve_nowhere, false)
            .unwrap();
        let bindings = unlit.bindings().unwrap();
        assert!(bindings.editor_image.is_some());
        assert_eq!(bindings.bump, None);

        let mut lit = Shader::new(wood());
        lit.realise(&mut textures, &mut device, &resolve_nowhere, true)
            .unwrap();
        let bindings = lit.bindings().unwrap();
        // the editor image falls back to the diffuse map, so they share a texture
        assert_eq!(bindings.editor_image, bindings.diffuse);
        assert!(bindings.bump.is_some());
        assert_eq!(bindings.specular, None);
    }

    #[test]
    fn unrealise_gives_textures_back() {
        let mut device = HeadlessDevice::new();
        let mut textures = GLTextureManager::new();
        let mut shader = Shader::new(wood());
        assert_eq!(shader.shader_file_name(), "wood.mtr");
        assert_eq!(shader.description(), "oak planks");

        shader
            .realise(&mut textures, &mut device, &resolve_nowhere, true)
            .unwrap();
        assert_eq!(device.live_textures(), 2);

        shader.unrealise(&mut textures, &mut device);
        assert!(!shader.is_realised());
        assert_eq!(device.live_textures(), 0);
        assert!(textures.is_empty());
    }
}
