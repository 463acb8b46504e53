use crate::image::{load_image, DecodedImage};
use gl::types::GLuint;
use gl_thin::device::GraphicsDevice;
use gl_thin::gl_helper::GLErrorWrapper;
use slotmap::{new_key_type, SlotMap};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

new_key_type! {
    /// Handle to a cached GPU texture
    pub struct TextureKey;
}

const PLACEHOLDER_PATH: &str = "$placeholder";

pub struct Texture {
    path: PathBuf,
    handle: GLuint,
    width: u32,
    height: u32,
    placeholder: bool,
    refs: usize,
}

impl Texture {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn handle(&self) -> GLuint {
        self.handle
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// true when the image could not be loaded and the checkerboard stands in for it
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub fn ref_count(&self) -> usize {
        self.refs
    }
}

/// One GPU texture per image path, shared by everything that asks for it.
///
/// Every `get_binding` must be paired with a `release`; the GPU object is
/// deleted when the last holder lets go.
#[derive(Default)]
pub struct GLTextureManager {
    textures: SlotMap<TextureKey, Texture>,
    by_path: HashMap<PathBuf, TextureKey>,
}

impl GLTextureManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_binding(
        &mut self,
        path: &Path,
        device: &mut dyn GraphicsDevice,
    ) -> Result<TextureKey, GLErrorWrapper> {
        if let Some(key) = self.acquire_cached(path) {
            return Ok(key);
        }

        let texture = match load_image(path) {
            Ok(image) => match upload(path, &image, false, device) {
                Ok(texture) => texture,
                Err(e) => {
                    log::warn!("failed to upload {}: {}", path.display(), e);
                    upload(path, &DecodedImage::placeholder(), true, device)?
                }
            },
            Err(e) => {
                log::warn!(
                    "failed to load texture {}: {}; substituting placeholder",
                    path.display(),
                    e
                );
                upload(path, &DecodedImage::placeholder(), true, device)?
            }
        };

        log::debug!(
            "uploaded {} ({}x{}) as texture {}",
            path.display(),
            texture.width,
            texture.height,
            texture.handle
        );
        Ok(self.insert(texture))
    }

    /// The shared "shader not found" texture, counted like any other binding.
    pub fn get_placeholder(
        &mut self,
        device: &mut dyn GraphicsDevice,
    ) -> Result<TextureKey, GLErrorWrapper> {
        let path = Path::new(PLACEHOLDER_PATH);
        if let Some(key) = self.acquire_cached(path) {
            return Ok(key);
        }
        let texture = upload(path, &DecodedImage::placeholder(), true, device)?;
        Ok(self.insert(texture))
    }

    /// Drop one reference.  Stale keys are ignored.
    pub fn release(&mut self, key: TextureKey, device: &mut dyn GraphicsDevice) {
        let Some(texture) = self.textures.get_mut(key) else {
            return;
        };
        texture.refs = texture.refs.saturating_sub(1);
        if texture.refs > 0 {
            return;
        }
        if let Some(texture) = self.textures.remove(key) {
            device.delete_texture(texture.handle);
            self.by_path.remove(&texture.path);
        }
    }

    pub fn texture(&self, key: TextureKey) -> Option<&Texture> {
        self.textures.get(key)
    }

    pub fn key_for_path(&self, path: &Path) -> Option<TextureKey> {
        self.by_path.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Delete every GPU texture regardless of holders; outstanding keys go stale.
    pub fn unrealise(&mut self, device: &mut dyn GraphicsDevice) {
        for (_, texture) in self.textures.drain() {
            device.delete_texture(texture.handle);
        }
        self.by_path.clear();
    }

    fn acquire_cached(&mut self, path: &Path) -> Option<TextureKey> {
        let key = *self.by_path.get(path)?;
        let texture = self.textures.get_mut(key)?;
        texture.refs += 1;
        Some(key)
    }

    fn insert(&mut self, texture: Texture) -> TextureKey {
        let path = texture.path.clone();
        let key = self.textures.insert(texture);
        self.by_path.insert(path, key);
        key
    }
}

fn upload(
    path: &Path,
    image: &DecodedImage,
    placeholder: bool,
    device: &mut dyn GraphicsDevice,
) -> Result<Texture, GLErrorWrapper> {
    let handle = device.upload_texture(&image.as_texture_image())?;
    Ok(Texture {
        path: path.to_path_buf(),
        handle,
        width: image.width,
        height: image.height,
        placeholder,
        refs: 1,
    })
}
