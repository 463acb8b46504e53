//! The seam between the caches and the driver.
//!
//! Everything that touches GPU state goes through [`GraphicsDevice`], so the
//! texture and program caches can run against [`GlDevice`] on a live context
//! or against [`crate::headless::HeadlessDevice`] without one.

use crate::arb::{ArbFunctions, ArbProgramError, FRAGMENT_PROGRAM_ARB, VERTEX_PROGRAM_ARB};
use crate::errors::BuildError;
use crate::gl_helper::{explode_if_gl_error, GLErrorWrapper, Program, Texture};
use gl::types::{GLenum, GLint, GLsizei, GLuint};
use std::ffi::{c_void, CStr};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArbTarget {
    Vertex,
    Fragment,
}

impl ArbTarget {
    pub fn gl_enum(self) -> GLenum {
        match self {
            ArbTarget::Vertex => VERTEX_PROGRAM_ARB,
            ArbTarget::Fragment => FRAGMENT_PROGRAM_ARB,
        }
    }
}

/// Result of handing ARB program text to the driver.  The handle is valid even
/// when `error` is set; the driver simply refuses to run it.
#[derive(Clone, Debug)]
pub struct ArbProgramLoad {
    pub handle: GLuint,
    pub error: Option<ArbProgramError>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Red,
    Rg,
    Rgb,
    Rgba,
}

impl PixelFormat {
    pub fn gl_enum(self) -> GLenum {
        match self {
            PixelFormat::Red => gl::RED,
            PixelFormat::Rg => gl::RG,
            PixelFormat::Rgb => gl::RGB,
            PixelFormat::Rgba => gl::RGBA,
        }
    }

    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Red => 1,
            PixelFormat::Rg => 2,
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

/// Tightly packed 8-bit pixels ready for upload
pub struct TextureImage<'a> {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: &'a [u8],
}

pub trait GraphicsDevice {
    fn upload_texture(&mut self, image: &TextureImage) -> Result<GLuint, GLErrorWrapper>;

    fn delete_texture(&mut self, handle: GLuint);

    /// `vertex` and `fragment` are the complete NUL-terminated sources;
    /// `attributes` are bound before linking.
    fn build_glsl_program(
        &mut self,
        vertex: &CStr,
        fragment: &CStr,
        attributes: &[(GLuint, &str)],
    ) -> Result<GLuint, BuildError>;

    fn delete_glsl_program(&mut self, handle: GLuint);

    /// `None` unbinds
    fn use_glsl_program(&mut self, handle: Option<GLuint>) -> Result<(), GLErrorWrapper>;

    fn load_arb_program(
        &mut self,
        target: ArbTarget,
        source: &[u8],
    ) -> Result<ArbProgramLoad, GLErrorWrapper>;

    fn delete_arb_program(&mut self, handle: GLuint);

    /// Binds and enables the program for `target`; `None` disables the target.
    fn bind_arb_program(
        &mut self,
        target: ArbTarget,
        handle: Option<GLuint>,
    ) -> Result<(), GLErrorWrapper>;
}

//

/// [`GraphicsDevice`] backed by the current GL context
pub struct GlDevice {
    arb: Option<ArbFunctions>,
}

impl GlDevice {
    /// Load the GL function pointers (core and ARB) through `loader`.
    /// The context must be current.
    pub fn load_with<F>(mut loader: F) -> Self
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(&mut loader);
        Self {
            arb: ArbFunctions::load_with(loader),
        }
    }

    pub fn supports_arb_programs(&self) -> bool {
        self.arb.is_some()
    }

    fn arb(&self) -> Result<&ArbFunctions, GLErrorWrapper> {
        self.arb.as_ref().ok_or_else(|| {
            GLErrorWrapper::with_message("ARB assembly programs are not supported".to_string())
        })
    }
}

impl GraphicsDevice for GlDevice {
    fn upload_texture(&mut self, image: &TextureImage) -> Result<GLuint, GLErrorWrapper> {
        let target = gl::TEXTURE_2D;
        let format = image.format.gl_enum();
        let mut texture = Texture::new()?;
        texture.write_pixels(
            target,
            0,
            format as GLint,
            image.width as GLsizei,
            image.height as GLsizei,
            format,
            image.pixels,
        )?;
        unsafe { texture.generate_mipmap(target)? };
        texture.configure_sampling(target)?;

        unsafe { gl::BindTexture(target, 0) };
        explode_if_gl_error()?;

        Ok(texture.unmanage())
    }

    fn delete_texture(&mut self, handle: GLuint) {
        drop(Texture(crate::gl_helper::Ownership::Owned(handle)));
    }

    fn build_glsl_program(
        &mut self,
        vertex: &CStr,
        fragment: &CStr,
        attributes: &[(GLuint, &str)],
    ) -> Result<GLuint, BuildError> {
        Ok(Program::compile(vertex, fragment, attributes)?.unmanage())
    }

    fn delete_glsl_program(&mut self, handle: GLuint) {
        drop(Program::take_ownership(handle));
    }

    fn use_glsl_program(&mut self, handle: Option<GLuint>) -> Result<(), GLErrorWrapper> {
        unsafe { gl::UseProgram(handle.unwrap_or(0)) };
        explode_if_gl_error()
    }

    fn load_arb_program(
        &mut self,
        target: ArbTarget,
        source: &[u8],
    ) -> Result<ArbProgramLoad, GLErrorWrapper> {
        let arb = *self.arb()?;
        // the driver reports program errors through GL state, so start clean
        let _ = explode_if_gl_error();

        let handle = arb.gen_program()?;
        let loaded = arb
            .bind_program(target.gl_enum(), handle)
            .and_then(|_| arb.program_string(target.gl_enum(), source));
        let error = delete_on_error(handle, loaded, |handle| arb.delete_program(handle))?;
        Ok(ArbProgramLoad { handle, error })
    }

    fn delete_arb_program(&mut self, handle: GLuint) {
        if let Some(arb) = self.arb.as_ref() {
            arb.delete_program(handle);
        }
    }

    fn bind_arb_program(
        &mut self,
        target: ArbTarget,
        handle: Option<GLuint>,
    ) -> Result<(), GLErrorWrapper> {
        let arb = *self.arb()?;
        match handle {
            Some(handle) => {
                unsafe { gl::Enable(target.gl_enum()) };
                explode_if_gl_error()?;
                arb.bind_program(target.gl_enum(), handle)
            }
            None => {
                unsafe { gl::Disable(target.gl_enum()) };
                explode_if_gl_error()
            }
        }
    }
}

/// Hand `handle` to `delete` when `result` is an error, so a failed load does not leak it.
fn delete_on_error<T, E>(
    handle: GLuint,
    result: Result<T, E>,
    delete: impl FnOnce(GLuint),
) -> Result<T, E> {
    if result.is_err() {
        delete(handle);
    }
    result
}
