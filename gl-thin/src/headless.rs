//! A [`GraphicsDevice`] that needs no context.
//!
//! Handles are allocated from a counter and every live object is tracked, so
//! callers can check that caches give back exactly what they took.  Sources are
//! checked the way a strict driver would reject obviously broken input: GLSL
//! must define `main`, ARB text must start with the right `!!ARB..1.0` header.

use crate::arb::ArbProgramError;
use crate::device::{ArbProgramLoad, ArbTarget, GraphicsDevice, TextureImage};
use crate::errors::{BuildError, ShaderStage};
use crate::gl_helper::GLErrorWrapper;
use gl::types::GLuint;
use std::collections::{HashMap, HashSet};
use std::ffi::CStr;

#[derive(Default)]
pub struct HeadlessDevice {
    next_handle: GLuint,
    textures: HashMap<GLuint, (u32, u32)>,
    glsl_programs: HashSet<GLuint>,
    arb_programs: HashMap<GLuint, ArbTarget>,
    bound_glsl: Option<GLuint>,
    bound_arb: HashMap<ArbTarget, GLuint>,
    uploads: usize,
    compiles: usize,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> GLuint {
        self.next_handle += 1;
        self.next_handle
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn texture_size(&self, handle: GLuint) -> Option<(u32, u32)> {
        self.textures.get(&handle).copied()
    }

    pub fn live_programs(&self) -> usize {
        self.glsl_programs.len() + self.arb_programs.len()
    }

    pub fn is_live_program(&self, handle: GLuint) -> bool {
        self.glsl_programs.contains(&handle) || self.arb_programs.contains_key(&handle)
    }

    /// total texture uploads since construction
    pub fn uploads(&self) -> usize {
        self.uploads
    }

    /// total program builds (GLSL links and ARB loads) since construction
    pub fn compiles(&self) -> usize {
        self.compiles
    }

    pub fn bound_glsl_program(&self) -> Option<GLuint> {
        self.bound_glsl
    }

    pub fn bound_arb_program(&self, target: ArbTarget) -> Option<GLuint> {
        self.bound_arb.get(&target).copied()
    }
}

fn check_glsl(stage: ShaderStage, source: &CStr) -> Result<(), BuildError> {
    let text = source.to_string_lossy();
    if text.contains("main") {
        Ok(())
    } else {
        Err(BuildError::Compile {
            stage,
            log: "0:1(1): error: main() is not defined".to_string(),
        })
    }
}

fn arb_header(target: ArbTarget) -> &'static [u8] {
    match target {
        ArbTarget::Vertex => b"!!ARBvp1.0",
        ArbTarget::Fragment => b"!!ARBfp1.0",
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn upload_texture(&mut self, image: &TextureImage) -> Result<GLuint, GLErrorWrapper> {
        let expected = image.width as usize * image.height as usize * image.format.channels();
        if expected != image.pixels.len() {
            return Err(GLErrorWrapper::with_message(format!(
                "size mismatch : {}*{}*{} != {}",
                image.width,
                image.height,
                image.format.channels(),
                image.pixels.len()
            )));
        }
        let handle = self.allocate();
        self.textures.insert(handle, (image.width, image.height));
        self.uploads += 1;
        Ok(handle)
    }

    fn delete_texture(&mut self, handle: GLuint) {
        self.textures.remove(&handle);
    }

    fn build_glsl_program(
        &mut self,
        vertex: &CStr,
        fragment: &CStr,
        _attributes: &[(GLuint, &str)],
    ) -> Result<GLuint, BuildError> {
        self.compiles += 1;
        check_glsl(ShaderStage::Vertex, vertex)?;
        check_glsl(ShaderStage::Fragment, fragment)?;
        let handle = self.allocate();
        self.glsl_programs.insert(handle);
        Ok(handle)
    }

    fn delete_glsl_program(&mut self, handle: GLuint) {
        self.glsl_programs.remove(&handle);
        if self.bound_glsl == Some(handle) {
            self.bound_glsl = None;
        }
    }

    fn use_glsl_program(&mut self, handle: Option<GLuint>) -> Result<(), GLErrorWrapper> {
        match handle {
            Some(h) if !self.glsl_programs.contains(&h) => Err(GLErrorWrapper::new(
                gl::INVALID_VALUE,
            )),
            _ => {
                self.bound_glsl = handle;
                Ok(())
            }
        }
    }

    fn load_arb_program(
        &mut self,
        target: ArbTarget,
        source: &[u8],
    ) -> Result<ArbProgramLoad, GLErrorWrapper> {
        self.compiles += 1;
        let handle = self.allocate();
        self.arb_programs.insert(handle, target);
        let error = if source.starts_with(arb_header(target)) {
            None
        } else {
            Some(ArbProgramError {
                position: 0,
                message: "line 1, column 1:  error: invalid program header".to_string(),
            })
        };
        Ok(ArbProgramLoad { handle, error })
    }

    fn delete_arb_program(&mut self, handle: GLuint) {
        if let Some(target) = self.arb_programs.remove(&handle) {
            if self.bound_arb.get(&target) == Some(&handle) {
                self.bound_arb.remove(&target);
            }
        }
    }

    fn bind_arb_program(
        &mut self,
        target: ArbTarget,
        handle: Option<GLuint>,
    ) -> Result<(), GLErrorWrapper> {
        match handle {
            Some(h) => match self.arb_programs.get(&h) {
                Some(t) if *t == target => {
                    self.bound_arb.insert(target, h);
                    Ok(())
                }
                _ => Err(GLErrorWrapper::new(gl::INVALID_OPERATION)),
            },
            None => {
                self.bound_arb.remove(&target);
                Ok(())
            }
        }
    }
}
