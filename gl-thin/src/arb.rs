//! `GL_ARB_vertex_program` / `GL_ARB_fragment_program` entry points.
//!
//! The `gl` crate is generated for the core profile without extensions, so the
//! handful of ARB assembly functions are looked up by hand through the same
//! loader that feeds `gl::load_with`.

use crate::gl_helper::{explode_if_gl_error, GLErrorWrapper};
use gl::types::{GLenum, GLint, GLsizei, GLuint};
use std::ffi::{c_void, CStr};
use std::os::raw::c_char;

pub const VERTEX_PROGRAM_ARB: GLenum = 0x8620;
pub const FRAGMENT_PROGRAM_ARB: GLenum = 0x8804;
pub const PROGRAM_FORMAT_ASCII_ARB: GLenum = 0x8875;
pub const PROGRAM_ERROR_POSITION_ARB: GLenum = 0x864B;
pub const PROGRAM_ERROR_STRING_ARB: GLenum = 0x8874;

type GenProgramsFn = unsafe extern "system" fn(GLsizei, *mut GLuint);
type DeleteProgramsFn = unsafe extern "system" fn(GLsizei, *const GLuint);
type BindProgramFn = unsafe extern "system" fn(GLenum, GLuint);
type ProgramStringFn = unsafe extern "system" fn(GLenum, GLenum, GLsizei, *const c_void);

/// I wish the gl crate published these functions
#[derive(Copy, Clone)]
pub struct ArbFunctions {
    gen_programs: GenProgramsFn,
    delete_programs: DeleteProgramsFn,
    bind_program: BindProgramFn,
    program_string: ProgramStringFn,
}

/// What the driver said about a program string it did not like
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArbProgramError {
    pub position: GLint,
    pub message: String,
}

impl ArbFunctions {
    /// Returns `None` when the driver does not expose the extension.
    pub fn load_with<F>(mut loader: F) -> Option<Self>
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        let gen_programs = loader("glGenProgramsARB");
        let delete_programs = loader("glDeleteProgramsARB");
        let bind_program = loader("glBindProgramARB");
        let program_string = loader("glProgramStringARB");

        if [gen_programs, delete_programs, bind_program, program_string]
            .iter()
            .any(|p| p.is_null())
        {
            log::warn!("ARB assembly program entry points are not available");
            return None;
        }

        unsafe {
            Some(Self {
                gen_programs: std::mem::transmute::<*const c_void, GenProgramsFn>(gen_programs),
                delete_programs: std::mem::transmute::<*const c_void, DeleteProgramsFn>(
                    delete_programs,
                ),
                bind_program: std::mem::transmute::<*const c_void, BindProgramFn>(bind_program),
                program_string: std::mem::transmute::<*const c_void, ProgramStringFn>(
                    program_string,
                ),
            })
        }
    }

    pub fn gen_program(&self) -> Result<GLuint, GLErrorWrapper> {
        let mut rval = 0;
        unsafe { (self.gen_programs)(1, &mut rval) };
        explode_if_gl_error()?;
        Ok(rval)
    }

    pub fn delete_program(&self, handle: GLuint) {
        unsafe { (self.delete_programs)(1, &handle) };
    }

    pub fn bind_program(&self, target: GLenum, handle: GLuint) -> Result<(), GLErrorWrapper> {
        unsafe { (self.bind_program)(target, handle) };
        explode_if_gl_error()
    }

    /// Upload the program text into the currently bound program object.
    ///
    /// Legacy ARB errors are reported through GL state rather than a status
    /// query: an `INVALID_OPERATION` means the driver rejected the text, and the
    /// position and message are read back and returned as `Ok(Some(..))`.
    pub fn program_string(
        &self,
        target: GLenum,
        source: &[u8],
    ) -> Result<Option<ArbProgramError>, GLErrorWrapper> {
        unsafe {
            (self.program_string)(
                target,
                PROGRAM_FORMAT_ASCII_ARB,
                source.len() as GLsizei,
                source.as_ptr() as *const c_void,
            )
        };

        match explode_if_gl_error() {
            Ok(()) => Ok(None),
            Err(e) if e.is_invalid_operation() => Ok(Some(read_program_error())),
            Err(e) => Err(e),
        }
    }
}

fn read_program_error() -> ArbProgramError {
    let mut position = 0;
    unsafe { gl::GetIntegerv(PROGRAM_ERROR_POSITION_ARB, &mut position) };
    let raw = unsafe { gl::GetString(PROGRAM_ERROR_STRING_ARB) };
    let message = if raw.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(raw as *const c_char) }
            .to_string_lossy()
            .into_owned()
    };
    ArbProgramError { position, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr::null;

    #[test]
    fn missing_entry_points_yield_none() {
        assert!(ArbFunctions::load_with(|_| null()).is_none());
    }

    #[test]
    fn partially_missing_entry_points_yield_none() {
        unsafe extern "system" fn bogus() {}
        let present = bogus as *const c_void;
        let loaded = ArbFunctions::load_with(|name| {
            if name == "glProgramStringARB" {
                null()
            } else {
                present
            }
        });
        assert!(loaded.is_none());
    }
}
