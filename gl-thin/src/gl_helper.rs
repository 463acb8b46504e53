use crate::errors::{BuildError, ShaderStage};
use gl::types::{GLchar, GLenum, GLint, GLsizei, GLuint};
use std::ffi::{CStr, CString};
use std::fmt::{Debug, Display, Formatter};
use std::marker::PhantomData;
use std::mem::{size_of, MaybeUninit};
use std::ptr::null;

#[cfg(feature = "egl")]
pub fn initialize_gl_using_egli() -> crate::device::GlDevice {
    crate::device::GlDevice::load_with(|name| match CString::new(name) {
        Ok(name) => (unsafe { egli::ffi::eglGetProcAddress(name.as_ptr()) }) as *const _,
        Err(_) => null(),
    })
}

pub fn explode_if_gl_error() -> Result<(), GLErrorWrapper> {
    let mut last_err = None;
    loop {
        let err = unsafe { gl::GetError() };
        if err == gl::NO_ERROR {
            break;
        } else {
            last_err = Some(err);
        }
    }

    match last_err {
        Some(e) => Err(GLErrorWrapper::new(e)),
        None => Ok(()),
    }
}

//

#[derive(Clone)]
pub enum MessageForError {
    None,
    Str(String),
}

#[derive(Clone)]
pub struct GLErrorWrapper {
    pub code: GLenum,
    pub message: MessageForError,
}

impl GLErrorWrapper {
    pub fn with_message(msg: String) -> Self {
        Self {
            code: 0,
            message: MessageForError::Str(msg),
        }
    }

    pub fn new(code: GLenum) -> Self {
        Self {
            code,
            message: MessageForError::None,
        }
    }

    pub fn is_invalid_operation(&self) -> bool {
        self.code == gl::INVALID_OPERATION
    }
}

impl Debug for GLErrorWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            MessageForError::Str(msg) => write!(f, "{:?}", msg),
            MessageForError::None => write!(f, "0x{:x}", self.code),
        }
    }
}

impl Display for GLErrorWrapper {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        <Self as Debug>::fmt(self, f)
    }
}

impl std::error::Error for GLErrorWrapper {}

//

pub enum Ownership<T> {
    Owned(T),
    None,
}

//

pub trait ShaderFlavor {
    const FLAVOR: GLenum;
    const STAGE: ShaderStage;
}

pub struct VertexShader {}
impl ShaderFlavor for VertexShader {
    const FLAVOR: GLenum = gl::VERTEX_SHADER;
    const STAGE: ShaderStage = ShaderStage::Vertex;
}

pub struct FragmentShader {}
impl ShaderFlavor for FragmentShader {
    const FLAVOR: GLenum = gl::FRAGMENT_SHADER;
    const STAGE: ShaderStage = ShaderStage::Fragment;
}

//

pub struct Shader<T> {
    handle: Option<GLuint>,
    phantom_data: PhantomData<T>,
}

impl<F: ShaderFlavor> Shader<F> {
    pub fn new_raw() -> Result<Self, GLErrorWrapper> {
        let rval = unsafe { gl::CreateShader(F::FLAVOR) };
        explode_if_gl_error()?;
        Ok(Self {
            handle: Some(rval),
            phantom_data: Default::default(),
        })
    }

    /// The source is handed to the driver as a single NUL-terminated string.
    pub fn compile(source: &CStr) -> Result<Self, BuildError> {
        let rval = Self::new_raw()?;
        let strings = [source.as_ptr() as *const GLchar];
        unsafe { gl::ShaderSource(rval.borrow(), 1, strings.as_ptr(), null()) };
        explode_if_gl_error()?;
        unsafe { gl::CompileShader(rval.borrow()) };
        explode_if_gl_error()?;

        let mut is_compiled = 0;
        unsafe { gl::GetShaderiv(rval.borrow(), gl::COMPILE_STATUS, &mut is_compiled) };
        if is_compiled == 0 {
            Err(BuildError::Compile {
                stage: F::STAGE,
                log: rval.get_shader_info_log(),
            })
        } else {
            Ok(rval)
        }
    }
}

impl<F> Shader<F> {
    /// get access to the GL handle in case you need to call some low-level stuff
    pub fn borrow(&self) -> GLuint {
        self.handle.unwrap_or(0)
    }

    pub fn get_shader_info_log(&self) -> String {
        let mut max_length = 0;
        unsafe { gl::GetShaderiv(self.borrow(), gl::INFO_LOG_LENGTH, &mut max_length) };
        let mut error_log: Vec<GLchar> = vec![0; max_length.max(1) as usize];
        let mut written = 0;
        unsafe {
            gl::GetShaderInfoLog(
                self.borrow(),
                error_log.len() as GLsizei,
                &mut written,
                error_log.as_mut_ptr(),
            );
        }
        error_log.truncate(written.max(0) as usize);
        String::from_utf8_lossy(&from_glchar_to_u8(error_log)).into_owned()
    }
}

impl<F> Drop for Shader<F> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            unsafe { gl::DeleteShader(handle) }
        }
    }
}

//

pub struct Program(GLuint);

impl Program {
    pub fn new_empty() -> Result<Self, GLErrorWrapper> {
        let rval = unsafe { gl::CreateProgram() };
        explode_if_gl_error()?;
        Ok(Self(rval))
    }

    /// Compile both stages, bind the requested attribute locations and link.
    pub fn compile(
        vertex_shader: &CStr,
        fragment_shader: &CStr,
        attributes: &[(GLuint, &str)],
    ) -> Result<Self, BuildError> {
        let vertex_shader = Shader::<VertexShader>::compile(vertex_shader)?;
        let fragment_shader = Shader::<FragmentShader>::compile(fragment_shader)?;

        let mut rval = Self::new_empty()?;
        rval.attach(&vertex_shader)?;
        rval.attach(&fragment_shader)?;

        for (index, name) in attributes {
            rval.bind_attribute_location(*index, name)?;
        }

        unsafe { gl::LinkProgram(rval.borrow()) };
        explode_if_gl_error()?;

        let mut link_status = 0;
        unsafe { gl::GetProgramiv(rval.borrow(), gl::LINK_STATUS, &mut link_status) };
        explode_if_gl_error()?;
        if link_status == 0 {
            return Err(BuildError::Link {
                log: rval.get_program_info_log(),
            });
        }

        rval.detach(&vertex_shader);
        rval.detach(&fragment_shader);

        #[cfg(debug_assertions)]
        rval.log_validation();

        Ok(rval)
    }

    pub fn borrow(&self) -> GLuint {
        self.0
    }

    pub fn take_ownership(handle: GLuint) -> Self {
        Self(handle)
    }

    #[must_use]
    /// take ownership of the GL handle inside this object.  You are now responsible for calling gl::DeleteProgram
    pub fn unmanage(self) -> GLuint {
        let handle = self.0;
        std::mem::forget(self);
        handle
    }

    fn attach<T>(&mut self, shader: &Shader<T>) -> Result<(), GLErrorWrapper> {
        unsafe { gl::AttachShader(self.borrow(), shader.borrow()) };
        explode_if_gl_error()
    }

    fn detach<T>(&mut self, shader: &Shader<T>) {
        unsafe { gl::DetachShader(self.borrow(), shader.borrow()) };
    }

    fn bind_attribute_location(&mut self, index: GLuint, name: &str) -> Result<(), GLErrorWrapper> {
        let c_name = CString::new(name)
            .map_err(|_| GLErrorWrapper::with_message(format!("bad attribute name {:?}", name)))?;
        unsafe { gl::BindAttribLocation(self.0, index, c_name.as_ptr()) };
        explode_if_gl_error()
    }

    #[cfg(debug_assertions)]
    fn log_validation(&self) {
        let mut valid = 0;
        unsafe {
            gl::ValidateProgram(self.0);
            gl::GetProgramiv(self.0, gl::VALIDATE_STATUS, &mut valid);
        }
        log::debug!(
            "GLSL program {} {} valid: {}",
            self.0,
            if valid != 0 { "IS" } else { "IS NOT" },
            self.get_program_info_log()
        );
    }

    pub fn get_program_info_log(&self) -> String {
        let mut max_length = 0;
        unsafe { gl::GetProgramiv(self.borrow(), gl::INFO_LOG_LENGTH, &mut max_length) };
        let mut error_log: Vec<GLchar> = vec![0; max_length.max(1) as usize];
        let mut written = 0;
        unsafe {
            gl::GetProgramInfoLog(
                self.borrow(),
                error_log.len() as GLsizei,
                &mut written,
                error_log.as_mut_ptr(),
            );
        }
        error_log.truncate(written.max(0) as usize);
        String::from_utf8_lossy(&from_glchar_to_u8(error_log)).into_owned()
    }
}

fn from_glchar_to_u8(src: Vec<GLchar>) -> Vec<u8> {
    src.into_iter().map(|x| x as u8).collect::<Vec<_>>()
}

impl Drop for Program {
    fn drop(&mut self) {
        unsafe { gl::DeleteProgram(self.0) }
    }
}

//

pub struct Texture(pub Ownership<GLuint>);

impl Texture {
    pub fn new() -> Result<Self, GLErrorWrapper> {
        let mut rval = MaybeUninit::uninit();
        unsafe { gl::GenTextures(1, rval.as_mut_ptr()) };
        explode_if_gl_error()?;
        Ok(Self(Ownership::Owned(unsafe { rval.assume_init() })))
    }

    pub fn borrow(&self) -> GLuint {
        match &self.0 {
            Ownership::Owned(val) => *val,
            Ownership::None => 0,
        }
    }

    #[must_use]
    /// take ownership of the GL handle inside this object.  You are now responsible for calling gl::DeleteTextures
    pub fn unmanage(mut self) -> GLuint {
        let handle = self.borrow();
        self.0 = Ownership::None;
        handle
    }

    pub fn bind(&self, target: GLenum) -> Result<(), GLErrorWrapper> {
        unsafe { gl::BindTexture(target, self.borrow()) };
        explode_if_gl_error()
    }

    /// Remember to populate the mipmap by either writing all the different mipmap `level`s or using `self.generate_mipmap()`
    #[allow(clippy::too_many_arguments)]
    pub fn write_pixels<T: GLBufferType>(
        &mut self,
        target: GLenum,
        level: GLint,
        internal_format: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        pixels: &[T],
    ) -> Result<(), GLErrorWrapper> {
        let bpp = bytes_per_pixel::<T>(format)?;
        if image_byte_len(width, height, bpp) != pixels.len() * size_of::<T>() {
            return Err(GLErrorWrapper::with_message(format!(
                "size mismatch : {}*{}*{} != {}",
                width,
                height,
                bpp,
                pixels.len()
            )));
        }
        self.bind(target)?;
        unsafe {
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            gl::TexImage2D(
                target,
                level,
                internal_format,
                width,
                height,
                0,
                format,
                T::TYPE_CODE,
                pixels.as_ptr() as *const _,
            );
        }
        explode_if_gl_error()
    }

    /// # Safety
    /// did you `bind()` this texture yet?
    pub unsafe fn generate_mipmap(&self, target: GLenum) -> Result<(), GLErrorWrapper> {
        unsafe { gl::GenerateMipmap(target) };
        explode_if_gl_error()
    }

    /// trilinear filtering and repeat wrapping, which is what map textures want
    pub fn configure_sampling(&self, target: GLenum) -> Result<(), GLErrorWrapper> {
        self.bind(target)?;
        unsafe {
            gl::TexParameteri(target, gl::TEXTURE_MIN_FILTER, gl::LINEAR_MIPMAP_LINEAR as GLint);
            gl::TexParameteri(target, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint);
            gl::TexParameteri(target, gl::TEXTURE_WRAP_S, gl::REPEAT as GLint);
            gl::TexParameteri(target, gl::TEXTURE_WRAP_T, gl::REPEAT as GLint);
        }
        explode_if_gl_error()
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        match self.0 {
            Ownership::Owned(handle) => unsafe { gl::DeleteTextures(1, &handle) },
            Ownership::None => {}
        }
    }
}

//

pub trait GLBufferType {
    const TYPE_CODE: GLenum;
}

impl GLBufferType for u8 {
    const TYPE_CODE: GLenum = gl::UNSIGNED_BYTE;
}

pub fn bytes_per_pixel<T: GLBufferType>(format: GLenum) -> Result<usize, GLErrorWrapper> {
    let alpha = match format {
        gl::RGB => 3,
        gl::RED => 1,
        gl::RG => 2,
        gl::RGBA => 4,
        _ => {
            // there are so many variants I am missing ...
            return Err(GLErrorWrapper::with_message(format!(
                "unhandled format 0x{:x}",
                format
            )));
        }
    };

    Ok(alpha * size_of::<T>())
}

/// bytes of a tightly packed `width`x`height` image; negative sizes count as empty
pub fn image_byte_len(width: GLsizei, height: GLsizei, bytes_per_pixel: usize) -> usize {
    width.max(0) as usize * height.max(0) as usize * bytes_per_pixel
}
