//! hand-loaded table of the gl entry points this project touches.
//!
//! gl functions have to be resolved through the current context (egl's
//! GetProcAddress); none of this is linked at build time.

use std::ffi::{c_char, c_void};
use std::mem::transmute_copy;

use anyhow::anyhow;

pub type GLboolean = u8;
pub type GLbitfield = u32;
pub type GLchar = c_char;
pub type GLenum = u32;
pub type GLfloat = f32;
pub type GLint = i32;
pub type GLsizei = i32;
pub type GLsizeiptr = isize;
pub type GLubyte = u8;
pub type GLuint = u32;

pub const FALSE: GLboolean = 0;
pub const TRUE: GLboolean = 1;

pub const NO_ERROR: GLenum = 0;
pub const TRIANGLES: GLenum = 0x0004;
pub const BACK: GLenum = 0x0405;
pub const UNSIGNED_INT: GLenum = 0x1405;
pub const FLOAT: GLenum = 0x1406;
pub const VERSION: GLenum = 0x1F02;
pub const COLOR_BUFFER_BIT: GLbitfield = 0x4000;
pub const ARRAY_BUFFER: GLenum = 0x8892;
pub const ELEMENT_ARRAY_BUFFER: GLenum = 0x8893;
pub const STATIC_DRAW: GLenum = 0x88E4;
pub const FRAGMENT_SHADER: GLenum = 0x8B30;
pub const VERTEX_SHADER: GLenum = 0x8B31;
pub const COMPILE_STATUS: GLenum = 0x8B81;
pub const LINK_STATUS: GLenum = 0x8B82;
pub const VALIDATE_STATUS: GLenum = 0x8B83;
pub const INFO_LOG_LENGTH: GLenum = 0x8B84;

#[allow(non_snake_case)]
pub struct Api {
    pub AttachShader: unsafe extern "C" fn(program: GLuint, shader: GLuint),
    pub BindBuffer: unsafe extern "C" fn(target: GLenum, buffer: GLuint),
    pub BindVertexArray: unsafe extern "C" fn(array: GLuint),
    pub BufferData:
        unsafe extern "C" fn(target: GLenum, size: GLsizeiptr, data: *const c_void, usage: GLenum),
    pub Clear: unsafe extern "C" fn(mask: GLbitfield),
    pub ClearColor:
        unsafe extern "C" fn(red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat),
    pub CompileShader: unsafe extern "C" fn(shader: GLuint),
    pub CreateProgram: unsafe extern "C" fn() -> GLuint,
    pub CreateShader: unsafe extern "C" fn(r#type: GLenum) -> GLuint,
    pub DeleteBuffers: unsafe extern "C" fn(n: GLsizei, buffers: *const GLuint),
    pub DeleteProgram: unsafe extern "C" fn(program: GLuint),
    pub DeleteShader: unsafe extern "C" fn(shader: GLuint),
    pub DeleteVertexArrays: unsafe extern "C" fn(n: GLsizei, arrays: *const GLuint),
    pub DetachShader: unsafe extern "C" fn(program: GLuint, shader: GLuint),
    pub DrawBuffer: unsafe extern "C" fn(buf: GLenum),
    pub DrawElements:
        unsafe extern "C" fn(mode: GLenum, count: GLsizei, r#type: GLenum, indices: *const c_void),
    pub EnableVertexAttribArray: unsafe extern "C" fn(index: GLuint),
    pub GenBuffers: unsafe extern "C" fn(n: GLsizei, buffers: *mut GLuint),
    pub GenVertexArrays: unsafe extern "C" fn(n: GLsizei, arrays: *mut GLuint),
    pub GetError: unsafe extern "C" fn() -> GLenum,
    pub GetProgramInfoLog: unsafe extern "C" fn(
        program: GLuint,
        buf_size: GLsizei,
        length: *mut GLsizei,
        info_log: *mut GLchar,
    ),
    pub GetProgramiv: unsafe extern "C" fn(program: GLuint, pname: GLenum, params: *mut GLint),
    pub GetShaderInfoLog: unsafe extern "C" fn(
        shader: GLuint,
        buf_size: GLsizei,
        length: *mut GLsizei,
        info_log: *mut GLchar,
    ),
    pub GetShaderiv: unsafe extern "C" fn(shader: GLuint, pname: GLenum, params: *mut GLint),
    pub GetString: unsafe extern "C" fn(name: GLenum) -> *const GLubyte,
    pub GetUniformLocation: unsafe extern "C" fn(program: GLuint, name: *const GLchar) -> GLint,
    pub LinkProgram: unsafe extern "C" fn(program: GLuint),
    pub ShaderSource: unsafe extern "C" fn(
        shader: GLuint,
        count: GLsizei,
        string: *const *const GLchar,
        length: *const GLint,
    ),
    pub Uniform4f:
        unsafe extern "C" fn(location: GLint, v0: GLfloat, v1: GLfloat, v2: GLfloat, v3: GLfloat),
    pub UseProgram: unsafe extern "C" fn(program: GLuint),
    pub ValidateProgram: unsafe extern "C" fn(program: GLuint),
    pub VertexAttribPointer: unsafe extern "C" fn(
        index: GLuint,
        size: GLint,
        r#type: GLenum,
        normalized: GLboolean,
        stride: GLsizei,
        pointer: *const c_void,
    ),
    pub Viewport: unsafe extern "C" fn(x: GLint, y: GLint, width: GLsizei, height: GLsizei),
}

impl Api {
    /// `loadfn` receives a nul-terminated function name and returns its
    /// address, or null if the context cannot provide it.
    pub unsafe fn load_with(
        mut loadfn: impl FnMut(*const c_char) -> *mut c_void,
    ) -> anyhow::Result<Self> {
        macro_rules! load {
            ($name:literal) => {{
                let addr = loadfn(concat!($name, "\0").as_ptr().cast());
                if addr.is_null() {
                    return Err(anyhow!(concat!("could not load ", $name)));
                }
                unsafe { transmute_copy(&addr) }
            }};
        }

        Ok(Self {
            AttachShader: load!("glAttachShader"),
            BindBuffer: load!("glBindBuffer"),
            BindVertexArray: load!("glBindVertexArray"),
            BufferData: load!("glBufferData"),
            Clear: load!("glClear"),
            ClearColor: load!("glClearColor"),
            CompileShader: load!("glCompileShader"),
            CreateProgram: load!("glCreateProgram"),
            CreateShader: load!("glCreateShader"),
            DeleteBuffers: load!("glDeleteBuffers"),
            DeleteProgram: load!("glDeleteProgram"),
            DeleteShader: load!("glDeleteShader"),
            DeleteVertexArrays: load!("glDeleteVertexArrays"),
            DetachShader: load!("glDetachShader"),
            DrawBuffer: load!("glDrawBuffer"),
            DrawElements: load!("glDrawElements"),
            EnableVertexAttribArray: load!("glEnableVertexAttribArray"),
            GenBuffers: load!("glGenBuffers"),
            GenVertexArrays: load!("glGenVertexArrays"),
            GetError: load!("glGetError"),
            GetProgramInfoLog: load!("glGetProgramInfoLog"),
            GetProgramiv: load!("glGetProgramiv"),
            GetShaderInfoLog: load!("glGetShaderInfoLog"),
            GetShaderiv: load!("glGetShaderiv"),
            GetString: load!("glGetString"),
            GetUniformLocation: load!("glGetUniformLocation"),
            LinkProgram: load!("glLinkProgram"),
            ShaderSource: load!("glShaderSource"),
            Uniform4f: load!("glUniform4f"),
            UseProgram: load!("glUseProgram"),
            ValidateProgram: load!("glValidateProgram"),
            VertexAttribPointer: load!("glVertexAttribPointer"),
            Viewport: load!("glViewport"),
        })
    }
}
