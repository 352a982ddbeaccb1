//! hand-loaded table of the egl entry points this project uses.

use std::ffi::{c_char, c_uint, c_void};
use std::ptr::null_mut;

use dynlib::DynLib;

pub type EGLBoolean = c_uint;
pub type EGLenum = c_uint;
pub type EGLint = i32;
pub type EGLAttrib = isize;
pub type EGLConfig = *mut c_void;
pub type EGLContext = *mut c_void;
pub type EGLDisplay = *mut c_void;
pub type EGLSurface = *mut c_void;
pub type EGLNativeDisplayType = *mut c_void;
pub type EGLNativeWindowType = *mut c_void;

pub const FALSE: EGLBoolean = 0;
pub const TRUE: EGLBoolean = 1;

pub const NO_CONTEXT: EGLContext = null_mut();
pub const NO_DISPLAY: EGLDisplay = null_mut();
pub const NO_SURFACE: EGLSurface = null_mut();

pub const SUCCESS: EGLint = 0x3000;
pub const ALPHA_SIZE: EGLenum = 0x3021;
pub const BLUE_SIZE: EGLenum = 0x3022;
pub const GREEN_SIZE: EGLenum = 0x3023;
pub const RED_SIZE: EGLenum = 0x3024;
pub const SURFACE_TYPE: EGLenum = 0x3033;
pub const NONE: EGLenum = 0x3038;
pub const RENDERABLE_TYPE: EGLenum = 0x3040;
pub const CONFORMANT: EGLenum = 0x3042;
pub const CONTEXT_MAJOR_VERSION: EGLenum = 0x3098;
pub const CONTEXT_MINOR_VERSION: EGLenum = 0x30FB;
pub const CONTEXT_OPENGL_PROFILE_MASK: EGLenum = 0x30FD;
pub const OPENGL_API: EGLenum = 0x30A2;
pub const PLATFORM_WAYLAND_KHR: EGLenum = 0x31D8;

pub const WINDOW_BIT: EGLint = 0x0004;
pub const OPENGL_BIT: EGLint = 0x0008;
pub const CONTEXT_OPENGL_CORE_PROFILE_BIT: EGLint = 0x0001;

#[allow(non_snake_case)]
pub struct Api {
    pub BindAPI: unsafe extern "C" fn(api: EGLenum) -> EGLBoolean,
    pub ChooseConfig: unsafe extern "C" fn(
        dpy: EGLDisplay,
        attrib_list: *const EGLint,
        configs: *mut EGLConfig,
        config_size: EGLint,
        num_config: *mut EGLint,
    ) -> EGLBoolean,
    pub CreateContext: unsafe extern "C" fn(
        dpy: EGLDisplay,
        config: EGLConfig,
        share_context: EGLContext,
        attrib_list: *const EGLint,
    ) -> EGLContext,
    /// egl 1.5; absent on older installations.
    pub CreatePlatformWindowSurface: Option<
        unsafe extern "C" fn(
            dpy: EGLDisplay,
            config: EGLConfig,
            native_window: *mut c_void,
            attrib_list: *const EGLAttrib,
        ) -> EGLSurface,
    >,
    pub CreateWindowSurface: unsafe extern "C" fn(
        dpy: EGLDisplay,
        config: EGLConfig,
        win: EGLNativeWindowType,
        attrib_list: *const EGLint,
    ) -> EGLSurface,
    pub DestroyContext: unsafe extern "C" fn(dpy: EGLDisplay, ctx: EGLContext) -> EGLBoolean,
    pub DestroySurface: unsafe extern "C" fn(dpy: EGLDisplay, surface: EGLSurface) -> EGLBoolean,
    pub GetDisplay: unsafe extern "C" fn(display_id: EGLNativeDisplayType) -> EGLDisplay,
    pub GetError: unsafe extern "C" fn() -> EGLint,
    /// egl 1.5; absent on older installations.
    pub GetPlatformDisplay: Option<
        unsafe extern "C" fn(
            platform: EGLenum,
            native_display: *mut c_void,
            attrib_list: *const EGLAttrib,
        ) -> EGLDisplay,
    >,
    pub GetProcAddress: unsafe extern "C" fn(procname: *const c_char) -> *mut c_void,
    pub Initialize:
        unsafe extern "C" fn(dpy: EGLDisplay, major: *mut EGLint, minor: *mut EGLint) -> EGLBoolean,
    pub MakeCurrent: unsafe extern "C" fn(
        dpy: EGLDisplay,
        draw: EGLSurface,
        read: EGLSurface,
        ctx: EGLContext,
    ) -> EGLBoolean,
    pub SwapBuffers: unsafe extern "C" fn(dpy: EGLDisplay, surface: EGLSurface) -> EGLBoolean,
    pub SwapInterval: unsafe extern "C" fn(dpy: EGLDisplay, interval: EGLint) -> EGLBoolean,
    pub Terminate: unsafe extern "C" fn(dpy: EGLDisplay) -> EGLBoolean,

    _dynlib: DynLib,
}

impl Api {
    pub fn load() -> Result<Self, dynlib::Error> {
        let dynlib = DynLib::open_any(&[c"libEGL.so.1", c"libEGL.so"])?;

        Ok(Self {
            BindAPI: dynlib.lookup(c"eglBindAPI")?,
            ChooseConfig: dynlib.lookup(c"eglChooseConfig")?,
            CreateContext: dynlib.lookup(c"eglCreateContext")?,
            CreatePlatformWindowSurface: dynlib.lookup(c"eglCreatePlatformWindowSurface").ok(),
            CreateWindowSurface: dynlib.lookup(c"eglCreateWindowSurface")?,
            DestroyContext: dynlib.lookup(c"eglDestroyContext")?,
            DestroySurface: dynlib.lookup(c"eglDestroySurface")?,
            GetDisplay: dynlib.lookup(c"eglGetDisplay")?,
            GetError: dynlib.lookup(c"eglGetError")?,
            GetPlatformDisplay: dynlib.lookup(c"eglGetPlatformDisplay").ok(),
            GetProcAddress: dynlib.lookup(c"eglGetProcAddress")?,
            Initialize: dynlib.lookup(c"eglInitialize")?,
            MakeCurrent: dynlib.lookup(c"eglMakeCurrent")?,
            SwapBuffers: dynlib.lookup(c"eglSwapBuffers")?,
            SwapInterval: dynlib.lookup(c"eglSwapInterval")?,
            Terminate: dynlib.lookup(c"eglTerminate")?,

            _dynlib: dynlib,
        })
    }
}
