use std::ffi::{c_int, c_void};
use std::ptr::null;
use std::{array, error, fmt};

use crate::libegl::*;
use crate::libwayland_egl;

// NOTE: Connection hands out handles for the resources it creates that need
// cleanup; it keeps track of them and is responsible for deinitialization,
// whether the caller destroys them explicitly or lets Connection drop.

/// an egl error code, as reported by eglGetError.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode(pub EGLint);

impl error::Error for ErrorCode {}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("egl error {:#x}", self.0))
    }
}

// ----
// display

pub enum Display {
    /// eglGetPlatformDisplay (egl 1.5)
    Khr(EGLDisplay),
    /// eglGetDisplay
    /// > the set of platforms to which display_id is permitted to belong, as
    /// well as the actual type of display_id, are implementation-specific.
    /// - https://registry.khronos.org/EGL/sdk/docs/man/html/eglGetDisplay.xhtml
    Old(EGLDisplay),
}

impl std::ops::Deref for Display {
    type Target = EGLDisplay;

    fn deref(&self) -> &Self::Target {
        let (Self::Khr(dpy) | Self::Old(dpy)) = self;
        dpy
    }
}

impl Display {
    fn get_platform_display(
        api: &Api,
        platform: EGLenum,
        native_display: *mut c_void,
        attribs: Option<&[EGLAttrib]>,
    ) -> Option<EGLDisplay> {
        let get_platform_display = api.GetPlatformDisplay?;
        let ret = unsafe {
            get_platform_display(
                platform,
                native_display,
                attribs.map_or(null(), |attribs| attribs.as_ptr()),
            )
        };
        (ret != NO_DISPLAY).then_some(ret)
    }

    fn get_display(api: &Api, native_display: *mut c_void) -> Option<EGLDisplay> {
        let ret = unsafe { (api.GetDisplay)(native_display) };
        (ret != NO_DISPLAY).then_some(ret)
    }

    fn from_wayland_display(
        api: &Api,
        wl_display: *mut c_void,
        attribs: Option<&[EGLAttrib]>,
    ) -> Option<Self> {
        attribs.inspect(|attribs| assert!(attribs.contains(&(NONE as EGLAttrib))));

        Self::get_platform_display(api, PLATFORM_WAYLAND_KHR, wl_display, attribs)
            .map(Self::Khr)
            .or_else(|| Self::get_display(api, wl_display).map(Self::Old))
    }
}

// ----
// context

#[derive(Debug)]
pub enum CreateContextError {
    CouldNotBindApi(EGLint),
    CouldNotCreateContext(EGLint),
}

impl error::Error for CreateContextError {}

impl fmt::Display for CreateContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CouldNotBindApi(code) => {
                f.write_fmt(format_args!("could not bind api: {code:#x}"))
            }
            Self::CouldNotCreateContext(code) => {
                f.write_fmt(format_args!("could not create context: {code:#x}"))
            }
        }
    }
}

pub struct Context {
    index: u8,
    pub context: EGLContext,
    pub config: EGLConfig,
}

// ----
// surface

#[derive(Debug)]
pub enum CreateWaylandWsiError {
    CouldNotLoadWaylandEgl(dynlib::Error),
    CouldNotCreateWlEglWindow,
}

impl error::Error for CreateWaylandWsiError {}

impl fmt::Display for CreateWaylandWsiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CouldNotLoadWaylandEgl(err) => {
                f.write_fmt(format_args!("could not load wayland-egl: {err}"))
            }
            Self::CouldNotCreateWlEglWindow => f.write_str("could not create wl egl window"),
        }
    }
}

struct WaylandWsi {
    lib: libwayland_egl::Lib,
    wl_egl_window: *mut libwayland_egl::wl_egl_window,
}

impl WaylandWsi {
    fn new(wl_surface: *mut c_void, width: u32, height: u32) -> Result<Self, CreateWaylandWsiError> {
        let lib = libwayland_egl::Lib::load()
            .map_err(CreateWaylandWsiError::CouldNotLoadWaylandEgl)?;

        let wl_egl_window =
            unsafe { (lib.wl_egl_window_create)(wl_surface, width as c_int, height as c_int) };
        if wl_egl_window.is_null() {
            return Err(CreateWaylandWsiError::CouldNotCreateWlEglWindow);
        }

        Ok(Self { lib, wl_egl_window })
    }

    fn resize(&self, width: u32, height: u32) {
        unsafe {
            (self.lib.wl_egl_window_resize)(self.wl_egl_window, width as c_int, height as c_int, 0, 0)
        };
    }
}

impl Drop for WaylandWsi {
    fn drop(&mut self) {
        unsafe { (self.lib.wl_egl_window_destroy)(self.wl_egl_window) };
    }
}

// NOTE: wsi stands for window system integration, in the vulkan sense of the
// term. wayland is the only integration wired up so far.
enum Wsi {
    Wayland(WaylandWsi),
}

impl Wsi {
    fn as_native_window(&self) -> *mut c_void {
        match self {
            Self::Wayland(wayland) => wayland.wl_egl_window.cast(),
        }
    }

    fn resize(&self, width: u32, height: u32) {
        match self {
            Self::Wayland(wayland) => wayland.resize(width, height),
        }
    }
}

#[derive(Debug)]
pub enum CreateSurfaceError {
    CouldNotCreateWaylandWsi(CreateWaylandWsiError),
    CouldNotCreateSurface(EGLint),
}

impl error::Error for CreateSurfaceError {}

impl fmt::Display for CreateSurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CouldNotCreateWaylandWsi(err) => {
                f.write_fmt(format_args!("could not create wayland wsi: {err}"))
            }
            Self::CouldNotCreateSurface(code) => {
                f.write_fmt(format_args!("could not create surface: {code:#x}"))
            }
        }
    }
}

pub struct Surface {
    index: u8,
    wsi: Wsi,
    pub surface: EGLSurface,
    pub config: EGLConfig,
}

impl Surface {
    pub fn resize(&self, width: u32, height: u32) {
        self.wsi.resize(width, height);
    }
}

// ----
// connection

#[derive(Debug)]
pub enum CreateConnectionError {
    CouldNotLoadEgl(dynlib::Error),
    CouldNotGetDisplay,
    CouldNotInitializeDisplay(EGLint),
}

impl error::Error for CreateConnectionError {}

impl fmt::Display for CreateConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CouldNotLoadEgl(err) => f.write_fmt(format_args!("could not load egl: {err}")),
            Self::CouldNotGetDisplay => f.write_str("could not get display"),
            Self::CouldNotInitializeDisplay(code) => {
                f.write_fmt(format_args!("could not initialize display: {code:#x}"))
            }
        }
    }
}

pub struct Connection {
    pub api: Api,
    pub display: Display,

    // NOTE: this program needs one of each; a few spares cost nothing.
    contexts: [Option<EGLContext>; 4],
    surfaces: [Option<EGLSurface>; 4],
}

impl Drop for Connection {
    fn drop(&mut self) {
        for maybe_surface in self.surfaces.iter_mut() {
            if let Some(surface) = maybe_surface.take() {
                unsafe { (self.api.DestroySurface)(*self.display, surface) };
            }
        }

        for maybe_context in self.contexts.iter_mut() {
            if let Some(context) = maybe_context.take() {
                unsafe { (self.api.DestroyContext)(*self.display, context) };
            }
        }

        unsafe { (self.api.Terminate)(*self.display) };
    }
}

impl Connection {
    pub fn from_wayland_display(
        wl_display: *mut c_void,
        attribs: Option<&[EGLAttrib]>,
    ) -> Result<Self, CreateConnectionError> {
        let api = Api::load().map_err(CreateConnectionError::CouldNotLoadEgl)?;

        let display = Display::from_wayland_display(&api, wl_display, attribs)
            .ok_or(CreateConnectionError::CouldNotGetDisplay)?;

        let mut version = (0, 0);
        if unsafe { (api.Initialize)(*display, &mut version.0, &mut version.1) } == FALSE {
            let code = unsafe { (api.GetError)() };
            return Err(CreateConnectionError::CouldNotInitializeDisplay(code));
        }
        log::info!("initialized egl {}.{}", version.0, version.1);

        Ok(Self {
            api,
            display,
            contexts: array::from_fn(|_| None),
            surfaces: array::from_fn(|_| None),
        })
    }

    pub fn error_code(&self) -> ErrorCode {
        ErrorCode(unsafe { (self.api.GetError)() })
    }

    /// NOTE: EGLConfig needs no cleanup, so choosing one is left entirely to
    /// the caller.
    pub fn create_context(
        &mut self,
        api: EGLenum,
        config: EGLConfig,
        share_context: Option<&Context>,
        attribs: Option<&[EGLint]>,
    ) -> Result<Context, CreateContextError> {
        attribs.inspect(|attribs| assert!(attribs.contains(&(NONE as EGLint))));

        if unsafe { (self.api.BindAPI)(api) } == FALSE {
            let code = unsafe { (self.api.GetError)() };
            return Err(CreateContextError::CouldNotBindApi(code));
        }

        let context = unsafe {
            (self.api.CreateContext)(
                *self.display,
                config,
                share_context.map_or(NO_CONTEXT, |c| c.context),
                attribs.map_or(null(), |attribs| attribs.as_ptr()),
            )
        };
        if context == NO_CONTEXT {
            let code = unsafe { (self.api.GetError)() };
            return Err(CreateContextError::CouldNotCreateContext(code));
        }

        let index = self
            .contexts
            .iter()
            .position(|it| it.is_none())
            .expect("exhausted context capacity");
        self.contexts[index] = Some(context);
        Ok(Context {
            index: index as u8,
            context,
            config,
        })
    }

    /// panics if the handle is invalid.
    pub fn destroy_context(&mut self, c: Context) {
        let context = self.contexts[c.index as usize]
            .take()
            .expect("invalid context handle");
        unsafe { (self.api.DestroyContext)(*self.display, context) };
    }

    pub fn create_wayland_surface(
        &mut self,
        config: EGLConfig,
        wl_surface: *mut c_void,
        width: u32,
        height: u32,
        attribs: Option<&[EGLAttrib]>,
    ) -> Result<Surface, CreateSurfaceError> {
        attribs.inspect(|attribs| assert!(attribs.contains(&(NONE as EGLAttrib))));

        let wsi = Wsi::Wayland(
            WaylandWsi::new(wl_surface, width, height)
                .map_err(CreateSurfaceError::CouldNotCreateWaylandWsi)?,
        );

        let surface = match self.display {
            Display::Khr(dpy) => {
                // a khr display implies egl 1.5, which carries the platform
                // surface entry point.
                let create_platform_window_surface = self
                    .api
                    .CreatePlatformWindowSurface
                    .expect("egl 1.5 display without eglCreatePlatformWindowSurface");
                unsafe {
                    create_platform_window_surface(
                        dpy,
                        config,
                        wsi.as_native_window(),
                        attribs.map_or(null(), |attribs| attribs.as_ptr()),
                    )
                }
            }
            Display::Old(dpy) => {
                // the legacy entry point takes EGLint attribs; none are
                // passed through here.
                assert!(attribs.is_none());
                unsafe {
                    (self.api.CreateWindowSurface)(dpy, config, wsi.as_native_window(), null())
                }
            }
        };
        if surface == NO_SURFACE {
            let code = unsafe { (self.api.GetError)() };
            return Err(CreateSurfaceError::CouldNotCreateSurface(code));
        }

        let index = self
            .surfaces
            .iter()
            .position(|it| it.is_none())
            .expect("exhausted surface capacity");
        self.surfaces[index] = Some(surface);
        Ok(Surface {
            index: index as u8,
            wsi,
            surface,
            config,
        })
    }

    /// panics if the handle is invalid.
    pub fn destroy_surface(&mut self, s: Surface) {
        let surface = self.surfaces[s.index as usize]
            .take()
            .expect("invalid surface handle");
        unsafe { (self.api.DestroySurface)(*self.display, surface) };
    }

    pub fn make_current(
        &self,
        context: &Context,
        surface: Option<&Surface>,
    ) -> Result<(), ErrorCode> {
        let surface = surface.map_or(NO_SURFACE, |s| s.surface);
        if unsafe { (self.api.MakeCurrent)(*self.display, surface, surface, context.context) }
            == FALSE
        {
            Err(self.error_code())
        } else {
            Ok(())
        }
    }

    pub fn swap_buffers(&self, surface: &Surface) -> Result<(), ErrorCode> {
        if unsafe { (self.api.SwapBuffers)(*self.display, surface.surface) } == FALSE {
            Err(self.error_code())
        } else {
            Ok(())
        }
    }

    /// best effort; not every config honors every interval.
    pub fn swap_interval(&self, interval: EGLint) {
        if unsafe { (self.api.SwapInterval)(*self.display, interval) } == FALSE {
            log::debug!(
                "could not set swap interval {interval}: {}",
                self.error_code()
            );
        }
    }
}
