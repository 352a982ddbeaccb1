use anyhow::{Context as _, anyhow};
use gl::Apier as _;
use raw_window_handle as rwh;
use window::{Window, WindowAttrs, WindowEvent};

use crate::{AppContext, AppHandler};

struct Logger;

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        println!(
            "{level:<5} {file}:{line} > {text}",
            level = record.level(),
            file = record.file().unwrap_or_else(|| record.target()),
            line = record
                .line()
                .map_or_else(|| "??".to_string(), |line| line.to_string()),
            text = record.args(),
        );
    }

    fn flush(&self) {}
}

impl Logger {
    fn init() {
        log::set_logger(&Logger).expect("could not set logger");
        log::set_max_level(log::LevelFilter::Trace);
    }
}

struct InitializedGraphicsContext {
    egl_connection: egl::wrap::Connection,
    egl_context: egl::wrap::Context,
    egl_surface: egl::wrap::Surface,
    gl_api: gl::Api,
}

enum GraphicsContext {
    Initialized(InitializedGraphicsContext),
    Uninit,
}

impl GraphicsContext {
    fn new_uninit() -> Self {
        Self::Uninit
    }

    fn init(
        &mut self,
        display_handle: rwh::DisplayHandle,
        window_handle: rwh::WindowHandle,
        width: u32,
        height: u32,
    ) -> anyhow::Result<&mut InitializedGraphicsContext> {
        assert!(matches!(self, Self::Uninit));

        let mut egl_connection = match display_handle.as_raw() {
            rwh::RawDisplayHandle::Wayland(rdh) => {
                egl::wrap::Connection::from_wayland_display(rdh.display.as_ptr(), None)
                    .context("could not create egl connection")?
            }
            other => return Err(anyhow!("unsupported display: {other:?}")),
        };

        let egl_config = {
            use egl::{EGLenum, EGLint};

            let mut config_attrs = [egl::NONE as EGLint; 32];
            let mut num_config_attrs = 0;
            let mut push_config_attr = |attr: EGLenum, value: EGLint| {
                config_attrs[num_config_attrs] = attr as EGLint;
                num_config_attrs += 1;
                config_attrs[num_config_attrs] = value;
                num_config_attrs += 1;
            };
            push_config_attr(egl::SURFACE_TYPE, egl::WINDOW_BIT);
            push_config_attr(egl::CONFORMANT, egl::OPENGL_BIT);
            push_config_attr(egl::RENDERABLE_TYPE, egl::OPENGL_BIT);
            push_config_attr(egl::RED_SIZE, 8);
            push_config_attr(egl::GREEN_SIZE, 8);
            push_config_attr(egl::BLUE_SIZE, 8);
            // NOTE: EGL_ALPHA_SIZE enables surface transparency.
            push_config_attr(egl::ALPHA_SIZE, 8);

            let mut configs = [std::ptr::null_mut(); 64];
            let mut num_configs = 0;
            let ok = unsafe {
                (egl_connection.api.ChooseConfig)(
                    *egl_connection.display,
                    config_attrs.as_ptr(),
                    configs.as_mut_ptr(),
                    configs.len() as EGLint,
                    &mut num_configs,
                )
            };
            if ok == egl::FALSE || num_configs == 0 {
                return Err(egl_connection.error_code()).context("could not choose config");
            }

            let ret = configs[0];
            assert!(!ret.is_null());
            ret
        };

        let egl_context = egl_connection
            .create_context(
                egl::OPENGL_API,
                egl_config,
                None,
                Some(&[
                    egl::CONTEXT_MAJOR_VERSION as egl::EGLint,
                    3,
                    egl::CONTEXT_MINOR_VERSION as egl::EGLint,
                    3,
                    egl::CONTEXT_OPENGL_PROFILE_MASK as egl::EGLint,
                    egl::CONTEXT_OPENGL_CORE_PROFILE_BIT,
                    egl::NONE as egl::EGLint,
                ]),
            )
            .context("could not create egl context")?;

        let egl_surface = match window_handle.as_raw() {
            rwh::RawWindowHandle::Wayland(rwh) => egl_connection
                .create_wayland_surface(egl_context.config, rwh.surface.as_ptr(), width, height, None)
                .context("could not create egl surface")?,
            other => return Err(anyhow!("unsupported window: {other:?}")),
        };

        egl_connection
            .make_current(&egl_context, Some(&egl_surface))
            .context("could not make current")?;

        // one swap per display refresh, like the classic tutorial setups.
        egl_connection.swap_interval(1);

        let gl_api = unsafe {
            gl::Api::load_with(|procname| (egl_connection.api.GetProcAddress)(procname))
        }
        .context("could not load gl api")?;

        let gl_version = unsafe { gl_api.get_string(gl::VERSION) }?;
        log::info!("initialized gl {gl_version}");

        *self = Self::Initialized(InitializedGraphicsContext {
            egl_connection,
            egl_context,
            egl_surface,
            gl_api,
        });
        let Self::Initialized(init) = self else {
            unreachable!();
        };
        Ok(init)
    }
}

struct Context<A: AppHandler> {
    window: Box<dyn Window>,
    graphics_context: GraphicsContext,
    events: Vec<WindowEvent>,
    app_handler: Option<A>,
    close_requested: bool,
}

impl<A: AppHandler> Context<A> {
    fn new(window_attrs: WindowAttrs) -> anyhow::Result<Self> {
        let window = window::create_window(window_attrs)?;
        let graphics_context = GraphicsContext::new_uninit();
        Ok(Self {
            window,
            graphics_context,
            events: Vec::new(),
            app_handler: None,
            close_requested: false,
        })
    }

    fn iterate(&mut self) -> anyhow::Result<()> {
        self.window.pump_events()?;

        while let Some(event) = self.window.pop_event() {
            match event {
                WindowEvent::Configure { logical_size } => match self.graphics_context {
                    GraphicsContext::Uninit => {
                        let igc = self.graphics_context.init(
                            self.window.display_handle()?,
                            self.window.window_handle()?,
                            logical_size.0,
                            logical_size.1,
                        )?;

                        self.app_handler = Some(A::create(AppContext {
                            window: self.window.as_mut(),
                            gl_api: &mut igc.gl_api,
                        })?);
                    }
                    GraphicsContext::Initialized(_) => {
                        unreachable!();
                    }
                },
                WindowEvent::Resized { physical_size } => {
                    if let GraphicsContext::Initialized(ref mut igc) = self.graphics_context {
                        igc.egl_surface.resize(physical_size.0, physical_size.1);
                    }
                }
                WindowEvent::CloseRequested => {
                    self.close_requested = true;
                }
            }
            self.events.push(event);
        }

        let events = self.events.drain(..);

        let (
            Some(app_handler),
            GraphicsContext::Initialized(InitializedGraphicsContext {
                egl_connection,
                egl_context,
                egl_surface,
                gl_api,
            }),
        ) = (self.app_handler.as_mut(), &mut self.graphics_context)
        else {
            return Ok(());
        };

        egl_connection
            .make_current(egl_context, Some(egl_surface))
            .context("could not make current")?;

        app_handler.iterate(
            AppContext {
                window: self.window.as_mut(),
                gl_api,
            },
            events,
        )?;

        egl_connection
            .swap_buffers(egl_surface)
            .context("could not swap buffers")?;

        Ok(())
    }

    fn destroy(&mut self) {
        let (Some(app_handler), GraphicsContext::Initialized(igc)) =
            (self.app_handler.as_mut(), &mut self.graphics_context)
        else {
            return;
        };

        // gl object deletion needs the context current; skip cleanup rather
        // than crash if the context is already gone.
        if igc
            .egl_connection
            .make_current(&igc.egl_context, Some(&igc.egl_surface))
            .is_err()
        {
            log::warn!("could not make current for teardown");
            return;
        }

        app_handler.destroy(AppContext {
            window: self.window.as_mut(),
            gl_api: &mut igc.gl_api,
        });
    }
}

pub fn run<A: AppHandler>(window_attrs: WindowAttrs) -> anyhow::Result<()> {
    Logger::init();

    let mut ctx = Context::<A>::new(window_attrs).context("could not create app context")?;
    while !ctx.close_requested {
        ctx.iterate()?;
    }
    ctx.destroy();

    Ok(())
}
