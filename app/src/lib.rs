use window::{Window, WindowEvent};

pub struct AppContext<'a> {
    pub window: &'a mut dyn Window,
    pub gl_api: &'a mut gl::Api,
}

/// the lifecycle of a gl app. `create` runs once the window is configured and
/// a context is current; `iterate` runs once per frame, context current;
/// `destroy` runs before teardown so gl objects can be released.
pub trait AppHandler {
    fn create(ctx: AppContext) -> anyhow::Result<Self>
    where
        Self: Sized;
    fn iterate(
        &mut self,
        ctx: AppContext,
        events: impl Iterator<Item = WindowEvent>,
    ) -> anyhow::Result<()>;
    fn destroy(&mut self, _ctx: AppContext) {}
}

mod runner;
pub use runner::run;
