use raw_window_handle as rwh;

mod backend_winit;

pub const DEFAULT_LOGICAL_SIZE: (u32, u32) = (640, 480);

#[derive(Debug, Clone)]
pub struct WindowAttrs {
    pub title: String,
    pub logical_size: Option<(u32, u32)>,
    pub resizable: bool,
}

impl Default for WindowAttrs {
    fn default() -> Self {
        Self {
            title: String::new(),
            logical_size: None,
            resizable: true,
        }
    }
}

#[derive(Debug)]
pub enum WindowEvent {
    /// the window exists and has its initial size; safe to hook up graphics.
    Configure { logical_size: (u32, u32) },
    Resized { physical_size: (u32, u32) },
    CloseRequested,
}

pub trait Window: rwh::HasDisplayHandle + rwh::HasWindowHandle {
    fn pump_events(&mut self) -> anyhow::Result<()>;
    fn pop_event(&mut self) -> Option<WindowEvent>;
    /// physical size, in pixels.
    fn size(&self) -> (u32, u32);
}

pub fn create_window(attrs: WindowAttrs) -> anyhow::Result<Box<dyn Window>> {
    let winit_window = backend_winit::WinitBackend::new(attrs)?;
    Ok(Box::new(winit_window))
}
