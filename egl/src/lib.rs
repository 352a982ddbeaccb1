mod libegl;
mod libwayland_egl;
pub mod wrap;

pub use libegl::*;
