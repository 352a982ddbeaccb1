mod libgl;
pub mod program;
mod wrap;

pub use libgl::*;
pub use wrap::{Apier, Buffer, Program, Shader, VertexArray};
