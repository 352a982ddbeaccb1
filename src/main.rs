use std::ptr::null;
use std::time::Instant;

use anyhow::Context as _;
use app::{AppContext, AppHandler};
use gl::Apier as _;
use window::{WindowAttrs, WindowEvent};

// NOTE: shader naming conventions
//   - `a_` for attributes
//   - `u_` for uniforms
//   - `o_` for fragment outputs

const VSHADER_SOURCE: &str = "
#version 330 core

layout(location = 0) in vec4 a_position;

void main() {
    gl_Position = a_position;
}
";

const FSHADER_SOURCE: &str = "
#version 330 core

layout(location = 0) out vec4 o_color;

uniform vec4 u_color;

void main() {
    o_color = u_color;
}
";

const A_POSITION_LOC: gl::GLuint = 0;

const QUAD_VERTICES: [[f32; 2]; 4] = [
    [-0.5, -0.5],
    [0.5, -0.5],
    [0.5, 0.5],
    [-0.5, 0.5],
];
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

// red channel sweep speed, full 0..1 ramp in well under a second.
const RED_UNITS_PER_SEC: f32 = 3.0;

struct Quad {
    program: gl::Program,
    u_color_loc: gl::GLint,
    vbo: gl::Buffer,
    ebo: gl::Buffer,
    vao: gl::VertexArray,

    red: f32,
    rising: bool,
    prev_frame: Instant,
}

impl AppHandler for Quad {
    fn create(ctx: AppContext) -> anyhow::Result<Self> {
        let gl_api = &*ctx.gl_api;
        unsafe {
            let program = gl::program::link(gl_api, VSHADER_SOURCE, FSHADER_SOURCE)?;
            let u_color_loc = gl_api
                .get_uniform_location(program, c"u_color")
                .context("could not get loc of u_color")?;

            let vao = gl_api.create_vertex_array().context("could not create vao")?;
            gl_api.bind_vertex_array(Some(vao));

            let vbo = gl_api.create_buffer().context("could not create vbo")?;
            gl_api.bind_buffer(gl::ARRAY_BUFFER, Some(vbo));
            gl_api.buffer_data(
                gl::ARRAY_BUFFER,
                size_of_val(&QUAD_VERTICES) as gl::GLsizeiptr,
                QUAD_VERTICES.as_ptr().cast(),
                gl::STATIC_DRAW,
            );
            gl_api.vertex_attrib_pointer(
                A_POSITION_LOC,
                2,
                gl::FLOAT,
                gl::FALSE,
                size_of::<[f32; 2]>() as gl::GLsizei,
                null(),
            );
            gl_api.enable_vertex_attrib_array(A_POSITION_LOC);

            // the element binding is captured by the bound vao.
            let ebo = gl_api.create_buffer().context("could not create ebo")?;
            gl_api.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, Some(ebo));
            gl_api.buffer_data(
                gl::ELEMENT_ARRAY_BUFFER,
                size_of_val(&QUAD_INDICES) as gl::GLsizeiptr,
                QUAD_INDICES.as_ptr().cast(),
                gl::STATIC_DRAW,
            );

            gl_api.use_program(Some(program));
            gl_api.uniform_4f(u_color_loc, 0.2, 0.3, 0.8, 1.0);

            Ok(Self {
                program,
                u_color_loc,
                vbo,
                ebo,
                vao,

                red: 0.0,
                rising: true,
                prev_frame: Instant::now(),
            })
        }
    }

    fn iterate(
        &mut self,
        ctx: AppContext,
        events: impl Iterator<Item = WindowEvent>,
    ) -> anyhow::Result<()> {
        for event in events {
            if matches!(event, WindowEvent::CloseRequested) {
                log::info!("close requested");
            }
        }

        let next_frame = Instant::now();
        let dt = (next_frame - self.prev_frame).as_secs_f32();
        self.prev_frame = next_frame;

        self.red += if self.rising { dt } else { -dt } * RED_UNITS_PER_SEC;
        if self.red >= 1.0 {
            self.red = 1.0;
            self.rising = false;
        } else if self.red <= 0.0 {
            self.red = 0.0;
            self.rising = true;
        }

        let (width, height) = ctx.window.size();
        unsafe {
            // NOTE: some drivers render nothing unless the draw buffer is
            // specified explicitly.
            ctx.gl_api.draw_buffer(gl::BACK);
            ctx.gl_api
                .viewport(0, 0, width as gl::GLsizei, height as gl::GLsizei);

            ctx.gl_api.clear_color(0.0, 0.0, 0.0, 1.0);
            ctx.gl_api.clear(gl::COLOR_BUFFER_BIT);

            ctx.gl_api.use_program(Some(self.program));
            ctx.gl_api
                .uniform_4f(self.u_color_loc, self.red, 0.3, 0.8, 1.0);

            ctx.gl_api.bind_vertex_array(Some(self.vao));
            ctx.gl_api.draw_elements(
                gl::TRIANGLES,
                QUAD_INDICES.len() as gl::GLsizei,
                gl::UNSIGNED_INT,
                null(),
            );

            if let Some(code) = ctx.gl_api.get_error() {
                log::warn!("gl error {code:#x}");
            }
        }

        Ok(())
    }

    fn destroy(&mut self, ctx: AppContext) {
        unsafe {
            ctx.gl_api.delete_program(self.program);
            ctx.gl_api.delete_buffer(self.vbo);
            ctx.gl_api.delete_buffer(self.ebo);
            ctx.gl_api.delete_vertex_array(self.vao);
        }
    }
}

fn main() -> anyhow::Result<()> {
    app::run::<Quad>(WindowAttrs {
        title: "glimt".to_string(),
        logical_size: Some((640, 480)),
        resizable: true,
    })
}
