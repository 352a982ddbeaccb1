use std::ffi::{CStr, c_void};
use std::num::NonZero;

use anyhow::{Context as _, anyhow};

use crate::libgl as gl;

/// rustified mirror of the gl subset this project uses. methods match the c
/// entry points 1:1, except where rust can offer strings, options and
/// results instead of out-params and sentinel values.
///
/// the program builder and its tests are generic over this trait; the real
/// implementation lives on [`gl::Api`].
pub trait Apier {
    type Buffer: Copy;
    type Program: Copy + PartialEq;
    type Shader: Copy + PartialEq;
    type VertexArray: Copy;

    unsafe fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    unsafe fn bind_buffer(&self, target: gl::GLenum, buffer: Option<Self::Buffer>);
    unsafe fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);
    unsafe fn buffer_data(
        &self,
        target: gl::GLenum,
        size: gl::GLsizeiptr,
        data: *const c_void,
        usage: gl::GLenum,
    );
    unsafe fn clear(&self, mask: gl::GLbitfield);
    unsafe fn clear_color(
        &self,
        red: gl::GLfloat,
        green: gl::GLfloat,
        blue: gl::GLfloat,
        alpha: gl::GLfloat,
    );
    unsafe fn compile_shader(&self, shader: Self::Shader);
    unsafe fn create_buffer(&self) -> anyhow::Result<Self::Buffer>;
    unsafe fn create_program(&self) -> anyhow::Result<Self::Program>;
    unsafe fn create_shader(&self, r#type: gl::GLenum) -> anyhow::Result<Self::Shader>;
    unsafe fn create_vertex_array(&self) -> anyhow::Result<Self::VertexArray>;
    unsafe fn delete_buffer(&self, buffer: Self::Buffer);
    unsafe fn delete_program(&self, program: Self::Program);
    unsafe fn delete_shader(&self, shader: Self::Shader);
    unsafe fn delete_vertex_array(&self, vertex_array: Self::VertexArray);
    unsafe fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    unsafe fn draw_buffer(&self, buf: gl::GLenum);
    unsafe fn draw_elements(
        &self,
        mode: gl::GLenum,
        count: gl::GLsizei,
        r#type: gl::GLenum,
        indices: *const c_void,
    );
    unsafe fn enable_vertex_attrib_array(&self, index: gl::GLuint);
    unsafe fn get_error(&self) -> Option<gl::GLenum>;
    unsafe fn get_program_info_log(&self, program: Self::Program) -> String;
    unsafe fn get_program_parameter(&self, program: Self::Program, pname: gl::GLenum)
    -> gl::GLint;
    unsafe fn get_shader_info_log(&self, shader: Self::Shader) -> String;
    unsafe fn get_shader_parameter(&self, shader: Self::Shader, pname: gl::GLenum) -> gl::GLint;
    unsafe fn get_string(&self, name: gl::GLenum) -> anyhow::Result<String>;
    unsafe fn get_uniform_location(&self, program: Self::Program, name: &CStr)
    -> Option<gl::GLint>;
    unsafe fn link_program(&self, program: Self::Program);
    unsafe fn shader_source(&self, shader: Self::Shader, source: &str);
    unsafe fn uniform_4f(
        &self,
        location: gl::GLint,
        v0: gl::GLfloat,
        v1: gl::GLfloat,
        v2: gl::GLfloat,
        v3: gl::GLfloat,
    );
    unsafe fn use_program(&self, program: Option<Self::Program>);
    unsafe fn validate_program(&self, program: Self::Program);
    unsafe fn vertex_attrib_pointer(
        &self,
        index: gl::GLuint,
        size: gl::GLint,
        r#type: gl::GLenum,
        normalized: gl::GLboolean,
        stride: gl::GLsizei,
        pointer: *const c_void,
    );
    unsafe fn viewport(&self, x: gl::GLint, y: gl::GLint, width: gl::GLsizei, height: gl::GLsizei);
}

impl Apier for gl::Api {
    type Buffer = NonZero<gl::GLuint>;
    type Program = NonZero<gl::GLuint>;
    type Shader = NonZero<gl::GLuint>;
    type VertexArray = NonZero<gl::GLuint>;

    #[inline]
    unsafe fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { (self.AttachShader)(program.get(), shader.get()) };
    }

    #[inline]
    unsafe fn bind_buffer(&self, target: gl::GLenum, buffer: Option<Self::Buffer>) {
        unsafe { (self.BindBuffer)(target, buffer.map_or(0, |v| v.get())) };
    }

    #[inline]
    unsafe fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        unsafe { (self.BindVertexArray)(vertex_array.map_or(0, |v| v.get())) };
    }

    #[inline]
    unsafe fn buffer_data(
        &self,
        target: gl::GLenum,
        size: gl::GLsizeiptr,
        data: *const c_void,
        usage: gl::GLenum,
    ) {
        unsafe { (self.BufferData)(target, size, data, usage) };
    }

    #[inline]
    unsafe fn clear(&self, mask: gl::GLbitfield) {
        unsafe { (self.Clear)(mask) };
    }

    #[inline]
    unsafe fn clear_color(
        &self,
        red: gl::GLfloat,
        green: gl::GLfloat,
        blue: gl::GLfloat,
        alpha: gl::GLfloat,
    ) {
        unsafe { (self.ClearColor)(red, green, blue, alpha) };
    }

    #[inline]
    unsafe fn compile_shader(&self, shader: Self::Shader) {
        unsafe { (self.CompileShader)(shader.get()) };
    }

    #[inline]
    unsafe fn create_buffer(&self) -> anyhow::Result<Self::Buffer> {
        let mut buffer: gl::GLuint = 0;
        unsafe { (self.GenBuffers)(1, &mut buffer) };
        NonZero::new(buffer).context("could not create buffer")
    }

    #[inline]
    unsafe fn create_program(&self) -> anyhow::Result<Self::Program> {
        let program = unsafe { (self.CreateProgram)() };
        NonZero::new(program).context("could not create program")
    }

    #[inline]
    unsafe fn create_shader(&self, r#type: gl::GLenum) -> anyhow::Result<Self::Shader> {
        let shader = unsafe { (self.CreateShader)(r#type) };
        NonZero::new(shader).context("could not create shader")
    }

    #[inline]
    unsafe fn create_vertex_array(&self) -> anyhow::Result<Self::VertexArray> {
        let mut vertex_array: gl::GLuint = 0;
        unsafe { (self.GenVertexArrays)(1, &mut vertex_array) };
        NonZero::new(vertex_array).context("could not create vertex array")
    }

    #[inline]
    unsafe fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { (self.DeleteBuffers)(1, &buffer.get()) };
    }

    #[inline]
    unsafe fn delete_program(&self, program: Self::Program) {
        unsafe { (self.DeleteProgram)(program.get()) };
    }

    #[inline]
    unsafe fn delete_shader(&self, shader: Self::Shader) {
        unsafe { (self.DeleteShader)(shader.get()) };
    }

    #[inline]
    unsafe fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        unsafe { (self.DeleteVertexArrays)(1, &vertex_array.get()) };
    }

    #[inline]
    unsafe fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { (self.DetachShader)(program.get(), shader.get()) };
    }

    #[inline]
    unsafe fn draw_buffer(&self, buf: gl::GLenum) {
        unsafe { (self.DrawBuffer)(buf) };
    }

    #[inline]
    unsafe fn draw_elements(
        &self,
        mode: gl::GLenum,
        count: gl::GLsizei,
        r#type: gl::GLenum,
        indices: *const c_void,
    ) {
        unsafe { (self.DrawElements)(mode, count, r#type, indices) };
    }

    #[inline]
    unsafe fn enable_vertex_attrib_array(&self, index: gl::GLuint) {
        unsafe { (self.EnableVertexAttribArray)(index) };
    }

    #[inline]
    unsafe fn get_error(&self) -> Option<gl::GLenum> {
        let ret = unsafe { (self.GetError)() };
        (ret != gl::NO_ERROR).then_some(ret)
    }

    unsafe fn get_program_info_log(&self, program: Self::Program) -> String {
        let cap = unsafe { self.get_program_parameter(program, gl::INFO_LOG_LENGTH) };
        if cap <= 0 {
            return String::new();
        }
        let mut buf = vec![0_u8; cap as usize];
        let mut len: gl::GLsizei = 0;
        unsafe { (self.GetProgramInfoLog)(program.get(), cap, &mut len, buf.as_mut_ptr().cast()) };
        buf.truncate(len.max(0) as usize);
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[inline]
    unsafe fn get_program_parameter(
        &self,
        program: Self::Program,
        pname: gl::GLenum,
    ) -> gl::GLint {
        let mut param: gl::GLint = 0;
        unsafe { (self.GetProgramiv)(program.get(), pname, &mut param) };
        param
    }

    unsafe fn get_shader_info_log(&self, shader: Self::Shader) -> String {
        let cap = unsafe { self.get_shader_parameter(shader, gl::INFO_LOG_LENGTH) };
        if cap <= 0 {
            return String::new();
        }
        let mut buf = vec![0_u8; cap as usize];
        let mut len: gl::GLsizei = 0;
        unsafe { (self.GetShaderInfoLog)(shader.get(), cap, &mut len, buf.as_mut_ptr().cast()) };
        buf.truncate(len.max(0) as usize);
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[inline]
    unsafe fn get_shader_parameter(&self, shader: Self::Shader, pname: gl::GLenum) -> gl::GLint {
        let mut param: gl::GLint = 0;
        unsafe { (self.GetShaderiv)(shader.get(), pname, &mut param) };
        param
    }

    #[inline]
    unsafe fn get_string(&self, name: gl::GLenum) -> anyhow::Result<String> {
        let ptr = unsafe { (self.GetString)(name) };
        if ptr.is_null() {
            return Err(anyhow!("could not get string (name 0x{name:x})"));
        }
        unsafe { CStr::from_ptr(ptr.cast()) }
            .to_str()
            .context("invalid string")
            .map(|cstr| cstr.to_string())
    }

    #[inline]
    unsafe fn get_uniform_location(
        &self,
        program: Self::Program,
        name: &CStr,
    ) -> Option<gl::GLint> {
        let ret = unsafe { (self.GetUniformLocation)(program.get(), name.as_ptr()) };
        (ret != -1).then_some(ret)
    }

    #[inline]
    unsafe fn link_program(&self, program: Self::Program) {
        unsafe { (self.LinkProgram)(program.get()) };
    }

    #[inline]
    unsafe fn shader_source(&self, shader: Self::Shader, source: &str) {
        unsafe {
            (self.ShaderSource)(
                shader.get(),
                1,
                &(source.as_ptr() as *const gl::GLchar),
                &(source.len() as gl::GLint),
            )
        };
    }

    #[inline]
    unsafe fn uniform_4f(
        &self,
        location: gl::GLint,
        v0: gl::GLfloat,
        v1: gl::GLfloat,
        v2: gl::GLfloat,
        v3: gl::GLfloat,
    ) {
        unsafe { (self.Uniform4f)(location, v0, v1, v2, v3) };
    }

    #[inline]
    unsafe fn use_program(&self, program: Option<Self::Program>) {
        unsafe { (self.UseProgram)(program.map_or(0, |v| v.get())) };
    }

    #[inline]
    unsafe fn validate_program(&self, program: Self::Program) {
        unsafe { (self.ValidateProgram)(program.get()) };
    }

    #[inline]
    unsafe fn vertex_attrib_pointer(
        &self,
        index: gl::GLuint,
        size: gl::GLint,
        r#type: gl::GLenum,
        normalized: gl::GLboolean,
        stride: gl::GLsizei,
        pointer: *const c_void,
    ) {
        unsafe { (self.VertexAttribPointer)(index, size, r#type, normalized, stride, pointer) };
    }

    #[inline]
    unsafe fn viewport(
        &self,
        x: gl::GLint,
        y: gl::GLint,
        width: gl::GLsizei,
        height: gl::GLsizei,
    ) {
        unsafe { (self.Viewport)(x, y, width, height) };
    }
}

pub type Buffer = <gl::Api as Apier>::Buffer;
pub type Program = <gl::Api as Apier>::Program;
pub type Shader = <gl::Api as Apier>::Shader;
pub type VertexArray = <gl::Api as Apier>::VertexArray;
