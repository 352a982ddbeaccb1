//! shader program construction: compile both stages, link, validate.
//!
//! every entry point here requires a current gl context on this thread.

use std::{error, fmt};

use crate::libgl as gl;
use crate::wrap::Apier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn gl_type(self) -> gl::GLenum {
        match self {
            Self::Vertex => gl::VERTEX_SHADER,
            Self::Fragment => gl::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

#[derive(Debug)]
pub enum BuildProgramError {
    /// the backend refused to hand out a shader or program object.
    Alloc(anyhow::Error),
    /// one stage did not compile; `log` is the backend's diagnostic text.
    Compile { stage: ShaderStage, log: String },
    /// the stages did not link together; `log` is the program info log.
    Link { log: String },
}

impl error::Error for BuildProgramError {}

impl fmt::Display for BuildProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alloc(err) => f.write_fmt(format_args!("could not allocate gl object: {err:#}")),
            Self::Compile { stage, log } => f.write_fmt(format_args!(
                "could not compile {stage} shader: {}",
                log.trim_end()
            )),
            Self::Link { log } => {
                f.write_fmt(format_args!("could not link program: {}", log.trim_end()))
            }
        }
    }
}

/// one compiled stage. the backend hands out plain integer ids; this owns one
/// so the object is deleted exactly once, early returns included.
pub struct ShaderUnit<'a, A: Apier> {
    api: &'a A,
    raw: Option<A::Shader>,
    stage: ShaderStage,
}

impl<A: Apier> ShaderUnit<'_, A> {
    pub fn raw(&self) -> A::Shader {
        self.raw.expect("shader unit was already released")
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl<A: Apier> Drop for ShaderUnit<'_, A> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            unsafe { self.api.delete_shader(raw) };
        }
    }
}

struct ProgramGuard<'a, A: Apier> {
    api: &'a A,
    raw: Option<A::Program>,
}

impl<'a, A: Apier> ProgramGuard<'a, A> {
    fn create(api: &'a A) -> Result<Self, BuildProgramError> {
        let raw = unsafe { api.create_program() }.map_err(BuildProgramError::Alloc)?;
        Ok(Self {
            api,
            raw: Some(raw),
        })
    }

    fn raw(&self) -> A::Program {
        self.raw.expect("program guard was already released")
    }

    fn release(mut self) -> A::Program {
        self.raw.take().expect("program guard was already released")
    }
}

impl<A: Apier> Drop for ProgramGuard<'_, A> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            unsafe { self.api.delete_program(raw) };
        }
    }
}

/// compiles a single stage into an owning [`ShaderUnit`].
///
/// on failure the shader object is deleted and the backend's full info log
/// travels with the error, alongside the stage that broke.
pub unsafe fn compile<'a, A: Apier>(
    api: &'a A,
    stage: ShaderStage,
    source: &str,
) -> Result<ShaderUnit<'a, A>, BuildProgramError> {
    let raw = unsafe { api.create_shader(stage.gl_type()) }.map_err(BuildProgramError::Alloc)?;
    let unit = ShaderUnit {
        api,
        raw: Some(raw),
        stage,
    };

    unsafe {
        api.shader_source(raw, source);
        api.compile_shader(raw);

        if api.get_shader_parameter(raw, gl::COMPILE_STATUS) == gl::FALSE as gl::GLint {
            let log = api.get_shader_info_log(raw);
            return Err(BuildProgramError::Compile { stage, log });
        }
    }

    log::debug!("compiled {stage} shader:\n{source}");
    Ok(unit)
}

/// builds a complete program out of a vertex and a fragment source.
///
/// a failed compile aborts before anything is attached; a failed link
/// surfaces the program info log. on every path, success included, both
/// intermediate shader objects are deleted before this returns, and on
/// failure the program object is deleted too. the caller owns the returned
/// program and deletes it via [`Apier::delete_program`].
pub unsafe fn link<A: Apier>(
    api: &A,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<A::Program, BuildProgramError> {
    let program = ProgramGuard::create(api)?;

    let vertex = unsafe { compile(api, ShaderStage::Vertex, vertex_source) }?;
    let fragment = unsafe { compile(api, ShaderStage::Fragment, fragment_source) }?;

    let raw = program.raw();
    unsafe {
        api.attach_shader(raw, vertex.raw());
        api.attach_shader(raw, fragment.raw());

        api.link_program(raw);
        if api.get_program_parameter(raw, gl::LINK_STATUS) == gl::FALSE as gl::GLint {
            let log = api.get_program_info_log(raw);
            return Err(BuildProgramError::Link { log });
        }

        // advisory: drivers may report problems here without failing the
        // link, so this never aborts the build.
        api.validate_program(raw);
        if api.get_program_parameter(raw, gl::VALIDATE_STATUS) == gl::FALSE as gl::GLint {
            log::warn!(
                "program validation: {}",
                api.get_program_info_log(raw).trim_end()
            );
        }

        // the program keeps the linked binary; the intermediate units can go.
        api.detach_shader(raw, vertex.raw());
        api.detach_shader(raw, fragment.raw());
    }

    Ok(program.release())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use std::ffi::{CStr, c_void};

    use super::*;

    const VERTEX_SOURCE: &str = "void main() { gl_Position = vec4(0.0); }";
    const FRAGMENT_SOURCE: &str = "void main() { }";

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        CreateShader(u32),
        ShaderSource(u32),
        CompileShader(u32),
        DeleteShader(u32),
        CreateProgram(u32),
        AttachShader(u32, u32),
        DetachShader(u32, u32),
        LinkProgram(u32),
        ValidateProgram(u32),
        DeleteProgram(u32),
        UseProgram(Option<u32>),
        Uniform4f(i32),
    }

    #[derive(Default)]
    struct Induce {
        vertex_compile_failure: bool,
        fragment_compile_failure: bool,
        link_failure: bool,
        validate_failure: bool,
    }

    #[derive(Default)]
    struct State {
        next_id: u32,
        shader_stages: HashMap<u32, gl::GLenum>,
        live_shaders: HashSet<u32>,
        live_programs: HashSet<u32>,
        calls: Vec<Call>,
        induce: Induce,
    }

    /// records every call and can be told to fail specific steps, so tests
    /// can check both the outcome and the call protocol.
    #[derive(Default)]
    struct FakeApi {
        state: RefCell<State>,
    }

    impl FakeApi {
        fn induce(&self, induce: Induce) {
            self.state.borrow_mut().induce = induce;
        }

        fn calls(&self) -> Vec<Call> {
            self.state.borrow().calls.clone()
        }

        fn live_shaders(&self) -> usize {
            self.state.borrow().live_shaders.len()
        }

        fn live_programs(&self) -> usize {
            self.state.borrow().live_programs.len()
        }

        fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
            self.state.borrow().calls.iter().filter(|it| pred(it)).count()
        }
    }

    impl Apier for FakeApi {
        type Buffer = u32;
        type Program = u32;
        type Shader = u32;
        type VertexArray = u32;

        unsafe fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
            self.state
                .borrow_mut()
                .calls
                .push(Call::AttachShader(program, shader));
        }

        unsafe fn bind_buffer(&self, _target: gl::GLenum, _buffer: Option<Self::Buffer>) {
            unreachable!()
        }

        unsafe fn bind_vertex_array(&self, _vertex_array: Option<Self::VertexArray>) {
            unreachable!()
        }

        unsafe fn buffer_data(
            &self,
            _target: gl::GLenum,
            _size: gl::GLsizeiptr,
            _data: *const c_void,
            _usage: gl::GLenum,
        ) {
            unreachable!()
        }

        unsafe fn clear(&self, _mask: gl::GLbitfield) {
            unreachable!()
        }

        unsafe fn clear_color(
            &self,
            _red: gl::GLfloat,
            _green: gl::GLfloat,
            _blue: gl::GLfloat,
            _alpha: gl::GLfloat,
        ) {
            unreachable!()
        }

        unsafe fn compile_shader(&self, shader: Self::Shader) {
            self.state.borrow_mut().calls.push(Call::CompileShader(shader));
        }

        unsafe fn create_buffer(&self) -> anyhow::Result<Self::Buffer> {
            unreachable!()
        }

        unsafe fn create_program(&self) -> anyhow::Result<Self::Program> {
            let mut state = self.state.borrow_mut();
            state.next_id += 1;
            let id = state.next_id;
            state.live_programs.insert(id);
            state.calls.push(Call::CreateProgram(id));
            Ok(id)
        }

        unsafe fn create_shader(&self, r#type: gl::GLenum) -> anyhow::Result<Self::Shader> {
            let mut state = self.state.borrow_mut();
            state.next_id += 1;
            let id = state.next_id;
            state.shader_stages.insert(id, r#type);
            state.live_shaders.insert(id);
            state.calls.push(Call::CreateShader(id));
            Ok(id)
        }

        unsafe fn create_vertex_array(&self) -> anyhow::Result<Self::VertexArray> {
            unreachable!()
        }

        unsafe fn delete_buffer(&self, _buffer: Self::Buffer) {
            unreachable!()
        }

        unsafe fn delete_program(&self, program: Self::Program) {
            let mut state = self.state.borrow_mut();
            assert!(
                state.live_programs.remove(&program),
                "double delete of program {program}"
            );
            state.calls.push(Call::DeleteProgram(program));
        }

        unsafe fn delete_shader(&self, shader: Self::Shader) {
            let mut state = self.state.borrow_mut();
            assert!(
                state.live_shaders.remove(&shader),
                "double delete of shader {shader}"
            );
            state.calls.push(Call::DeleteShader(shader));
        }

        unsafe fn delete_vertex_array(&self, _vertex_array: Self::VertexArray) {
            unreachable!()
        }

        unsafe fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
            self.state
                .borrow_mut()
                .calls
                .push(Call::DetachShader(program, shader));
        }

        unsafe fn draw_buffer(&self, _buf: gl::GLenum) {
            unreachable!()
        }

        unsafe fn draw_elements(
            &self,
            _mode: gl::GLenum,
            _count: gl::GLsizei,
            r#_type: gl::GLenum,
            _indices: *const c_void,
        ) {
            unreachable!()
        }

        unsafe fn enable_vertex_attrib_array(&self, _index: gl::GLuint) {
            unreachable!()
        }

        unsafe fn get_error(&self) -> Option<gl::GLenum> {
            None
        }

        unsafe fn get_program_info_log(&self, program: Self::Program) -> String {
            format!("error: program {program} refused to cooperate")
        }

        unsafe fn get_program_parameter(
            &self,
            _program: Self::Program,
            pname: gl::GLenum,
        ) -> gl::GLint {
            let state = self.state.borrow();
            let failed = match pname {
                gl::LINK_STATUS => state.induce.link_failure,
                gl::VALIDATE_STATUS => state.induce.validate_failure,
                _ => unreachable!("unexpected program parameter 0x{pname:x}"),
            };
            if failed {
                gl::FALSE as gl::GLint
            } else {
                gl::TRUE as gl::GLint
            }
        }

        unsafe fn get_shader_info_log(&self, shader: Self::Shader) -> String {
            let stage = self.state.borrow().shader_stages[&shader];
            format!("0:1(1): error: shader 0x{stage:x} is broken")
        }

        unsafe fn get_shader_parameter(
            &self,
            shader: Self::Shader,
            pname: gl::GLenum,
        ) -> gl::GLint {
            assert_eq!(pname, gl::COMPILE_STATUS);
            let state = self.state.borrow();
            let failed = match state.shader_stages[&shader] {
                gl::VERTEX_SHADER => state.induce.vertex_compile_failure,
                gl::FRAGMENT_SHADER => state.induce.fragment_compile_failure,
                other => unreachable!("unexpected shader type 0x{other:x}"),
            };
            if failed {
                gl::FALSE as gl::GLint
            } else {
                gl::TRUE as gl::GLint
            }
        }

        unsafe fn get_string(&self, _name: gl::GLenum) -> anyhow::Result<String> {
            unreachable!()
        }

        unsafe fn get_uniform_location(
            &self,
            _program: Self::Program,
            _name: &CStr,
        ) -> Option<gl::GLint> {
            Some(2)
        }

        unsafe fn link_program(&self, program: Self::Program) {
            self.state.borrow_mut().calls.push(Call::LinkProgram(program));
        }

        unsafe fn shader_source(&self, shader: Self::Shader, source: &str) {
            assert!(!source.is_empty());
            self.state.borrow_mut().calls.push(Call::ShaderSource(shader));
        }

        unsafe fn uniform_4f(
            &self,
            location: gl::GLint,
            _v0: gl::GLfloat,
            _v1: gl::GLfloat,
            _v2: gl::GLfloat,
            _v3: gl::GLfloat,
        ) {
            self.state.borrow_mut().calls.push(Call::Uniform4f(location));
        }

        unsafe fn use_program(&self, program: Option<Self::Program>) {
            self.state.borrow_mut().calls.push(Call::UseProgram(program));
        }

        unsafe fn validate_program(&self, program: Self::Program) {
            self.state
                .borrow_mut()
                .calls
                .push(Call::ValidateProgram(program));
        }

        unsafe fn vertex_attrib_pointer(
            &self,
            _index: gl::GLuint,
            _size: gl::GLint,
            r#_type: gl::GLenum,
            _normalized: gl::GLboolean,
            _stride: gl::GLsizei,
            _pointer: *const c_void,
        ) {
            unreachable!()
        }

        unsafe fn viewport(
            &self,
            _x: gl::GLint,
            _y: gl::GLint,
            _width: gl::GLsizei,
            _height: gl::GLsizei,
        ) {
            unreachable!()
        }
    }

    #[test]
    fn test_link_returns_program_and_frees_units() {
        let api = FakeApi::default();

        let program = unsafe { link(&api, VERTEX_SOURCE, FRAGMENT_SOURCE) }.unwrap();

        // both intermediate units are gone, the program survives.
        assert_eq!(api.live_shaders(), 0);
        assert_eq!(api.live_programs(), 1);
        assert_eq!(api.count(|it| matches!(it, Call::CreateShader(_))), 2);
        assert_eq!(api.count(|it| matches!(it, Call::DeleteShader(_))), 2);

        // attach happens before link, link before validate, cleanup last.
        let calls = api.calls();
        let pos = |call: Call| calls.iter().position(|it| *it == call).unwrap();
        let first_attach = calls
            .iter()
            .position(|it| matches!(it, Call::AttachShader(..)))
            .unwrap();
        let first_delete = calls
            .iter()
            .position(|it| matches!(it, Call::DeleteShader(_)))
            .unwrap();
        assert!(first_attach < pos(Call::LinkProgram(program)));
        assert!(pos(Call::LinkProgram(program)) < pos(Call::ValidateProgram(program)));
        assert!(pos(Call::ValidateProgram(program)) < first_delete);

        unsafe { api.delete_program(program) };
        assert_eq!(api.live_programs(), 0);
    }

    #[test]
    fn test_vertex_compile_failure_short_circuits() {
        let api = FakeApi::default();
        api.induce(Induce {
            vertex_compile_failure: true,
            ..Induce::default()
        });

        let err = unsafe { link(&api, VERTEX_SOURCE, FRAGMENT_SOURCE) }.unwrap_err();
        match err {
            BuildProgramError::Compile { stage, log } => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // a broken stage never reaches attach or link.
        assert_eq!(api.count(|it| matches!(it, Call::AttachShader(..))), 0);
        assert_eq!(api.count(|it| matches!(it, Call::LinkProgram(_))), 0);
        assert_eq!(api.live_shaders(), 0);
        assert_eq!(api.live_programs(), 0);
    }

    #[test]
    fn test_fragment_compile_failure_frees_vertex_unit() {
        let api = FakeApi::default();
        api.induce(Induce {
            fragment_compile_failure: true,
            ..Induce::default()
        });

        let err = unsafe { link(&api, VERTEX_SOURCE, FRAGMENT_SOURCE) }.unwrap_err();
        assert!(matches!(
            err,
            BuildProgramError::Compile {
                stage: ShaderStage::Fragment,
                ..
            }
        ));

        assert_eq!(api.count(|it| matches!(it, Call::CreateShader(_))), 2);
        assert_eq!(api.count(|it| matches!(it, Call::DeleteShader(_))), 2);
        assert_eq!(api.count(|it| matches!(it, Call::LinkProgram(_))), 0);
        assert_eq!(api.live_shaders(), 0);
        assert_eq!(api.live_programs(), 0);
    }

    #[test]
    fn test_link_failure_reports_program_log() {
        let api = FakeApi::default();
        api.induce(Induce {
            link_failure: true,
            ..Induce::default()
        });

        let err = unsafe { link(&api, VERTEX_SOURCE, FRAGMENT_SOURCE) }.unwrap_err();
        match err {
            BuildProgramError::Link { log } => assert!(!log.is_empty()),
            other => panic!("unexpected error: {other:?}"),
        }

        // validation is pointless on a failed link.
        assert_eq!(api.count(|it| matches!(it, Call::ValidateProgram(_))), 0);
        assert_eq!(api.live_shaders(), 0);
        assert_eq!(api.live_programs(), 0);
    }

    #[test]
    fn test_validation_failure_is_advisory_only() {
        let api = FakeApi::default();
        api.induce(Induce {
            validate_failure: true,
            ..Induce::default()
        });

        let program = unsafe { link(&api, VERTEX_SOURCE, FRAGMENT_SOURCE) }.unwrap();
        assert_eq!(api.live_programs(), 1);
        assert_eq!(api.live_shaders(), 0);

        unsafe { api.delete_program(program) };
    }

    #[test]
    fn test_compile_twice_yields_independent_units() {
        let api = FakeApi::default();

        let first = unsafe { compile(&api, ShaderStage::Vertex, VERTEX_SOURCE) }.unwrap();
        let second = unsafe { compile(&api, ShaderStage::Vertex, VERTEX_SOURCE) }.unwrap();

        assert_ne!(first.raw(), second.raw());
        assert_eq!(first.stage(), second.stage());
        assert_eq!(api.live_shaders(), 2);

        drop(first);
        drop(second);
        assert_eq!(api.live_shaders(), 0);
    }

    #[test]
    fn test_uniform_update_after_successful_link() {
        let api = FakeApi::default();

        let program = unsafe { link(&api, VERTEX_SOURCE, FRAGMENT_SOURCE) }.unwrap();
        unsafe {
            api.use_program(Some(program));
            let location = api.get_uniform_location(program, c"u_color").unwrap();
            api.uniform_4f(location, 0.2, 0.3, 0.8, 1.0);
            assert!(api.get_error().is_none());

            assert_eq!(api.count(|it| matches!(it, Call::Uniform4f(_))), 1);
            api.delete_program(program);
        }
    }

    #[test]
    fn test_many_mixed_links_leak_nothing() {
        let api = FakeApi::default();

        for i in 0..1000 {
            api.induce(Induce {
                vertex_compile_failure: i % 4 == 1,
                fragment_compile_failure: i % 4 == 2,
                link_failure: i % 4 == 3,
                ..Induce::default()
            });

            match unsafe { link(&api, VERTEX_SOURCE, FRAGMENT_SOURCE) } {
                Ok(program) => {
                    assert_eq!(i % 4, 0);
                    unsafe { api.delete_program(program) };
                }
                Err(_) => assert_ne!(i % 4, 0),
            }
        }

        assert_eq!(api.live_shaders(), 0);
        assert_eq!(api.live_programs(), 0);
        assert_eq!(
            api.count(|it| matches!(it, Call::CreateShader(_))),
            api.count(|it| matches!(it, Call::DeleteShader(_))),
        );
    }
}
