//! Test doubles shared by the unit tests.

use crate::core::context::{
    AttributeLocation, BufferData, BufferId, ProgramDesc, ProgramId, ProgramInterface,
    ProgramKind, RenderContext, TextureId, Topology, UniformLocation, UniformValue, VertexArrayId,
};
use crate::core::geometry::VertexAttribute;
use crate::pipeline::shaders::{phong, unlit};
use crate::scene::texture::TextureImage;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Once;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateVertexArray(VertexArrayId),
    DeleteVertexArray(VertexArrayId),
    CreateBuffer(BufferId),
    DeleteBuffer(BufferId),
    SetVertexBuffer(VertexArrayId, BufferId),
    SetIndexBuffer(VertexArrayId, BufferId),
    EnableAttribute(VertexArrayId, AttributeLocation, VertexAttribute),
    CreateProgram(ProgramId),
    DeleteProgram(ProgramId),
    CreateTexture(TextureId),
    DeleteTexture(TextureId),
    UseProgram(ProgramId),
    SetUniform(String, UniformValue),
    BindTexture(u32, TextureId),
    BindVertexArray(VertexArrayId),
    DepthTest(bool),
    DepthWrite(bool),
    Blend(bool),
    DrawElements {
        vertex_array: VertexArrayId,
        topology: Topology,
        count: usize,
    },
}

/// Records every call and hands out sequential handles.
#[derive(Default)]
pub struct RecordingContext {
    pub calls: Vec<Call>,
    /// Allocate a zero handle for vertex arrays.
    pub fail_vertex_arrays: bool,
    /// Allocate a zero handle once this many buffers exist.
    pub fail_buffers_after: Option<usize>,
    pub fail_programs: bool,
    next_id: u32,
    buffers_created: usize,
    programs: HashMap<u32, ProgramInterface>,
    current_program: ProgramId,
    bound_vertex_array: VertexArrayId,
}

impl RecordingContext {
    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn draws(&self) -> Vec<VertexArrayId> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::DrawElements { vertex_array, .. } => Some(*vertex_array),
                _ => None,
            })
            .collect()
    }

    pub fn uniform_writes(&self, name: &str) -> Vec<UniformValue> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::SetUniform(n, v) if n == name => Some(*v),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl RenderContext for RecordingContext {
    fn create_vertex_array(&mut self) -> VertexArrayId {
        let id = if self.fail_vertex_arrays {
            VertexArrayId::NONE
        } else {
            VertexArrayId(self.allocate())
        };
        self.calls.push(Call::CreateVertexArray(id));
        id
    }

    fn delete_vertex_array(&mut self, vao: VertexArrayId) {
        self.calls.push(Call::DeleteVertexArray(vao));
    }

    fn create_buffer(&mut self, _data: BufferData) -> BufferId {
        let exhausted = self
            .fail_buffers_after
            .is_some_and(|limit| self.buffers_created >= limit);
        let id = if exhausted {
            BufferId::NONE
        } else {
            self.buffers_created += 1;
            BufferId(self.allocate())
        };
        self.calls.push(Call::CreateBuffer(id));
        id
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.calls.push(Call::DeleteBuffer(buffer));
    }

    fn set_vertex_buffer(&mut self, vao: VertexArrayId, buffer: BufferId, _stride: usize) {
        self.calls.push(Call::SetVertexBuffer(vao, buffer));
    }

    fn set_index_buffer(&mut self, vao: VertexArrayId, buffer: BufferId) {
        self.calls.push(Call::SetIndexBuffer(vao, buffer));
    }

    fn enable_attribute(
        &mut self,
        vao: VertexArrayId,
        location: AttributeLocation,
        attribute: VertexAttribute,
    ) {
        self.calls
            .push(Call::EnableAttribute(vao, location, attribute));
    }

    fn create_program(&mut self, desc: &ProgramDesc) -> ProgramId {
        if self.fail_programs {
            self.calls.push(Call::CreateProgram(ProgramId::NONE));
            return ProgramId::NONE;
        }
        let id = self.allocate();
        let interface = match desc.kind {
            ProgramKind::Phong => phong::interface(desc.point_light_capacity),
            ProgramKind::Unlit => unlit::interface(),
        };
        self.programs.insert(id, interface);
        self.calls.push(Call::CreateProgram(ProgramId(id)));
        ProgramId(id)
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program.0);
        self.calls.push(Call::DeleteProgram(program));
    }

    fn program_interface(&self, program: ProgramId) -> Option<ProgramInterface> {
        self.programs.get(&program.0).cloned()
    }

    fn create_texture(&mut self, _image: TextureImage) -> TextureId {
        let id = TextureId(self.allocate());
        self.calls.push(Call::CreateTexture(id));
        id
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.calls.push(Call::DeleteTexture(texture));
    }

    fn use_program(&mut self, program: ProgramId) {
        self.current_program = program;
        self.calls.push(Call::UseProgram(program));
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let name = self
            .programs
            .get(&self.current_program.0)
            .and_then(|i| i.uniforms.get(location.0))
            .map(|u| u.name.clone())
            .unwrap_or_else(|| format!("<{}>", location.0));
        self.calls.push(Call::SetUniform(name, value));
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.calls.push(Call::BindTexture(unit, texture));
    }

    fn bind_vertex_array(&mut self, vao: VertexArrayId) {
        self.bound_vertex_array = vao;
        self.calls.push(Call::BindVertexArray(vao));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.calls.push(Call::DepthTest(enabled));
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.calls.push(Call::DepthWrite(enabled));
    }

    fn set_blend(&mut self, enabled: bool) {
        self.calls.push(Call::Blend(enabled));
    }

    fn draw_elements(&mut self, topology: Topology, count: usize) {
        self.calls.push(Call::DrawElements {
            vertex_array: self.bound_vertex_array,
            topology,
            count,
        });
    }
}

thread_local! {
    static CAPTURED: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

/// Logger that keeps records per thread, so parallel tests see only their own.
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        CAPTURED.with(|c| c.borrow_mut().push((record.level(), record.args().to_string())));
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

/// Runs `f` and returns what it logged on this thread.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<(Level, String)>) {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
    CAPTURED.with(|c| c.borrow_mut().clear());
    let result = f();
    (result, CAPTURED.with(|c| c.take()))
}
