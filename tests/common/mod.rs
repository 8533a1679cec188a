//! Recording toolchain double shared by the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use gcu_backend::{GraphToolchain, OptionArgv, Status, ToolchainCall};

/// Status code returned by injected failures.
pub const INJECTED_STATUS: i32 = 42;

/// Stand-in for a framework-built graph module.
#[derive(Debug)]
pub struct FakeModule {
    pub name: &'static str,
}

#[derive(Debug, PartialEq, Eq)]
pub struct FakeProgram {
    pub id: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub struct FakeExecutable {
    pub binary: Vec<u8>,
}

pub struct RecordingToolchain {
    defaults: Vec<u8>,
    binary: Vec<u8>,
    fail_at: Option<ToolchainCall>,
    announce_destroy: bool,
    pub calls: RefCell<Vec<ToolchainCall>>,
    pub created: Cell<usize>,
    pub destroyed: Cell<usize>,
    pub last_target: RefCell<Option<String>>,
    pub compiled_options: RefCell<Vec<String>>,
    pub bin_buffer_len: Cell<Option<usize>>,
}

impl RecordingToolchain {
    pub fn new(defaults: &str) -> Self {
        Self::with_raw_defaults(defaults.as_bytes().to_vec())
    }

    pub fn with_raw_defaults(defaults: Vec<u8>) -> Self {
        Self {
            defaults,
            binary: b"\x7fTOPS-binary".to_vec(),
            fail_at: None,
            announce_destroy: false,
            calls: RefCell::new(Vec::new()),
            created: Cell::new(0),
            destroyed: Cell::new(0),
            last_target: RefCell::new(None),
            compiled_options: RefCell::new(Vec::new()),
            bin_buffer_len: Cell::new(None),
        }
    }

    pub fn failing_at(mut self, call: ToolchainCall) -> Self {
        self.fail_at = Some(call);
        self
    }

    pub fn with_binary(mut self, binary: Vec<u8>) -> Self {
        self.binary = binary;
        self
    }

    /// Print a marker to stderr whenever a program is destroyed.
    pub fn announcing_destroy(mut self) -> Self {
        self.announce_destroy = true;
        self
    }

    pub fn calls(&self) -> Vec<ToolchainCall> {
        self.calls.borrow().clone()
    }

    fn enter(&self, call: ToolchainCall) -> Result<(), Status> {
        self.calls.borrow_mut().push(call);
        if self.fail_at == Some(call) {
            Err(Status(INJECTED_STATUS))
        } else {
            Ok(())
        }
    }
}

impl GraphToolchain for RecordingToolchain {
    type Module = FakeModule;
    type Program = FakeProgram;
    type Executable = FakeExecutable;

    fn default_options(&self, target: &str, buf: &mut [u8]) -> Result<(), Status> {
        self.enter(ToolchainCall::InitOptions)?;
        *self.last_target.borrow_mut() = Some(target.to_string());
        // Behaves like a C API writing into a fixed buffer: the terminator is
        // only written when there is room for it.
        let n = self.defaults.len().min(buf.len());
        buf[..n].copy_from_slice(&self.defaults[..n]);
        if n < buf.len() {
            buf[n] = 0;
        }
        Ok(())
    }

    fn create_program(&self, _module: &FakeModule) -> Result<FakeProgram, Status> {
        self.enter(ToolchainCall::CreateProgram)?;
        self.created.set(self.created.get() + 1);
        Ok(FakeProgram {
            id: self.created.get(),
        })
    }

    fn compile_program(&self, _program: &FakeProgram, options: &OptionArgv) -> Result<(), Status> {
        self.enter(ToolchainCall::CompileProgram)?;
        *self.compiled_options.borrow_mut() = options
            .iter()
            .map(|opt| opt.to_string_lossy().into_owned())
            .collect();
        Ok(())
    }

    fn binary_size(&self, _program: &FakeProgram) -> Result<u64, Status> {
        self.enter(ToolchainCall::GetBinSize)?;
        Ok(self.binary.len() as u64)
    }

    fn binary(&self, _program: &FakeProgram, buf: &mut [u8]) -> Result<(), Status> {
        self.enter(ToolchainCall::GetBin)?;
        self.bin_buffer_len.set(Some(buf.len()));
        if buf.len() != self.binary.len() {
            return Err(Status(-2));
        }
        buf.copy_from_slice(&self.binary);
        Ok(())
    }

    fn destroy_program(&self, _program: FakeProgram) -> Status {
        self.destroyed.set(self.destroyed.get() + 1);
        if self.announce_destroy {
            eprintln!("destroy-program");
        }
        match self.enter(ToolchainCall::DestroyProgram) {
            Ok(()) => Status::SUCCESS,
            Err(status) => status,
        }
    }

    fn create_executable(&self, binary: &[u8]) -> Result<FakeExecutable, Status> {
        self.enter(ToolchainCall::CreateExecutable)?;
        Ok(FakeExecutable {
            binary: binary.to_vec(),
        })
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
