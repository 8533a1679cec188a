// Copyright 2025 STARGA Inc.
// Licensed under the Apache License, Version 2.0 (the “License”);
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at:
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an “AS IS” BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Runtime binding of the vendor graph compiler and runtime libraries.
//!
//! Both libraries are opened with `libloading` so the crate builds and
//! tests without the vendor SDK installed.

use std::ffi::CString;
use std::marker::{PhantomData, PhantomPinned};
use std::os::raw::{c_char, c_int, c_void};
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::Arc;

use libloading::Library;

use crate::config::BackendConfig;
use crate::options::OptionArgv;
use crate::toolchain::{GraphToolchain, Status};

/// Status reported for arguments that cannot be passed to C at all.
pub const INVALID_ARGUMENT: Status = Status(-1);

type RawProgram = *mut c_void;
type RawExecutable = *mut c_void;

type InitOptionsFn = unsafe extern "C" fn(*const c_char, *mut c_char, c_int) -> c_int;
type CreateProgramFn = unsafe extern "C" fn(*mut RawProgram, *const c_void) -> c_int;
type CompileProgramFn = unsafe extern "C" fn(RawProgram, c_int, *const *const c_char) -> c_int;
type GetBinSizeFn = unsafe extern "C" fn(RawProgram, *mut u64) -> c_int;
type GetBinFn = unsafe extern "C" fn(RawProgram, *mut c_char) -> c_int;
type DestroyProgramFn = unsafe extern "C" fn(*mut RawProgram) -> c_int;
type CreateExecutableFn = unsafe extern "C" fn(*mut RawExecutable, *const c_void, usize) -> c_int;
type DestroyExecutableFn = unsafe extern "C" fn(RawExecutable) -> c_int;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to open {}: {source}", .path.display())]
    Library {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },
    #[error("symbol {name} not found in {}: {source}", .path.display())]
    Symbol {
        name: &'static str,
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },
}

struct Symbols {
    init_options: InitOptionsFn,
    create_program: CreateProgramFn,
    compile_program: CompileProgramFn,
    get_bin_size: GetBinSizeFn,
    get_bin: GetBinFn,
    destroy_program: DestroyProgramFn,
    create_executable: CreateExecutableFn,
    destroy_executable: DestroyExecutableFn,
}

/// Loaded libraries and the entry points copied out of them. The function
/// pointers are valid for as long as this value is alive.
struct Libraries {
    symbols: Symbols,
    _graph: Library,
    _runtime: Library,
}

/// # Safety
///
/// `T` must be the exact function pointer type of the exported symbol.
unsafe fn resolve<T: Copy>(lib: &Library, path: &Path, name: &'static str) -> Result<T, LoadError> {
    let symbol = lib
        .get::<T>(name.as_bytes())
        .map_err(|source| LoadError::Symbol {
            name,
            path: path.to_path_buf(),
            source,
        })?;
    Ok(*symbol)
}

fn open(path: &Path) -> Result<Library, LoadError> {
    // SAFETY: loading the vendor library runs its initializers; the vendor
    // SDK libraries have no initialization-order requirements.
    unsafe { Library::new(path) }.map_err(|source| LoadError::Library {
        path: path.to_path_buf(),
        source,
    })
}

/// Opaque HLIR graph module owned by the framework.
#[repr(C)]
pub struct HlirModule {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

impl HlirModule {
    /// Borrow a framework-owned module.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point to a live `hlir::Module` that is not
    /// mutated for the returned lifetime.
    pub unsafe fn from_raw<'a>(ptr: *const c_void) -> Option<&'a HlirModule> {
        (ptr as *const HlirModule).as_ref()
    }

    fn as_ptr(&self) -> *const c_void {
        self as *const HlirModule as *const c_void
    }
}

/// In-progress compilation owned by a [`ProgramGuard`](crate::program::ProgramGuard).
#[derive(Debug)]
pub struct NativeProgram {
    raw: RawProgram,
}

/// Loadable executable. Destroyed on drop unless handed off with
/// [`into_raw`](Self::into_raw).
pub struct NativeExecutable {
    raw: RawExecutable,
    libs: Arc<Libraries>,
}

impl NativeExecutable {
    pub fn as_raw(&self) -> *mut c_void {
        self.raw
    }

    /// Transfer ownership of the `topsExecutable_t` to the caller.
    pub fn into_raw(mut self) -> *mut c_void {
        std::mem::replace(&mut self.raw, ptr::null_mut())
    }
}

impl Drop for NativeExecutable {
    fn drop(&mut self) {
        if self.raw.is_null() {
            return;
        }
        // SAFETY: `raw` came from topsCreateExecutable and was not handed off.
        let status = unsafe { (self.libs.symbols.destroy_executable)(self.raw) };
        if status != 0 {
            log::warn!("topsDestroyExecutable returned status {status}");
        }
    }
}

/// Vendor toolchain bound at runtime.
#[derive(Clone)]
pub struct NativeToolchain {
    libs: Arc<Libraries>,
}

impl NativeToolchain {
    /// Open the libraries named by `config`.
    pub fn load(config: &BackendConfig) -> Result<Self, LoadError> {
        Self::open(&config.graph_library, &config.runtime_library)
    }

    pub fn open(graph_path: &Path, runtime_path: &Path) -> Result<Self, LoadError> {
        let graph = open(graph_path)?;
        let runtime = open(runtime_path)?;

        // SAFETY: the function types mirror the vendor headers.
        let symbols = unsafe {
            Symbols {
                init_options: resolve(&graph, graph_path, "topsgraphInitOptions")?,
                create_program: resolve(&graph, graph_path, "topsgraphCreateProgramFromModule")?,
                compile_program: resolve(&graph, graph_path, "topsgraphCompileProgram")?,
                get_bin_size: resolve(&graph, graph_path, "topsgraphGetBinSize")?,
                get_bin: resolve(&graph, graph_path, "topsgraphGetBin")?,
                destroy_program: resolve(&graph, graph_path, "topsgraphDestroyProgram")?,
                create_executable: resolve(&runtime, runtime_path, "topsCreateExecutable")?,
                destroy_executable: resolve(&runtime, runtime_path, "topsDestroyExecutable")?,
            }
        };
        log::debug!(
            "loaded toolchain from {} and {}",
            graph_path.display(),
            runtime_path.display()
        );

        Ok(Self {
            libs: Arc::new(Libraries {
                symbols,
                _graph: graph,
                _runtime: runtime,
            }),
        })
    }

    fn symbols(&self) -> &Symbols {
        &self.libs.symbols
    }
}

fn status(code: c_int) -> Result<(), Status> {
    if code == 0 {
        Ok(())
    } else {
        Err(Status(code))
    }
}

impl GraphToolchain for NativeToolchain {
    type Module = HlirModule;
    type Program = NativeProgram;
    type Executable = NativeExecutable;

    fn default_options(&self, target: &str, buf: &mut [u8]) -> Result<(), Status> {
        let target = CString::new(target).map_err(|_| INVALID_ARGUMENT)?;
        // Never report more room than the buffer has.
        let capacity = c_int::try_from(buf.len()).unwrap_or(c_int::MAX);
        // SAFETY: `buf` is writable for `capacity` bytes.
        status(unsafe {
            (self.symbols().init_options)(target.as_ptr(), buf.as_mut_ptr().cast(), capacity)
        })
    }

    fn create_program(&self, module: &HlirModule) -> Result<NativeProgram, Status> {
        let mut raw: RawProgram = ptr::null_mut();
        // SAFETY: `module` is a live framework module, `raw` is a valid out slot.
        status(unsafe { (self.symbols().create_program)(&mut raw, module.as_ptr()) })?;
        Ok(NativeProgram { raw })
    }

    fn compile_program(&self, program: &NativeProgram, options: &OptionArgv) -> Result<(), Status> {
        let count = c_int::try_from(options.len()).map_err(|_| INVALID_ARGUMENT)?;
        // SAFETY: `options` holds `count` valid C strings for this call.
        status(unsafe { (self.symbols().compile_program)(program.raw, count, options.as_ptr()) })
    }

    fn binary_size(&self, program: &NativeProgram) -> Result<u64, Status> {
        let mut size = 0u64;
        // SAFETY: `size` is a valid out slot.
        status(unsafe { (self.symbols().get_bin_size)(program.raw, &mut size) })?;
        Ok(size)
    }

    fn binary(&self, program: &NativeProgram, buf: &mut [u8]) -> Result<(), Status> {
        // SAFETY: `buf` has exactly the size the toolchain reported.
        status(unsafe { (self.symbols().get_bin)(program.raw, buf.as_mut_ptr().cast()) })
    }

    fn destroy_program(&self, program: NativeProgram) -> Status {
        let mut raw = program.raw;
        // SAFETY: the handle is consumed here and never used again.
        Status(unsafe { (self.symbols().destroy_program)(&mut raw) })
    }

    fn create_executable(&self, binary: &[u8]) -> Result<NativeExecutable, Status> {
        let mut raw: RawExecutable = ptr::null_mut();
        // SAFETY: `binary` is readable for `binary.len()` bytes.
        status(unsafe {
            (self.symbols().create_executable)(&mut raw, binary.as_ptr().cast(), binary.len())
        })?;
        Ok(NativeExecutable {
            raw,
            libs: Arc::clone(&self.libs),
        })
    }
}
