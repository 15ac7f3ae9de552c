//! C ABI boundary.
//!
//! Ownership rule at every function here: a pointer returned by this library
//! stays valid until the matching deinit call, and no longer. Each
//! construction function has exactly one teardown function; partial teardown
//! is unsupported. Nothing in this crate does work of its own: it converts
//! at the boundary and delegates.

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::path::PathBuf;

use declgraph_compiledb::CompileDatabase;
use declgraph_core::{CompileCommand, Connection, LinkIdentifier, Node, Slice};
use declgraph_recorder::{ArenaSink, GraphRecorder, GraphSink, ModuleExport};

/// Host-supplied delivery functions for push mode. Invoked synchronously,
/// in emission order, while the traversal runs; the recorder materializes
/// nothing of its own in this mode. Null members are skipped.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RecorderCallbacks {
    pub userdata: *mut c_void,
    pub add_node: Option<unsafe extern "C" fn(*mut c_void, i64, *const c_char, u64)>,
    pub add_connection: Option<unsafe extern "C" fn(*mut c_void, i64, i64)>,
    pub add_link_identifier: Option<unsafe extern "C" fn(*mut c_void, i64, *const c_char, u64)>,
}

struct CallbackSink {
    callbacks: RecorderCallbacks,
}

impl GraphSink for CallbackSink {
    fn add_node(&mut self, id: i64, name: &str) {
        if let Some(f) = self.callbacks.add_node {
            unsafe {
                f(
                    self.callbacks.userdata,
                    id,
                    name.as_ptr() as *const c_char,
                    name.len() as u64,
                )
            }
        }
    }

    fn add_connection(&mut self, from: i64, to: i64) {
        if let Some(f) = self.callbacks.add_connection {
            unsafe { f(self.callbacks.userdata, from, to) }
        }
    }

    fn add_link_identifier(&mut self, id: i64, alias: &str) {
        if let Some(f) = self.callbacks.add_link_identifier {
            unsafe {
                f(
                    self.callbacks.userdata,
                    id,
                    alias.as_ptr() as *const c_char,
                    alias.len() as u64,
                )
            }
        }
    }
}

/// Opaque recorder handle covering both delivery modes.
pub struct Recorder(RecorderImpl);

enum RecorderImpl {
    Batch(GraphRecorder<ArenaSink>),
    Push(GraphRecorder<CallbackSink>),
}

impl Recorder {
    fn enter_scope(&mut self, id: i64, scope_defining: bool) {
        match &mut self.0 {
            RecorderImpl::Batch(r) => r.enter_scope(id, scope_defining),
            RecorderImpl::Push(r) => r.enter_scope(id, scope_defining),
        }
    }

    fn leave_scope(&mut self, id: i64) {
        match &mut self.0 {
            RecorderImpl::Batch(r) => r.leave_scope(id),
            RecorderImpl::Push(r) => r.leave_scope(id),
        }
    }

    fn declaration(
        &mut self,
        id: i64,
        canonical: bool,
        name: &str,
        alias: Option<&str>,
        alias_eligible: bool,
    ) {
        match &mut self.0 {
            RecorderImpl::Batch(r) => r.declaration(id, canonical, name, alias, alias_eligible),
            RecorderImpl::Push(r) => r.declaration(id, canonical, name, alias, alias_eligible),
        }
    }

    fn reference(&mut self, id: i64, name: &str) {
        match &mut self.0 {
            RecorderImpl::Batch(r) => r.reference(id, name),
            RecorderImpl::Push(r) => r.reference(id, name),
        }
    }
}

/// Borrows `(ptr, len)` as text. Hosts pass UTF-8; anything else reads as
/// empty rather than tearing down the traversal.
unsafe fn text_arg<'a>(ptr: *const c_char, len: u64) -> &'a str {
    if ptr.is_null() {
        return "";
    }
    let bytes = std::slice::from_raw_parts(ptr as *const u8, len as usize);
    std::str::from_utf8(bytes).unwrap_or("")
}

/// Installs a process-wide tracing subscriber honoring `RUST_LOG`. Optional;
/// calling it twice is harmless.
#[no_mangle]
pub extern "C" fn declgraph_init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// New batch-mode recorder. Null when the arena reservation fails. Teardown
/// is `declgraph_recorder_finish`.
#[no_mangle]
pub extern "C" fn declgraph_recorder_new() -> *mut Recorder {
    match GraphRecorder::batch() {
        Ok(rec) => Box::into_raw(Box::new(Recorder(RecorderImpl::Batch(rec)))),
        Err(err) => {
            tracing::warn!(%err, "batch recorder construction failed");
            std::ptr::null_mut()
        }
    }
}

/// New push-mode recorder delivering through `callbacks`. Teardown is
/// `declgraph_recorder_finish` (which returns null in this mode).
#[no_mangle]
pub extern "C" fn declgraph_recorder_with_callbacks(
    callbacks: RecorderCallbacks,
) -> *mut Recorder {
    let sink = CallbackSink { callbacks };
    Box::into_raw(Box::new(Recorder(RecorderImpl::Push(
        GraphRecorder::with_sink(sink),
    ))))
}

#[no_mangle]
pub unsafe extern "C" fn declgraph_recorder_enter_scope(
    recorder: *mut Recorder,
    id: i64,
    scope_defining: bool,
) {
    if let Some(recorder) = recorder.as_mut() {
        recorder.enter_scope(id, scope_defining);
    }
}

#[no_mangle]
pub unsafe extern "C" fn declgraph_recorder_declaration(
    recorder: *mut Recorder,
    id: i64,
    canonical: bool,
    name: *const c_char,
    name_len: u64,
    alias: *const c_char,
    alias_len: u64,
    alias_eligible: bool,
) {
    if let Some(recorder) = recorder.as_mut() {
        let name = text_arg(name, name_len);
        let alias = if alias.is_null() {
            None
        } else {
            Some(text_arg(alias, alias_len))
        };
        recorder.declaration(id, canonical, name, alias, alias_eligible);
    }
}

#[no_mangle]
pub unsafe extern "C" fn declgraph_recorder_reference(
    recorder: *mut Recorder,
    id: i64,
    name: *const c_char,
    name_len: u64,
) {
    if let Some(recorder) = recorder.as_mut() {
        let name = text_arg(name, name_len);
        recorder.reference(id, name);
    }
}

#[no_mangle]
pub unsafe extern "C" fn declgraph_recorder_leave_scope(recorder: *mut Recorder, id: i64) {
    if let Some(recorder) = recorder.as_mut() {
        recorder.leave_scope(id);
    }
}

/// Consumes the recorder. Batch mode returns the frozen export (teardown:
/// `declgraph_export_deinit`); push mode has already delivered everything
/// and returns null.
#[no_mangle]
pub unsafe extern "C" fn declgraph_recorder_finish(recorder: *mut Recorder) -> *mut ModuleExport {
    if recorder.is_null() {
        return std::ptr::null_mut();
    }
    let recorder = Box::from_raw(recorder);
    match recorder.0 {
        RecorderImpl::Batch(rec) => Box::into_raw(Box::new(rec.finish())),
        RecorderImpl::Push(_) => std::ptr::null_mut(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn declgraph_export_nodes(export: *const ModuleExport) -> Slice<Node> {
    match export.as_ref() {
        Some(export) => Slice::from_slice(export.nodes()),
        None => Slice::empty(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn declgraph_export_connections(
    export: *const ModuleExport,
) -> Slice<Connection> {
    match export.as_ref() {
        Some(export) => Slice::from_slice(export.connections()),
        None => Slice::empty(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn declgraph_export_link_identifiers(
    export: *const ModuleExport,
) -> Slice<LinkIdentifier> {
    match export.as_ref() {
        Some(export) => Slice::from_slice(export.link_identifiers()),
        None => Slice::empty(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn declgraph_export_text(export: *const ModuleExport) -> Slice<u8> {
    match export.as_ref() {
        Some(export) => Slice::from_slice(export.text_bytes()),
        None => Slice::empty(),
    }
}

/// Releases the export and all its arenas in one step. Every view issued
/// from it becomes invalid simultaneously.
#[no_mangle]
pub unsafe extern "C" fn declgraph_export_deinit(export: *mut ModuleExport) {
    if !export.is_null() {
        drop(Box::from_raw(export));
    }
}

/// Loads a compilation database from `directory`. On failure returns null
/// and, when `out_error` is non-null, stores a caller-owned error string to
/// be released with `declgraph_string_free`.
#[no_mangle]
pub unsafe extern "C" fn declgraph_compiledb_load(
    directory: *const c_char,
    out_error: *mut *mut c_char,
) -> *mut CompileDatabase {
    if !out_error.is_null() {
        *out_error = std::ptr::null_mut();
    }
    if directory.is_null() {
        return std::ptr::null_mut();
    }
    let dir = PathBuf::from(CStr::from_ptr(directory).to_string_lossy().into_owned());
    match CompileDatabase::load_from_directory(&dir) {
        Ok(db) => Box::into_raw(Box::new(db)),
        Err(err) => {
            if !out_error.is_null() {
                let text = CString::new(err.to_string()).unwrap_or_default();
                *out_error = text.into_raw();
            }
            std::ptr::null_mut()
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn declgraph_compiledb_commands(
    database: *const CompileDatabase,
) -> Slice<CompileCommand> {
    match database.as_ref() {
        Some(db) => Slice::from_slice(db.commands()),
        None => Slice::empty(),
    }
}

/// Releases the database's text, argv and record arenas together.
#[no_mangle]
pub unsafe extern "C" fn declgraph_compiledb_deinit(database: *mut CompileDatabase) {
    if !database.is_null() {
        drop(Box::from_raw(database));
    }
}

/// Frees an error string returned by `declgraph_compiledb_load`.
#[no_mangle]
pub unsafe extern "C" fn declgraph_string_free(text: *mut c_char) {
    if !text.is_null() {
        drop(CString::from_raw(text));
    }
}
