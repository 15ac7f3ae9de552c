use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;

use anyhow::Result;
use declgraph::*;
use tempfile::TempDir;

fn text(s: &str) -> (*const c_char, u64) {
    (s.as_ptr() as *const c_char, s.len() as u64)
}

#[test]
fn batch_mode_round_trip() {
    let rec = declgraph_recorder_new();
    assert!(!rec.is_null());

    unsafe {
        declgraph_recorder_enter_scope(rec, 1, true);
        declgraph_recorder_enter_scope(rec, 2, true);
        let (name, name_len) = text("widget");
        let (alias, alias_len) = text("_Zwidget");
        declgraph_recorder_declaration(rec, 2, true, name, name_len, alias, alias_len, true);
        let (used, used_len) = text("helper");
        declgraph_recorder_reference(rec, 9, used, used_len);
        declgraph_recorder_leave_scope(rec, 2);
        declgraph_recorder_leave_scope(rec, 1);

        let export = declgraph_recorder_finish(rec);
        assert!(!export.is_null());

        let nodes = declgraph_export_nodes(export);
        let connections = declgraph_export_connections(export);
        let links = declgraph_export_link_identifiers(export);
        let bytes = declgraph_export_text(export);

        let nodes = nodes.as_slice();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].id, 2);
        assert_eq!(CStr::from_ptr(nodes[0].name).to_bytes(), b"widget");
        assert_eq!(nodes[1].id, 9);
        assert_eq!(CStr::from_ptr(nodes[1].name).to_bytes(), b"helper");

        let connections = connections.as_slice();
        assert_eq!(connections.len(), 2);
        assert_eq!((connections[0].from, connections[0].to), (2, 1));
        // Reference site links to the enclosing scope.
        assert_eq!((connections[1].from, connections[1].to), (9, 2));

        let links = links.as_slice();
        assert_eq!(links.len(), 1);
        assert_eq!(CStr::from_ptr(links[0].alias).to_bytes(), b"_Zwidget");

        assert!(bytes.len > 0);

        declgraph_export_deinit(export);
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Delivered {
    Node(i64, String),
    Connection(i64, i64),
    Link(i64, String),
}

unsafe extern "C" fn on_node(ud: *mut c_void, id: i64, name: *const c_char, len: u64) {
    let out = &mut *(ud as *mut Vec<Delivered>);
    let bytes = std::slice::from_raw_parts(name as *const u8, len as usize);
    out.push(Delivered::Node(id, String::from_utf8_lossy(bytes).into_owned()));
}

unsafe extern "C" fn on_connection(ud: *mut c_void, from: i64, to: i64) {
    let out = &mut *(ud as *mut Vec<Delivered>);
    out.push(Delivered::Connection(from, to));
}

unsafe extern "C" fn on_link(ud: *mut c_void, id: i64, alias: *const c_char, len: u64) {
    let out = &mut *(ud as *mut Vec<Delivered>);
    let bytes = std::slice::from_raw_parts(alias as *const u8, len as usize);
    out.push(Delivered::Link(id, String::from_utf8_lossy(bytes).into_owned()));
}

#[test]
fn callback_mode_delivers_in_emission_order() {
    let mut delivered: Vec<Delivered> = Vec::new();
    let callbacks = RecorderCallbacks {
        userdata: &mut delivered as *mut _ as *mut c_void,
        add_node: Some(on_node),
        add_connection: Some(on_connection),
        add_link_identifier: Some(on_link),
    };

    let rec = declgraph_recorder_with_callbacks(callbacks);
    assert!(!rec.is_null());

    unsafe {
        declgraph_recorder_enter_scope(rec, 1, true);
        let (name, name_len) = text("widget");
        let (alias, alias_len) = text("_Zwidget");
        declgraph_recorder_declaration(rec, 1, true, name, name_len, alias, alias_len, true);
        declgraph_recorder_leave_scope(rec, 1);

        // Push mode never materializes an export.
        let export = declgraph_recorder_finish(rec);
        assert!(export.is_null());
    }

    assert_eq!(
        delivered,
        vec![
            Delivered::Node(1, "widget".into()),
            Delivered::Connection(1, 0),
            Delivered::Link(1, "_Zwidget".into()),
        ]
    );
}

#[test]
fn compiledb_load_views_and_teardown() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(
        dir.path().join("compile_commands.json"),
        r#"[{"directory": "/p", "file": "a.c", "arguments": ["cc", "-c", "a.c"]}]"#,
    )?;
    let dir_c = CString::new(dir.path().to_string_lossy().into_owned())?;

    unsafe {
        let mut err: *mut c_char = std::ptr::null_mut();
        let db = declgraph_compiledb_load(dir_c.as_ptr(), &mut err);
        assert!(!db.is_null());
        assert!(err.is_null());

        let commands = declgraph_compiledb_commands(db);
        let commands = commands.as_slice();
        assert_eq!(commands.len(), 1);
        assert_eq!(CStr::from_ptr(commands[0].filename).to_bytes(), b"a.c");
        assert_eq!(commands[0].argc, 3);
        let argv = std::slice::from_raw_parts(commands[0].argv, 3);
        assert_eq!(CStr::from_ptr(argv[0]).to_bytes(), b"cc");
        assert!(commands[0].heuristic.is_null());

        declgraph_compiledb_deinit(db);
    }
    Ok(())
}

#[test]
fn compiledb_load_failure_yields_owned_error_string() -> Result<()> {
    let dir = TempDir::new()?;
    let dir_c = CString::new(dir.path().to_string_lossy().into_owned())?;

    unsafe {
        let mut err: *mut c_char = std::ptr::null_mut();
        let db = declgraph_compiledb_load(dir_c.as_ptr(), &mut err);
        assert!(db.is_null());
        assert!(!err.is_null());

        let message = CStr::from_ptr(err).to_string_lossy().into_owned();
        assert!(message.contains("compile_commands.json"));

        declgraph_string_free(err);
    }
    Ok(())
}
