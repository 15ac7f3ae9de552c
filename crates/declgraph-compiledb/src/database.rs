use std::os::raw::c_char;
use std::path::Path;

use declgraph_core::{ArgvCell, CompileCommand, MemoryCategory, TextArena, VirtualArena};

use crate::error::Result;
use crate::manifest::{self, ManifestEntry};

/// Heuristic tag for argv vectors recovered by word-splitting a `command`
/// string rather than read from an `arguments` array.
const INFERRED_FROM_COMMAND: &str = "inferred from command string";

/// All build commands of a project, deep-copied into arena storage.
///
/// Every pointer in every [`CompileCommand`] targets storage owned here, so
/// the commands stay valid after the manifest's transient source data is
/// gone. Dropping the database releases the text, argv and record arenas
/// together; partial release is not supported.
#[derive(Debug)]
pub struct CompileDatabase {
    text: TextArena,
    argv: VirtualArena<ArgvCell>,
    commands: VirtualArena<CompileCommand>,
}

impl CompileDatabase {
    /// Loads the manifest found in `dir` and materializes one record per
    /// compilation unit, in source order.
    pub fn load_from_directory(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = manifest::load(dir)?;
        tracing::debug!(dir = %dir.display(), entries = entries.len(), "compilation database loaded");

        let mut db = Self {
            text: TextArena::new()?,
            argv: VirtualArena::new(MemoryCategory::ArgvCells)?,
            commands: VirtualArena::new(MemoryCategory::CompileCommands)?,
        };
        for entry in entries {
            db.append(entry);
        }
        Ok(db)
    }

    fn append(&mut self, entry: ManifestEntry) {
        let (args, heuristic) = match (entry.arguments, entry.command) {
            (Some(args), _) => (args, None),
            (None, Some(command)) => {
                (manifest::split_command(&command), Some(INFERRED_FROM_COMMAND))
            }
            (None, None) => (Vec::new(), None),
        };

        let directory = self.text.dupe_str(&entry.directory);
        let filename = self.text.dupe_str(&entry.file);
        let output = self.text.dupe_str(entry.output.as_deref().unwrap_or(""));
        let heuristic = heuristic
            .map(|h| self.text.dupe_str(h))
            .unwrap_or(std::ptr::null());

        let argc = args.len() as u64;
        let argv = self.argv.alloc(args.len());
        for (i, arg) in args.iter().enumerate() {
            unsafe {
                argv.add(i).write(ArgvCell(self.text.dupe_str(arg)));
            }
        }

        self.commands.push(CompileCommand {
            directory,
            filename,
            output,
            heuristic,
            argc,
            argv: argv as *const *const c_char,
        });
    }

    /// All commands in manifest order; valid until the database is dropped.
    pub fn commands(&self) -> &[CompileCommand] {
        self.commands.as_slice()
    }

    /// Distinct translation-unit filenames in first-seen order. Hosts use
    /// this to enumerate units before traversal begins.
    pub fn files(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for command in self.commands() {
            let name = self.text_of(command.filename).unwrap_or("");
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        seen
    }

    /// Resolves one arena text pointer; `None` for null (absent heuristic).
    pub fn text_of(&self, ptr: *const c_char) -> Option<&str> {
        if ptr.is_null() {
            return None;
        }
        unsafe { self.text.resolve(ptr) }.to_str().ok()
    }

    /// A command's argument vector resolved back to string slices.
    pub fn argv_of(&self, command: &CompileCommand) -> Vec<&str> {
        if command.argv.is_null() {
            return Vec::new();
        }
        let cells =
            unsafe { std::slice::from_raw_parts(command.argv, command.argc as usize) };
        cells
            .iter()
            .map(|&p| self.text_of(p).unwrap_or(""))
            .collect()
    }
}
