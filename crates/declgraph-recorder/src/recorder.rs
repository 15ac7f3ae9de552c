use declgraph_core::{ArenaOptions, Result, ROOT_SCOPE};

use crate::event::TraversalEvent;
use crate::export::ModuleExport;
use crate::sink::{ArenaSink, GraphSink};

#[derive(Debug, Clone, Copy)]
struct ScopeFrame {
    id: i64,
    scope_defining: bool,
}

/// Consumes the provider's event stream and emits the node/connection/alias
/// graph through a [`GraphSink`].
///
/// The recorder is the explicit stack machine for scope nesting: every
/// `enter_scope` records a frame, every `leave_scope` pops it and checks the
/// id. A mismatch means the event stream broke its nesting contract; that is
/// an internal-consistency violation and terminates the process.
///
/// Owned by a single traversal; not safe for concurrent use.
#[derive(Debug)]
pub struct GraphRecorder<S: GraphSink> {
    sink: S,
    frames: Vec<ScopeFrame>,
    parents: Vec<i64>,
}

impl<S: GraphSink> GraphRecorder<S> {
    pub fn with_sink(sink: S) -> Self {
        Self {
            sink,
            frames: Vec::new(),
            parents: Vec::new(),
        }
    }

    /// Applies one event; dispatch over the provider's node-kind callbacks.
    pub fn record(&mut self, event: TraversalEvent<'_>) {
        match event {
            TraversalEvent::EnterScope { id, scope_defining } => {
                self.enter_scope(id, scope_defining)
            }
            TraversalEvent::Declaration {
                id,
                canonical,
                name,
                alias,
                alias_eligible,
            } => self.declaration(id, canonical, name, alias, alias_eligible),
            TraversalEvent::Reference { id, name } => self.reference(id, name),
            TraversalEvent::LeaveScope { id } => self.leave_scope(id),
        }
    }

    pub fn enter_scope(&mut self, id: i64, scope_defining: bool) {
        self.frames.push(ScopeFrame { id, scope_defining });
        if scope_defining {
            self.parents.push(id);
        }
    }

    pub fn leave_scope(&mut self, id: i64) {
        let frame = match self.frames.pop() {
            Some(frame) => frame,
            None => {
                tracing::error!(id, "scope left with no scope entered");
                std::process::abort();
            }
        };
        if frame.id != id {
            tracing::error!(expected = frame.id, got = id, "scope nesting violated");
            std::process::abort();
        }
        if frame.scope_defining {
            let popped = self.parents.pop();
            // frames and parents are pushed together; they cannot drift
            debug_assert_eq!(popped, Some(id));
        }
    }

    /// Records a declaration visit. Non-canonical re-declarations contribute
    /// nothing, so each logical entity yields exactly one node.
    pub fn declaration(
        &mut self,
        id: i64,
        canonical: bool,
        name: &str,
        alias: Option<&str>,
        alias_eligible: bool,
    ) {
        if !canonical {
            return;
        }
        let parent = self.parent_of_current();
        self.sink.add_node(id, name);
        self.sink.add_connection(id, parent);
        if alias_eligible {
            if let Some(alias) = alias {
                self.sink.add_link_identifier(id, alias);
            }
        }
    }

    /// Records a reference site. The connection targets the enclosing scope
    /// (the stack top), not the declaration the reference names.
    pub fn reference(&mut self, id: i64, name: &str) {
        let scope = self.current_scope();
        self.sink.add_node(id, name);
        self.sink.add_connection(id, scope);
    }

    /// The scope one below the current stack top. The traversal pushes the
    /// current construct before visiting it, so the top is the construct
    /// itself and its parent sits one entry down. With fewer than two
    /// entries on the stack this is [`ROOT_SCOPE`], at any depth.
    pub fn parent_of_current(&self) -> i64 {
        if self.parents.len() < 2 {
            return ROOT_SCOPE;
        }
        self.parents[self.parents.len() - 2]
    }

    /// The current stack top, or [`ROOT_SCOPE`] outside any scope.
    pub fn current_scope(&self) -> i64 {
        self.parents.last().copied().unwrap_or(ROOT_SCOPE)
    }

    /// Hands the sink back, e.g. to inspect a collector in callback mode.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl GraphRecorder<ArenaSink> {
    /// Batch-mode recorder buffering into arenas.
    pub fn batch() -> Result<Self> {
        Ok(Self::with_sink(ArenaSink::new()?))
    }

    pub fn batch_with_options(options: &ArenaOptions) -> Result<Self> {
        Ok(Self::with_sink(ArenaSink::with_options(options)?))
    }

    /// Freezes the output arenas into a read-only export. The traversal's
    /// scope stack is discarded here; it never escapes to the export.
    pub fn finish(self) -> ModuleExport {
        self.sink.into_export()
    }
}
