use declgraph_core::{
    ArenaOptions, Connection, LinkIdentifier, MemoryCategory, Node, Result, TextArena,
    VirtualArena,
};

use crate::export::ModuleExport;

/// Destination for recorder emissions. Batch mode buffers into arenas;
/// callback mode forwards each emission to the host as it happens. The
/// recorder is written once over this seam, so both modes see the exact
/// same sequence.
pub trait GraphSink {
    fn add_node(&mut self, id: i64, name: &str);
    fn add_connection(&mut self, from: i64, to: i64);
    fn add_link_identifier(&mut self, id: i64, alias: &str);
}

/// Batch sink: three record arenas plus one shared text arena. Frozen into a
/// [`ModuleExport`] when traversal completes.
#[derive(Debug)]
pub struct ArenaSink {
    nodes: VirtualArena<Node>,
    connections: VirtualArena<Connection>,
    links: VirtualArena<LinkIdentifier>,
    text: TextArena,
}

impl ArenaSink {
    pub fn new() -> Result<Self> {
        Self::with_options(&ArenaOptions::default())
    }

    pub fn with_options(options: &ArenaOptions) -> Result<Self> {
        Ok(Self {
            nodes: VirtualArena::with_options(options, MemoryCategory::Nodes)?,
            connections: VirtualArena::with_options(options, MemoryCategory::Connections)?,
            links: VirtualArena::with_options(options, MemoryCategory::LinkIdentifiers)?,
            text: TextArena::with_options(options)?,
        })
    }

    pub(crate) fn into_export(self) -> ModuleExport {
        ModuleExport::new(self.nodes, self.connections, self.links, self.text)
    }
}

impl GraphSink for ArenaSink {
    fn add_node(&mut self, id: i64, name: &str) {
        let name = self.text.dupe_str(name);
        self.nodes.push(Node { id, name });
    }

    fn add_connection(&mut self, from: i64, to: i64) {
        self.connections.push(Connection { from, to });
    }

    fn add_link_identifier(&mut self, id: i64, alias: &str) {
        let alias = self.text.dupe_str(alias);
        self.links.push(LinkIdentifier { id, alias });
    }
}
