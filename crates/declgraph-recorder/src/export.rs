use declgraph_core::{Connection, LinkIdentifier, Node, TextArena, VirtualArena};

/// Frozen recorder output: the three record arenas plus the shared text
/// arena, exposed read-only.
///
/// The export exclusively owns its storage. Every view stays valid until the
/// export is dropped; dropping releases all four arenas as a single step and
/// invalidates all views simultaneously. There is no partial teardown.
#[derive(Debug)]
pub struct ModuleExport {
    nodes: VirtualArena<Node>,
    connections: VirtualArena<Connection>,
    links: VirtualArena<LinkIdentifier>,
    text: TextArena,
}

impl ModuleExport {
    pub(crate) fn new(
        nodes: VirtualArena<Node>,
        connections: VirtualArena<Connection>,
        links: VirtualArena<LinkIdentifier>,
        text: TextArena,
    ) -> Self {
        tracing::debug!(
            nodes = nodes.len(),
            connections = connections.len(),
            link_identifiers = links.len(),
            text_bytes = text.len(),
            "module export frozen"
        );
        Self {
            nodes,
            connections,
            links,
            text,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        self.nodes.as_slice()
    }

    pub fn connections(&self) -> &[Connection] {
        self.connections.as_slice()
    }

    pub fn link_identifiers(&self) -> &[LinkIdentifier] {
        self.links.as_slice()
    }

    /// The raw interned text buffer, NUL terminators included.
    pub fn text_bytes(&self) -> &[u8] {
        self.text.as_slice()
    }

    /// Resolves a node's interned display name.
    pub fn node_name(&self, node: &Node) -> &str {
        unsafe { self.text.resolve(node.name) }.to_str().unwrap_or("")
    }

    /// Resolves a link identifier's interned alias.
    pub fn link_alias(&self, link: &LinkIdentifier) -> &str {
        unsafe { self.text.resolve(link.alias) }
            .to_str()
            .unwrap_or("")
    }
}
