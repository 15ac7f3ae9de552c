/// One traversal event from the external syntax-tree provider.
///
/// The provider drives the recorder with a single synchronous stream of
/// these, in depth-first pre-order: a scope is entered before anything inside
/// it is visited, and left after its last child. Every `EnterScope` has a
/// matching `LeaveScope` with the same id.
#[derive(Debug, Clone, Copy)]
pub enum TraversalEvent<'a> {
    EnterScope {
        id: i64,
        /// False for constructs that never open a nesting level, such as
        /// local variables.
        scope_defining: bool,
    },
    Declaration {
        id: i64,
        /// Only the canonical representative of a set of re-declarations
        /// contributes to the graph.
        canonical: bool,
        name: &'a str,
        alias: Option<&'a str>,
        /// False in templated/dependent contexts, for locals and for
        /// compiler-synthesized helpers; those have no stable external name.
        alias_eligible: bool,
    },
    Reference {
        id: i64,
        name: &'a str,
    },
    LeaveScope {
        id: i64,
    },
}
