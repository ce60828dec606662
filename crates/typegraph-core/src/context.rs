use typegraph_core_types::RequestContext;

/// Unit-of-work handle threaded through every mutator call
///
/// Scopes all store lookups to one workspace, names the actor for the
/// activity trail and carries the correlation ids for logs and errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationContext {
    pub workspace_id: String,
    pub actor: String,
    pub request: RequestContext,
}

impl MutationContext {
    /// Context with a fresh `RequestContext`
    pub fn new(workspace_id: impl Into<String>, actor: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            actor: actor.into(),
            request: RequestContext::new(),
        }
    }

    pub fn with_request(mut self, request: RequestContext) -> Self {
        self.request = request;
        self
    }
}
