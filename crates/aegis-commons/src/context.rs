use uuid::Uuid;

/// The request id stamped by the request-id middleware, carried in request
/// extensions ahead of authentication so it is available even on requests
/// that are ultimately rejected by auth. `RequestContext` combines this with
/// the authenticated user id once both are known.
#[derive(Debug, Clone, Copy)]
pub struct RequestId(pub Uuid);

/// Per-request scoped values, passed explicitly rather than read from globals
/// (`spec.md` §9: "Dynamic request-scoped values ... passed through a
/// per-request context carrier, not module globals"). Every `Coordinator`
/// operation takes one of these instead of a bare `user_id`.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub user_id: String,
}

impl RequestContext {
    pub fn new(request_id: Uuid, user_id: impl Into<String>) -> Self {
        Self {
            request_id,
            user_id: user_id.into(),
        }
    }
}
