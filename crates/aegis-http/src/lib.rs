mod auth;
mod error;
mod middleware;
mod response;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
