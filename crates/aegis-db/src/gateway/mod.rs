mod health;
mod manifest;
mod relay_instance;
mod rollup;
mod session;
mod usage;

use sqlx::PgPool;

pub const START_ENDPOINT: &str = "/api/v1/relay/start";

/// The only component that opens a transaction. All multi-row mutations run
/// inside a single `sqlx::Transaction`; every SQL-level invariant from
/// `spec.md` §3/§4.2 is encapsulated here and nowhere else.
///
/// Grounded on `kftray-commons/src/utils/db.rs`: one pool handle, plain
/// `sqlx::query`/`query_as` (no compile-time `query!` macros, so this crate
/// never needs a live database at build time), structured `error!` logging
/// immediately before any SQL error is erased into `CoreError::Internal`.
#[derive(Clone)]
pub struct Gateway {
    pool: PgPool,
}

impl Gateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub use health::*;
pub use manifest::*;
pub use rollup::*;
pub use session::*;
pub use usage::*;
