use sqlx::PgPool;

pub mod changes;
pub mod posts_repo;
pub mod subscription;

use changes::CollectionChanges;

#[derive(Clone)]
pub struct PostgresRepo {
    pool: PgPool,
    changes: CollectionChanges,
    snapshot_buffer: usize,
}

impl PostgresRepo {
    pub fn new(pool: PgPool, changes: CollectionChanges, snapshot_buffer: usize) -> Self {
        Self {
            pool,
            changes,
            snapshot_buffer: snapshot_buffer.max(1),
        }
    }
}
