// 实体存储模块
// 以集合 + 过滤器的方式访问各类文档，不提供跨集合的关联查询

use std::future::Future;
use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;

mod filter;
pub mod memory;
pub mod postgres;

pub use filter::{Clause, Filter};
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// 可持久化的文档类型
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// 集合名称
    const COLLECTION: &'static str;
    /// 需要在集合内唯一的字段
    const UNIQUE_KEY: Option<&'static str> = None;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("document codec error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("{op} on {collection} exceeded the {secs}s deadline")]
    Timeout {
        op: &'static str,
        collection: &'static str,
        secs: u64,
    },
    #[error("duplicate {key} in {collection}")]
    Duplicate {
        collection: &'static str,
        key: &'static str,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// 按集合存取文档的抽象接口
pub trait EntityStore: Send + Sync {
    fn insert_one<T: Document>(&self, record: &T)
    -> impl Future<Output = StoreResult<String>> + Send;

    fn insert_many<T: Document>(
        &self,
        records: &[T],
    ) -> impl Future<Output = StoreResult<Vec<String>>> + Send;

    fn find_one<T: Document>(
        &self,
        filter: &Filter,
    ) -> impl Future<Output = StoreResult<Option<T>>> + Send;

    /// 结果按插入顺序返回
    fn find<T: Document>(&self, filter: &Filter)
    -> impl Future<Output = StoreResult<Vec<T>>> + Send;

    fn count<T: Document>(&self, filter: &Filter) -> impl Future<Output = StoreResult<u64>> + Send;
}

pub(crate) fn to_document<T: Document>(record: &T) -> StoreResult<Map<String, Value>> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::Codec(<serde_json::Error as serde::ser::Error>::custom(
            format!("{} record must serialize to a JSON object", T::COLLECTION),
        ))),
    }
}

pub(crate) fn from_document<T: Document>(doc: Map<String, Value>) -> StoreResult<T> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

/// 单次操作的超时设置
#[derive(Debug, Clone, Copy)]
pub struct Deadlines {
    pub write: Duration,
    pub read: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            write: Duration::from_secs(5),
            read: Duration::from_secs(3),
        }
    }
}

#[derive(Clone)]
enum Backend {
    Postgres(PgStore),
    Memory(MemoryStore),
}

/// 应用持有的存储句柄，按配置分发到具体后端并为每次调用加上超时
#[derive(Clone)]
pub struct Store {
    backend: Backend,
    deadlines: Deadlines,
}

impl Store {
    pub fn postgres(store: PgStore, deadlines: Deadlines) -> Self {
        Self {
            backend: Backend::Postgres(store),
            deadlines,
        }
    }

    pub fn memory(store: MemoryStore, deadlines: Deadlines) -> Self {
        Self {
            backend: Backend::Memory(store),
            deadlines,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Postgres(_) => "postgres",
            Backend::Memory(_) => "memory",
        }
    }
}

async fn within<R>(
    deadline: Duration,
    op: &'static str,
    collection: &'static str,
    fut: impl Future<Output = StoreResult<R>>,
) -> StoreResult<R> {
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("{} on {} timed out after {:?}", op, collection, deadline);
            Err(StoreError::Timeout {
                op,
                collection,
                secs: deadline.as_secs(),
            })
        }
    }
}

impl EntityStore for Store {
    async fn insert_one<T: Document>(&self, record: &T) -> StoreResult<String> {
        let fut = async {
            match &self.backend {
                Backend::Postgres(s) => s.insert_one(record).await,
                Backend::Memory(s) => s.insert_one(record).await,
            }
        };
        within(self.deadlines.write, "insert_one", T::COLLECTION, fut).await
    }

    async fn insert_many<T: Document>(&self, records: &[T]) -> StoreResult<Vec<String>> {
        let fut = async {
            match &self.backend {
                Backend::Postgres(s) => s.insert_many(records).await,
                Backend::Memory(s) => s.insert_many(records).await,
            }
        };
        within(self.deadlines.write, "insert_many", T::COLLECTION, fut).await
    }

    async fn find_one<T: Document>(&self, filter: &Filter) -> StoreResult<Option<T>> {
        let fut = async {
            match &self.backend {
                Backend::Postgres(s) => s.find_one(filter).await,
                Backend::Memory(s) => s.find_one(filter).await,
            }
        };
        within(self.deadlines.read, "find_one", T::COLLECTION, fut).await
    }

    async fn find<T: Document>(&self, filter: &Filter) -> StoreResult<Vec<T>> {
        let fut = async {
            match &self.backend {
                Backend::Postgres(s) => s.find(filter).await,
                Backend::Memory(s) => s.find(filter).await,
            }
        };
        within(self.deadlines.read, "find", T::COLLECTION, fut).await
    }

    async fn count<T: Document>(&self, filter: &Filter) -> StoreResult<u64> {
        let fut = async {
            match &self.backend {
                Backend::Postgres(s) => s.count::<T>(filter).await,
                Backend::Memory(s) => s.count::<T>(filter).await,
            }
        };
        within(self.deadlines.read, "count", T::COLLECTION, fut).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn expired_deadline_is_a_timeout() {
        let err = within(
            Duration::from_millis(10),
            "find",
            "MRCTask",
            std::future::pending::<StoreResult<()>>(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Timeout {
                op: "find",
                collection: "MRCTask",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn finished_call_passes_through() {
        let count = within(Duration::from_secs(3), "count", "MRCTask", async {
            Ok::<_, StoreError>(7u64)
        })
        .await
        .unwrap();
        assert_eq!(count, 7);
    }

    #[test]
    fn writes_get_more_time_than_reads() {
        let deadlines = Deadlines::default();
        assert_eq!(deadlines.write, Duration::from_secs(5));
        assert_eq!(deadlines.read, Duration::from_secs(3));
    }
}
