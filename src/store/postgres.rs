use serde_json::{Map, Value};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    Clause, Document, EntityStore, Filter, StoreError, StoreResult, from_document, to_document,
};

// 单条 INSERT 语句的最大行数，避免超出绑定参数上限
const INSERT_CHUNK_ROWS: usize = 1000;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        seq BIGSERIAL PRIMARY KEY,
        id UUID NOT NULL UNIQUE,
        collection TEXT NOT NULL,
        doc JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS documents_collection_idx ON documents (collection)",
    "CREATE INDEX IF NOT EXISTS documents_doc_idx ON documents USING GIN (doc jsonb_path_ops)",
];

/// 基于 PostgreSQL JSONB 的文档存储，所有集合共用一张表
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute("SET application_name = 'label_backend';")
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// 建表及索引，可重复执行
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// 为声明了唯一字段的集合建立部分唯一索引
    pub async fn ensure_unique<T: Document>(&self) -> Result<(), sqlx::Error> {
        let Some(key) = T::UNIQUE_KEY else {
            return Ok(());
        };
        let statement = format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS documents_{}_{}_key \
             ON documents ((doc -> '{}')) WHERE collection = '{}'",
            T::COLLECTION.to_lowercase(),
            key.to_lowercase(),
            key,
            T::COLLECTION,
        );
        sqlx::query(&statement).execute(&self.pool).await?;
        tracing::info!("Ensured unique index on {}.{}", T::COLLECTION, key);
        Ok(())
    }
}

fn classify<T: Document>(err: sqlx::Error) -> StoreError {
    let unique = matches!(&err, sqlx::Error::Database(db) if db.is_unique_violation());
    match (unique, T::UNIQUE_KEY) {
        (true, Some(key)) => StoreError::Duplicate {
            collection: T::COLLECTION,
            key,
        },
        _ => StoreError::Database(err),
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, collection: &str, filter: &Filter) {
    qb.push(" WHERE collection = ").push_bind(collection.to_string());
    for clause in filter.clauses() {
        match clause {
            Clause::Eq(field, value) => {
                let mut probe = Map::new();
                probe.insert(field.clone(), value.clone());
                qb.push(" AND doc @> ").push_bind(Json(Value::Object(probe)));
            }
            // jsonb 数组包含标量的特例：'["a","b"]' @> '"a"'
            Clause::In(field, values) => {
                qb.push(" AND ")
                    .push_bind(Json(Value::Array(values.clone())))
                    .push(" @> (doc -> ")
                    .push_bind(field.clone())
                    .push(")");
            }
        }
    }
}

impl EntityStore for PgStore {
    async fn insert_one<T: Document>(&self, record: &T) -> StoreResult<String> {
        let id = Uuid::new_v4();
        let doc = to_document(record)?;
        sqlx::query("INSERT INTO documents (id, collection, doc) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(T::COLLECTION)
            .bind(Json(Value::Object(doc)))
            .execute(&self.pool)
            .await
            .map_err(classify::<T>)?;
        Ok(id.to_string())
    }

    async fn insert_many<T: Document>(&self, records: &[T]) -> StoreResult<Vec<String>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let rows = records
            .iter()
            .map(|r| -> StoreResult<(Uuid, Map<String, Value>)> {
                Ok((Uuid::new_v4(), to_document(r)?))
            })
            .collect::<StoreResult<Vec<_>>>()?;
        let ids = rows.iter().map(|(id, _)| id.to_string()).collect::<Vec<_>>();

        let mut tx = self.pool.begin().await?;
        for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
            let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO documents (id, collection, doc) ");
            qb.push_values(chunk, |mut b, (id, doc)| {
                b.push_bind(*id)
                    .push_bind(T::COLLECTION)
                    .push_bind(Json(Value::Object(doc.clone())));
            });
            qb.build()
                .execute(&mut *tx)
                .await
                .map_err(classify::<T>)?;
        }
        tx.commit().await?;
        Ok(ids)
    }

    async fn find_one<T: Document>(&self, filter: &Filter) -> StoreResult<Option<T>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT doc FROM documents");
        push_filter(&mut qb, T::COLLECTION, filter);
        qb.push(" ORDER BY seq LIMIT 1");

        let row: Option<(Json<Map<String, Value>>,)> =
            qb.build_query_as().fetch_optional(&self.pool).await?;
        row.map(|(Json(doc),)| from_document(doc)).transpose()
    }

    async fn find<T: Document>(&self, filter: &Filter) -> StoreResult<Vec<T>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT doc FROM documents");
        push_filter(&mut qb, T::COLLECTION, filter);
        qb.push(" ORDER BY seq");

        let rows: Vec<(Json<Map<String, Value>>,)> =
            qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|(Json(doc),)| from_document(doc))
            .collect()
    }

    async fn count<T: Document>(&self, filter: &Filter) -> StoreResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM documents");
        push_filter(&mut qb, T::COLLECTION, filter);

        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(filter: &Filter) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT doc FROM documents");
        push_filter(&mut qb, "Authentication", filter);
        qb.sql().to_string()
    }

    #[test]
    fn collection_only() {
        assert_eq!(
            select(&Filter::new()),
            "SELECT doc FROM documents WHERE collection = $1"
        );
    }

    #[test]
    fn equality_uses_containment_and_membership_uses_array_contains() {
        let filter = Filter::new()
            .eq("userId", "u1")
            .eq("statusCode", "1")
            .is_in("projectId", [1, 2]);
        assert_eq!(
            select(&filter),
            "SELECT doc FROM documents WHERE collection = $1 \
             AND doc @> $2 AND doc @> $3 AND $4 @> (doc -> $5)"
        );
    }
}
