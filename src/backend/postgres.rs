use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use uuid::Uuid;

use super::{Document, DocumentStore, Fields};

/// Document collections stored as JSONB rows of a single `documents` table.
#[derive(Clone)]
pub struct PgDocumentStore {
    db: PgPool,
}

impl PgDocumentStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

fn parse_id(id: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(id).with_context(|| format!("invalid document id {id:?}"))
}

/// Containment filter for `field = value`; `@>` is what the GIN index on
/// `data` can serve.
const FIND_BY_FIELD_SQL: &str = r#"
    SELECT id, data
    FROM documents
    WHERE collection = $1 AND data @> jsonb_build_object($2::text, $3::jsonb)
    ORDER BY created_at ASC
"#;

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> anyhow::Result<Vec<Document>> {
        let rows = sqlx::query_as::<_, (Uuid, Json<Fields>)>(FIND_BY_FIELD_SQL)
            .bind(collection)
            .bind(field)
            .bind(Json(value))
            .fetch_all(&self.db)
            .await
            .with_context(|| format!("query {collection} by {field}"))?;

        Ok(rows
            .into_iter()
            .map(|(id, Json(fields))| Document {
                id: id.to_string(),
                fields,
            })
            .collect())
    }

    async fn insert(&self, collection: &str, fields: Fields) -> anyhow::Result<String> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO documents (id, collection, data)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(id)
        .bind(collection)
        .bind(Json(fields))
        .execute(&self.db)
        .await
        .with_context(|| format!("insert into {collection}"))?;
        Ok(id.to_string())
    }

    async fn update(&self, collection: &str, id: &str, patch: Fields) -> anyhow::Result<()> {
        let id = parse_id(id)?;
        let result = sqlx::query(
            r#"
            UPDATE documents
               SET data = data || $3
             WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(patch))
        .execute(&self.db)
        .await
        .with_context(|| format!("update {collection}/{id}"))?;

        anyhow::ensure!(
            result.rows_affected() == 1,
            "document {collection}/{id} not found"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_uses_containment_so_the_gin_index_applies() {
        assert!(FIND_BY_FIELD_SQL.contains("data @> jsonb_build_object($2::text, $3::jsonb)"));
        assert!(!FIND_BY_FIELD_SQL.contains("data -> $2"));
    }

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(parse_id("not-a-uuid").is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }
}
