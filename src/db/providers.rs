use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{self, DirectoryQuery};
use crate::models::{Provider, ProviderInput};

pub async fn list(pool: &PgPool, query: &DirectoryQuery) -> Result<Vec<Provider>, sqlx::Error> {
    if let Some(search) = &query.search {
        let pattern = db::like_pattern(search);
        sqlx::query_as::<_, Provider>(
            "SELECT * FROM providers
             WHERE full_name ILIKE $1 ESCAPE '\\'
                OR specialty ILIKE $1 ESCAPE '\\'
                OR email ILIKE $1 ESCAPE '\\'
             ORDER BY full_name ASC LIMIT $2",
        )
        .bind(pattern)
        .bind(query.limit)
        .fetch_all(pool)
        .await
    } else {
        sqlx::query_as::<_, Provider>("SELECT * FROM providers ORDER BY full_name ASC LIMIT $1")
            .bind(query.limit)
            .fetch_all(pool)
            .await
    }
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Provider>, sqlx::Error> {
    sqlx::query_as::<_, Provider>("SELECT * FROM providers WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create(pool: &PgPool, input: &ProviderInput) -> Result<Provider, sqlx::Error> {
    sqlx::query_as::<_, Provider>(
        "INSERT INTO providers (id, full_name, email, specialty)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&input.full_name)
    .bind(&input.email)
    .bind(input.specialty.as_deref().unwrap_or_default())
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    input: &ProviderInput,
) -> Result<Option<Provider>, sqlx::Error> {
    sqlx::query_as::<_, Provider>(
        "UPDATE providers SET full_name = $2, email = $3, specialty = $4
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&input.full_name)
    .bind(&input.email)
    .bind(input.specialty.as_deref().unwrap_or_default())
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM providers WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
