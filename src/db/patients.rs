use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{self, DirectoryQuery};
use crate::models::{Patient, PatientInput};

pub async fn list(pool: &PgPool, query: &DirectoryQuery) -> Result<Vec<Patient>, sqlx::Error> {
    if let Some(search) = &query.search {
        let pattern = db::like_pattern(search);
        sqlx::query_as::<_, Patient>(
            "SELECT * FROM patients
             WHERE full_name ILIKE $1 ESCAPE '\\' OR email ILIKE $1 ESCAPE '\\'
             ORDER BY created_at_utc DESC LIMIT $2",
        )
        .bind(pattern)
        .bind(query.limit)
        .fetch_all(pool)
        .await
    } else {
        sqlx::query_as::<_, Patient>(
            "SELECT * FROM patients ORDER BY created_at_utc DESC LIMIT $1",
        )
        .bind(query.limit)
        .fetch_all(pool)
        .await
    }
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Patient>, sqlx::Error> {
    sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn create(pool: &PgPool, input: &PatientInput) -> Result<Patient, sqlx::Error> {
    sqlx::query_as::<_, Patient>(
        "INSERT INTO patients (id, full_name, email, date_of_birth)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&input.full_name)
    .bind(&input.email)
    .bind(input.date_of_birth)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    input: &PatientInput,
) -> Result<Option<Patient>, sqlx::Error> {
    sqlx::query_as::<_, Patient>(
        "UPDATE patients SET full_name = $2, email = $3, date_of_birth = $4
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&input.full_name)
    .bind(&input.email)
    .bind(input.date_of_birth)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM patients WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
