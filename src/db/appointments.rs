use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::{self, AppointmentQuery};
use crate::models::{Appointment, AppointmentInput};

pub async fn list(
    pool: &PgPool,
    query: &AppointmentQuery,
) -> Result<Vec<Appointment>, sqlx::Error> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT * FROM appointments WHERE TRUE");

    if let Some(search) = &query.search_text {
        let pattern = db::like_pattern(search);
        builder
            .push(" AND (patient_id::text ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR provider_id::text ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR COALESCE(notes, '') ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
    if let Some(from) = query.from_utc {
        builder.push(" AND starts_at_utc >= ").push_bind(from);
    }
    if let Some(to) = query.to_utc {
        builder.push(" AND ends_at_utc <= ").push_bind(to);
    }
    if let Some(provider_id) = query.provider_id {
        builder.push(" AND provider_id = ").push_bind(provider_id);
    }

    builder
        .push(" ORDER BY starts_at_utc DESC LIMIT ")
        .push_bind(query.limit);

    builder
        .build_query_as::<Appointment>()
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Appointment>, sqlx::Error> {
    sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Serializes scheduling for one provider until the surrounding transaction ends.
pub async fn lock_provider<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    provider_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
        .bind(provider_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn find_overlapping<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    provider_id: Uuid,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    exclude: Option<Uuid>,
) -> Result<Vec<Appointment>, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(
        "SELECT * FROM appointments
         WHERE provider_id = $1
           AND starts_at_utc < $3
           AND $2 < ends_at_utc
           AND ($4::uuid IS NULL OR id <> $4)
         ORDER BY starts_at_utc",
    )
    .bind(provider_id)
    .bind(starts_at)
    .bind(ends_at)
    .bind(exclude)
    .fetch_all(executor)
    .await
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    input: &AppointmentInput,
) -> Result<Appointment, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(
        "INSERT INTO appointments (id, patient_id, provider_id, starts_at_utc, ends_at_utc, notes)
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(input.patient_id)
    .bind(input.provider_id)
    .bind(input.starts_at_utc)
    .bind(input.ends_at_utc)
    .bind(&input.notes)
    .fetch_one(executor)
    .await
}

pub async fn update<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    input: &AppointmentInput,
) -> Result<Option<Appointment>, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(
        "UPDATE appointments
         SET patient_id = $2, provider_id = $3, starts_at_utc = $4, ends_at_utc = $5, notes = $6
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(input.patient_id)
    .bind(input.provider_id)
    .bind(input.starts_at_utc)
    .bind(input.ends_at_utc)
    .bind(&input.notes)
    .fetch_optional(executor)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
