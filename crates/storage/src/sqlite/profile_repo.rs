use quiz_core::model::{PrincipalId, Profile, QuizResult};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{map_result_row, position_to_i64, principal_from_row, ser};
use crate::repository::{ProfileRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl ProfileRepository for SqliteRepository {
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO profiles (principal_id, display_name, email)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(principal_id) DO UPDATE SET
                display_name = excluded.display_name,
                email = excluded.email
            ",
        )
        .bind(profile.principal_id().as_str())
        .bind(profile.display_name())
        .bind(profile.email())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_profile(&self, id: &PrincipalId) -> Result<Option<Profile>, StorageError> {
        let Some(row) = sqlx::query(
            r"
                SELECT principal_id, display_name, email
                FROM profiles
                WHERE principal_id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        else {
            return Ok(None);
        };

        let principal_id = principal_from_row(&row)?;
        let display_name: Option<String> = row.try_get("display_name").map_err(ser)?;
        let email: Option<String> = row.try_get("email").map_err(ser)?;

        let rows = sqlx::query(
            r"
                SELECT score, total, percentage, taken_at
                FROM quiz_results
                WHERE principal_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut history = Vec::with_capacity(rows.len());
        for row in &rows {
            history.push(map_result_row(row)?);
        }

        let mut profile = Profile::new(principal_id).with_quiz_results(history);
        if let Some(name) = display_name {
            profile = profile.with_display_name(name);
        }
        if let Some(email) = email {
            profile = profile.with_email(email);
        }
        Ok(Some(profile))
    }

    async fn merge_quiz_results(
        &self,
        id: &PrincipalId,
        results: &[QuizResult],
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let exists = sqlx::query("SELECT 1 FROM profiles WHERE principal_id = ?1")
            .bind(id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(conn)?;
        if exists.is_none() {
            return Err(StorageError::NotFound);
        }

        sqlx::query("DELETE FROM quiz_results WHERE principal_id = ?1")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, result) in results.iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO quiz_results (principal_id, position, score, total, percentage, taken_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )
            .bind(id.as_str())
            .bind(position_to_i64(position)?)
            .bind(i64::from(result.score()))
            .bind(i64::from(result.total()))
            .bind(i64::from(result.percentage()))
            .bind(result.taken_at())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn append_quiz_result(
        &self,
        id: &PrincipalId,
        result: &QuizResult,
    ) -> Result<(), StorageError> {
        // One statement: the next position and the profile check are read under the same write lock.
        let outcome = sqlx::query(
            r"
            INSERT INTO quiz_results (principal_id, position, score, total, percentage, taken_at)
            SELECT p.principal_id,
                   (SELECT COALESCE(MAX(q.position) + 1, 0)
                      FROM quiz_results q
                     WHERE q.principal_id = p.principal_id),
                   ?2, ?3, ?4, ?5
              FROM profiles p
             WHERE p.principal_id = ?1
            ",
        )
        .bind(id.as_str())
        .bind(i64::from(result.score()))
        .bind(i64::from(result.total()))
        .bind(i64::from(result.percentage()))
        .bind(result.taken_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if outcome.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
