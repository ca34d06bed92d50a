use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use tokio::time::timeout;

use crate::error::Error;
use crate::users::model::{Credential, User};

/// Deadline applied to every storage call; exceeding it surfaces as a
/// generic storage error rather than blocking the request.
const DB_TIMEOUT: Duration = Duration::from_secs(5);

/// Name of the unique constraint on users.email, matched structurally when
/// classifying insert failures.
const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<User, Error>;
    async fn find_by_id(&self, id: i64) -> Result<User, Error>;
    /// Persists a new user; storage assigns id and timestamps back onto it.
    async fn insert(&self, user: &mut User) -> Result<(), Error>;
    async fn update(&self, id: i64, user: &mut User) -> Result<(), Error>;
    async fn delete(&self, id: i64) -> Result<(), Error>;
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    fullname: String,
    email: String,
    password: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            fullname: row.fullname,
            email: row.email,
            password: Credential::from_hash(row.password),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgUsers {
    db: PgPool,
}

impl PgUsers {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn timeout_err() -> Error {
    Error::Storage("storage operation timed out".into())
}

/// Classifies a write failure: a unique violation on the email constraint is
/// the duplicate-email case, everything else stays a storage error. The
/// driver's structured error kind and constraint name are used, never the
/// message text.
fn map_write_err(e: sqlx::Error) -> Error {
    match &e {
        sqlx::Error::Database(db)
            if db.is_unique_violation() && db.constraint() == Some(EMAIL_UNIQUE_CONSTRAINT) =>
        {
            Error::DuplicateEmail
        }
        _ => Error::from(e),
    }
}

#[async_trait]
impl UserRepo for PgUsers {
    async fn find_by_email(&self, email: &str) -> Result<User, Error> {
        let row = timeout(
            DB_TIMEOUT,
            sqlx::query_as::<_, UserRow>(
                r#"
                SELECT id, fullname, email, password, created_at, updated_at
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(&self.db),
        )
        .await
        .map_err(|_| timeout_err())??;

        row.map(User::from).ok_or(Error::NotFound)
    }

    async fn find_by_id(&self, id: i64) -> Result<User, Error> {
        let row = timeout(
            DB_TIMEOUT,
            sqlx::query_as::<_, UserRow>(
                r#"
                SELECT id, fullname, email, password, created_at, updated_at
                FROM users
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.db),
        )
        .await
        .map_err(|_| timeout_err())??;

        row.map(User::from).ok_or(Error::NotFound)
    }

    async fn insert(&self, user: &mut User) -> Result<(), Error> {
        let res = timeout(
            DB_TIMEOUT,
            sqlx::query(
                r#"
                INSERT INTO users (fullname, email, password)
                VALUES ($1, $2, $3)
                RETURNING id, created_at, updated_at
                "#,
            )
            .bind(&user.fullname)
            .bind(&user.email)
            .bind(user.password.hash())
            .fetch_one(&self.db),
        )
        .await
        .map_err(|_| timeout_err())?;

        let row = res.map_err(map_write_err)?;
        user.id = row.try_get("id")?;
        user.created_at = row.try_get("created_at")?;
        user.updated_at = row.try_get("updated_at")?;
        Ok(())
    }

    async fn update(&self, id: i64, user: &mut User) -> Result<(), Error> {
        let res = timeout(
            DB_TIMEOUT,
            sqlx::query(
                r#"
                UPDATE users
                SET fullname = $1, email = $2, password = $3, updated_at = now()
                WHERE id = $4
                RETURNING updated_at
                "#,
            )
            .bind(&user.fullname)
            .bind(&user.email)
            .bind(user.password.hash())
            .bind(id)
            .fetch_one(&self.db),
        )
        .await
        .map_err(|_| timeout_err())?;

        let row = res.map_err(map_write_err)?;
        user.updated_at = row.try_get("updated_at")?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), Error> {
        let result = timeout(
            DB_TIMEOUT,
            sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id)
                .execute(&self.db),
        )
        .await
        .map_err(|_| timeout_err())??;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::InMemoryUsers;
    use super::*;

    fn user(fullname: &str, email: &str) -> User {
        let mut user = User::new(fullname, email);
        user.password.set("longpassword1").expect("hash");
        user
    }

    #[tokio::test]
    async fn insert_assigns_id_and_timestamps() {
        let repo = InMemoryUsers::default();
        let mut u = user("Jane Doe Smith", "jane@example.com");
        repo.insert(&mut u).await.expect("insert");
        assert!(u.id > 0);
    }

    #[tokio::test]
    async fn second_insert_with_same_email_is_duplicate() {
        let repo = InMemoryUsers::default();
        let mut first = user("Jane Doe Smith", "jane@example.com");
        repo.insert(&mut first).await.expect("insert");

        let mut second = user("John Doe Smith", "jane@example.com");
        let err = repo.insert(&mut second).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateEmail));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn delete_missing_user_is_not_found() {
        let repo = InMemoryUsers::default();
        let err = repo.delete(99).await.unwrap_err();
        assert!(matches!(err, Error::NotFound));
    }

    #[tokio::test]
    async fn delete_then_lookup_is_not_found() {
        let repo = InMemoryUsers::default();
        let mut u = user("Jane Doe Smith", "jane@example.com");
        repo.insert(&mut u).await.expect("insert");

        repo.delete(u.id).await.expect("delete");
        let err = repo.find_by_email("jane@example.com").await.unwrap_err();
        assert!(matches!(err, Error::NotFound));
    }

    #[tokio::test]
    async fn update_refreshes_fields() {
        let repo = InMemoryUsers::default();
        let mut u = user("Jane Doe Smith", "jane@example.com");
        repo.insert(&mut u).await.expect("insert");

        u.fullname = "Jane Doe Smith-Jones".into();
        u.password.set("newlongpassword1").expect("hash");
        repo.update(u.id, &mut u).await.expect("update");

        let found = repo.find_by_email("jane@example.com").await.expect("find");
        assert_eq!(found.fullname, "Jane Doe Smith-Jones");
        assert!(found.password.matches("newlongpassword1").unwrap());
    }
}
