use anyhow::Context;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Household {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Membership {
    pub id: Uuid,
    pub user_id: String,
    pub household_id: Uuid,
}

#[derive(Debug, Clone, FromRow)]
pub struct MemberRow {
    pub membership_id: Uuid,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct HouseholdWithCount {
    pub id: Uuid,
    pub name: String,
    pub member_count: i64,
}

pub async fn find_membership(db: &PgPool, user_id: &str) -> anyhow::Result<Option<Membership>> {
    let row = sqlx::query_as::<_, Membership>(
        r#"
        SELECT id, user_id, household_id
        FROM household_member
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("find membership")?;
    Ok(row)
}

pub async fn find_household(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Household>> {
    let row = sqlx::query_as::<_, Household>(
        r#"
        SELECT id, name
        FROM household
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
    .context("find household")?;
    Ok(row)
}

pub async fn my_household(db: &PgPool, user_id: &str) -> anyhow::Result<Option<Household>> {
    let row = sqlx::query_as::<_, Household>(
        r#"
        SELECT h.id, h.name
        FROM household_member m
        JOIN household h ON h.id = m.household_id
        WHERE m.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("my household")?;
    Ok(row)
}

/// Members of a household joined against the identity-provider user records.
/// Name and email default to empty strings when the user record has not been
/// mirrored yet, matching what callers render for unknown users.
pub async fn list_members(db: &PgPool, household_id: Uuid) -> anyhow::Result<Vec<MemberRow>> {
    let rows = sqlx::query_as::<_, MemberRow>(
        r#"
        SELECT m.id AS membership_id,
               m.user_id,
               COALESCE(u.name, '') AS name,
               COALESCE(u.email, '') AS email,
               u.image
        FROM household_member m
        LEFT JOIN users u ON u.id = m.user_id
        WHERE m.household_id = $1
        "#,
    )
    .bind(household_id)
    .fetch_all(db)
    .await
    .context("list members")?;
    Ok(rows)
}

pub async fn list_with_counts(db: &PgPool) -> anyhow::Result<Vec<HouseholdWithCount>> {
    let rows = sqlx::query_as::<_, HouseholdWithCount>(
        r#"
        SELECT h.id, h.name, COUNT(m.id) AS member_count
        FROM household h
        LEFT JOIN household_member m ON m.household_id = h.id
        GROUP BY h.id
        ORDER BY h.created_at ASC
        "#,
    )
    .fetch_all(db)
    .await
    .context("list households")?;
    Ok(rows)
}

/// Inserts the household and the creator's membership in one transaction.
/// Returns the raw sqlx error so callers can map a unique violation on
/// `household_member.user_id` to a conflict.
pub async fn create_with_member(
    db: &PgPool,
    name: &str,
    user_id: &str,
) -> Result<Uuid, sqlx::Error> {
    let mut tx = db.begin().await?;

    let (household_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO household (name)
        VALUES ($1)
        RETURNING id
        "#,
    )
    .bind(name)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO household_member (user_id, household_id)
        VALUES ($1, $2)
        "#,
    )
    .bind(user_id)
    .bind(household_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(household_id)
}

pub async fn insert_member(
    db: &PgPool,
    user_id: &str,
    household_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO household_member (user_id, household_id)
        VALUES ($1, $2)
        "#,
    )
    .bind(user_id)
    .bind(household_id)
    .execute(db)
    .await?;
    Ok(())
}

/// Deletes the membership, then the household itself if no members remain.
/// The delete/count/maybe-delete sequence runs in one transaction so no
/// reader observes a household with zero members. Returns whether the
/// household was cascade-deleted.
pub async fn remove_member_cascade(
    db: &PgPool,
    membership_id: Uuid,
    household_id: Uuid,
) -> anyhow::Result<bool> {
    let mut tx = db.begin().await.context("begin tx")?;

    sqlx::query("DELETE FROM household_member WHERE id = $1")
        .bind(membership_id)
        .execute(&mut *tx)
        .await
        .context("delete membership")?;

    let (remaining,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM household_member WHERE household_id = $1")
            .bind(household_id)
            .fetch_one(&mut *tx)
            .await
            .context("count remaining members")?;

    let household_deleted = remaining == 0;
    if household_deleted {
        sqlx::query("DELETE FROM household WHERE id = $1")
            .bind(household_id)
            .execute(&mut *tx)
            .await
            .context("delete empty household")?;
    }

    tx.commit().await.context("commit tx")?;
    Ok(household_deleted)
}

pub async fn rename(db: &PgPool, household_id: Uuid, name: &str) -> anyhow::Result<()> {
    sqlx::query("UPDATE household SET name = $2 WHERE id = $1")
        .bind(household_id)
        .bind(name)
        .execute(db)
        .await
        .context("rename household")?;
    Ok(())
}
