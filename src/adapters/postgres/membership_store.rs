//! PostgreSQL implementation of MembershipStore.
//!
//! Provides persistent storage for Membership and PromoGrant records using
//! PostgreSQL. All compound writes run in a single transaction, and every
//! conditional update is guarded by the membership `version` column.

use crate::domain::foundation::{
    DomainError, ErrorCode, GrantId, MemberNumber, MembershipId, OwnerId, PlanId, Timestamp,
};
use crate::domain::grant::{GrantReason, PromoGrant};
use crate::domain::membership::Membership;
use crate::ports::MembershipStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// PostgreSQL implementation of the MembershipStore port.
///
/// Uses sqlx for type-safe database operations with connection pooling.
pub struct PostgresMembershipStore {
    pool: PgPool,
}

impl PostgresMembershipStore {
    /// Creates a new PostgresMembershipStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a membership.
#[derive(Debug, sqlx::FromRow)]
struct MembershipRow {
    id: Uuid,
    owner_id: String,
    member_number: String,
    plan_id: String,
    max_pets: i32,
    is_active: bool,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = DomainError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        Ok(Membership {
            id: MembershipId::from_uuid(row.id),
            owner_id: OwnerId::new(row.owner_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid owner_id: {}", e))
            })?,
            member_number: MemberNumber::parse(&row.member_number).map_err(|e| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid member_number: {}", e),
                )
            })?,
            plan_id: PlanId::new(row.plan_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid plan_id: {}", e))
            })?,
            max_pets: u32::try_from(row.max_pets).map_err(|_| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid max_pets value: {}", row.max_pets),
                )
            })?,
            is_active: row.is_active,
            expires_at: Timestamp::from_datetime(row.expires_at),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
            version: row.version,
        })
    }
}

/// Database row representation of a promo grant.
#[derive(Debug, sqlx::FromRow)]
struct PromoGrantRow {
    id: Uuid,
    owner_id: String,
    membership_id: Uuid,
    reason: String,
    granted_by: String,
    expires_at: DateTime<Utc>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PromoGrantRow> for PromoGrant {
    type Error = DomainError;

    fn try_from(row: PromoGrantRow) -> Result<Self, Self::Error> {
        Ok(PromoGrant {
            id: GrantId::from_uuid(row.id),
            owner_id: OwnerId::new(row.owner_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid owner_id: {}", e))
            })?,
            membership_id: MembershipId::from_uuid(row.membership_id),
            reason: GrantReason::parse(&row.reason).ok_or_else(|| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid grant reason: {}", row.reason),
                )
            })?,
            granted_by: row.granted_by,
            expires_at: Timestamp::from_datetime(row.expires_at),
            notes: row.notes,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn map_sqlx_error(context: &str, e: sqlx::Error) -> DomainError {
    match &e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            DomainError::new(
                ErrorCode::StoreUnavailable,
                format!("{}: storage unavailable: {}", context, e),
            )
        }
        sqlx::Error::Database(db_err) if db_err.constraint() == Some("memberships_owner_id_key") => {
            DomainError::new(ErrorCode::MembershipExists, "Owner already has a membership")
        }
        sqlx::Error::Database(db_err)
            if db_err.constraint() == Some("memberships_member_number_key") =>
        {
            DomainError::new(
                ErrorCode::DatabaseError,
                "Member number collision on insert",
            )
        }
        _ => DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e)),
    }
}

const MEMBERSHIP_COLUMNS: &str = "id, owner_id, member_number, plan_id, max_pets, is_active, \
     expires_at, created_at, updated_at, version";

const GRANT_COLUMNS: &str =
    "id, owner_id, membership_id, reason, granted_by, expires_at, notes, created_at";

impl PostgresMembershipStore {
    /// Conditionally updates the membership row inside `tx`.
    ///
    /// The version predicate makes the update a compare-and-swap; the pet
    /// count runs after the row is locked by the update, so a concurrent pet
    /// registration cannot slip past a shrinking ceiling.
    async fn update_guarded(
        tx: &mut Transaction<'_, Postgres>,
        membership: &Membership,
        expected_version: i64,
        pet_ceiling: Option<u32>,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE memberships SET
                plan_id = $3,
                max_pets = $4,
                is_active = $5,
                expires_at = $6,
                updated_at = $7,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(membership.id.as_uuid())
        .bind(expected_version)
        .bind(membership.plan_id.as_str())
        .bind(i32::try_from(membership.max_pets).unwrap_or(i32::MAX))
        .bind(membership.is_active)
        .bind(membership.expires_at.as_datetime())
        .bind(membership.updated_at.as_datetime())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to update membership", e))?;

        if result.rows_affected() == 0 {
            let exists: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM memberships WHERE id = $1")
                    .bind(membership.id.as_uuid())
                    .fetch_optional(&mut **tx)
                    .await
                    .map_err(|e| map_sqlx_error("Failed to check membership", e))?;
            return Err(match exists {
                Some(_) => DomainError::new(
                    ErrorCode::WriteConflict,
                    "Membership was modified concurrently",
                ),
                None => DomainError::new(ErrorCode::MembershipNotFound, "Membership not found"),
            });
        }

        if let Some(ceiling) = pet_ceiling {
            let (count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM pets WHERE membership_id = $1")
                    .bind(membership.id.as_uuid())
                    .fetch_one(&mut **tx)
                    .await
                    .map_err(|e| map_sqlx_error("Failed to count pets", e))?;
            let count = u32::try_from(count).unwrap_or(u32::MAX);
            if count > ceiling {
                return Err(DomainError::new(
                    ErrorCode::QuotaExceeded,
                    format!("{} pets exceed the quota of {}", count, ceiling),
                )
                .with_detail("excess", (count - ceiling).to_string())
                .with_detail("max_pets", ceiling.to_string()));
            }
        }

        Ok(())
    }

    /// Inserts or replaces the grant linked to `grant.membership_id`.
    async fn upsert_grant(
        tx: &mut Transaction<'_, Postgres>,
        grant: &PromoGrant,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO promo_grants (
                id, owner_id, membership_id, reason, granted_by, expires_at, notes, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (membership_id) DO UPDATE SET
                id = EXCLUDED.id,
                reason = EXCLUDED.reason,
                granted_by = EXCLUDED.granted_by,
                expires_at = EXCLUDED.expires_at,
                notes = EXCLUDED.notes,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(grant.id.as_uuid())
        .bind(grant.owner_id.as_str())
        .bind(grant.membership_id.as_uuid())
        .bind(grant.reason.as_str())
        .bind(&grant.granted_by)
        .bind(grant.expires_at.as_datetime())
        .bind(&grant.notes)
        .bind(grant.created_at.as_datetime())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to upsert promo grant", e))?;

        Ok(())
    }

    async fn insert_membership_row(
        tx: &mut Transaction<'_, Postgres>,
        membership: &Membership,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO memberships (
                id, owner_id, member_number, plan_id, max_pets, is_active,
                expires_at, created_at, updated_at, version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(membership.id.as_uuid())
        .bind(membership.owner_id.as_str())
        .bind(membership.member_number.as_str())
        .bind(membership.plan_id.as_str())
        .bind(i32::try_from(membership.max_pets).unwrap_or(i32::MAX))
        .bind(membership.is_active)
        .bind(membership.expires_at.as_datetime())
        .bind(membership.created_at.as_datetime())
        .bind(membership.updated_at.as_datetime())
        .bind(membership.version)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to insert membership", e))?;

        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'_, Postgres>, DomainError> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("Failed to begin transaction", e))
    }
}

async fn commit(tx: Transaction<'_, Postgres>) -> Result<(), DomainError> {
    tx.commit()
        .await
        .map_err(|e| map_sqlx_error("Failed to commit transaction", e))
}

#[async_trait]
impl MembershipStore for PostgresMembershipStore {
    async fn find_membership(
        &self,
        id: &MembershipId,
    ) -> Result<Option<Membership>, DomainError> {
        let row: Option<MembershipRow> = sqlx::query_as(&format!(
            "SELECT {} FROM memberships WHERE id = $1",
            MEMBERSHIP_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to find membership", e))?;

        row.map(Membership::try_from).transpose()
    }

    async fn find_membership_by_owner(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Option<Membership>, DomainError> {
        let row: Option<MembershipRow> = sqlx::query_as(&format!(
            "SELECT {} FROM memberships WHERE owner_id = $1",
            MEMBERSHIP_COLUMNS
        ))
        .bind(owner_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to find membership by owner", e))?;

        row.map(Membership::try_from).transpose()
    }

    async fn pet_count(&self, id: &MembershipId) -> Result<u32, DomainError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM pets WHERE membership_id = $1")
                .bind(id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("Failed to count pets", e))?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn next_member_sequence(&self, year: i32) -> Result<u32, DomainError> {
        let (sequence,): (i32,) = sqlx::query_as(
            r#"
            INSERT INTO member_number_counters (year, last_sequence)
            VALUES ($1, 1)
            ON CONFLICT (year) DO UPDATE SET
                last_sequence = member_number_counters.last_sequence + 1
            RETURNING last_sequence
            "#,
        )
        .bind(year)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to reserve member sequence", e))?;

        u32::try_from(sequence).map_err(|_| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid member sequence: {}", sequence),
            )
        })
    }

    async fn insert_membership(&self, membership: &Membership) -> Result<(), DomainError> {
        let mut tx = self.begin().await?;
        Self::insert_membership_row(&mut tx, membership).await?;
        commit(tx).await
    }

    async fn update_membership(
        &self,
        membership: &Membership,
        expected_version: i64,
        pet_ceiling: Option<u32>,
    ) -> Result<(), DomainError> {
        let mut tx = self.begin().await?;
        Self::update_guarded(&mut tx, membership, expected_version, pet_ceiling).await?;
        commit(tx).await
    }

    async fn find_grant(&self, id: &GrantId) -> Result<Option<PromoGrant>, DomainError> {
        let row: Option<PromoGrantRow> = sqlx::query_as(&format!(
            "SELECT {} FROM promo_grants WHERE id = $1",
            GRANT_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to find promo grant", e))?;

        row.map(PromoGrant::try_from).transpose()
    }

    async fn find_grant_by_membership(
        &self,
        membership_id: &MembershipId,
    ) -> Result<Option<PromoGrant>, DomainError> {
        let row: Option<PromoGrantRow> = sqlx::query_as(&format!(
            "SELECT {} FROM promo_grants WHERE membership_id = $1",
            GRANT_COLUMNS
        ))
        .bind(membership_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to find promo grant by membership", e))?;

        row.map(PromoGrant::try_from).transpose()
    }

    async fn insert_membership_with_grant(
        &self,
        membership: &Membership,
        grant: &PromoGrant,
    ) -> Result<(), DomainError> {
        let mut tx = self.begin().await?;
        Self::insert_membership_row(&mut tx, membership).await?;
        Self::upsert_grant(&mut tx, grant).await?;
        commit(tx).await
    }

    async fn update_membership_with_grant(
        &self,
        membership: &Membership,
        expected_version: i64,
        pet_ceiling: Option<u32>,
        grant: &PromoGrant,
    ) -> Result<(), DomainError> {
        let mut tx = self.begin().await?;
        Self::update_guarded(&mut tx, membership, expected_version, pet_ceiling).await?;
        Self::upsert_grant(&mut tx, grant).await?;
        commit(tx).await
    }

    async fn revoke_grant(
        &self,
        membership: &Membership,
        expected_version: i64,
        grant_id: &GrantId,
    ) -> Result<(), DomainError> {
        let mut tx = self.begin().await?;
        Self::update_guarded(&mut tx, membership, expected_version, None).await?;

        let result = sqlx::query("DELETE FROM promo_grants WHERE id = $1")
            .bind(grant_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("Failed to delete promo grant", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::GrantNotFound,
                "Promo grant not found",
            ));
        }

        commit(tx).await
    }
}
