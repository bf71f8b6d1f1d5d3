use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Sqlite};

use hrdesk_core::domain::ringi::{
    ApproverEntry, Cancellation, FinalStatus, Requester, RingiDocument, RingiId, Urgency,
};
use hrdesk_core::ringi::{projections, RequestScope, StatusCounts};

use super::{
    column, decode_date, decode_enum, decode_timestamp, email_key, encode_date, encode_timestamp,
    RepositoryError, RingiRepository,
};
use crate::DbPool;

const ENTITY: &str = "ringi";

const RINGI_COLUMNS: &str = "id, title, category, purpose, details, amount, requester_name,
    requester_email, request_date, approval_chain_json, current_approver, final_status, urgency,
    cancellation_reason, cancelled_at, revision, created_at, updated_at";

pub struct SqlRingiRepository {
    pool: DbPool,
}

impl SqlRingiRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: &RingiId) -> Result<bool, RepositoryError> {
        let exists: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM ringi WHERE id = ?)")
            .bind(&id.0)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists == 1)
    }
}

fn row_to_ringi(row: &sqlx::sqlite::SqliteRow) -> Result<RingiDocument, RepositoryError> {
    let chain_json: String = column(row, "approval_chain_json")?;
    let approval_chain: Vec<ApproverEntry> = serde_json::from_str(&chain_json)
        .map_err(|e| RepositoryError::Decode(format!("approval chain: {e}")))?;
    let amount = column::<Option<String>>(row, "amount")?
        .map(|raw| {
            Decimal::from_str(&raw)
                .map_err(|e| RepositoryError::Decode(format!("invalid amount `{raw}`: {e}")))
        })
        .transpose()?;
    let current_approver: i64 = column(row, "current_approver")?;
    let current_approver = usize::try_from(current_approver)
        .map_err(|_| RepositoryError::Decode(format!("negative approver index {current_approver}")))?;
    let final_status: String = column(row, "final_status")?;
    let urgency: String = column(row, "urgency")?;
    let cancellation_reason: Option<String> = column(row, "cancellation_reason")?;
    let cancelled_at: Option<String> = column(row, "cancelled_at")?;
    let cancellation = match (cancellation_reason, cancelled_at) {
        (Some(reason), Some(at)) => Some(Cancellation { reason, cancelled_at: decode_timestamp(&at)? }),
        _ => None,
    };

    Ok(RingiDocument {
        id: RingiId(column(row, "id")?),
        title: column(row, "title")?,
        category: column(row, "category")?,
        purpose: column(row, "purpose")?,
        details: column(row, "details")?,
        amount,
        requester: Requester {
            name: column(row, "requester_name")?,
            email: column(row, "requester_email")?,
        },
        request_date: decode_date(&column::<String>(row, "request_date")?)?,
        approval_chain,
        current_approver,
        final_status: decode_enum("final_status", &final_status, FinalStatus::parse)?,
        urgency: decode_enum("urgency", &urgency, Urgency::parse)?,
        cancellation,
        revision: column(row, "revision")?,
        created_at: decode_timestamp(&column::<String>(row, "created_at")?)?,
        updated_at: decode_timestamp(&column::<String>(row, "updated_at")?)?,
    })
}

fn encode_chain(document: &RingiDocument) -> Result<String, RepositoryError> {
    serde_json::to_string(&document.approval_chain)
        .map_err(|e| RepositoryError::Decode(format!("approval chain: {e}")))
}

fn active_approver_key(document: &RingiDocument) -> Option<String> {
    document.active_approver_email().map(email_key)
}

#[async_trait::async_trait]
impl RingiRepository for SqlRingiRepository {
    async fn find_by_id(&self, id: &RingiId) -> Result<Option<RingiDocument>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {RINGI_COLUMNS} FROM ringi WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_ringi(r)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, document: &RingiDocument) -> Result<(), RepositoryError> {
        let chain_json = encode_chain(document)?;
        let current_approver = i64::try_from(document.current_approver)
            .map_err(|_| RepositoryError::Decode("approver index overflow".to_string()))?;

        sqlx::query(
            "INSERT INTO ringi (id, title, category, purpose, details, amount, requester_name,
                                requester_email, request_date, approval_chain_json,
                                current_approver, current_approver_email, final_status, urgency,
                                cancellation_reason, cancelled_at, revision, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&document.id.0)
        .bind(&document.title)
        .bind(&document.category)
        .bind(&document.purpose)
        .bind(&document.details)
        .bind(document.amount.map(|amount| amount.to_string()))
        .bind(&document.requester.name)
        .bind(&document.requester.email)
        .bind(encode_date(&document.request_date))
        .bind(chain_json)
        .bind(current_approver)
        .bind(active_approver_key(document))
        .bind(document.final_status.as_str())
        .bind(document.urgency.as_str())
        .bind(document.cancellation.as_ref().map(|c| c.reason.clone()))
        .bind(document.cancellation.as_ref().map(|c| encode_timestamp(&c.cancelled_at)))
        .bind(document.revision)
        .bind(encode_timestamp(&document.created_at))
        .bind(encode_timestamp(&document.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn compare_and_swap(
        &self,
        expected_revision: i64,
        document: &RingiDocument,
    ) -> Result<(), RepositoryError> {
        let chain_json = encode_chain(document)?;
        let current_approver = i64::try_from(document.current_approver)
            .map_err(|_| RepositoryError::Decode("approver index overflow".to_string()))?;

        let result = sqlx::query(
            "UPDATE ringi SET
                 approval_chain_json = ?,
                 current_approver = ?,
                 current_approver_email = ?,
                 final_status = ?,
                 cancellation_reason = ?,
                 cancelled_at = ?,
                 revision = ?,
                 updated_at = ?
             WHERE id = ? AND revision = ? AND final_status = 'pending'",
        )
        .bind(chain_json)
        .bind(current_approver)
        .bind(active_approver_key(document))
        .bind(document.final_status.as_str())
        .bind(document.cancellation.as_ref().map(|c| c.reason.clone()))
        .bind(document.cancellation.as_ref().map(|c| encode_timestamp(&c.cancelled_at)))
        .bind(document.revision)
        .bind(encode_timestamp(&document.updated_at))
        .bind(&document.id.0)
        .bind(expected_revision)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }
        if self.exists(&document.id).await? {
            Err(RepositoryError::Conflict { entity: ENTITY, id: document.id.0.clone() })
        } else {
            Err(RepositoryError::NotFound { entity: ENTITY, id: document.id.0.clone() })
        }
    }

    async fn list(
        &self,
        scope: &RequestScope,
        status: Option<FinalStatus>,
    ) -> Result<Vec<RingiDocument>, RepositoryError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {RINGI_COLUMNS} FROM ringi WHERE 1 = 1"));
        if let RequestScope::Own(email) = scope {
            query.push(" AND lower(requester_email) = ").push_bind(email_key(email));
        }
        if let Some(status) = status {
            query.push(" AND final_status = ").push_bind(status.as_str());
        }
        query.push(" ORDER BY created_at DESC, id DESC");

        let rows = query.build().fetch_all(&self.pool).await?;
        let documents = rows.iter().map(row_to_ringi).collect::<Result<Vec<_>, _>>()?;
        Ok(projections::filter_by_status(documents, status, scope))
    }

    async fn pending_for_approver(
        &self,
        email: &str,
    ) -> Result<Vec<RingiDocument>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {RINGI_COLUMNS} FROM ringi
             WHERE final_status = 'pending' AND current_approver_email = ?"
        ))
        .bind(email_key(email))
        .fetch_all(&self.pool)
        .await?;

        let candidates = rows.iter().map(row_to_ringi).collect::<Result<Vec<_>, _>>()?;
        Ok(projections::pending_for_approver(candidates, email))
    }

    async fn count_by_status(&self, scope: &RequestScope) -> Result<StatusCounts, RepositoryError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT final_status, COUNT(*) AS count FROM ringi");
        if let RequestScope::Own(email) = scope {
            query.push(" WHERE lower(requester_email) = ").push_bind(email_key(email));
        }
        query.push(" GROUP BY final_status");

        let rows = query.build().fetch_all(&self.pool).await?;
        let mut counts = StatusCounts::default();
        for row in &rows {
            let status: String = column(row, "final_status")?;
            let count: i64 = column(row, "count")?;
            counts.record(
                decode_enum("final_status", &status, FinalStatus::parse)?,
                usize::try_from(count).unwrap_or_default(),
            );
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use hrdesk_core::domain::identity::{Actor, Role};
    use hrdesk_core::domain::ringi::{Decision, FinalStatus, NewApprover, NewRingi, RingiDocument};
    use hrdesk_core::ringi::{DecisionInput, RequestScope, RingiWorkflow};

    use super::SqlRingiRepository;
    use crate::repositories::test_support::setup;
    use crate::repositories::{RepositoryError, RingiRepository};

    fn tanaka() -> Actor {
        Actor::new("tanaka@example.co.jp", "Tanaka", Role::Employee)
    }

    fn submit(requester: &Actor, title: &str, minutes: i64) -> RingiDocument {
        RingiWorkflow::new()
            .create(
                NewRingi {
                    title: title.to_string(),
                    purpose: "Team offsite".to_string(),
                    details: "Venue and travel".to_string(),
                    amount: Some(Decimal::new(35_000_050, 2)),
                    approvers: vec![
                        NewApprover {
                            name: "Kacho".to_string(),
                            email: "Kacho@Example.co.jp".to_string(),
                            position: "課長".to_string(),
                        },
                        NewApprover {
                            name: "Bucho".to_string(),
                            email: "bucho@example.co.jp".to_string(),
                            position: "部長".to_string(),
                        },
                    ],
                    ..NewRingi::default()
                },
                requester,
                Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).single().expect("time")
                    + Duration::minutes(minutes),
            )
            .expect("create")
    }

    fn approve(document: &RingiDocument, index: usize) -> RingiDocument {
        let email = document.approval_chain[index].email.clone();
        RingiWorkflow::new()
            .decide(
                document,
                &Actor::new(email, "approver", Role::Employee),
                DecisionInput { approver_index: index, decision: Decision::Approved, comment: None, hanko: None },
                document.updated_at + Duration::minutes(1),
            )
            .expect("approve")
            .document
    }

    #[tokio::test]
    async fn insert_and_find_preserve_the_document() {
        let repo = SqlRingiRepository::new(setup().await);
        let document = submit(&tanaka(), "Offsite", 0);

        repo.insert(&document).await.expect("insert");
        let found = repo.find_by_id(&document.id).await.expect("find").expect("exists");

        assert_eq!(found, document);
    }

    #[tokio::test]
    async fn compare_and_swap_rejects_a_stale_revision() {
        let repo = SqlRingiRepository::new(setup().await);
        let document = submit(&tanaka(), "Offsite", 0);
        repo.insert(&document).await.expect("insert");

        let advanced = approve(&document, 0);
        repo.compare_and_swap(document.revision, &advanced).await.expect("first write wins");

        let stale = approve(&document, 0);
        let error = repo.compare_and_swap(document.revision, &stale).await.expect_err("stale");
        assert!(matches!(error, RepositoryError::Conflict { .. }));

        let stored = repo.find_by_id(&document.id).await.expect("find").expect("exists");
        assert_eq!(stored.revision, 1);
        assert_eq!(stored.current_approver, 1);
    }

    #[tokio::test]
    async fn racing_writers_from_one_read_yield_exactly_one_success() {
        let repo = SqlRingiRepository::new(setup().await);
        let document = submit(&tanaka(), "Offsite", 0);
        repo.insert(&document).await.expect("insert");

        let approved = approve(&document, 0);
        let cancelled = RingiWorkflow::new()
            .cancel(&document, &tanaka(), "plans changed", document.updated_at)
            .expect("cancel")
            .document;

        let (left, right) = tokio::join!(
            repo.compare_and_swap(document.revision, &approved),
            repo.compare_and_swap(document.revision, &cancelled),
        );

        assert_eq!([left.is_ok(), right.is_ok()].iter().filter(|ok| **ok).count(), 1);
        let stored = repo.find_by_id(&document.id).await.expect("find").expect("exists");
        assert_eq!(stored.revision, 1);
    }

    #[tokio::test]
    async fn closed_documents_cannot_be_swapped() {
        let repo = SqlRingiRepository::new(setup().await);
        let document = submit(&tanaka(), "Offsite", 0);
        repo.insert(&document).await.expect("insert");
        let first = approve(&document, 0);
        repo.compare_and_swap(0, &first).await.expect("first");
        let done = approve(&first, 1);
        repo.compare_and_swap(1, &done).await.expect("second");
        assert_eq!(done.final_status, FinalStatus::Approved);

        let mut tampered = done.clone();
        tampered.revision = 3;
        let error = repo.compare_and_swap(2, &tampered).await.expect_err("closed");
        assert!(matches!(error, RepositoryError::Conflict { .. }));
    }

    #[tokio::test]
    async fn missing_document_swap_reports_not_found() {
        let repo = SqlRingiRepository::new(setup().await);
        let document = submit(&tanaka(), "Ghost", 0);

        let error = repo.compare_and_swap(0, &document).await.expect_err("missing");
        assert!(matches!(error, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn pending_lookup_follows_the_current_approver() {
        let repo = SqlRingiRepository::new(setup().await);
        let first = submit(&tanaka(), "first", 0);
        let second = submit(&tanaka(), "second", 5);
        repo.insert(&first).await.expect("insert");
        repo.insert(&second).await.expect("insert");

        let for_kacho = repo.pending_for_approver("kacho@example.co.jp").await.expect("kacho");
        assert_eq!(for_kacho.len(), 2);
        assert_eq!(for_kacho[0].title, "second");

        repo.compare_and_swap(0, &approve(&first, 0)).await.expect("advance");

        let for_kacho = repo.pending_for_approver("KACHO@example.co.jp").await.expect("kacho");
        let for_bucho = repo.pending_for_approver("bucho@example.co.jp").await.expect("bucho");
        assert_eq!(for_kacho.iter().map(|d| d.title.as_str()).collect::<Vec<_>>(), vec!["second"]);
        assert_eq!(for_bucho.iter().map(|d| d.title.as_str()).collect::<Vec<_>>(), vec!["first"]);
    }

    #[tokio::test]
    async fn listing_and_counts_respect_scope_and_status() {
        let repo = SqlRingiRepository::new(setup().await);
        let sato = Actor::new("sato@example.co.jp", "Sato", Role::Employee);
        let mine = submit(&tanaka(), "mine", 0);
        let theirs = submit(&sato, "theirs", 1);
        repo.insert(&mine).await.expect("insert");
        repo.insert(&theirs).await.expect("insert");
        let cancelled = RingiWorkflow::new()
            .cancel(&theirs, &sato, "duplicate", theirs.updated_at)
            .expect("cancel")
            .document;
        repo.compare_and_swap(0, &cancelled).await.expect("cancel write");

        let own = repo.list(&RequestScope::Own("TANAKA@example.co.jp".to_string()), None).await.expect("own");
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].title, "mine");

        let everything = repo.list(&RequestScope::All, None).await.expect("all");
        assert_eq!(everything.iter().map(|d| d.title.as_str()).collect::<Vec<_>>(), vec!["theirs", "mine"]);

        let cancelled_only =
            repo.list(&RequestScope::All, Some(FinalStatus::Cancelled)).await.expect("cancelled");
        assert_eq!(cancelled_only.len(), 1);
        assert_eq!(
            cancelled_only[0].cancellation.as_ref().map(|c| c.reason.as_str()),
            Some("duplicate")
        );

        let counts = repo.count_by_status(&RequestScope::All).await.expect("counts");
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.cancelled, 1);
        let own_counts = repo
            .count_by_status(&RequestScope::Own("sato@example.co.jp".to_string()))
            .await
            .expect("own counts");
        assert_eq!(own_counts.total(), 1);
        assert_eq!(own_counts.pending, 0);
    }
}
