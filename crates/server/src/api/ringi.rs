use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use hrdesk_core::domain::ringi::{Decision, FinalStatus, NewRingi, RingiDocument, RingiId};
use hrdesk_core::errors::DomainError;
use hrdesk_core::ringi::DecisionInput;

use super::{ApiError, AppState, RequestContext};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CancelBody {
    #[serde(default)]
    pub reason: String,
}

pub async fn list(
    State(state): State<AppState>,
    context: RequestContext,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<RingiDocument>>, ApiError> {
    let status = match query.status.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => Some(FinalStatus::parse(raw).ok_or_else(|| {
            context.fail(DomainError::Validation(format!("unknown ringi status `{raw}`")))
        })?),
        None => None,
    };

    let documents =
        state.ringi.list(&context.actor, status).await.map_err(|error| context.fail(error))?;
    Ok(Json(documents))
}

pub async fn create(
    State(state): State<AppState>,
    context: RequestContext,
    Json(input): Json<NewRingi>,
) -> Result<(StatusCode, Json<RingiDocument>), ApiError> {
    let document = state
        .ringi
        .create(input, &context.actor, &context.correlation_id)
        .await
        .map_err(|error| context.fail(error))?;
    Ok((StatusCode::CREATED, Json(document)))
}

/// Ringi whose active slot belongs to the caller.
pub async fn pending(
    State(state): State<AppState>,
    context: RequestContext,
) -> Result<Json<Vec<RingiDocument>>, ApiError> {
    let documents =
        state.ringi.pending_for(&context.actor).await.map_err(|error| context.fail(error))?;
    Ok(Json(documents))
}

pub async fn fetch(
    State(state): State<AppState>,
    context: RequestContext,
    Path(id): Path<String>,
) -> Result<Json<RingiDocument>, ApiError> {
    let document =
        state.ringi.get(&RingiId(id), &context.actor).await.map_err(|error| context.fail(error))?;
    Ok(Json(document))
}

pub async fn decide(
    State(state): State<AppState>,
    context: RequestContext,
    Path(id): Path<String>,
    Json(input): Json<DecisionInput>,
) -> Result<Json<RingiDocument>, ApiError> {
    let has_comment = input.comment.as_deref().is_some_and(|comment| !comment.trim().is_empty());
    if input.decision == Decision::Rejected && !has_comment {
        return Err(context.fail(DomainError::Validation(
            "a comment is required when rejecting a ringi".to_string(),
        )));
    }

    info!(
        event_name = "api.ringi.decision.received",
        correlation_id = %context.correlation_id,
        ringi_id = %id,
        approver_index = input.approver_index,
        decision = input.decision.as_str(),
        "ringi decision received"
    );
    let document = state
        .ringi
        .decide(&RingiId(id), &context.actor, input, &context.correlation_id)
        .await
        .map_err(|error| context.fail(error))?;
    Ok(Json(document))
}

pub async fn cancel(
    State(state): State<AppState>,
    context: RequestContext,
    Path(id): Path<String>,
    Json(body): Json<CancelBody>,
) -> Result<Json<RingiDocument>, ApiError> {
    let document = state
        .ringi
        .cancel(&RingiId(id), &context.actor, &body.reason, &context.correlation_id)
        .await
        .map_err(|error| context.fail(error))?;
    Ok(Json(document))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::api::test_support::{app, call, ADMIN, SATO, TANAKA};

    const KACHO: (&str, &str, &str) = ("kacho@example.co.jp", "Kacho", "employee");
    const BUCHO: (&str, &str, &str) = ("bucho@example.co.jp", "Bucho", "employee");

    fn submission() -> Value {
        json!({
            "title": "New laptops",
            "purpose": "Replace five-year-old machines",
            "details": "Five units",
            "amount": "750000",
            "urgency": "high",
            "approvers": [
                {"name": "Kacho", "email": KACHO.0, "position": "課長"},
                {"name": "Bucho", "email": BUCHO.0, "position": "部長"}
            ]
        })
    }

    async fn submit(app: &axum::Router) -> String {
        let (status, body) = call(app, "POST", "/api/v1/ringi", TANAKA, Some(submission())).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().expect("id").to_string()
    }

    #[tokio::test]
    async fn create_records_requester_and_opens_the_chain() {
        let app = app().await;
        let (status, body) = call(&app, "POST", "/api/v1/ringi", TANAKA, Some(submission())).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["finalStatus"], "pending");
        assert_eq!(body["currentApprover"], 0);
        assert_eq!(body["requester"]["email"], TANAKA.0);
        assert_eq!(body["category"], "経費申請");
        assert_eq!(body["approvalChain"][1]["status"], "pending");
    }

    #[tokio::test]
    async fn empty_chain_is_rejected() {
        let app = app().await;
        let mut payload = submission();
        payload["approvers"] = json!([]);
        let (status, body) = call(&app, "POST", "/api/v1/ringi", TANAKA, Some(payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "bad_request");
    }

    #[tokio::test]
    async fn blank_purpose_or_details_is_rejected() {
        let app = app().await;
        for field in ["purpose", "details"] {
            let mut payload = submission();
            payload[field] = json!("   ");
            let (status, body) = call(&app, "POST", "/api/v1/ringi", TANAKA, Some(payload)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "blank {field}");
            assert_eq!(body["error"]["kind"], "bad_request");
            assert!(body["error"]["message"].as_str().unwrap_or_default().contains(field));
        }

        let (_, listed) = call(&app, "GET", "/api/v1/ringi", ADMIN, None).await;
        assert_eq!(listed.as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn approvals_walk_the_chain_in_order() {
        let app = app().await;
        let id = submit(&app).await;
        let decision = format!("/api/v1/ringi/{id}/decision");

        let (status, _) = call(
            &app,
            "POST",
            &decision,
            BUCHO,
            Some(json!({"approverIndex": 1, "decision": "approved"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT, "second approver may not act first");

        let (status, pending) = call(&app, "GET", "/api/v1/ringi/pending", KACHO, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pending.as_array().map(Vec::len), Some(1));

        let (status, body) = call(
            &app,
            "POST",
            &decision,
            KACHO,
            Some(json!({"approverIndex": 0, "decision": "approved", "comment": "ok"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["currentApprover"], 1);
        assert_eq!(body["approvalChain"][0]["hanko"]["kind"], "digital");

        let (_, body) = call(
            &app,
            "POST",
            &decision,
            BUCHO,
            Some(json!({"approverIndex": 1, "decision": "approved"})),
        )
        .await;
        assert_eq!(body["finalStatus"], "approved");

        let (_, approved) = call(&app, "GET", "/api/v1/ringi?status=approved", TANAKA, None).await;
        assert_eq!(approved.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn rejection_needs_a_comment_and_closes_the_ringi() {
        let app = app().await;
        let id = submit(&app).await;
        let decision = format!("/api/v1/ringi/{id}/decision");

        let (status, _) = call(
            &app,
            "POST",
            &decision,
            KACHO,
            Some(json!({"approverIndex": 0, "decision": "rejected", "comment": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &app,
            "POST",
            &decision,
            KACHO,
            Some(json!({"approverIndex": 0, "decision": "rejected", "comment": "over budget"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["finalStatus"], "rejected");

        let cancel = format!("/api/v1/ringi/{id}/cancel");
        let (status, body) =
            call(&app, "POST", &cancel, TANAKA, Some(json!({"reason": "late"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["kind"], "conflict");
    }

    #[tokio::test]
    async fn wrong_identity_is_forbidden_and_outsiders_cannot_read() {
        let app = app().await;
        let id = submit(&app).await;

        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/v1/ringi/{id}/decision"),
            SATO,
            Some(json!({"approverIndex": 0, "decision": "approved"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(&app, "GET", &format!("/api/v1/ringi/{id}"), SATO, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(&app, "GET", &format!("/api/v1/ringi/{id}"), ADMIN, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], id.as_str());
    }

    #[tokio::test]
    async fn only_the_requester_cancels_and_a_reason_is_required() {
        let app = app().await;
        let id = submit(&app).await;
        let cancel = format!("/api/v1/ringi/{id}/cancel");

        let (status, _) = call(&app, "POST", &cancel, KACHO, Some(json!({"reason": "no"}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(&app, "POST", &cancel, TANAKA, Some(json!({"reason": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) =
            call(&app, "POST", &cancel, TANAKA, Some(json!({"reason": "budget frozen"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["finalStatus"], "cancelled");
        assert_eq!(body["cancellation"]["reason"], "budget frozen");
    }

    #[tokio::test]
    async fn listing_scopes_and_validates_status() {
        let app = app().await;
        submit(&app).await;

        let (_, own) = call(&app, "GET", "/api/v1/ringi", TANAKA, None).await;
        assert_eq!(own.as_array().map(Vec::len), Some(1));
        let (_, others) = call(&app, "GET", "/api/v1/ringi", SATO, None).await;
        assert_eq!(others.as_array().map(Vec::len), Some(0));
        let (_, everything) = call(&app, "GET", "/api/v1/ringi?status=pending", ADMIN, None).await;
        assert_eq!(everything.as_array().map(Vec::len), Some(1));

        let (status, _) = call(&app, "GET", "/api/v1/ringi?status=lost", ADMIN, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_ringi_is_not_found() {
        let app = app().await;
        let (status, body) = call(&app, "GET", "/api/v1/ringi/RNG-missing", ADMIN, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"]["correlationId"].as_str().is_some_and(|id| !id.is_empty()));
    }
}
