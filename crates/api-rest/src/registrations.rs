//! Registration wizard sessions.
//!
//! Each session owns one [`RegistrationWizard`]. Setter endpoints are all-or-nothing: the
//! update is applied to a copy and only kept if every part of the request is accepted.
//! Navigation endpoints act on the session directly, so a blocked `next` still records its
//! field errors for the following `GET`.
//!
//! Every request marks its session as used. Opening a session drops the ones left idle for
//! longer than the configured timeout.

use crate::error::{error_response, from_intake, session_not_found, ApiResult};
use crate::views::{registration_summary, session_res};
use crate::{AppState, Session};
use api_shared::{
    EnrollmentReq, GotoReq, ListRegistrationsRes, PaymentReq, ScansReq, SessionRes, SubmitRes,
};
use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDate, NaiveTime};
use scanreg_core::{
    AgeUnit, EnrollmentDetails, Gender, IntakeError, IntakeResult, RegistrationWizard, ScanId,
    WizardStep,
};
use scanreg_ids::RecordId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};

impl AppState {
    /// Locks the session and marks it as used.
    async fn session(&self, id: &str) -> ApiResult<(RecordId, OwnedMutexGuard<Session>)> {
        let session_id = RecordId::parse(id).map_err(|_| session_not_found())?;
        let session = self
            .sessions
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or_else(session_not_found)?;
        let mut slot = session.lock_owned().await;
        slot.touch();
        Ok((session_id, slot))
    }
}

/// Sessions busy with a request are kept regardless of age.
fn evict_idle(sessions: &mut HashMap<RecordId, Arc<Mutex<Session>>>, timeout: Duration) {
    let now = Instant::now();
    sessions.retain(|session_id, session| match session.try_lock() {
        Ok(slot) if slot.is_idle(now, timeout) => {
            tracing::info!("evicted idle registration session {}", session_id);
            false
        }
        _ => true,
    });
}

async fn update_session<F>(state: &AppState, id: &str, apply: F) -> ApiResult<Json<SessionRes>>
where
    F: FnOnce(&mut RegistrationWizard) -> IntakeResult<()>,
{
    let (session_id, mut slot) = state.session(id).await?;
    let mut updated = slot.wizard.clone();
    apply(&mut updated).map_err(|e| from_intake("Update registration error", e))?;
    slot.wizard = updated;
    Ok(Json(session_res(session_id, &slot.wizard)))
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn enrollment_details(req: EnrollmentReq) -> IntakeResult<EnrollmentDetails> {
    let age_unit = match blank_to_none(req.age_unit) {
        Some(unit) => unit.parse::<AgeUnit>()?,
        None => AgeUnit::default(),
    };
    let gender = blank_to_none(req.gender)
        .map(|g| g.parse::<Gender>())
        .transpose()?;

    Ok(EnrollmentDetails {
        hospital_id: blank_to_none(req.hospital_id),
        doctor_id: blank_to_none(req.doctor_id),
        patient_name: req.patient_name,
        age: req.age,
        age_unit,
        gender,
        contact_no: req.contact_no,
    })
}

fn parse_allot_date(value: &str) -> IntakeResult<Option<NaiveDate>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| {
            IntakeError::InvalidInput(format!("invalid allot_date '{value}' (expected YYYY-MM-DD)"))
        })
}

fn parse_allot_time(value: &str) -> IntakeResult<Option<NaiveTime>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map(Some)
        .map_err(|_| {
            IntakeError::InvalidInput(format!("invalid allot_time '{value}' (expected HH:MM)"))
        })
}

#[utoipa::path(
    post,
    path = "/registrations",
    responses(
        (status = 201, description = "Session opened at the enrollment step", body = SessionRes),
        (status = 502, description = "Reference data unavailable", body = api_shared::ErrorRes)
    )
)]
/// Opens a wizard session and loads hospitals, doctors and the scan catalog into it.
#[axum::debug_handler]
pub async fn open_registration(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<SessionRes>)> {
    let mut wizard = RegistrationWizard::new(state.categories.clone());
    wizard
        .mount(state.directory.as_ref())
        .await
        .map_err(|e| from_intake("Open registration error", e))?;

    let session_id = RecordId::new();
    let res = session_res(session_id, &wizard);
    let mut sessions = state.sessions.write().await;
    evict_idle(&mut sessions, state.session_idle_timeout);
    sessions.insert(session_id, Arc::new(Mutex::new(Session::new(wizard))));
    drop(sessions);

    tracing::info!("opened registration session {}", session_id);
    Ok((StatusCode::CREATED, Json(res)))
}

#[utoipa::path(
    get,
    path = "/registrations/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Current step, draft and field errors", body = SessionRes),
        (status = 404, description = "Unknown session", body = api_shared::ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn get_registration(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<SessionRes>> {
    let (session_id, slot) = state.session(&id).await?;
    Ok(Json(session_res(session_id, &slot.wizard)))
}

#[utoipa::path(
    put,
    path = "/registrations/{id}/enrollment",
    params(("id" = String, Path, description = "Session id")),
    request_body = EnrollmentReq,
    responses(
        (status = 200, description = "Enrollment fields stored", body = SessionRes),
        (status = 404, description = "Unknown session", body = api_shared::ErrorRes),
        (status = 422, description = "Unrecognised age unit or gender", body = api_shared::ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn set_enrollment(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<EnrollmentReq>,
) -> ApiResult<Json<SessionRes>> {
    update_session(&state, &id, move |wizard| {
        wizard.set_enrollment(enrollment_details(req)?);
        Ok(())
    })
    .await
}

#[utoipa::path(
    put,
    path = "/registrations/{id}/scans",
    params(("id" = String, Path, description = "Session id")),
    request_body = ScansReq,
    responses(
        (status = 200, description = "Selection and category stored, draft repriced", body = SessionRes),
        (status = 404, description = "Unknown session", body = api_shared::ErrorRes),
        (status = 422, description = "Scan id not in the catalog", body = api_shared::ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn set_scans(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<ScansReq>,
) -> ApiResult<Json<SessionRes>> {
    update_session(&state, &id, move |wizard| {
        wizard.set_scan_selection(req.scan_ids.into_iter().map(ScanId))?;
        if let Some(category) = req.category {
            wizard.set_category(&category);
        }
        Ok(())
    })
    .await
}

#[utoipa::path(
    put,
    path = "/registrations/{id}/payment",
    params(("id" = String, Path, description = "Session id")),
    request_body = PaymentReq,
    responses(
        (status = 200, description = "Payment fields stored, due recomputed", body = SessionRes),
        (status = 404, description = "Unknown session", body = api_shared::ErrorRes),
        (status = 422, description = "Negative amount or malformed date/time", body = api_shared::ErrorRes)
    )
)]
/// Absent fields keep their current value; an empty date or time clears it.
#[axum::debug_handler]
pub async fn set_payment(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<PaymentReq>,
) -> ApiResult<Json<SessionRes>> {
    update_session(&state, &id, move |wizard| {
        if let Some(received) = req.received_amount {
            wizard.set_received_amount(received)?;
        }
        if let Some(discount) = req.discount_amount {
            wizard.set_discount_amount(discount)?;
        }
        let date = match req.allot_date {
            Some(value) => parse_allot_date(&value)?,
            None => wizard.draft().allot_date(),
        };
        let time = match req.allot_time {
            Some(value) => parse_allot_time(&value)?,
            None => wizard.draft().allot_time(),
        };
        wizard.set_appointment(date, time);
        Ok(())
    })
    .await
}

#[utoipa::path(
    post,
    path = "/registrations/{id}/next",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Moved forward one step", body = SessionRes),
        (status = 404, description = "Unknown session", body = api_shared::ErrorRes),
        (status = 422, description = "Step guard failed", body = api_shared::ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn next_step(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<SessionRes>> {
    let (session_id, mut slot) = state.session(&id).await?;
    slot.wizard.next().map_err(|e| from_intake("Next step error", e))?;
    Ok(Json(session_res(session_id, &slot.wizard)))
}

#[utoipa::path(
    post,
    path = "/registrations/{id}/back",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Moved back one step", body = SessionRes),
        (status = 404, description = "Unknown session", body = api_shared::ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn back_step(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<SessionRes>> {
    let (session_id, mut slot) = state.session(&id).await?;
    slot.wizard.back();
    Ok(Json(session_res(session_id, &slot.wizard)))
}

#[utoipa::path(
    post,
    path = "/registrations/{id}/goto",
    params(("id" = String, Path, description = "Session id")),
    request_body = GotoReq,
    responses(
        (status = 200, description = "Arrived at the requested step", body = SessionRes),
        (status = 404, description = "Unknown session", body = api_shared::ErrorRes),
        (status = 422, description = "A guard on the way failed", body = api_shared::ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn goto_step(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<GotoReq>,
) -> ApiResult<Json<SessionRes>> {
    let target: WizardStep = req
        .step
        .parse()
        .map_err(|e| from_intake("Go to step error", e))?;
    let (session_id, mut slot) = state.session(&id).await?;
    slot.wizard.go_to(target).map_err(|e| from_intake("Go to step error", e))?;
    Ok(Json(session_res(session_id, &slot.wizard)))
}

#[utoipa::path(
    post,
    path = "/registrations/{id}/submit",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Registration stored; session reset for the next patient", body = SubmitRes),
        (status = 404, description = "Unknown session", body = api_shared::ErrorRes),
        (status = 422, description = "Not at the payment step, or a guard failed", body = api_shared::ErrorRes),
        (status = 502, description = "Patient store failed; draft kept", body = api_shared::ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn submit_registration(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<Json<SubmitRes>> {
    let (_, mut slot) = state.session(&id).await?;
    let confirmation = slot
        .wizard
        .submit(state.store.as_ref(), &state.cro_sequence)
        .await
        .map_err(|e| from_intake("Submit registration error", e))?;

    Ok(Json(SubmitRes {
        cro: confirmation.cro,
        record_id: confirmation.record_id,
        message: confirmation.message,
    }))
}

#[utoipa::path(
    delete,
    path = "/registrations/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 204, description = "Draft discarded and session closed"),
        (status = 404, description = "Unknown session", body = api_shared::ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn close_registration(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> ApiResult<StatusCode> {
    let session_id = RecordId::parse(&id).map_err(|_| session_not_found())?;
    let session = state
        .sessions
        .write()
        .await
        .remove(&session_id)
        .ok_or_else(session_not_found)?;
    session.lock().await.wizard.reset();

    tracing::info!("closed registration session {}", session_id);
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "Stored registrations, oldest first", body = ListRegistrationsRes),
        (status = 501, description = "Registrations are stored by the backend", body = api_shared::ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn list_registrations(
    State(state): State<AppState>,
) -> ApiResult<Json<ListRegistrationsRes>> {
    let Some(file_store) = state.file_store.as_ref() else {
        return Err(error_response(
            StatusCode::NOT_IMPLEMENTED,
            "Registration listing is only available with the file store",
        ));
    };
    let registrations = file_store
        .list_registrations()
        .iter()
        .map(registration_summary)
        .collect();
    Ok(Json(ListRegistrationsRes { registrations }))
}
