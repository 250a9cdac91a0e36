//! Reference data and stateless pricing endpoints.

use crate::error::{from_intake, ApiResult};
use crate::views::scan_option_res;
use crate::AppState;
use api_shared::{
    CategoryRes, DueReq, DueRes, ListCategoriesRes, ListScansRes, QuoteReq, QuoteRes,
};
use axum::{extract::State, response::Json};
use scanreg_core::{check_amount, compute_charges, compute_due, currency, is_settled, ScanId};
use std::collections::BTreeSet;

#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "Known patient categories", body = ListCategoriesRes)
    )
)]
#[axum::debug_handler]
pub async fn list_categories(State(state): State<AppState>) -> Json<ListCategoriesRes> {
    let categories = state
        .categories
        .categories()
        .into_iter()
        .map(|c| CategoryRes {
            name: c.name,
            is_fee_exempt: c.is_fee_exempt,
        })
        .collect();
    Json(ListCategoriesRes { categories })
}

#[utoipa::path(
    get,
    path = "/catalog/scans",
    responses(
        (status = 200, description = "Current scan catalog", body = ListScansRes),
        (status = 502, description = "Catalog source unavailable", body = api_shared::ErrorRes)
    )
)]
#[axum::debug_handler]
pub async fn list_scans(State(state): State<AppState>) -> ApiResult<Json<ListScansRes>> {
    let scans = state
        .directory
        .scans()
        .await
        .map_err(|e| from_intake("List scans error", e))?;
    Ok(Json(ListScansRes {
        scans: scans.iter().map(scan_option_res).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/pricing/quote",
    request_body = QuoteReq,
    responses(
        (status = 200, description = "Charges for the selection", body = QuoteRes),
        (status = 502, description = "Catalog source unavailable", body = api_shared::ErrorRes)
    )
)]
/// Prices a scan selection for a category against the current catalog.
///
/// Ids that are not in the catalog are ignored.
#[axum::debug_handler]
pub async fn quote(
    State(state): State<AppState>,
    Json(req): Json<QuoteReq>,
) -> ApiResult<Json<QuoteRes>> {
    let catalog = state
        .directory
        .scans()
        .await
        .map_err(|e| from_intake("Quote catalog error", e))?;
    let selected: BTreeSet<ScanId> = req.scan_ids.into_iter().map(ScanId).collect();
    let category = state.categories.category(&req.category);
    let charges = compute_charges(&selected, &catalog, &category);

    Ok(Json(QuoteRes {
        gross_amount: currency(charges.gross_amount),
        total_amount: currency(charges.total_amount),
        total_minutes: charges.total_minutes,
        is_fee_exempt: category.is_fee_exempt,
    }))
}

#[utoipa::path(
    post,
    path = "/pricing/due",
    request_body = DueReq,
    responses(
        (status = 200, description = "Outstanding amount", body = DueRes),
        (status = 422, description = "Amount out of range", body = api_shared::ErrorRes)
    )
)]
/// `total - received - discount`, unclamped.
#[axum::debug_handler]
pub async fn due(
    State(_state): State<AppState>,
    Json(req): Json<DueReq>,
) -> ApiResult<Json<DueRes>> {
    let checked = check_amount("total amount", req.total_amount)
        .and_then(|_| check_amount("received amount", req.received_amount))
        .and_then(|_| check_amount("discount amount", req.discount_amount));
    checked.map_err(|e| from_intake("Due error", e))?;

    let due_amount = compute_due(req.total_amount, req.received_amount, req.discount_amount);
    Ok(Json(DueRes {
        due_amount: currency(due_amount),
        settled: is_settled(due_amount),
    }))
}
