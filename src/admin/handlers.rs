//! Admin API handlers

use axum::{
    Json,
    extract::{Path, State},
};

use super::{
    error::AdminServiceError,
    middleware::AdminState,
    types::{
        CustomerListResponse, CustomerStoreCreditSummary, StoreCreditDeleteResponse,
        StoreCreditListResponse, StoreCreditResponse,
    },
    validation::{
        CreateStoreCreditRequest, Expand, ListCustomersQuery, ListStoreCreditsQuery,
        RetrieveStoreCreditQuery, UpdateStoreCreditRequest, ValidJson, ValidQuery,
    },
};

/// GET /admin/store-credits
pub async fn list_store_credits(
    State(state): State<AdminState>,
    ValidQuery(query): ValidQuery<ListStoreCreditsQuery>,
) -> Result<Json<StoreCreditListResponse>, AdminServiceError> {
    let params = query.validate(state.service.page_limits(), Expand::ALL)?;
    let (store_credits, count) =
        state.service.list(&params.filter, params.pagination, params.expand);

    Ok(Json(StoreCreditListResponse {
        store_credits,
        count,
        offset: params.pagination.offset,
        limit: params.pagination.limit,
    }))
}

/// POST /admin/store-credits
pub async fn create_store_credit(
    State(state): State<AdminState>,
    ValidJson(payload): ValidJson<CreateStoreCreditRequest>,
) -> Result<Json<StoreCreditResponse>, AdminServiceError> {
    let new_credit = payload.validate()?;
    let store_credit = state.service.create(new_credit)?;
    Ok(Json(StoreCreditResponse { store_credit }))
}

/// GET /admin/store-credits/:id
pub async fn get_store_credit(
    State(state): State<AdminState>,
    Path(id): Path<String>,
    ValidQuery(query): ValidQuery<RetrieveStoreCreditQuery>,
) -> Result<Json<StoreCreditResponse>, AdminServiceError> {
    let expand = query.validate(Expand::ALL)?;
    let store_credit = state.service.get(&id, expand)?;
    Ok(Json(StoreCreditResponse { store_credit }))
}

/// POST /admin/store-credits/:id
pub async fn update_store_credit(
    State(state): State<AdminState>,
    Path(id): Path<String>,
    ValidJson(payload): ValidJson<UpdateStoreCreditRequest>,
) -> Result<Json<StoreCreditResponse>, AdminServiceError> {
    let patch = payload.validate()?;
    let store_credit = state.service.update(&id, patch)?;
    Ok(Json(StoreCreditResponse { store_credit }))
}

/// DELETE /admin/store-credits/:id
pub async fn delete_store_credit(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Result<Json<StoreCreditDeleteResponse>, AdminServiceError> {
    state.service.delete(&id)?;
    Ok(Json(StoreCreditDeleteResponse::new(id)))
}

/// GET /admin/store-credits/customers
pub async fn list_customers(
    State(state): State<AdminState>,
    ValidQuery(query): ValidQuery<ListCustomersQuery>,
) -> Result<Json<CustomerListResponse>, AdminServiceError> {
    let params = query.validate(state.service.page_limits())?;
    let (customers, count) = state
        .service
        .list_customers(&params.filter, params.pagination)?;

    Ok(Json(CustomerListResponse {
        customers,
        count,
        offset: params.pagination.offset,
        limit: params.pagination.limit,
    }))
}

/// GET /admin/store-credits/customers/:id
pub async fn get_customer(
    State(state): State<AdminState>,
    Path(customer_id): Path<String>,
) -> Result<Json<CustomerStoreCreditSummary>, AdminServiceError> {
    let summary = state.service.get_customer_summary(&customer_id)?;
    Ok(Json(summary))
}

/// GET /admin/store-credits/customers/:id/store-credits
///
/// Region is expanded unless the request asks otherwise.
pub async fn list_customer_store_credits(
    State(state): State<AdminState>,
    Path(customer_id): Path<String>,
    ValidQuery(query): ValidQuery<ListStoreCreditsQuery>,
) -> Result<Json<StoreCreditListResponse>, AdminServiceError> {
    let params = query.validate(state.service.page_limits(), Expand::REGION)?;
    let (store_credits, count) = state.service.list_for_customer(
        &customer_id,
        params.filter,
        params.pagination,
        params.expand,
    )?;

    Ok(Json(StoreCreditListResponse {
        store_credits,
        count,
        offset: params.pagination.offset,
        limit: params.pagination.limit,
    }))
}
