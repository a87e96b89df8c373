//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{
        AtomJson, BindingJson, ByTypeParams, HandlesResponse, HealthResponse, InsertRequest,
        InsertResponse, QueryRequest, QueryResponse, RemoveParams, RemoveResponse, StatusResponse,
        TruthJson, TruthResponse, TruthUpdateRequest, TypeJson, TypeRegisteredResponse,
        TypesResponse,
    },
};
use crate::error::AppError;
use atomspace_core::{AtomSpace, Handle, QueryLimits};
use axum::{
    Json,
    extract::{Path, Query as UrlQuery, State},
    http::StatusCode,
    response::IntoResponse,
};

// =============================================================================
// HEALTH / STATUS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Store counts.
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse::from(state.space.metrics()))
}

// =============================================================================
// TYPE HANDLERS
// =============================================================================

/// List registered types.
pub async fn list_types_handler(State(state): State<AppState>) -> Json<TypesResponse> {
    let entries = state.space.types();
    let types = entries
        .iter()
        .map(|e| TypeJson::from_entry(e, &entries))
        .collect();
    Json(TypesResponse { types })
}

/// Register a type.
pub async fn register_type_handler(
    State(state): State<AppState>,
    Json(request): Json<TypeJson>,
) -> Result<Json<TypeRegisteredResponse>, AppError> {
    let id = state
        .space
        .register_type(&request.name, request.parent.as_deref())?;
    tracing::info!(name = %request.name, type_id = id.0, "type registered");
    Ok(Json(TypeRegisteredResponse {
        name: request.name,
        type_id: id.0,
    }))
}

/// Handles of one type, optionally including subtypes.
pub async fn atoms_of_type_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    UrlQuery(params): UrlQuery<ByTypeParams>,
) -> Result<Json<HandlesResponse>, AppError> {
    let handles = state.space.get_by_type(&name, params.subtypes)?;
    Ok(Json(HandlesResponse::from(handles)))
}

// =============================================================================
// ATOM HANDLERS
// =============================================================================

/// Insert an atom. Returns 201 when created, 200 for a duplicate.
pub async fn insert_atom_handler(
    State(state): State<AppState>,
    Json(request): Json<InsertRequest>,
) -> Result<(StatusCode, Json<InsertResponse>), AppError> {
    let truth = request.truth.map(TruthJson::to_truth).transpose()?;
    let outcome = state
        .space
        .insert_with_outcome(&request.atom.to_spec(), truth)?;

    let status = if outcome.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(InsertResponse {
            handle: outcome.handle().value(),
            created: outcome.is_created(),
        }),
    ))
}

/// Fetch one atom.
pub async fn get_atom_handler(
    State(state): State<AppState>,
    Path(handle): Path<u64>,
) -> Result<Json<AtomJson>, AppError> {
    Ok(Json(describe_atom(&state.space, Handle(handle))?))
}

/// Remove an atom. Without `cascade`, referenced atoms are refused with 409.
pub async fn remove_atom_handler(
    State(state): State<AppState>,
    Path(handle): Path<u64>,
    UrlQuery(params): UrlQuery<RemoveParams>,
) -> Result<Json<RemoveResponse>, AppError> {
    let handle = Handle(handle);
    let removed = if params.cascade {
        state.space.remove_cascade(handle)?
    } else {
        state.space.remove(handle)?;
        vec![handle]
    };
    Ok(Json(RemoveResponse {
        removed: removed.into_iter().map(Handle::value).collect(),
    }))
}

/// Links that contain an atom.
pub async fn incoming_handler(
    State(state): State<AppState>,
    Path(handle): Path<u64>,
) -> Result<Json<HandlesResponse>, AppError> {
    let incoming = state.space.get_incoming(Handle(handle))?;
    Ok(Json(HandlesResponse::from(incoming)))
}

// =============================================================================
// TRUTH HANDLERS
// =============================================================================

pub async fn get_truth_handler(
    State(state): State<AppState>,
    Path(handle): Path<u64>,
) -> Result<Json<TruthResponse>, AppError> {
    let truth = state.space.get_truth_value(Handle(handle))?;
    Ok(Json(TruthResponse {
        handle,
        truth: truth.map(TruthJson::from),
    }))
}

/// Revise, replace or clear a truth value. Responds with the value now held.
pub async fn put_truth_handler(
    State(state): State<AppState>,
    Path(handle): Path<u64>,
    Json(request): Json<TruthUpdateRequest>,
) -> Result<Json<TruthResponse>, AppError> {
    let h = Handle(handle);
    let truth = match request.truth {
        None => {
            state.space.clear_truth_value(h)?;
            None
        }
        Some(tv) if request.replace => {
            let value = tv.to_truth()?;
            state.space.replace_truth_value(h, value)?;
            Some(value)
        }
        Some(tv) => Some(state.space.set_truth_value(h, tv.strength, tv.confidence)?),
    };
    Ok(Json(TruthResponse {
        handle,
        truth: truth.map(TruthJson::from),
    }))
}

// =============================================================================
// QUERY HANDLER
// =============================================================================

/// Run a pattern query on the blocking pool.
pub async fn query_handler(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    let space = state.space.clone();
    let caps = state.limits;
    let response = tokio::task::spawn_blocking(move || execute_query(&space, &request, caps))
        .await
        .map_err(|e| AppError::Internal(format!("query task failed: {}", e)))??;
    Ok(Json(response))
}

/// Compile and run a query, collecting every solution within the caps.
///
/// One solution past the result cap is requested so a cut-off result set can
/// be told apart from one that fits exactly.
pub fn execute_query(
    space: &AtomSpace,
    request: &QueryRequest,
    caps: QueryLimits,
) -> Result<QueryResponse, AppError> {
    let mut query = request.to_query(caps);
    let max_results = query.limits.max_results;
    query.limits.max_results = max_results.map(|m| m.saturating_add(1));

    let mut matches = space.run(&query)?;
    let mut bindings: Vec<BindingJson> =
        matches.by_ref().map(|b| BindingJson::from(&b)).collect();

    let truncated = max_results.is_some_and(|m| bindings.len() > m);
    if let Some(m) = max_results {
        bindings.truncate(m);
    }

    let budget_exhausted = matches.budget_exhausted();
    if budget_exhausted {
        tracing::warn!(
            steps = matches.steps(),
            found = bindings.len(),
            "query stopped at step cap"
        );
    } else {
        tracing::debug!(
            steps = matches.steps(),
            found = bindings.len(),
            truncated,
            "query done"
        );
    }

    Ok(QueryResponse {
        count: bindings.len(),
        bindings,
        budget_exhausted,
        truncated,
    })
}

// =============================================================================
// HELPERS
// =============================================================================

fn describe_atom(space: &AtomSpace, handle: Handle) -> Result<AtomJson, AppError> {
    let atom = space.get(handle)?;
    let type_name = space
        .type_name(atom.type_id())
        .ok_or_else(|| AppError::Internal(format!("atom {} has unregistered type", handle)))?;
    let truth = space.get_truth_value(handle)?;
    Ok(AtomJson::new(&atom, type_name, truth))
}
