//! Media actions: directory browsing, uploads and the image recycle bin.

use axum::{
    response::{IntoResponse, Response},
    Json,
};

use crate::web::dto::{MediaResponse, OkResponse, RestoreResponse, UploadResponse};
use crate::web::error::ApiError;
use crate::web::handlers::{ActionParams, AppState};

type HandlerResult = std::result::Result<Response, ApiError>;

/// `action=media`: one level of the media tree, directories first.
pub fn list(state: &AppState, params: &ActionParams) -> HandlerResult {
    let store = state.media_store(params.collection())?;
    let listing = store.list(params.get("path").unwrap_or(""))?;
    Ok(Json(MediaResponse {
        success: true,
        path: listing.path,
        items: listing.items,
    })
    .into_response())
}

/// `action=upload`: multipart image upload.
pub fn upload(state: &AppState, params: &ActionParams) -> HandlerResult {
    let file = params
        .upload
        .as_ref()
        .ok_or_else(|| ApiError::bad_request("missing uploaded file"))?;
    let store = state.media_store(params.collection())?;
    let stored = store.upload(
        &file.filename,
        &file.bytes,
        params.get("path").unwrap_or(""),
        file.content_type.as_deref(),
    )?;
    Ok(Json(UploadResponse {
        success: true,
        filename: stored.filename,
        url: stored.url,
        size: stored.size,
    })
    .into_response())
}

/// `action=createdir`.
pub fn create_dir(state: &AppState, params: &ActionParams) -> HandlerResult {
    let name = params.require("dirname")?;
    let store = state.media_store(params.collection())?;
    store.create_dir(name, params.get("path").unwrap_or(""))?;
    Ok(Json(OkResponse::ok()).into_response())
}

/// `action=deletedir`: recursive delete, refused outside the media root.
pub fn delete_dir(state: &AppState, params: &ActionParams) -> HandlerResult {
    let name = params.require("dirname")?;
    let store = state.media_store(params.collection())?;
    store.delete_dir(name, params.get("path").unwrap_or(""))?;
    Ok(Json(OkResponse::ok()).into_response())
}

/// `action=deleteimage`: soft-delete into the image recycle bin.
pub fn delete_image(state: &AppState, params: &ActionParams) -> HandlerResult {
    let name = params
        .first(&["imagename", "filename"])
        .ok_or_else(|| ApiError::bad_request("missing parameter: imagename"))?;
    let store = state.media_store(params.collection())?;
    store.soft_delete(name, params.get("path").unwrap_or(""))?;
    Ok(Json(OkResponse::ok()).into_response())
}

/// `action=restoreimage`.
pub fn restore_image(state: &AppState, params: &ActionParams) -> HandlerResult {
    let name = params
        .first(&["imagename", "filename"])
        .ok_or_else(|| ApiError::bad_request("missing parameter: imagename"))?;
    let store = state.media_store(params.collection())?;
    let restored = store.restore(name, params.get("path").unwrap_or(""))?;
    Ok(Json(RestoreResponse {
        success: true,
        filename: restored,
    })
    .into_response())
}

/// `action=permanentdeleteimage`.
pub fn permanent_delete_image(state: &AppState, params: &ActionParams) -> HandlerResult {
    let name = params
        .first(&["imagename", "filename"])
        .ok_or_else(|| ApiError::bad_request("missing parameter: imagename"))?;
    let store = state.media_store(params.collection())?;
    store.purge(name, params.get("path").unwrap_or(""))?;
    Ok(Json(OkResponse::ok()).into_response())
}
