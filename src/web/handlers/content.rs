//! Content file actions: CRUD plus the recycle-bin workflow.

use axum::{
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::web::dto::{
    CollectionsResponse, OkResponse, RecycleBinResponse, RenameResponse, RestoreResponse,
    WriteResponse,
};
use crate::web::error::ApiError;
use crate::web::handlers::{ActionParams, AppState};

type HandlerResult = std::result::Result<Response, ApiError>;

/// `if_unmodified_since` parameter for optimistic writes, epoch seconds.
fn expected_mtime(params: &ActionParams) -> std::result::Result<Option<u64>, ApiError> {
    match params.get("if_unmodified_since") {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ApiError::bad_request("if_unmodified_since must be epoch seconds")),
    }
}

/// `action=list`: filenames newest first, as a bare JSON array.
pub fn list(state: &AppState, params: &ActionParams) -> HandlerResult {
    let store = state.content_store(params.collection())?;
    Ok(Json(store.list()?).into_response())
}

/// `action=read`: the raw document as `text/plain`.
pub fn read(state: &AppState, params: &ActionParams) -> HandlerResult {
    let file = params.require("file")?;
    let store = state.content_store(params.collection())?;
    let content = store.read(file)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        content,
    )
        .into_response())
}

/// `action=write` / `action=save`: full-content overwrite. Any `field_<name>`
/// parameters are merged into the document's front matter first.
pub fn save(state: &AppState, params: &ActionParams) -> HandlerResult {
    let file = params.require("file")?;
    let content = params.get("content").unwrap_or("");
    let store = state.content_store(params.collection())?;

    let fields = params.field_values();
    let outcome = if fields.is_empty() {
        store.write(file, content, expected_mtime(params)?)?
    } else {
        store.save_with_fields(file, content, &fields, &state.schema, expected_mtime(params)?)?
    };

    Ok(Json(WriteResponse {
        success: true,
        filename: outcome.filename,
        method: outcome.method,
    })
    .into_response())
}

/// `action=create`: new file, `Conflict` when it already exists.
pub fn create(state: &AppState, params: &ActionParams) -> HandlerResult {
    let file = params.require("file")?;
    let content = params.get("content").unwrap_or("");
    let store = state.content_store(params.collection())?;
    store.create(file, content)?;
    Ok(Json(OkResponse::ok()).into_response())
}

/// `action=rename`.
pub fn rename(state: &AppState, params: &ActionParams) -> HandlerResult {
    let old = params.require("oldFilename")?;
    let new = params.require("newFilename")?;
    let store = state.content_store(params.collection())?;
    let (old_name, new_name) = store.rename(old, new)?;
    Ok(Json(RenameResponse {
        success: true,
        old_name,
        new_name,
    })
    .into_response())
}

/// `action=delete`: soft-delete into the collection's recycle bin.
pub fn delete(state: &AppState, params: &ActionParams) -> HandlerResult {
    let filename = params.require("filename")?;
    let store = state.content_store(params.collection())?;
    store.soft_delete(filename)?;
    Ok(Json(OkResponse::ok()).into_response())
}

/// `action=recyclebin`: trashed entries, `type` selects files or images.
pub fn recycle_bin(state: &AppState, params: &ActionParams) -> HandlerResult {
    let kind = params.get("type").unwrap_or("files");
    let files = match kind {
        "files" => state.content_store(params.collection())?.list_trashed(),
        "images" => state.media_store(params.collection())?.list_trashed(),
        other => {
            return Err(ApiError::bad_request(format!(
                "unknown recycle bin type: {other}"
            )))
        }
    };
    Ok(Json(RecycleBinResponse {
        success: true,
        files,
    })
    .into_response())
}

/// `action=emptyrecyclebin`: `type` of `files`, `images` or `all`. With
/// `all`, a failure on one kind does not stop the other; failures are
/// aggregated into one message.
pub fn empty_recycle_bin(state: &AppState, params: &ActionParams) -> HandlerResult {
    let kind = params.get("type").unwrap_or("all");
    if !matches!(kind, "files" | "images" | "all") {
        return Err(ApiError::bad_request(format!(
            "unknown recycle bin type: {kind}"
        )));
    }

    let mut failures = Vec::new();
    if matches!(kind, "files" | "all") {
        if let Err(e) = state
            .content_store(params.collection())
            .and_then(|s| s.empty_recycle_bin())
        {
            tracing::error!(error = %e, "emptying file recycle bin failed");
            failures.push("files");
        }
    }
    if matches!(kind, "images" | "all") {
        if let Err(e) = state
            .media_store(params.collection())
            .and_then(|s| s.empty_recycle_bin())
        {
            tracing::error!(error = %e, "emptying image recycle bin failed");
            failures.push("images");
        }
    }

    if failures.is_empty() {
        Ok(Json(OkResponse::ok()).into_response())
    } else {
        Err(ApiError::internal(format!(
            "could not empty recycle bin: {}",
            failures.join(", ")
        )))
    }
}

/// `action=restore`: move a trashed file back under its original name.
pub fn restore(state: &AppState, params: &ActionParams) -> HandlerResult {
    let filename = params.require("filename")?;
    let store = state.content_store(params.collection())?;
    let restored = store.restore(filename)?;
    Ok(Json(RestoreResponse {
        success: true,
        filename: restored,
    })
    .into_response())
}

/// `action=permanentdelete`: unlink from the recycle bin only.
pub fn permanent_delete(state: &AppState, params: &ActionParams) -> HandlerResult {
    let filename = params.require("filename")?;
    let store = state.content_store(params.collection())?;
    store.purge(filename)?;
    Ok(Json(OkResponse::ok()).into_response())
}

/// `action=collections`: the available collection names.
pub fn collections(state: &AppState) -> HandlerResult {
    Ok(Json(CollectionsResponse {
        success: true,
        collections: state.resolver.collections(),
    })
    .into_response())
}
