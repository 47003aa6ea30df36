//! Action dispatch for the `/process` endpoint.

pub mod content;
pub mod logs;
pub mod media;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{FromRequest, Multipart, Query, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap, Method},
    response::Response,
    Form,
};

use crate::cache::FileCache;
use crate::config::Config;
use crate::frontmatter::{FieldSchema, FieldType};
use crate::logging::LogControl;
use crate::paths::PathResolver;
use crate::store::{ContentStore, MediaStore};
use crate::web::auth::{SessionGate, TokenGate};
use crate::web::error::ApiError;
use crate::Result;

/// Actions that change the store and require an authenticated session.
const MUTATING_ACTIONS: &[&str] = &[
    "write",
    "save",
    "rename",
    "delete",
    "create",
    "emptyrecyclebin",
    "restore",
    "restoreimage",
    "deleteimage",
    "permanentdelete",
    "permanentdeleteimage",
    "upload",
    "createdir",
    "deletedir",
];

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub resolver: PathResolver,
    pub cache: FileCache,
    pub schema: FieldSchema,
    pub log_control: LogControl,
    pub gate: Arc<dyn SessionGate>,
}

impl AppState {
    pub fn new(config: Config, log_control: LogControl) -> Result<Self> {
        let cache = if config.cache.enabled {
            FileCache::new(&config.cache.dir, true)?
        } else {
            FileCache::disabled()
        };
        let resolver = PathResolver::new(&config.content.root);
        let schema: FieldSchema = config
            .content
            .fields
            .iter()
            .map(|(name, kind)| (name.clone(), FieldType::from_name(kind)))
            .collect();
        let gate: Arc<dyn SessionGate> = Arc::new(TokenGate::new(config.web.auth_token.clone()));

        Ok(Self {
            config,
            resolver,
            cache,
            schema,
            log_control,
            gate,
        })
    }

    /// Build a content store for the request's collection.
    pub fn content_store(&self, collection: &str) -> Result<ContentStore> {
        let paths = self.resolver.resolve(collection)?;
        Ok(ContentStore::new(
            paths,
            self.cache.clone(),
            self.config.content.max_content_bytes,
        ))
    }

    /// Build a media store for the request's collection.
    pub fn media_store(&self, collection: &str) -> Result<MediaStore> {
        let paths = self.resolver.resolve(collection)?;
        MediaStore::new(
            &self.config.media.root,
            paths.recycle_images_dir,
            &self.config.media.public_url,
            paths.name,
            self.cache.clone(),
            Duration::from_secs(self.config.cache.media_ttl_secs),
            self.config.media.max_upload_size_mb * 1024 * 1024,
            self.config.media.image_extensions.clone(),
        )
    }
}

/// An uploaded file from a multipart request.
pub struct Upload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Flattened request parameters: query string merged with an urlencoded or
/// multipart body. Body values win over query values.
pub struct ActionParams {
    values: HashMap<String, String>,
    pub upload: Option<Upload>,
}

impl ActionParams {
    async fn collect(
        query: HashMap<String, String>,
        req: Request,
    ) -> std::result::Result<Self, ApiError> {
        let mut values = query;
        let mut upload = None;

        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.starts_with("multipart/form-data") {
            let mut multipart = Multipart::from_request(req, &())
                .await
                .map_err(|_| ApiError::bad_request("invalid multipart body"))?;
            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|_| ApiError::bad_request("invalid multipart field"))?
            {
                let name = field.name().unwrap_or("").to_string();
                if let Some(filename) = field.file_name().map(str::to_string) {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|_| ApiError::bad_request("upload transfer failed"))?;
                    upload = Some(Upload {
                        filename,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                } else {
                    let text = field
                        .text()
                        .await
                        .map_err(|_| ApiError::bad_request("invalid multipart field"))?;
                    values.insert(name, text);
                }
            }
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(form) = Form::<HashMap<String, String>>::from_request(req, &())
                .await
                .map_err(|_| ApiError::bad_request("invalid form body"))?;
            values.extend(form);
        }

        Ok(Self { values, upload })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// First present parameter of several accepted spellings.
    pub fn first(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|n| self.get(n))
    }

    pub fn require(&self, name: &str) -> std::result::Result<&str, ApiError> {
        self.get(name)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::bad_request(format!("missing parameter: {name}")))
    }

    /// Collection parameter, empty string when omitted (resolver falls back).
    pub fn collection(&self) -> &str {
        self.get("collection").unwrap_or("")
    }

    /// Field values submitted as `field_<name>` parameters.
    pub fn field_values(&self) -> HashMap<String, String> {
        self.values
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix("field_")
                    .map(|name| (name.to_string(), v.clone()))
            })
            .collect()
    }
}

/// The single dispatch endpoint.
pub async fn process(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    req: Request,
) -> std::result::Result<Response, ApiError> {
    let method = req.method().clone();
    let headers: HeaderMap = req.headers().clone();

    let params = ActionParams::collect(query, req).await?;
    let action = params.require("action")?.to_string();

    let mutating =
        MUTATING_ACTIONS.contains(&action.as_str()) || (action == "logs" && method == Method::POST);
    if mutating && !state.gate.is_authenticated(&headers) {
        return Err(ApiError::unauthorized("authentication required"));
    }

    tracing::debug!(action = %action, mutating, "dispatching");

    match action.as_str() {
        "list" => content::list(&state, &params),
        "read" => content::read(&state, &params),
        "write" | "save" => content::save(&state, &params),
        "rename" => content::rename(&state, &params),
        "delete" => content::delete(&state, &params),
        "create" => content::create(&state, &params),
        "recyclebin" => content::recycle_bin(&state, &params),
        "emptyrecyclebin" => content::empty_recycle_bin(&state, &params),
        "restore" => content::restore(&state, &params),
        "permanentdelete" => content::permanent_delete(&state, &params),
        "collections" => content::collections(&state),
        "media" => media::list(&state, &params),
        "upload" => media::upload(&state, &params),
        "createdir" => media::create_dir(&state, &params),
        "deletedir" => media::delete_dir(&state, &params),
        "deleteimage" => media::delete_image(&state, &params),
        "restoreimage" => media::restore_image(&state, &params),
        "permanentdeleteimage" => media::permanent_delete_image(&state, &params),
        "logs" => logs::handle(&state, &params, method == Method::POST),
        other => Err(ApiError::bad_request(format!("unknown action: {other}"))),
    }
}
