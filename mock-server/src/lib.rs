use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Maximum bio length, in characters, accepted by `POST /me`.
pub const BIO_LIMIT: usize = 200;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub bio: String,
    pub avatar: Option<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            bio: String::new(),
            avatar: None,
        }
    }
}

/// Query parameters for `POST /me`. Omitted fields remain unchanged.
#[derive(Deserialize)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub bio: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateAvatar {
    pub url: String,
}

pub type Db = Arc<RwLock<Profile>>;

pub fn app() -> Router {
    app_with(Profile::default())
}

pub fn app_with(profile: Profile) -> Router {
    let db: Db = Arc::new(RwLock::new(profile));
    Router::new()
        .route("/me", get(get_profile).post(update_profile))
        .route("/me/avatar", post(update_avatar))
        .route("/status/{code}", get(status).post(status))
        .route("/garbage", get(garbage))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn get_profile(State(db): State<Db>) -> Json<Profile> {
    Json(db.read().await.clone())
}

async fn update_profile(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(input): Query<UpdateProfile>,
) -> Result<Json<Profile>, StatusCode> {
    if !is_json(&headers) {
        return Err(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
    if input
        .bio
        .as_ref()
        .is_some_and(|bio| bio.chars().count() > BIO_LIMIT)
    {
        tracing::debug!("rejecting bio over {BIO_LIMIT} characters");
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let mut profile = db.write().await;
    if let Some(name) = input.name {
        profile.name = name;
    }
    if let Some(bio) = input.bio {
        profile.bio = bio;
    }
    Ok(Json(profile.clone()))
}

async fn update_avatar(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(input): Query<UpdateAvatar>,
) -> Result<Json<Profile>, StatusCode> {
    if !is_json(&headers) {
        return Err(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
    let mut profile = db.write().await;
    profile.avatar = Some(input.url);
    Ok(Json(profile.clone()))
}

/// Answer with the requested status code and a small JSON body.
async fn status(Path(code): Path<u16>) -> (StatusCode, Json<serde_json::Value>) {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, Json(serde_json::json!({ "status": code }))),
        Err(_) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "invalid status code" })),
        ),
    }
}

/// A 200 response whose body is not JSON.
async fn garbage() -> (StatusCode, &'static str) {
    (StatusCode::OK, "this is not json")
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_serializes_to_json() {
        let profile = Profile {
            id: Uuid::nil(),
            name: "Test".to_string(),
            bio: "hello".to_string(),
            avatar: None,
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["name"], "Test");
        assert_eq!(json["bio"], "hello");
        assert!(json["avatar"].is_null());
    }

    #[test]
    fn update_profile_all_fields_optional() {
        let input: UpdateProfile = serde_json::from_str(r#"{}"#).unwrap();
        assert!(input.name.is_none());
        assert!(input.bio.is_none());
    }

    #[test]
    fn json_content_type_detection() {
        let mut headers = HeaderMap::new();
        assert!(!is_json(&headers));

        headers.insert(
            header::CONTENT_TYPE,
            "application/json; charset=utf-8".parse().unwrap(),
        );
        assert!(is_json(&headers));

        headers.insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());
        assert!(!is_json(&headers));
    }
}
