use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const DEMO_USERNAME: &str = "demo";
pub const DEMO_PASSWORD: &str = "demo-password";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Menu {
    pub id: u64,
    pub name: String,
    pub restaurant_id: u64,
    pub items: Vec<String>,
}

#[derive(Deserialize)]
pub struct UpdateMenu {
    pub name: Option<String>,
    pub items: Option<Vec<String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[derive(Default)]
pub struct Store {
    pub menus: BTreeMap<u64, Menu>,
    pub restaurants: Vec<Restaurant>,
    pub tags: Vec<Tag>,
    pub users: BTreeMap<u64, User>,
    pub tokens: HashSet<String>,
}

impl Store {
    /// A small fixed data set shared by the tests and local development.
    pub fn seeded() -> Self {
        let menus = [
            Menu {
                id: 1,
                name: "Breakfast".to_string(),
                restaurant_id: 1,
                items: vec!["eggs".to_string(), "toast".to_string()],
            },
            Menu {
                id: 2,
                name: "Lunch".to_string(),
                restaurant_id: 2,
                items: vec!["soup".to_string()],
            },
        ];
        let users = [User {
            id: 1,
            username: DEMO_USERNAME.to_string(),
            email: Some("demo@example.com".to_string()),
        }];
        Self {
            menus: menus.into_iter().map(|m| (m.id, m)).collect(),
            restaurants: vec![
                Restaurant {
                    id: 1,
                    name: "Corner Bistro".to_string(),
                },
                Restaurant {
                    id: 2,
                    name: "Harbor Grill".to_string(),
                },
            ],
            tags: vec![
                Tag {
                    id: 1,
                    label: "vegan".to_string(),
                },
                Tag {
                    id: 2,
                    label: "gluten-free".to_string(),
                },
            ],
            users: users.into_iter().map(|u| (u.id, u)).collect(),
            tokens: HashSet::new(),
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

type Rejection = (StatusCode, Json<ErrorBody>);

fn reject(status: StatusCode, detail: &str) -> Rejection {
    (
        status,
        Json(ErrorBody {
            detail: detail.to_string(),
        }),
    )
}

pub fn app() -> Router {
    app_with(Store::seeded())
}

pub fn app_with(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/auth/login/basic", post(login_basic))
        .route("/menus", get(list_menus))
        .route("/menus/{id}", get(get_menu).put(update_menu).delete(delete_menu))
        .route("/restaurants", get(list_restaurants))
        .route("/tags", get(list_tags))
        .route("/users/{id}", get(get_user))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn authorize(db: &Db, query: &TokenQuery) -> Result<(), Rejection> {
    let store = db.read().await;
    match &query.token {
        Some(token) if store.tokens.contains(token) => Ok(()),
        Some(_) => Err(reject(StatusCode::UNAUTHORIZED, "invalid token")),
        None => Err(reject(StatusCode::UNAUTHORIZED, "token required")),
    }
}

async fn login_basic(
    State(db): State<Db>,
    Json(input): Json<Credentials>,
) -> Result<Json<LoginResponse>, Rejection> {
    if input.username != DEMO_USERNAME || input.password != DEMO_PASSWORD {
        debug!(username = %input.username, "login refused");
        return Err(reject(StatusCode::UNAUTHORIZED, "bad credentials"));
    }
    let token = Uuid::new_v4().to_string();
    db.write().await.tokens.insert(token.clone());
    info!(username = %input.username, "login accepted");
    Ok(Json(LoginResponse { token }))
}

async fn list_menus(
    State(db): State<Db>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<Vec<Menu>>, Rejection> {
    authorize(&db, &query).await?;
    let store = db.read().await;
    Ok(Json(store.menus.values().cloned().collect()))
}

async fn get_menu(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<Menu>, Rejection> {
    authorize(&db, &query).await?;
    let store = db.read().await;
    store
        .menus
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "no such menu"))
}

async fn update_menu(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Query(query): Query<TokenQuery>,
    Json(input): Json<UpdateMenu>,
) -> Result<Json<Menu>, Rejection> {
    authorize(&db, &query).await?;
    let mut store = db.write().await;
    let menu = store
        .menus
        .get_mut(&id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "no such menu"))?;
    if let Some(name) = input.name {
        menu.name = name;
    }
    if let Some(items) = input.items {
        menu.items = items;
    }
    Ok(Json(menu.clone()))
}

async fn delete_menu(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Query(query): Query<TokenQuery>,
) -> Result<StatusCode, Rejection> {
    authorize(&db, &query).await?;
    let mut store = db.write().await;
    store
        .menus
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "no such menu"))
}

async fn list_restaurants(
    State(db): State<Db>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<Vec<Restaurant>>, Rejection> {
    authorize(&db, &query).await?;
    Ok(Json(db.read().await.restaurants.clone()))
}

async fn list_tags(
    State(db): State<Db>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<Vec<Tag>>, Rejection> {
    authorize(&db, &query).await?;
    Ok(Json(db.read().await.tags.clone()))
}

async fn get_user(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<User>, Rejection> {
    authorize(&db, &query).await?;
    let store = db.read().await;
    store
        .users
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "no such user"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_store_has_fixtures() {
        let store = Store::seeded();
        assert_eq!(store.menus.len(), 2);
        assert_eq!(store.restaurants.len(), 2);
        assert_eq!(store.tags.len(), 2);
        assert!(store.users.contains_key(&1));
        assert!(store.tokens.is_empty());
    }

    #[test]
    fn menu_serializes_to_json() {
        let menu = Store::seeded().menus.remove(&1).unwrap();
        let json = serde_json::to_value(&menu).unwrap();
        assert_eq!(json["name"], "Breakfast");
        assert_eq!(json["restaurant_id"], 1);
        assert_eq!(json["items"][1], "toast");
    }

    #[test]
    fn update_menu_ignores_unknown_fields() {
        let input: UpdateMenu =
            serde_json::from_str(r#"{"name":"Brunch","token":"abc"}"#).unwrap();
        assert_eq!(input.name.as_deref(), Some("Brunch"));
        assert!(input.items.is_none());
    }

    #[test]
    fn credentials_require_both_fields() {
        let result: Result<Credentials, _> = serde_json::from_str(r#"{"username":"demo"}"#);
        assert!(result.is_err());
    }
}
