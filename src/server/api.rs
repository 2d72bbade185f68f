use crate::agent::ChefAgent;
use crate::error::ChefError;
use crate::models::recipe::{ MealCategory, Recipe };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    routing::{ get, post },
    Router,
    extract::State,
    response::{ IntoResponse, Response },
    http::StatusCode,
    Json,
};
use serde::{ Deserialize, Serialize };
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, error };

#[derive(Deserialize)]
pub struct IdeasRequest {
    pub ingredients: String,
    pub category: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct IdeasResponse {
    pub success: bool,
    pub message: String,
    pub category: Option<String>,
    pub recipes: Vec<Recipe>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SurpriseResponse {
    pub success: bool,
    pub message: String,
    pub recipe: Option<Recipe>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub diet_profile: String,
}

#[derive(Clone)]
struct AppState {
    agent: Arc<ChefAgent>,
}

fn error_status(err: &ChefError) -> StatusCode {
    match err {
        ChefError::Upstream(_) => StatusCode::BAD_GATEWAY,
        ChefError::NotFound(_) => StatusCode::NOT_FOUND,
        ChefError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn router(agent: Arc<ChefAgent>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/ideas", post(ideas_handler))
        .route("/api/surprise", post(surprise_handler))
        .layer(cors)
        .with_state(AppState { agent })
}

pub async fn start_http_server(
    http_port: u16,
    agent: Arc<ChefAgent>
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = format!("0.0.0.0:{}", http_port).parse::<SocketAddr>()?;
    info!("Starting HTTP API server on: http://{}", addr);

    let app = router(agent);
    tokio::spawn(async move {
        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                    error!("HTTP server error: {}", e);
                }
            }
            Err(e) => {
                error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
            }
        }
    });

    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        diet_profile: state.agent.policy().name.clone(),
    })
}

async fn ideas_handler(State(state): State<AppState>, Json(req): Json<IdeasRequest>) -> Response {
    let category: MealCategory = match req.category.parse() {
        Ok(c) => c,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(IdeasResponse {
                    success: false,
                    message: format!("{}", e),
                    category: None,
                    recipes: Vec::new(),
                }),
            ).into_response();
        }
    };

    match state.agent.suggest_meals(&req.ingredients, category).await {
        Ok(recipes) => {
            let message = if recipes.is_empty() {
                format!("No {} meal ideas found! Try adding more ingredients.", category.as_str())
            } else {
                format!("{} {} meal suggestion(s)", recipes.len(), category.as_str())
            };
            (
                StatusCode::OK,
                Json(IdeasResponse {
                    success: true,
                    message,
                    category: Some(category.to_string()),
                    recipes,
                }),
            ).into_response()
        }
        Err(e) => {
            error!("Ideas request failed: {}", e);
            (
                error_status(&e),
                Json(IdeasResponse {
                    success: false,
                    message: e.to_string(),
                    category: Some(category.to_string()),
                    recipes: Vec::new(),
                }),
            ).into_response()
        }
    }
}

async fn surprise_handler(State(state): State<AppState>) -> Response {
    match state.agent.random_recipe().await {
        Ok(recipe) =>
            (
                StatusCode::OK,
                Json(SurpriseResponse {
                    success: true,
                    message: format!("How about {}?", recipe.title),
                    recipe: Some(recipe),
                }),
            ).into_response(),
        Err(e) =>
            (
                error_status(&e),
                Json(SurpriseResponse {
                    success: false,
                    message: e.to_string(),
                    recipe: None,
                }),
            ).into_response(),
    }
}
