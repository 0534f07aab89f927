use async_graphql::http::{playground_source, GraphQLPlaygroundConfig, ALL_WEBSOCKET_PROTOCOLS};
use async_graphql::Data;
use async_graphql_axum::{GraphQLProtocol, GraphQLRequest, GraphQLResponse, GraphQLWebSocket};
use axum::{
    extract::{State, WebSocketUpgrade},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use anyhow::{anyhow, Result};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::debug;

use super::handlers::health;
use crate::config::GatewayConfig;
use crate::graphql::{build_schema, ComposedSchema, ContextFactory};

#[derive(Clone)]
pub struct AppState {
    pub schema: ComposedSchema,
    pub contexts: ContextFactory,
}

pub async fn create_app(db: DatabaseConnection, config: &GatewayConfig) -> Result<Router> {
    let schema = build_schema()?;
    let contexts = ContextFactory::new(db, config.shows_api_root()?)?;
    create_router(AppState { schema, contexts }, config)
}

pub fn create_router(state: AppState, config: &GatewayConfig) -> Result<Router> {
    let cors = match config.cors_origin.as_deref() {
        Some(origin) => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<axum::http::HeaderValue>()
                    .map_err(|e| anyhow!("Invalid CORS origin: {}", e))?,
            )
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any),
    };

    let mut app = Router::new()
        .route("/health", get(health::health_check))
        .route("/graphql", post(graphql_handler))
        .route("/graphql/ws", get(graphql_ws_handler));

    if config.playground {
        app = app.route("/playground", get(graphql_playground));
    }

    Ok(app
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state))
}

async fn graphql_handler(State(state): State<AppState>, req: GraphQLRequest) -> GraphQLResponse {
    debug!("GraphQL request received");
    let request = req.into_inner().data(state.contexts.create());
    state.schema.execute(request).await.into()
}

async fn graphql_playground() -> impl IntoResponse {
    Html(playground_source(
        GraphQLPlaygroundConfig::new("/graphql").subscription_endpoint("/graphql/ws"),
    ))
}

/// One context per connection, attached when the client sends `connection_init`
async fn graphql_ws_handler(
    State(state): State<AppState>,
    protocol: GraphQLProtocol,
    upgrade: WebSocketUpgrade,
) -> Response {
    upgrade
        .protocols(ALL_WEBSOCKET_PROTOCOLS)
        .on_upgrade(move |socket| {
            let contexts = state.contexts.clone();
            GraphQLWebSocket::new(socket, state.schema.clone(), protocol)
                .on_connection_init(move |_payload| async move {
                    let mut data = Data::default();
                    data.insert(contexts.create());
                    Ok(data)
                })
                .serve()
        })
}
