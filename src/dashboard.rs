// src/dashboard.rs
// Auto-refreshing chart page served over HTTP.
use crate::chart::{render_error, render_html};
use crate::error::{PipelineError, Result};
use crate::pipeline::{Pipeline, Request};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

pub struct DashboardState {
    pub pipeline: Pipeline,
    pub request: Request,
}

pub fn router(state: Arc<DashboardState>) -> Router {
    Router::new()
        .route("/", get(chart_page))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Serve the dashboard on `settings.dashboard_bind` until the process stops
pub async fn serve(pipeline: Pipeline, request: Request) -> Result<()> {
    let bind = pipeline.settings().dashboard_bind.clone();
    let listener = TcpListener::bind(&bind)
        .await
        .map_err(|e| PipelineError::Config(format!("cannot bind {}: {}", bind, e)))?;

    info!("Dashboard for {} listening on http://{}", request.ticker, bind);
    let app = router(Arc::new(DashboardState { pipeline, request }));

    axum::serve(listener, app)
        .await
        .map_err(|e| PipelineError::Render(format!("dashboard server stopped: {}", e)))
}

async fn health_check() -> &'static str {
    "ok"
}

// Every request re-runs the pipeline so the page tracks the provider
async fn chart_page(State(state): State<Arc<DashboardState>>) -> Response {
    let refresh = Some(state.pipeline.settings().refresh_secs);
    let ticker = &state.request.ticker;

    let page = match state.pipeline.process(&state.request).await {
        Ok(series) => render_html(&series, ticker, refresh),
        Err(e) => Err(e),
    };

    match page {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Dashboard refresh failed: {}", e);
            let body = render_error(ticker, &e, refresh).unwrap_or_else(|_| e.to_string());
            (StatusCode::BAD_GATEWAY, Html(body)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::StaticProvider;
    use crate::data::RawPriceSeries;
    use crate::pipeline::test_support::{settings_in, static_pipeline};

    async fn spawn(state: DashboardState) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(Arc::new(state))).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = static_pipeline(dir.path(), 30);
        let request = pipeline.default_request();
        let base = spawn(DashboardState { pipeline, request }).await;

        let body = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_chart_page_refreshes() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = static_pipeline(dir.path(), 30);
        let request = pipeline.default_request();
        let base = spawn(DashboardState { pipeline, request }).await;

        let response = reqwest::get(&base).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let html = response.text().await.unwrap();
        assert!(html.contains("AAPL Stock Analysis"));
        assert!(html.contains("<meta http-equiv=\"refresh\" content=\"60\">"));
    }

    #[tokio::test]
    async fn test_failed_refresh_is_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let provider = StaticProvider {
            series: RawPriceSeries::default(),
        };
        let pipeline = Pipeline::new(Arc::new(provider), settings_in(dir.path()));
        let request = pipeline.default_request();
        let base = spawn(DashboardState { pipeline, request }).await;

        let response = reqwest::get(&base).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);
        assert!(response.text().await.unwrap().contains("AAPL: data unavailable"));
    }
}
