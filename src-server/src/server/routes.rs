//! Training and prediction endpoints

use super::page::render_page;
use super::state::AppState;
use crate::error::CarPriceError;
use crate::pipeline::TrainPipeline;
use crate::predictor::CarData;
use axum::{
    Form, Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use tracing::{error, info, warn};

pub const TRAINING_SUCCESS: &str = "Training successful !!";

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/train", get(train))
        .route("/predict", get(predict_form).post(predict))
}

fn status_for(err: &CarPriceError) -> StatusCode {
    match err.error_code() {
        "INVALID_INPUT" => StatusCode::BAD_REQUEST,
        "MODEL_NOT_PUBLISHED" => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_json(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(serde_json::json!({
            "status": false,
            "error": message
        })),
    )
        .into_response()
}

/// Run the training pipeline once, synchronously.
async fn train(State(state): State<AppState>) -> Response {
    let Ok(_guard) = state.training.try_lock() else {
        return (
            StatusCode::CONFLICT,
            "Error Occurred! a training run is already in progress",
        )
            .into_response();
    };

    let pipeline_state = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        TrainPipeline::builder()
            .config(pipeline_state.config.as_ref().clone())
            .document_source(pipeline_state.source.clone())
            .object_store(pipeline_state.store.clone())
            .model_cache(pipeline_state.model_cache.clone())
            .on_progress(|update| {
                info!(
                    "[{}] {:.0}% {}",
                    update.stage,
                    update.progress * 100.0,
                    update.message
                )
            })
            .build()?
            .run()
    })
    .await;

    match result {
        Ok(Ok(run)) => {
            info!(
                "Training run in {} finished (published: {})",
                run.run_dir.display(),
                run.is_published()
            );
            (StatusCode::OK, TRAINING_SUCCESS).into_response()
        }
        Ok(Err(e)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error Occurred! {e}"),
        )
            .into_response(),
        Err(e) => {
            error!("Training task panicked: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error Occurred! {e}"),
            )
                .into_response()
        }
    }
}

/// The prediction form, listing the car names the published model knows.
async fn predict_form(State(state): State<AppState>) -> Response {
    let predictor = state.predictor.clone();
    let names = match tokio::task::spawn_blocking(move || predictor.car_names()).await {
        Ok(Ok(names)) => names,
        Ok(Err(e)) => {
            warn!("Could not read car names from the published model: {e}");
            Vec::new()
        }
        Err(e) => return error_json(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    Html(render_page(&names, None)).into_response()
}

async fn predict(State(state): State<AppState>, Form(car): Form<CarData>) -> Response {
    let predictor = state.predictor.clone();
    let result = tokio::task::spawn_blocking(move || {
        let price = predictor.predict(&car)?;
        let names = predictor.car_names()?;
        Ok::<_, CarPriceError>((price, names))
    })
    .await;

    match result {
        Ok(Ok((price, names))) => Html(render_page(&names, Some(price))).into_response(),
        Ok(Err(e)) => {
            warn!("Prediction failed: {e}");
            error_json(status_for(&e), e.to_string())
        }
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
