use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use layers::{hover_readout, satellite_markers, OverlayFrame, SatellitePosition};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::AppState;

fn api_error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message.into() })))
}

pub async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

pub async fn get_status(State(state): State<AppState>) -> Json<Value> {
    Json(status_body(&state))
}

fn status_body(state: &AppState) -> Value {
    let feed = state.poller.task();
    let snapshot = feed.cache().latest();
    let horizons: Vec<u32> = feed
        .orchestrator()
        .horizons()
        .iter()
        .map(|h| h.hours())
        .collect();
    json!({
        "enabled": state.poller.is_running(),
        "inflight": feed.orchestrator().inflight().len(),
        "horizons": horizons,
        "pollIntervalMs": state.poller.interval().as_millis() as u64,
        "cycles": state.poller.stats(),
        "snapshot": {
            "cycle": snapshot.cycle,
            "cells": snapshot.cell_count(),
            "features": snapshot.feature_count(),
        },
    })
}

pub async fn get_snapshot(State(state): State<AppState>) -> Response {
    let snapshot = state.poller.task().cache().latest();
    Json(snapshot.as_ref().clone()).into_response()
}

pub async fn get_frame(State(state): State<AppState>) -> Json<OverlayFrame> {
    let snapshot = state.poller.task().cache().latest();
    let mut frame = state.renderer.render(&snapshot, state.started.elapsed());
    let highlighted = state.highlighted.read().clone();
    frame.satellites = satellite_markers(&state.satellites.read(), highlighted.as_deref());
    Json(frame)
}

#[derive(Debug, Deserialize)]
pub struct EnabledBody {
    pub enabled: bool,
}

pub async fn set_enabled(
    State(state): State<AppState>,
    Json(body): Json<EnabledBody>,
) -> Json<Value> {
    if state.poller.set_enabled(body.enabled) {
        info!(enabled = body.enabled, "forecast overlay toggled");
    }
    Json(status_body(&state))
}

pub async fn put_satellites(
    State(state): State<AppState>,
    Json(positions): Json<Vec<SatellitePosition>>,
) -> Json<Value> {
    let count = positions.len();
    *state.satellites.write() = positions;
    Json(json!({ "count": count }))
}

#[derive(Debug, Deserialize)]
pub struct HighlightBody {
    #[serde(default)]
    pub name: Option<String>,
}

pub async fn set_highlight(
    State(state): State<AppState>,
    Json(body): Json<HighlightBody>,
) -> Response {
    *state.highlighted.write() = body.name;
    get_highlight(State(state)).await
}

pub async fn get_highlight(State(state): State<AppState>) -> Response {
    let Some(name) = state.highlighted.read().clone() else {
        return Json(json!({ "name": null, "readout": null })).into_response();
    };
    let satellites = state.satellites.read();
    match satellites.iter().find(|s| s.name == name) {
        Some(sat) => Json(json!({ "name": name, "readout": hover_readout(sat) })).into_response(),
        None => api_error(
            StatusCode::NOT_FOUND,
            format!("satellite {name:?} is not tracked"),
        )
        .into_response(),
    }
}
