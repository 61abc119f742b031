//! HTTP preview server: the single-page UI, an MJPEG stream of the
//! annotated feed, an SSE stream of glyph/score snapshots, and the
//! start/stop control pair.
//!
//! The server runs on a dedicated thread so the capture loop stays free of
//! runtime concerns; the two sides share only the panel and the signals.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use actix_web::{
    http::header,
    web::{self, Bytes},
    App, HttpResponse, HttpServer,
};
use anyhow::{Context, Result};
use async_stream::stream;
use log::error;

use crate::runner::Signals;

use super::html;
use super::state::{PanelSnapshot, SharedPanel};

const FRAME_INTERVAL: Duration = Duration::from_millis(33);
const EVENT_INTERVAL: Duration = Duration::from_millis(200);

struct ServerState {
    panel: SharedPanel,
    signals: Arc<Signals>,
}

/// Spawn the server thread. It serves until the process exits.
pub fn spawn(
    bind: &str,
    panel: SharedPanel,
    signals: Arc<Signals>,
) -> Result<thread::JoinHandle<()>> {
    let bind = bind.to_string();
    thread::Builder::new()
        .name("moodcam-ui".into())
        .spawn(move || {
            let result = actix_web::rt::System::new().block_on(async move {
                HttpServer::new(move || {
                    App::new()
                        .app_data(web::Data::new(ServerState {
                            panel: panel.clone(),
                            signals: signals.clone(),
                        }))
                        .route("/", web::get().to(index))
                        .route("/stream.mjpg", web::get().to(stream_mjpeg))
                        .route("/frame.jpg", web::get().to(latest_frame))
                        .route("/events", web::get().to(stream_events))
                        .route("/start", web::post().to(start))
                        .route("/stop", web::post().to(stop))
                })
                .bind(bind)?
                .run()
                .await
            });
            if let Err(err) = result {
                error!("UI server error: {err}");
            }
        })
        .context("spawning UI server thread")
}

async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html::INDEX_HTML)
}

async fn start(state: web::Data<ServerState>) -> HttpResponse {
    state.signals.request_start();
    HttpResponse::NoContent().finish()
}

async fn stop(state: web::Data<ServerState>) -> HttpResponse {
    state.signals.request_stop();
    HttpResponse::NoContent().finish()
}

fn current_jpeg(panel: &SharedPanel) -> Option<Vec<u8>> {
    panel.lock().ok().and_then(|guard| guard.jpeg.clone())
}

fn current_snapshot(panel: &SharedPanel) -> Option<PanelSnapshot> {
    panel.lock().ok().map(|guard| guard.snapshot())
}

/// Latest annotated frame as a single JPEG.
async fn latest_frame(state: web::Data<ServerState>) -> HttpResponse {
    match current_jpeg(&state.panel) {
        Some(jpeg) => HttpResponse::Ok().content_type("image/jpeg").body(jpeg),
        None => HttpResponse::NoContent().finish(),
    }
}

/// MJPEG multipart stream of the annotated feed.
async fn stream_mjpeg(state: web::Data<ServerState>) -> HttpResponse {
    let state = state.clone();
    let stream = stream! {
        let mut interval = actix_web::rt::time::interval(FRAME_INTERVAL);
        loop {
            interval.tick().await;
            if let Some(jpeg) = current_jpeg(&state.panel) {
                let mut payload = Vec::with_capacity(jpeg.len() + 64);
                payload.extend_from_slice(b"--frame\r\n");
                payload.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
                payload.extend_from_slice(&jpeg);
                payload.extend_from_slice(b"\r\n");
                yield Ok::<Bytes, actix_web::Error>(Bytes::from(payload));
            }
        }
    };

    HttpResponse::Ok()
        .append_header((header::CACHE_CONTROL, "no-cache"))
        .append_header((
            header::CONTENT_TYPE,
            "multipart/x-mixed-replace; boundary=frame",
        ))
        .streaming(stream)
}

/// Glyph, chart rows, and status as Server-Sent Events.
async fn stream_events(state: web::Data<ServerState>) -> HttpResponse {
    let state = state.clone();
    let stream = stream! {
        yield Ok::<Bytes, actix_web::Error>(Bytes::from_static(b"retry: 500\n\n"));
        let mut interval = actix_web::rt::time::interval(EVENT_INTERVAL);
        loop {
            interval.tick().await;
            match current_snapshot(&state.panel) {
                Some(snapshot) => match serde_json::to_string(&snapshot) {
                    Ok(json) => {
                        let chunk = format!(
                            "id: {}\ndata: {}\n\n",
                            snapshot.frame_number, json
                        );
                        yield Ok::<Bytes, actix_web::Error>(Bytes::from(chunk));
                    }
                    Err(err) => {
                        let chunk = format!("event: error\ndata: {err}\n\n");
                        yield Ok::<Bytes, actix_web::Error>(Bytes::from(chunk));
                    }
                },
                None => {
                    yield Ok::<Bytes, actix_web::Error>(Bytes::from_static(b": keep-alive\n\n"));
                }
            }
        }
    };

    HttpResponse::Ok()
        .append_header((header::CACHE_CONTROL, "no-cache"))
        .append_header((header::CONTENT_TYPE, "text/event-stream"))
        .append_header((header::CONNECTION, "keep-alive"))
        .streaming(stream)
}
