//! Track submission to the media package service.

use crate::client::MediaPackageClient;
use crate::server::{AppContext, AppError};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use ocbridge_common::Error;
use ocbridge_db::pool::get_conn;
use serde::Deserialize;

pub fn mediapackage_routes() -> Router<AppContext> {
    Router::new().route("/mediapackage/tracks", post(add_track))
}

#[derive(Deserialize)]
struct AddTrackRequest {
    mediapackage: String,
    track_uri: String,
    flavor: String,
}

async fn add_track(
    State(ctx): State<AppContext>,
    Json(req): Json<AddTrackRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.mediapackage.trim().is_empty() {
        return Err(Error::invalid_input("mediapackage cannot be empty").into());
    }
    if req.track_uri.trim().is_empty() {
        return Err(Error::invalid_input("track_uri cannot be empty").into());
    }
    if req.flavor.trim().is_empty() {
        return Err(Error::invalid_input("flavor cannot be empty").into());
    }

    let client = {
        let conn = get_conn(&ctx.db_pool)?;
        MediaPackageClient::from_store(&conn, ctx.reconciler.config_id(), ctx.http_timeout())?
    };

    match client
        .add_track(&req.mediapackage, &req.track_uri, &req.flavor)
        .await
    {
        Some(media_package) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/xml")],
            media_package.into_xml(),
        )),
        None => Err(Error::remote("Media package service did not accept the track").into()),
    }
}
