// src/handlers.rs
use crate::{AppState, errors::ShelfScanError, models::*};
use crate::pipeline::batch_intake;
use crate::services::{FileDownloadSink, ImageProcessor};
use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, web};
use futures_util::TryStreamExt;
use log::{error, info};
use uuid::Uuid;

const SCAN_FAILED: &str = "Failed to analyze. Ensure the item or barcode is clearly visible.";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/scan", web::post().to(scan_image))
            .route("/stock", web::get().to(list_stock))
            .route("/stock", web::delete().to(clear_stock))
            .route("/stock/scan", web::post().to(scan_into_stock))
            .route("/stock/batch", web::post().to(run_stock_batch))
            .route("/stock/progress", web::get().to(batch_progress))
            .route("/stock/{entry_id}", web::patch().to(update_stock_entry))
            .route("/stock/{entry_id}", web::delete().to(delete_stock_entry))
            .route("/settings/reminder", web::get().to(get_reminder))
            .route("/settings/reminder", web::put().to(save_reminder))
            .route("/enhance", web::post().to(start_enhance))
            .route("/enhance/{session_id}", web::get().to(get_enhance))
            .route("/enhance/{session_id}", web::delete().to(reset_enhance))
            .route("/enhance/{session_id}/download", web::post().to(download_all))
            .route(
                "/enhance/{session_id}/styles/{style_id}",
                web::post().to(generate_style),
            )
            .route(
                "/enhance/{session_id}/styles/{style_id}/image",
                web::get().to(style_image),
            ),
    )
    .route("/health", web::get().to(health_check));
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "shelfscan",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Reads up to `max_images` image fields. Field `max_images + 1` is rejected
/// before its body is read.
async fn read_images<F>(
    payload: &mut Multipart,
    data: &AppState,
    max_images: usize,
    too_many: F,
) -> Result<Vec<CapturedImage>, Error>
where
    F: Fn(usize) -> ShelfScanError,
{
    let mut images = Vec::new();

    while let Some(mut field) = payload.try_next().await? {
        if images.len() == max_images {
            return Err(too_many(max_images).into());
        }
        let content_disposition = field.content_disposition();
        let filename = content_disposition
            .get_filename()
            .ok_or_else(|| ShelfScanError::Validation("No filename provided".to_string()))?
            .to_string();

        // Collect image data
        let mut image_data = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            image_data.extend_from_slice(&chunk);
        }

        images.push(data.image_processor.capture(filename, image_data)?);
    }

    Ok(images)
}

async fn read_single_image(payload: &mut Multipart, data: &AppState) -> Result<CapturedImage, Error> {
    let images = read_images(payload, data, 1, |_| {
        ShelfScanError::Validation("Only one image can be scanned at a time".to_string())
    })
    .await?;

    images
        .into_iter()
        .next()
        .ok_or_else(|| ShelfScanError::Validation("No image provided".to_string()).into())
}

fn scan_failed(e: ShelfScanError) -> ShelfScanError {
    match e {
        ShelfScanError::LLM(reason) => {
            error!("Analysis failed: {}", reason);
            ShelfScanError::LLM(SCAN_FAILED.to_string())
        }
        other => other,
    }
}

pub async fn scan_image(mut payload: Multipart, data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let image = read_single_image(&mut payload, &data).await?;
    let analysis = data.analyzer.analyze(&image).await.map_err(scan_failed)?;

    Ok(HttpResponse::Ok().json(&analysis))
}

pub async fn list_stock(data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let entries = data.store.list().await?;
    let summary = StockSummary::from_entries(&entries);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "entries": entries,
        "summary": summary
    })))
}

pub async fn scan_into_stock(
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let image = read_single_image(&mut payload, &data).await?;
    let entry = data.intake.scan_one(&image).await.map_err(scan_failed)?;
    let notice = Notice::Success(entry.product_name.clone());

    Ok(HttpResponse::Created().json(serde_json::json!({
        "entry": entry,
        "notice": notice
    })))
}

pub async fn run_stock_batch(
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let images = read_images(
        &mut payload,
        &data,
        data.intake.max_images(),
        batch_intake::limit_reached,
    )
    .await?;
    let outcome = data.intake.run_batch(images).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "outcome": outcome,
        "notice": outcome.notice()
    })))
}

pub async fn batch_progress(data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(data.intake.status()))
}

pub async fn update_stock_entry(
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
    body: web::Json<EntryUpdate>,
) -> Result<HttpResponse, Error> {
    let entry = data.store.update(path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(&entry))
}

pub async fn delete_stock_entry(
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    data.store.delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn clear_stock(data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    data.store.clear().await?;
    info!("Stock cleared");
    Ok(HttpResponse::NoContent().finish())
}

pub async fn get_reminder(data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(data.settings.load().await))
}

pub async fn save_reminder(
    data: web::Data<AppState>,
    body: web::Json<ReminderSettings>,
) -> Result<HttpResponse, Error> {
    let settings = body.into_inner();
    data.settings.save(&settings).await?;
    Ok(HttpResponse::Ok().json(&settings))
}

fn image_prefix(session_id: &Uuid) -> String {
    format!("/api/v1/enhance/{}/styles", session_id)
}

pub async fn start_enhance(
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let image = read_single_image(&mut payload, &data).await?;
    let session = data.variants.open(image);
    data.sessions.insert(session.clone()).await;
    info!("Opened gallery session {}", session.id);

    // Detection and the automatic styles continue after the response.
    let variants = data.variants.clone();
    let background = session.clone();
    tokio::spawn(async move {
        variants.detect_and_launch(&background).await;
    });

    let snapshot = session.snapshot(data.variants.catalog()).await;
    Ok(HttpResponse::Accepted().json(snapshot.with_image_urls(&image_prefix(&session.id))))
}

pub async fn get_enhance(path: web::Path<Uuid>, data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let session = data.sessions.get(&path.into_inner()).await?;
    let snapshot = session.snapshot(data.variants.catalog()).await;
    Ok(HttpResponse::Ok().json(snapshot.with_image_urls(&image_prefix(&session.id))))
}

pub async fn reset_enhance(path: web::Path<Uuid>, data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let session_id = path.into_inner();
    data.sessions
        .remove(&session_id)
        .await
        .ok_or_else(|| ShelfScanError::NotFound(format!("gallery session {}", session_id)))?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn generate_style(
    path: web::Path<(Uuid, String)>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let (session_id, style_id) = path.into_inner();
    let session = data.sessions.get(&session_id).await?;

    let started = data.variants.generate_one(&session, &style_id).await?.is_some();
    let snapshot = session.snapshot(data.variants.catalog()).await;
    let body = serde_json::json!({
        "started": started,
        "session": snapshot.with_image_urls(&image_prefix(&session_id))
    });

    if started {
        Ok(HttpResponse::Accepted().json(body))
    } else {
        Ok(HttpResponse::Ok().json(body))
    }
}

pub async fn style_image(
    path: web::Path<(Uuid, String)>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let (session_id, style_id) = path.into_inner();
    let session = data.sessions.get(&session_id).await?;

    let image = session
        .job(&style_id)
        .await
        .and_then(|job| job.image().cloned())
        .ok_or_else(|| ShelfScanError::NotFound(format!("generated image for {}", style_id)))?;

    Ok(HttpResponse::Ok()
        .content_type(ImageProcessor::content_type_for(&image))
        .body(image))
}

pub async fn download_all(path: web::Path<Uuid>, data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let session_id = path.into_inner();
    let session = data.sessions.get(&session_id).await?;

    let sink = FileDownloadSink::new(data.export_dir.join(session_id.to_string()));
    let saved = data.variants.download_all(&session, &sink).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "saved": saved,
        "directory": sink.dir().display().to_string()
    })))
}
