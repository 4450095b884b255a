// src/pipeline/variants.rs
use bytes::Bytes;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::errors::ShelfScanError;
use crate::models::CapturedImage;
use crate::pipeline::job::{JobStatus, StyleJob};
use crate::pipeline::styles::{StyleCatalog, StyleDefinition};
use crate::services::{DownloadSink, ImageEnhancer, ImageProcessor, ProductAnalyzer};

/// Subject used when detection fails.
pub const FALLBACK_SUBJECT: &str = "Item";

const SUBJECT_FILENAME_CHARS: usize = 15;

/// One source photo and the per-style jobs generated from it.
pub struct VariantSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    source: CapturedImage,
    subject: RwLock<Option<String>>,
    jobs: RwLock<Vec<StyleJob>>,
}

impl VariantSession {
    fn new(source: CapturedImage, catalog: &StyleCatalog) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            source,
            subject: RwLock::new(None),
            jobs: RwLock::new(catalog.iter().map(|s| StyleJob::new(s.id, s.auto)).collect()),
        }
    }

    pub fn source(&self) -> &CapturedImage {
        &self.source
    }

    pub async fn subject(&self) -> Option<String> {
        self.subject.read().await.clone()
    }

    pub async fn jobs(&self) -> Vec<StyleJob> {
        self.jobs.read().await.clone()
    }

    pub async fn job(&self, style_id: &str) -> Option<StyleJob> {
        self.jobs.read().await.iter().find(|j| j.style_id == style_id).cloned()
    }

    /// Applies `change` to the job with `style_id` only. Sibling jobs are
    /// never rewritten, so results landing in any order commute.
    async fn update_job<F>(&self, style_id: &str, change: F) -> Result<(), ShelfScanError>
    where
        F: FnOnce(&mut StyleJob) -> Result<(), ShelfScanError>,
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .iter_mut()
            .find(|j| j.style_id == style_id)
            .ok_or_else(|| ShelfScanError::NotFound(format!("style {}", style_id)))?;
        change(job)
    }

    pub async fn snapshot(&self, catalog: &StyleCatalog) -> SessionSnapshot {
        let subject = self.subject().await;
        let jobs = self
            .jobs
            .read()
            .await
            .iter()
            .filter_map(|job| {
                let style = catalog.get(job.style_id)?;
                Some(JobView {
                    style_id: style.id,
                    label: style.label,
                    description: style.description,
                    auto: style.auto,
                    status: job.status(),
                    image_url: None,
                })
            })
            .collect();

        SessionSnapshot {
            id: self.id,
            analyzing: subject.is_none(),
            subject,
            jobs,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub style_id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub auto: bool,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub subject: Option<String>,
    pub analyzing: bool,
    pub jobs: Vec<JobView>,
}

impl SessionSnapshot {
    /// Points completed jobs at `{prefix}/{style_id}/image`.
    pub fn with_image_urls(mut self, prefix: &str) -> Self {
        for job in &mut self.jobs {
            if job.status == JobStatus::Completed {
                job.image_url = Some(format!("{}/{}/image", prefix, job.style_id));
            }
        }
        self
    }

    #[cfg(test)]
    pub fn completed_count(&self) -> usize {
        self.jobs.iter().filter(|j| j.status == JobStatus::Completed).count()
    }
}

/// A started session plus its automatic jobs' task handles. Dropping the
/// handles detaches the jobs; they keep running.
pub struct Launch {
    pub session: Arc<VariantSession>,
    pub handles: Vec<JoinHandle<()>>,
}

pub struct VariantOrchestrator {
    analyzer: Arc<dyn ProductAnalyzer>,
    enhancer: Arc<dyn ImageEnhancer>,
    catalog: Arc<StyleCatalog>,
    download_delay: Duration,
}

impl VariantOrchestrator {
    pub fn new(
        analyzer: Arc<dyn ProductAnalyzer>,
        enhancer: Arc<dyn ImageEnhancer>,
        catalog: Arc<StyleCatalog>,
        download_delay: Duration,
    ) -> Self {
        Self {
            analyzer,
            enhancer,
            catalog,
            download_delay,
        }
    }

    pub fn catalog(&self) -> &StyleCatalog {
        &self.catalog
    }

    /// New session: automatic styles `pending`, the rest `idle`.
    pub fn open(&self, image: CapturedImage) -> Arc<VariantSession> {
        Arc::new(VariantSession::new(image, &self.catalog))
    }

    /// Detects the subject, then fans out the automatic styles.
    pub async fn start(&self, image: CapturedImage) -> Launch {
        let session = self.open(image);
        let handles = self.detect_and_launch(&session).await;
        Launch { session, handles }
    }

    pub async fn detect_and_launch(&self, session: &Arc<VariantSession>) -> Vec<JoinHandle<()>> {
        let subject = self.detect_subject(session).await;
        self.launch_automatic(session, &subject).await
    }

    pub async fn detect_subject(&self, session: &VariantSession) -> String {
        let subject = match self.analyzer.analyze(session.source()).await {
            Ok(analysis) => analysis.subject_label(),
            Err(e) => {
                warn!("Subject detection failed for session {}: {}", session.id, e);
                FALLBACK_SUBJECT.to_string()
            }
        };
        info!("Session {} subject: {}", session.id, subject);
        *session.subject.write().await = Some(subject.clone());
        subject
    }

    /// Moves every `pending` job to `processing` and starts one task per
    /// automatic style. Nothing waits on the tasks.
    pub async fn launch_automatic(
        &self,
        session: &Arc<VariantSession>,
        subject: &str,
    ) -> Vec<JoinHandle<()>> {
        let mut launched = Vec::new();
        {
            let mut jobs = session.jobs.write().await;
            for job in jobs.iter_mut() {
                if job.launch().is_ok() {
                    launched.push(job.style_id);
                }
            }
        }

        self.catalog
            .automatic()
            .filter(|style| launched.contains(&style.id))
            .map(|style| self.spawn_job(session.clone(), *style, subject.to_string()))
            .collect()
    }

    /// Generates an `idle` style or retries an `error` one. Returns `None`
    /// while the session has no subject yet.
    pub async fn generate_one(
        &self,
        session: &Arc<VariantSession>,
        style_id: &str,
    ) -> Result<Option<JoinHandle<()>>, ShelfScanError> {
        let Some(subject) = session.subject().await else {
            debug!("Ignoring {} for session {}: subject not detected yet", style_id, session.id);
            return Ok(None);
        };
        let style = *self
            .catalog
            .get(style_id)
            .ok_or_else(|| ShelfScanError::NotFound(format!("style {}", style_id)))?;

        session.update_job(style.id, StyleJob::begin).await?;
        Ok(Some(self.spawn_job(session.clone(), style, subject)))
    }

    fn spawn_job(
        &self,
        session: Arc<VariantSession>,
        style: StyleDefinition,
        subject: String,
    ) -> JoinHandle<()> {
        let enhancer = self.enhancer.clone();

        tokio::spawn(async move {
            let prompt = style.render_prompt(&subject);
            let result = enhancer.enhance(session.source(), &prompt).await;

            let applied = session
                .update_job(style.id, |job| match result {
                    Ok(image) => job.complete(image),
                    Err(e) => {
                        warn!("Failed to generate {}: {}", style.id, e);
                        job.fail()
                    }
                })
                .await;

            if let Err(e) = applied {
                warn!("Discarding result for {} in session {}: {}", style.id, session.id, e);
            }
        })
    }

    /// Saves every completed image in catalog order, pausing between saves.
    pub async fn download_all(
        &self,
        session: &VariantSession,
        sink: &dyn DownloadSink,
    ) -> Result<usize, ShelfScanError> {
        let subject = session.subject().await;
        let completed: Vec<(&'static str, Bytes)> = session
            .jobs
            .read()
            .await
            .iter()
            .filter_map(|job| job.image().map(|image| (job.style_id, image.clone())))
            .collect();

        for (index, (style_id, image)) in completed.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.download_delay).await;
            }
            let label = self.catalog.get(style_id).map_or(*style_id, |s| s.label);
            let filename = download_filename(
                subject.as_deref(),
                label,
                ImageProcessor::extension_for(image),
            );
            sink.save(&filename, image).await?;
        }

        Ok(completed.len())
    }
}

/// Whitespace runs become `_`; anything but alphanumerics, `_` and `-` is dropped.
fn filename_part(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | '-'))
        .collect()
}

/// `{subject}_{style}.{ext}` with the subject cut to 15 characters.
pub fn download_filename(subject: Option<&str>, style_label: &str, extension: &str) -> String {
    let subject: String = subject
        .map(filename_part)
        .unwrap_or_default()
        .chars()
        .take(SUBJECT_FILENAME_CHARS)
        .collect();
    let subject = if subject.is_empty() { "enhanced".to_string() } else { subject };

    format!("{}_{}.{}", subject, filename_part(style_label), extension)
}

/// Gallery sessions held in memory between requests. Sessions older than
/// the time-to-live are evicted by [`SessionRegistry::evict_expired`].
pub struct SessionRegistry {
    ttl: Duration,
    sessions: RwLock<HashMap<Uuid, Arc<VariantSession>>>,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, session: Arc<VariantSession>) {
        self.sessions.write().await.insert(session.id, session);
    }

    pub async fn get(&self, id: &Uuid) -> Result<Arc<VariantSession>, ShelfScanError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ShelfScanError::NotFound(format!("gallery session {}", id)))
    }

    pub async fn remove(&self, id: &Uuid) -> Option<Arc<VariantSession>> {
        self.sessions.write().await.remove(id)
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops every session created at least `ttl` before `now`.
    pub async fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| {
            now.signed_duration_since(session.created_at)
                .to_std()
                .map_or(true, |age| age < self.ttl)
        });
        before - sessions.len()
    }
}

/// Evicts expired sessions every `period`.
pub async fn run_session_sweeper(registry: Arc<SessionRegistry>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        let evicted = registry.evict_expired(Utc::now()).await;
        if evicted > 0 {
            info!(
                "Evicted {} expired gallery sessions, {} remain",
                evicted,
                registry.count().await
            );
        }
    }
}
