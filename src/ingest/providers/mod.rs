// src/ingest/providers/mod.rs
pub mod courtlistener;
pub mod gdelt;
pub mod openstates;
pub mod propublica;

use anyhow::{Context, Result};
use metrics::{counter, histogram};
use serde_json::Value;

use crate::ingest::classify::Classifier;
use crate::ingest::config::{ApiKeys, IngestConfig, SourceCfg};
use crate::ingest::raw::array_at;
use crate::ingest::types::SourceProvider;

/// Where a provider gets its payload from.
pub(crate) enum Mode {
    /// Owned JSON payload (tests, demos, offline runs).
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
        /// `(header name, key)` sent with every request.
        api_key: Option<(&'static str, String)>,
    },
    /// Source switched off or missing its API key: yields zero records.
    Disabled,
}

impl Mode {
    pub(crate) fn http(url: String, client: reqwest::Client) -> Self {
        Mode::Http {
            url,
            client,
            api_key: None,
        }
    }

    /// HTTP mode that requires a key; without one the source is disabled.
    pub(crate) fn http_with_key(
        url: String,
        client: reqwest::Client,
        header: &'static str,
        key: Option<String>,
    ) -> Self {
        match key {
            Some(k) => Mode::Http {
                url,
                client,
                api_key: Some((header, k)),
            },
            None => Mode::Disabled,
        }
    }

    /// Fetch the payload and return the record array found at `path`.
    pub(crate) async fn load(&self, provider: &'static str, path: &[&str]) -> Result<Vec<Value>> {
        let t0 = std::time::Instant::now();
        let payload: Value = match self {
            Mode::Fixture(s) => {
                serde_json::from_str(s).with_context(|| format!("parsing {provider} fixture"))?
            }
            Mode::Http {
                url,
                client,
                api_key,
            } => {
                let mut req = client.get(url.as_str());
                if let Some((header, key)) = api_key {
                    req = req.header(*header, key.as_str());
                }
                let resp = match req.send().await {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!(error = ?e, provider, "provider http error");
                        return Err(e).with_context(|| format!("{provider} http get()"));
                    }
                };
                resp.error_for_status()
                    .with_context(|| format!("{provider} http status"))?
                    .json()
                    .await
                    .with_context(|| format!("{provider} http .json()"))?
            }
            Mode::Disabled => {
                tracing::debug!(target: "ingest", provider, "source disabled");
                return Ok(Vec::new());
            }
        };

        let records = array_at(&payload, path);
        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_fetch_ms", "provider" => provider).record(ms);
        counter!("ingest_fetched_total", "provider" => provider).increment(records.len() as u64);
        Ok(records)
    }
}

fn classifier_for(cfg: &SourceCfg, defaults: &[&str]) -> Result<Classifier> {
    match &cfg.keywords {
        Some(words) => Classifier::from_keywords(words.as_slice()),
        None => Classifier::from_keywords(defaults),
    }
}

/// Build the live HTTP providers enabled in `cfg`.
pub fn build_http_providers(
    cfg: &IngestConfig,
    keys: &ApiKeys,
) -> Result<Vec<Box<dyn SourceProvider>>> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("democracy-index/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(cfg.http_timeout_secs))
        .build()
        .context("building http client")?;

    let mut out: Vec<Box<dyn SourceProvider>> = Vec::new();

    if cfg.propublica.enabled {
        out.push(Box::new(propublica::ProPublicaProvider::from_url(
            cfg.propublica.url_or(propublica::DEFAULT_URL),
            client.clone(),
            keys.propublica.clone(),
            classifier_for(&cfg.propublica, propublica::DEFAULT_KEYWORDS)?,
        )));
    }
    if cfg.openstates.enabled {
        out.push(Box::new(openstates::OpenStatesProvider::from_url(
            cfg.openstates.url_or(openstates::DEFAULT_URL),
            client.clone(),
            keys.openstates.clone(),
            classifier_for(&cfg.openstates, openstates::DEFAULT_KEYWORDS)?,
        )));
    }
    if cfg.courtlistener.enabled {
        out.push(Box::new(courtlistener::CourtListenerProvider::from_url(
            cfg.courtlistener.url_or(courtlistener::DEFAULT_URL),
            client.clone(),
            classifier_for(&cfg.courtlistener, courtlistener::DEFAULT_KEYWORDS)?,
        )));
    }
    if cfg.gdelt.enabled {
        out.push(Box::new(gdelt::GdeltProvider::from_url(
            cfg.gdelt.url_or(gdelt::DEFAULT_URL),
            client,
            classifier_for(&cfg.gdelt, gdelt::DEFAULT_KEYWORDS)?,
        )));
    }

    Ok(out)
}
