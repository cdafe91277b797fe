//! Builds the collaborators from configuration and runs one flow to completion.
use crate::{DiscoverArgs, OutputFormat, RegistryArgs};
use anyhow::{Context, Result};
use scout_common::RetryPolicy;
use scout_config::{require_value, GeocodingConfig, LlmConfig, ScoutConfig};
use scout_geo::GoogleGeocoder;
use scout_llm::{ActivityClassifier, OllamaClient};
use scout_registry::{read_rows_from_path, render_json, render_table, RegistryEnricher};
use scout_social::{find_users, InstagramClient};
use std::sync::Arc;

fn build_geocoder(cfg: &GeocodingConfig) -> Result<GoogleGeocoder> {
    let api_key = require_value("geocoding.api_key", &cfg.api_key)?;
    let geocoder = GoogleGeocoder::with_base_url(&cfg.base_url, api_key.to_string())?;
    Ok(match &cfg.region {
        Some(region) => geocoder.with_region(region.clone()),
        None => geocoder,
    })
}

async fn build_classifier(cfg: &LlmConfig) -> Result<ActivityClassifier> {
    let endpoint = require_value("llm.endpoint", &cfg.endpoint)?;
    let client = OllamaClient::new(endpoint)?;
    if cfg.prepare_model {
        client.prepare(&cfg.model).await;
    }

    let mut classifier = ActivityClassifier::new(Arc::new(client))
        .with_model(&cfg.model)
        .with_keep_alive(&cfg.keep_alive)
        .with_temperature(cfg.temperature)
        .with_policy(RetryPolicy::default().with_max_attempts(cfg.attempts));
    if let Some(prompt) = &cfg.system_prompt {
        classifier = classifier.with_system_prompt(prompt);
    }
    Ok(classifier)
}

pub async fn run_registry(cfg: &ScoutConfig, args: &RegistryArgs) -> Result<()> {
    let geocoder = build_geocoder(&cfg.geocoding)?;
    let classifier = build_classifier(&cfg.llm).await?;

    let path = args
        .input
        .clone()
        .unwrap_or_else(|| cfg.registry.input_path.clone());
    let rows = read_rows_from_path(
        &path,
        &cfg.registry.columns,
        cfg.registry.separator,
        args.row_limit(cfg.registry.row_limit),
    )
    .with_context(|| format!("reading registry export {}", path.display()))?;

    let enricher = RegistryEnricher::new(
        Arc::new(geocoder),
        classifier,
        cfg.registry.commercial_types.clone(),
    );
    let enriched = enricher.enrich(rows).await;

    match args.format {
        OutputFormat::Table => print!("{}", render_table(&enriched)),
        OutputFormat::Json => println!("{}", render_json(&enriched)?),
    }
    Ok(())
}

pub async fn run_discover(cfg: &ScoutConfig, args: &DiscoverArgs) -> Result<()> {
    let ig = &cfg.instagram;
    let username = require_value("instagram.username", &ig.username)?;
    let password = require_value("instagram.password", &ig.password)?;

    let mut client = InstagramClient::with_base_url(&ig.base_url)?;
    client
        .login(username, password)
        .await
        .context("Instagram login failed")?;

    let hashtag = args.hashtag.as_deref().unwrap_or(&ig.base_hashtag);
    let amount = args.max_posts.unwrap_or(ig.max_posts);
    let users = find_users(&client, hashtag, &ig.search_hashtags, &ig.search_texts, amount)
        .await
        .with_context(|| format!("fetching top posts for #{hashtag}"))?;

    println!("Matching users:");
    for user in &users {
        println!("{user}");
    }
    Ok(())
}
