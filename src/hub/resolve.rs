//! Gateway resolution endpoint
//!
//! Fetches the gateway list for a repository, resolves every hostname and
//! answers with a full report, a plain IP list, or an Azure IP group.

use super::common::{ApiError, ApiResult, ResolveParams, ResponseFormat};
use super::AppState;
use crate::dns::{ResolutionRecord, ResultSet};
use crate::provider::parse_gateways;
use crate::render::{azure_ip_group, render_ip_list, timestamp};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

/// Full resolution report
#[derive(Debug, Serialize)]
pub struct ResolveResponse<'a> {
    pub generated_at: String,
    pub total_gateways: usize,
    pub successful: usize,
    pub failed: usize,
    pub unique_ips: usize,
    pub gateways: &'a [ResolutionRecord],
    pub all_ips: Vec<String>,
}

impl<'a> ResolveResponse<'a> {
    pub fn new(results: &'a ResultSet) -> Self {
        let all_ips = results.unique_ips();
        ResolveResponse {
            generated_at: timestamp(&Utc::now()),
            total_gateways: results.len(),
            successful: results.successful_count(),
            failed: results.failed_count(),
            unique_ips: all_ips.len(),
            gateways: results.records(),
            all_ips,
        }
    }
}

/// GET|POST /api/resolve_gateway_ips
pub async fn resolve_gateway_ips(
    State(state): State<AppState>,
    Query(query): Query<ResolveParams>,
    body: Bytes,
) -> ApiResult<Response> {
    info!("VPN gateway IP resolution triggered");

    let params = query.overridden_by_body(&body);
    let owner = params.owner.unwrap_or_else(|| state.owner.clone());
    let repo = params.repo.unwrap_or_else(|| state.repo.clone());
    let format = ResponseFormat::parse(params.format.as_deref());

    let content = state.source.fetch(&owner, &repo).await.map_err(|e| {
        warn!("Failed to fetch gateways.txt for {}/{}: {}", owner, repo, e);
        ApiError::internal(format!("Failed to fetch gateways.txt: {}", e))
    })?;

    let hostnames = parse_gateways(&content);
    let results = state
        .resolver
        .resolve_all(&hostnames, state.workers)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let response = match format {
        ResponseFormat::Ips => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            render_ip_list(&results),
        )
            .into_response(),
        ResponseFormat::Azure => {
            json_response(&azure_ip_group(&results, &state.ip_group_name, None))?
        }
        ResponseFormat::Json => json_response(&ResolveResponse::new(&results))?,
    };
    Ok(response)
}

/// Pretty-printed JSON body
fn json_response<T: Serialize>(value: &T) -> ApiResult<Response> {
    let body = serde_json::to_string_pretty(value).map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}
