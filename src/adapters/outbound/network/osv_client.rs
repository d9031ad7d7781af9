use crate::ports::outbound::{BatchResponse, VulnerabilityDatabase};
use crate::scanning::domain::{
    AffectedPackage, PackageQuery, RawVulnerabilityRecord, SeverityDescriptor,
};
use crate::shared::error::ScanError;
use crate::shared::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const SERVICE: &str = "osv";

/// OSV API client for known-vulnerability lookups
///
/// Uses the OSV.dev batch query API. Requests are chunked at the service
/// limit and re-assembled in query order. The batch endpoint only returns
/// advisory identifiers, so bare records are hydrated from `/v1/vulns/{id}`.
///
/// # Security
/// - Every request carries a timeout
/// - Advisory ids are URL-encoded before being placed in a path
pub struct OsvClient {
    client: Client,
    api_url: String,
    chunk_size: usize,
    detail_concurrency: usize,
}

impl OsvClient {
    pub const DEFAULT_API_URL: &'static str = "https://api.osv.dev";
    const MAX_BATCH_SIZE: usize = 1000; // OSV API limit
    const DETAIL_CONCURRENCY: usize = 8;

    /// Creates a new client against `api_url` (scheme and host, no path)
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let user_agent = format!("reposcan/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            chunk_size: Self::MAX_BATCH_SIZE,
            detail_concurrency: Self::DETAIL_CONCURRENCY,
        })
    }

    /// Overrides the chunk size (clamped to the service limit)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(1, Self::MAX_BATCH_SIZE);
        self
    }

    /// Sends one chunk and returns its result sets, positionally aligned
    async fn fetch_chunk(&self, queries: &[&PackageQuery]) -> Result<Vec<Vec<RawVulnerabilityRecord>>> {
        let body = OsvBatchQuery {
            queries: queries
                .iter()
                .map(|q| OsvQuery {
                    package: OsvPackage {
                        name: q.name(),
                        ecosystem: q.ecosystem().as_str(),
                    },
                    version: q.version(),
                })
                .collect(),
        };

        let url = format!("{}/v1/querybatch", self.api_url);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScanError::upstream(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::upstream(SERVICE, format!("querybatch returned HTTP {}", status)).into());
        }

        let batch: OsvBatchResponse = response
            .json()
            .await
            .map_err(|e| ScanError::upstream(SERVICE, format!("invalid querybatch response: {}", e)))?;

        Ok(batch.results.into_iter().map(parse_result_entry).collect())
    }

    /// Fetches the full advisory for a bare record, keeping the bare one on failure
    async fn hydrate(&self, record: RawVulnerabilityRecord) -> RawVulnerabilityRecord {
        if !is_bare(&record) {
            return record;
        }
        match self.fetch_details(&record.id).await {
            Ok(detailed) => detailed,
            Err(e) => {
                tracing::warn!(advisory = %record.id, error = %e, "Failed to fetch advisory details");
                record
            }
        }
    }

    async fn fetch_details(&self, id: &str) -> Result<RawVulnerabilityRecord> {
        let url = format!("{}/v1/vulns/{}", self.api_url, urlencoding::encode(id));
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("OSV returned HTTP {} for advisory {}", response.status(), id);
        }
        let value: Value = response.json().await?;
        parse_vulnerability(value)
            .ok_or_else(|| anyhow::anyhow!("Advisory {} does not match the OSV schema", id))
    }

    /// Hydrates every record of every result set through one bounded stream
    ///
    /// Each detail request carries the client timeout on its own; a record
    /// whose hydration fails or times out stays bare.
    async fn hydrate_all(&self, results: Vec<Vec<RawVulnerabilityRecord>>) -> Vec<Vec<RawVulnerabilityRecord>> {
        let mut hydrated: Vec<Vec<RawVulnerabilityRecord>> =
            results.iter().map(|set| Vec::with_capacity(set.len())).collect();

        let keyed = results.into_iter().enumerate().flat_map(|(set, records)| {
            records
                .into_iter()
                .enumerate()
                .map(move |(index, record)| (set, index, record))
        });
        let mut records: Vec<(usize, usize, RawVulnerabilityRecord)> = stream::iter(keyed)
            .map(|(set, index, record)| async move { (set, index, self.hydrate(record).await) })
            .buffer_unordered(self.detail_concurrency)
            .collect()
            .await;

        records.sort_by_key(|(set, index, _)| (*set, *index));
        for (set, _, record) in records {
            hydrated[set].push(record);
        }
        hydrated
    }
}

#[async_trait]
impl VulnerabilityDatabase for OsvClient {
    async fn query_batch(&self, queries: &[PackageQuery]) -> Result<BatchResponse> {
        let mut results: Vec<Vec<RawVulnerabilityRecord>> = vec![Vec::new(); queries.len()];

        // Unpinned queries cannot be matched against affected versions
        let pinned: Vec<(usize, &PackageQuery)> = queries
            .iter()
            .enumerate()
            .filter(|(_, q)| q.is_pinned())
            .collect();
        if pinned.is_empty() {
            return Ok(BatchResponse {
                results,
                failed_chunks: 0,
            });
        }

        let chunks: Vec<&[(usize, &PackageQuery)]> = pinned.chunks(self.chunk_size).collect();
        let mut failed_chunks = 0;
        let mut last_error = None;

        for (chunk_index, chunk) in chunks.iter().enumerate() {
            let chunk_queries: Vec<&PackageQuery> = chunk.iter().map(|(_, q)| *q).collect();
            match self.fetch_chunk(&chunk_queries).await {
                Ok(sets) => {
                    if sets.len() != chunk.len() {
                        tracing::warn!(
                            chunk = chunk_index,
                            expected = chunk.len(),
                            received = sets.len(),
                            "OSV returned a misaligned result list"
                        );
                    }
                    for ((position, _), set) in chunk.iter().zip(sets) {
                        results[*position] = set;
                    }
                }
                Err(e) => {
                    tracing::warn!(chunk = chunk_index, queries = chunk.len(), error = %e, "OSV chunk failed");
                    failed_chunks += 1;
                    last_error = Some(e);
                }
            }
        }

        if failed_chunks == chunks.len() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        let results = self.hydrate_all(results).await;
        tracing::debug!(
            queries = queries.len(),
            sent = pinned.len(),
            records = results.iter().map(Vec::len).sum::<usize>(),
            "OSV batch resolved"
        );
        Ok(BatchResponse {
            results,
            failed_chunks,
        })
    }
}

/// A record as returned by the batch endpoint: identifier only
fn is_bare(record: &RawVulnerabilityRecord) -> bool {
    record.summary.is_none()
        && record.details.is_none()
        && record.severity.is_empty()
        && record.affected.is_empty()
        && record.secondary_score.is_none()
        && record.severity_label.is_none()
}

/// Reads one `{vulns: [...]}` result entry, skipping advisories that do not conform
fn parse_result_entry(entry: Value) -> Vec<RawVulnerabilityRecord> {
    let Some(vulns) = entry.get("vulns") else {
        return Vec::new();
    };
    let Some(vulns) = vulns.as_array() else {
        tracing::warn!("OSV result entry has a non-array 'vulns' field, skipping");
        return Vec::new();
    };
    vulns
        .iter()
        .filter_map(|vuln| {
            let parsed = parse_vulnerability(vuln.clone());
            if parsed.is_none() {
                tracing::warn!(entry = %vuln, "Skipping malformed OSV advisory");
            }
            parsed
        })
        .collect()
}

/// Validates one advisory document and maps it onto the domain record
fn parse_vulnerability(raw: Value) -> Option<RawVulnerabilityRecord> {
    let osv: OsvVulnerability = serde_json::from_value(raw.clone()).ok()?;
    if osv.id.trim().is_empty() {
        return None;
    }

    let database_specific = osv.database_specific.as_ref();
    let secondary_score = database_specific
        .and_then(|db| db.get("cvss_score"))
        .and_then(|score| match score {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });
    let severity_label = database_specific
        .and_then(|db| db.get("severity"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(RawVulnerabilityRecord {
        id: osv.id,
        summary: osv.summary,
        details: osv.details,
        aliases: osv.aliases,
        severity: osv
            .severity
            .into_iter()
            .map(|s| SeverityDescriptor {
                kind: s.severity_type,
                score: s.score,
            })
            .collect(),
        secondary_score,
        severity_label,
        references: osv.references.into_iter().map(|r| r.url).collect(),
        affected: osv
            .affected
            .into_iter()
            .map(|a| AffectedPackage {
                name: a.package.as_ref().map(|p| p.name.clone()),
                ecosystem: a.package.and_then(|p| p.ecosystem),
                fixed_versions: a
                    .ranges
                    .into_iter()
                    .flat_map(|r| r.events)
                    .filter_map(|e| e.fixed)
                    .collect(),
            })
            .collect(),
        raw,
    })
}

// OSV API request/response structures

#[derive(Debug, Serialize)]
struct OsvBatchQuery<'a> {
    queries: Vec<OsvQuery<'a>>,
}

#[derive(Debug, Serialize)]
struct OsvQuery<'a> {
    package: OsvPackage<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct OsvPackage<'a> {
    name: &'a str,
    ecosystem: &'a str,
}

#[derive(Debug, Deserialize)]
struct OsvBatchResponse {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct OsvVulnerability {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    severity: Vec<OsvSeverity>,
    #[serde(default)]
    database_specific: Option<serde_json::Map<String, Value>>,
    #[serde(default)]
    references: Vec<OsvReference>,
    #[serde(default)]
    affected: Vec<OsvAffected>,
}

#[derive(Debug, Deserialize)]
struct OsvSeverity {
    #[serde(rename = "type")]
    severity_type: String, // "CVSS_V3"
    score: String,         // e.g., "CVSS:3.1/AV:N/AC:L/..."
}

#[derive(Debug, Deserialize)]
struct OsvReference {
    url: String,
}

#[derive(Debug, Deserialize)]
struct OsvAffected {
    #[serde(default)]
    package: Option<OsvAffectedPackage>,
    #[serde(default)]
    ranges: Vec<OsvRange>,
}

#[derive(Debug, Deserialize)]
struct OsvAffectedPackage {
    name: String,
    #[serde(default)]
    ecosystem: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OsvRange {
    #[serde(default)]
    events: Vec<OsvEvent>,
}

#[derive(Debug, Deserialize)]
struct OsvEvent {
    #[serde(default)]
    fixed: Option<String>,
}
