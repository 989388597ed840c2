//! # Store — three-tier retrieval over the indexed corpus
//!
//! Read-only access to a relational, full-text-indexed document corpus
//! backed by SQLite + FTS5. Exposes typed per-table operations, per-id
//! fetch, exact-citation fetch, ranked full-text search, and substring
//! search, plus capability/metadata probing (spec §4.5).
//!
//! ## Schema
//! Three primary tables, each with a companion FTS5 external-content index:
//! - `law_documents` (statutes, regulations) + `law_documents_fts`
//! - `case_law_documents` + `case_law_documents_fts`
//! - `preparatory_works` + `preparatory_works_fts`
//! Two optional tables: `agency_guidance_documents`, `eu_reference_index`.
//! `corpus_meta(key, value)` carries `{tier, schema_version, built_at,
//! builder}`.
//!
//! ## Opening semantics
//! On first access the Store opens the database read-only. If the file is
//! absent, every operation returns the "unavailable" sentinel rather than an
//! error, so adapters can fall back to seed data (spec §9 Open Questions).

use crate::citation::{german_grammar, tokenize_for_substring, CitationGrammar};
use crate::errors::Result;
use crate::query::compile;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Scalar metadata value, per spec §3 ("no nested structures").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Statute,
    Regulation,
    Case,
    PreparatoryWork,
    Other,
}

/// The atomic retrieval unit (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub jurisdiction: String,
    pub kind: DocumentKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_snippet: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, MetadataValue>,
}

/// Distinguishes "Store absent" from "legitimately found nothing"
/// (spec §9 Open Questions).
#[derive(Debug, Clone)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    Unavailable,
}

/// Outcome of a listing operation, preserving the same unavailable/empty
/// distinction at the collection level.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Unavailable,
    Available { documents: Vec<Document>, total: usize },
}

/// Capability vocabulary derived from table presence (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    CoreLegislation,
    BasicCaseLaw,
    EuReferences,
    ExpandedCaseLaw,
    FullPreparatoryWorks,
    AgencyGuidance,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::CoreLegislation => "core_legislation",
            Capability::BasicCaseLaw => "basic_case_law",
            Capability::EuReferences => "eu_references",
            Capability::ExpandedCaseLaw => "expanded_case_law",
            Capability::FullPreparatoryWorks => "full_preparatory_works",
            Capability::AgencyGuidance => "agency_guidance",
        }
    }

    pub const ALL: [Capability; 6] = [
        Capability::CoreLegislation,
        Capability::BasicCaseLaw,
        Capability::EuReferences,
        Capability::ExpandedCaseLaw,
        Capability::FullPreparatoryWorks,
        Capability::AgencyGuidance,
    ];
}

#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    flags: std::collections::BTreeSet<Capability>,
}

impl CapabilitySet {
    pub fn has(&self, cap: Capability) -> bool {
        self.flags.contains(&cap)
    }

    pub fn set(&mut self, cap: Capability) {
        self.flags.insert(cap);
    }

    pub fn as_vec(&self) -> Vec<&'static str> {
        self.flags.iter().map(|c| c.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusMetadata {
    pub tier: Option<String>,
    pub schema_version: Option<String>,
    pub built_at: Option<String>,
    pub builder: Option<String>,
}

/// Optional filters for case-law search (spec §4.5).
#[derive(Debug, Clone, Default)]
pub struct CaseLawFilters {
    pub court: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

pub fn clamp_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(20).clamp(1, 100)
}

pub fn clamp_eu_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(20).clamp(1, 200)
}

/// Read-only handle over the indexed corpus.
pub struct Store {
    pool: Option<SqlitePool>,
    capabilities: CapabilitySet,
    metadata: CorpusMetadata,
}

fn row_to_document(row: &sqlx::sqlite::SqliteRow, kind: DocumentKind) -> Document {
    let metadata_json: Option<String> = row.try_get("metadata").ok().flatten();
    let metadata = metadata_json
        .and_then(|s| serde_json::from_str::<BTreeMap<String, MetadataValue>>(&s).ok())
        .unwrap_or_default();

    Document {
        id: row.try_get("id").unwrap_or_default(),
        jurisdiction: row.try_get("jurisdiction").unwrap_or_else(|_| "de".to_string()),
        kind,
        title: row.try_get("title").unwrap_or_default(),
        citation: row.try_get("citation").ok().flatten(),
        source_url: row.try_get("source_url").ok().flatten(),
        effective_date: row
            .try_get("effective_date")
            .or_else(|_| row.try_get("decision_date"))
            .or_else(|_| row.try_get("publication_date"))
            .ok()
            .flatten(),
        text_snippet: row.try_get("text_snippet").ok().flatten(),
        metadata,
    }
}

impl Store {
    /// Opens the corpus read-only, probing table presence to derive the
    /// Capability Set and loading `corpus_meta`. If `db_path` does not
    /// exist, returns a Store in the permanently-unavailable state.
    pub async fn open(db_path: &str, busy_timeout_ms: u64) -> Result<Self> {
        if !Path::new(db_path).exists() {
            tracing::warn!(db_path, "corpus database not found, store unavailable");
            return Ok(Self {
                pool: None,
                capabilities: CapabilitySet::default(),
                metadata: CorpusMetadata {
                    tier: None,
                    schema_version: None,
                    built_at: None,
                    builder: None,
                },
            });
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{db_path}"))?
            .read_only(true)
            .busy_timeout(std::time::Duration::from_millis(busy_timeout_ms));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;

        let capabilities = detect_capabilities(&pool).await?;
        let metadata = load_metadata(&pool).await;

        tracing::info!(
            capabilities = ?capabilities.as_vec(),
            "store opened, capabilities detected"
        );

        Ok(Self {
            pool: Some(pool),
            capabilities,
            metadata,
        })
    }

    pub fn is_available(&self) -> bool {
        self.pool.is_some()
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn metadata(&self) -> &CorpusMetadata {
        &self.metadata
    }

    async fn table_exists(pool: &SqlitePool, name: &str) -> Result<bool> {
        let row = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn row_counts(&self) -> BTreeMap<String, i64> {
        let mut counts = BTreeMap::new();
        let Some(pool) = &self.pool else {
            return counts;
        };
        for table in [
            "law_documents",
            "case_law_documents",
            "preparatory_works",
            "agency_guidance_documents",
            "eu_reference_index",
        ] {
            if let Ok(true) = Self::table_exists(pool, table).await {
                if let Ok(row) = sqlx::query(&format!("SELECT COUNT(*) as c FROM {table}"))
                    .fetch_one(pool)
                    .await
                {
                    let c: i64 = row.try_get("c").unwrap_or(0);
                    counts.insert(table.to_string(), c);
                }
            }
        }
        counts
    }

    /// `search_documents(query, limit)` — statute/regulation three-tier search.
    pub async fn search_documents(&self, query: &str, limit: u32) -> Result<SearchOutcome> {
        let Some(pool) = &self.pool else {
            return Ok(SearchOutcome::Unavailable);
        };
        if !Self::table_exists(pool, "law_documents").await? {
            return Ok(SearchOutcome::Unavailable);
        }

        let limit = limit as i64;
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();

        // Stage 1: exact citation.
        if let Some(parsed) = german_grammar().parse(query) {
            let lowered: Vec<String> = parsed
                .lookup_citations
                .iter()
                .map(|c| c.to_lowercase())
                .collect();
            for candidate in &lowered {
                if out.len() as i64 >= limit {
                    break;
                }
                let rows = sqlx::query(
                    "SELECT * FROM law_documents WHERE LOWER(citation) = ? ORDER BY id ASC",
                )
                .bind(candidate)
                .fetch_all(pool)
                .await?;
                for row in rows {
                    let doc = row_to_document(&row, DocumentKind::Statute);
                    if seen.insert(doc.id.clone()) {
                        out.push(doc);
                        if out.len() as i64 >= limit {
                            break;
                        }
                    }
                }
            }
        }

        // Stage 2: full-text.
        if (out.len() as i64) < limit {
            let compiled = compile(query);
            if !compiled.primary.is_empty()
                && Self::table_exists(pool, "law_documents_fts").await.unwrap_or(false)
            {
                fetch_fts(
                    pool,
                    "law_documents_fts",
                    "law_documents",
                    &compiled.primary,
                    limit - out.len() as i64,
                    DocumentKind::Statute,
                    &mut seen,
                    &mut out,
                )
                .await?;

                if (out.len() as i64) < limit {
                    if let Some(fallback) = &compiled.fallback {
                        fetch_fts(
                            pool,
                            "law_documents_fts",
                            "law_documents",
                            fallback,
                            limit - out.len() as i64,
                            DocumentKind::Statute,
                            &mut seen,
                            &mut out,
                        )
                        .await?;
                    }
                }
            }
        }

        // Stage 3: substring.
        if (out.len() as i64) < limit {
            let tokens = tokenize_for_substring(query);
            if !tokens.is_empty() {
                let mut sql = String::from(
                    "SELECT * FROM law_documents WHERE ",
                );
                let clauses: Vec<String> = tokens
                    .iter()
                    .map(|_| "(LOWER(title) LIKE ? OR LOWER(citation) LIKE ? OR LOWER(text_snippet) LIKE ?)".to_string())
                    .collect();
                sql.push_str(&clauses.join(" AND "));
                sql.push_str(" ORDER BY id ASC");

                let mut q = sqlx::query(&sql);
                for t in &tokens {
                    let pat = format!("%{t}%");
                    q = q.bind(pat.clone()).bind(pat.clone()).bind(pat);
                }
                let rows = q.fetch_all(pool).await?;
                for row in rows {
                    if out.len() as i64 >= limit {
                        break;
                    }
                    let doc = row_to_document(&row, DocumentKind::Statute);
                    if seen.insert(doc.id.clone()) {
                        out.push(doc);
                    }
                }
            }
        }

        out.truncate(limit as usize);
        let total = out.len();
        Ok(SearchOutcome::Available { documents: out, total })
    }

    /// Case-law three-tier search with court/date filters applied at every
    /// stage (spec §4.5).
    pub async fn search_case_law(
        &self,
        query: &str,
        limit: u32,
        filters: &CaseLawFilters,
    ) -> Result<SearchOutcome> {
        let Some(pool) = &self.pool else {
            return Ok(SearchOutcome::Unavailable);
        };
        if !Self::table_exists(pool, "case_law_documents").await? {
            return Ok(SearchOutcome::Unavailable);
        }

        let limit = limit as i64;
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();

        let filter_sql = build_case_law_filter_sql(filters);

        // Stage 1: exact match on ecli/file_number/citation/case_id/id.
        let lowered_query = query.trim().to_lowercase();
        if !lowered_query.is_empty() {
            let mut sql = format!(
                "SELECT * FROM case_law_documents WHERE (LOWER(ecli) = ? OR LOWER(file_number) = ? OR LOWER(citation) = ? OR LOWER(case_id) = ? OR LOWER(id) = ?)"
            );
            sql.push_str(&filter_sql);
            sql.push_str(" ORDER BY decision_date DESC, id DESC");
            let mut q = sqlx::query(&sql);
            for _ in 0..5 {
                q = q.bind(&lowered_query);
            }
            q = bind_case_law_filters(q, filters);
            let rows = q.fetch_all(pool).await?;
            for row in rows {
                if out.len() as i64 >= limit {
                    break;
                }
                let doc = row_to_document(&row, DocumentKind::Case);
                if seen.insert(doc.id.clone()) {
                    out.push(doc);
                }
            }
        }

        // Stage 2: full-text.
        if (out.len() as i64) < limit
            && Self::table_exists(pool, "case_law_documents_fts").await.unwrap_or(false)
        {
            let compiled = compile(query);
            if !compiled.primary.is_empty() {
                fetch_fts_filtered(
                    pool,
                    "case_law_documents_fts",
                    "case_law_documents",
                    &compiled.primary,
                    limit - out.len() as i64,
                    DocumentKind::Case,
                    &filter_sql,
                    filters,
                    &mut seen,
                    &mut out,
                )
                .await?;

                if (out.len() as i64) < limit {
                    if let Some(fallback) = &compiled.fallback {
                        fetch_fts_filtered(
                            pool,
                            "case_law_documents_fts",
                            "case_law_documents",
                            fallback,
                            limit - out.len() as i64,
                            DocumentKind::Case,
                            &filter_sql,
                            filters,
                            &mut seen,
                            &mut out,
                        )
                        .await?;
                    }
                }
            }
        }

        // Stage 3: substring.
        if (out.len() as i64) < limit {
            let tokens = tokenize_for_substring(query);
            if !tokens.is_empty() {
                let mut sql = String::from("SELECT * FROM case_law_documents WHERE ");
                let clauses: Vec<String> = tokens
                    .iter()
                    .map(|_| "(LOWER(title) LIKE ? OR LOWER(citation) LIKE ? OR LOWER(text_snippet) LIKE ?)".to_string())
                    .collect();
                sql.push_str(&clauses.join(" AND "));
                sql.push_str(&filter_sql);
                sql.push_str(" ORDER BY decision_date DESC, id DESC");

                let mut q = sqlx::query(&sql);
                for t in &tokens {
                    let pat = format!("%{t}%");
                    q = q.bind(pat.clone()).bind(pat.clone()).bind(pat);
                }
                q = bind_case_law_filters(q, filters);
                let rows = q.fetch_all(pool).await?;
                for row in rows {
                    if out.len() as i64 >= limit {
                        break;
                    }
                    let doc = row_to_document(&row, DocumentKind::Case);
                    if seen.insert(doc.id.clone()) {
                        out.push(doc);
                    }
                }
            }
        }

        out.truncate(limit as usize);
        let total = out.len();
        Ok(SearchOutcome::Available { documents: out, total })
    }

    /// Preparatory-works search requiring at least one of
    /// `{citation, statute_id, query}` (spec §4.5).
    pub async fn search_preparatory_works(
        &self,
        citation: Option<&str>,
        statute_id: Option<&str>,
        query: Option<&str>,
        limit: u32,
    ) -> Result<SearchOutcome> {
        let Some(pool) = &self.pool else {
            return Ok(SearchOutcome::Unavailable);
        };
        if !Self::table_exists(pool, "preparatory_works").await? {
            return Ok(SearchOutcome::Unavailable);
        }

        let limit = limit as i64;
        let mut hints: Vec<String> = Vec::new();
        if let Some(c) = citation {
            hints.push(c.to_string());
            if let Some(parsed) = german_grammar().parse(c) {
                if let Some(code) = parsed.parsed.get("code") {
                    hints.push(code.clone());
                }
            }
        }
        if let Some(s) = statute_id {
            hints.push(s.to_string());
        }
        if let Some(q) = query {
            hints.push(q.to_string());
        }

        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();

        if hints.is_empty() {
            let rows = sqlx::query(
                "SELECT * FROM preparatory_works ORDER BY publication_date DESC, id DESC LIMIT ?",
            )
            .bind(limit)
            .fetch_all(pool)
            .await?;
            for row in rows {
                let doc = row_to_document(&row, DocumentKind::PreparatoryWork);
                if seen.insert(doc.id.clone()) {
                    out.push(doc);
                }
            }
            let total = out.len();
            return Ok(SearchOutcome::Available { documents: out, total });
        }

        // Full-text stage using the first hint.
        if Self::table_exists(pool, "preparatory_works_fts").await.unwrap_or(false) {
            let compiled = compile(&hints[0]);
            if !compiled.primary.is_empty() {
                fetch_fts(
                    pool,
                    "preparatory_works_fts",
                    "preparatory_works",
                    &compiled.primary,
                    limit - out.len() as i64,
                    DocumentKind::PreparatoryWork,
                    &mut seen,
                    &mut out,
                )
                .await?;
            }
        }

        // Substring stage using all hints.
        if (out.len() as i64) < limit {
            for hint in &hints {
                if out.len() as i64 >= limit {
                    break;
                }
                let tokens = tokenize_for_substring(hint);
                if tokens.is_empty() {
                    continue;
                }
                let mut sql = String::from("SELECT * FROM preparatory_works WHERE ");
                let clauses: Vec<String> = tokens
                    .iter()
                    .map(|_| "(LOWER(title) LIKE ? OR LOWER(citation) LIKE ? OR LOWER(text_snippet) LIKE ?)".to_string())
                    .collect();
                sql.push_str(&clauses.join(" AND "));
                sql.push_str(" ORDER BY publication_date DESC, id DESC");

                let mut q = sqlx::query(&sql);
                for t in &tokens {
                    let pat = format!("%{t}%");
                    q = q.bind(pat.clone()).bind(pat.clone()).bind(pat);
                }
                let rows = q.fetch_all(pool).await?;
                for row in rows {
                    if out.len() as i64 >= limit {
                        break;
                    }
                    let doc = row_to_document(&row, DocumentKind::PreparatoryWork);
                    if seen.insert(doc.id.clone()) {
                        out.push(doc);
                    }
                }
            }
        }

        out.truncate(limit as usize);
        let total = out.len();
        Ok(SearchOutcome::Available { documents: out, total })
    }

    /// `get_document(id)` — probes statutes, then case law, then
    /// preparatory works.
    pub async fn get_document(&self, id: &str) -> Result<Lookup<Document>> {
        let Some(pool) = &self.pool else {
            return Ok(Lookup::Unavailable);
        };

        let mut any_table_exists = false;
        for (table, kind) in [
            ("law_documents", DocumentKind::Statute),
            ("case_law_documents", DocumentKind::Case),
            ("preparatory_works", DocumentKind::PreparatoryWork),
        ] {
            if !Self::table_exists(pool, table).await? {
                continue;
            }
            any_table_exists = true;
            let row = sqlx::query(&format!("SELECT * FROM {table} WHERE id = ?"))
                .bind(id)
                .fetch_optional(pool)
                .await?;
            if let Some(row) = row {
                return Ok(Lookup::Found(row_to_document(&row, kind)));
            }
        }
        if any_table_exists {
            Ok(Lookup::NotFound)
        } else {
            Ok(Lookup::Unavailable)
        }
    }

    /// `get_documents_by_citation(citation, limit)`.
    pub async fn get_documents_by_citation(
        &self,
        citation: &str,
        limit: u32,
    ) -> Result<SearchOutcome> {
        let Some(pool) = &self.pool else {
            return Ok(SearchOutcome::Unavailable);
        };
        let Some(parsed) = german_grammar().parse(citation) else {
            return Ok(SearchOutcome::Available { documents: vec![], total: 0 });
        };
        let limit = limit as i64;
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();

        for candidate in &parsed.lookup_citations {
            if out.len() as i64 >= limit {
                break;
            }
            let rows = sqlx::query(
                "SELECT * FROM law_documents WHERE LOWER(citation) = ? ORDER BY id ASC",
            )
            .bind(candidate.to_lowercase())
            .fetch_all(pool)
            .await?;
            for row in rows {
                let doc = row_to_document(&row, DocumentKind::Statute);
                if seen.insert(doc.id.clone()) {
                    out.push(doc);
                    if out.len() as i64 >= limit {
                        break;
                    }
                }
            }
        }

        out.truncate(limit as usize);
        let total = out.len();
        Ok(SearchOutcome::Available { documents: out, total })
    }

    /// Fetches rows for the EU extractor to scan, across all primary tables
    /// matching the given selector (statute id, citation, or document id).
    pub async fn fetch_candidates_for_eu_scan(
        &self,
        statute_id: Option<&str>,
        citation: Option<&str>,
        document_id: Option<&str>,
    ) -> Result<Lookup<Vec<Document>>> {
        let Some(_pool) = &self.pool else {
            return Ok(Lookup::Unavailable);
        };

        let mut docs = Vec::new();

        if let Some(id) = document_id {
            if let Lookup::Found(doc) = self.get_document(id).await? {
                docs.push(doc);
            }
        }
        if let Some(sid) = statute_id {
            if let Lookup::Found(doc) = self.get_document(sid).await? {
                docs.push(doc);
            }
        }
        if let Some(c) = citation {
            if let SearchOutcome::Available { documents, .. } =
                self.get_documents_by_citation(c, 200).await?
            {
                docs.extend(documents);
            }
        }

        if docs.is_empty() {
            Ok(Lookup::NotFound)
        } else {
            Ok(Lookup::Found(docs))
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn fetch_fts(
    pool: &SqlitePool,
    fts_table: &str,
    base_table: &str,
    expr: &str,
    remaining: i64,
    kind: DocumentKind,
    seen: &mut std::collections::HashSet<String>,
    out: &mut Vec<Document>,
) -> Result<()> {
    if remaining <= 0 || expr.is_empty() {
        return Ok(());
    }
    let sql = format!(
        "SELECT t.* FROM {base_table} t JOIN {fts_table} f ON f.rowid = t.rowid WHERE {fts_table} MATCH ? ORDER BY rank LIMIT ?"
    );
    let rows = sqlx::query(&sql)
        .bind(expr)
        .bind(remaining)
        .fetch_all(pool)
        .await?;
    for row in rows {
        let doc = row_to_document(&row, kind);
        if seen.insert(doc.id.clone()) {
            out.push(doc);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn fetch_fts_filtered(
    pool: &SqlitePool,
    fts_table: &str,
    base_table: &str,
    expr: &str,
    remaining: i64,
    kind: DocumentKind,
    filter_sql: &str,
    filters: &CaseLawFilters,
    seen: &mut std::collections::HashSet<String>,
    out: &mut Vec<Document>,
) -> Result<()> {
    if remaining <= 0 || expr.is_empty() {
        return Ok(());
    }
    let sql = format!(
        "SELECT t.* FROM {base_table} t JOIN {fts_table} f ON f.rowid = t.rowid WHERE {fts_table} MATCH ?{filter_sql} ORDER BY rank LIMIT ?"
    );
    let mut q = sqlx::query(&sql).bind(expr);
    q = bind_case_law_filters(q, filters);
    q = q.bind(remaining);
    let rows = q.fetch_all(pool).await?;
    for row in rows {
        let doc = row_to_document(&row, kind);
        if seen.insert(doc.id.clone()) {
            out.push(doc);
        }
    }
    Ok(())
}

fn build_case_law_filter_sql(filters: &CaseLawFilters) -> String {
    let mut sql = String::new();
    if filters.court.is_some() {
        sql.push_str(" AND LOWER(court) LIKE ?");
    }
    if filters.date_from.is_some() {
        sql.push_str(" AND decision_date >= ?");
    }
    if filters.date_to.is_some() {
        sql.push_str(" AND decision_date <= ?");
    }
    sql
}

fn bind_case_law_filters<'q>(
    mut q: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    filters: &'q CaseLawFilters,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    if let Some(court) = &filters.court {
        q = q.bind(format!("%{}%", court.to_lowercase()));
    }
    if let Some(from) = &filters.date_from {
        q = q.bind(from.clone());
    }
    if let Some(to) = &filters.date_to {
        q = q.bind(to.clone());
    }
    q
}

async fn detect_capabilities(pool: &SqlitePool) -> Result<CapabilitySet> {
    let mut caps = CapabilitySet::default();

    if Store::table_exists(pool, "law_documents").await? {
        caps.set(Capability::CoreLegislation);
    }
    if Store::table_exists(pool, "case_law_documents").await? {
        caps.set(Capability::BasicCaseLaw);
        if has_column(pool, "case_law_documents", "full_text").await? {
            caps.set(Capability::ExpandedCaseLaw);
        }
    }
    if Store::table_exists(pool, "preparatory_works").await? {
        caps.set(Capability::FullPreparatoryWorks);
    }
    if Store::table_exists(pool, "agency_guidance_documents").await? {
        caps.set(Capability::AgencyGuidance);
    }
    if Store::table_exists(pool, "eu_reference_index").await? {
        caps.set(Capability::EuReferences);
    }

    Ok(caps)
}

async fn has_column(pool: &SqlitePool, table: &str, column: &str) -> Result<bool> {
    let rows = sqlx::query(&format!("PRAGMA table_info({table})"))
        .fetch_all(pool)
        .await?;
    for row in rows {
        let name: String = row.try_get("name").unwrap_or_default();
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

async fn load_metadata(pool: &SqlitePool) -> CorpusMetadata {
    if !Store::table_exists(pool, "corpus_meta").await.unwrap_or(false) {
        return CorpusMetadata {
            tier: None,
            schema_version: None,
            built_at: None,
            builder: None,
        };
    }

    let mut map = BTreeMap::new();
    if let Ok(rows) = sqlx::query("SELECT key, value FROM corpus_meta").fetch_all(pool).await {
        for row in rows {
            let key: String = row.try_get("key").unwrap_or_default();
            let value: String = row.try_get("value").unwrap_or_default();
            map.insert(key, value);
        }
    }

    CorpusMetadata {
        tier: map.get("tier").cloned(),
        schema_version: map.get("schema_version").cloned(),
        built_at: map.get("built_at").cloned(),
        builder: map.get("builder").cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_limit_applies_bounds() {
        assert_eq!(clamp_limit(None), 20);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(500)), 100);
        assert_eq!(clamp_limit(Some(50)), 50);
    }

    #[test]
    fn clamp_eu_limit_applies_wider_bounds() {
        assert_eq!(clamp_eu_limit(None), 20);
        assert_eq!(clamp_eu_limit(Some(500)), 200);
    }

    #[tokio::test]
    async fn opening_missing_db_is_unavailable() {
        let store = Store::open("/nonexistent/path/to/corpus.db", 1000)
            .await
            .expect("open should not error");
        assert!(!store.is_available());
        let outcome = store.search_documents("anything", 20).await.unwrap();
        assert!(matches!(outcome, SearchOutcome::Unavailable));
    }

    async fn build_temp_corpus() -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db_path = dir.path().join("corpus.db");
        let db_path_str = db_path.to_string_lossy().to_string();

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{db_path_str}"))
            .unwrap()
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("create writable pool");

        sqlx::query(
            "CREATE TABLE law_documents (
                id TEXT PRIMARY KEY,
                jurisdiction TEXT NOT NULL,
                title TEXT NOT NULL,
                citation TEXT,
                source_url TEXT,
                effective_date TEXT,
                text_snippet TEXT,
                metadata TEXT
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            "CREATE VIRTUAL TABLE law_documents_fts USING fts5(
                title, citation, text_snippet,
                content='law_documents', content_rowid='rowid'
            )",
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO law_documents (id, jurisdiction, title, citation, source_url, effective_date, text_snippet, metadata)
             VALUES ('bgb:823', 'de', 'Schadensersatzpflicht', '§ 823 BGB', 'https://example.test/bgb-823', '1900-01-01', 'Wer vorsaetzlich oder fahrlaessig das Leben, den Koerper ... eines anderen widerrechtlich verletzt ...', '{}')",
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO law_documents_fts (rowid, title, citation, text_snippet)
             SELECT rowid, title, citation, text_snippet FROM law_documents",
        )
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            "CREATE TABLE corpus_meta (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO corpus_meta (key, value) VALUES ('tier', 'core_legislation')")
            .execute(&pool)
            .await
            .unwrap();

        pool.close().await;
        (dir, db_path_str)
    }

    #[tokio::test]
    async fn exact_citation_hit_takes_priority_over_full_text() {
        let (_dir, db_path) = build_temp_corpus().await;
        let store = Store::open(&db_path, 1000).await.unwrap();
        assert!(store.is_available());
        assert!(store.capabilities().has(Capability::CoreLegislation));

        let outcome = store.search_documents("§ 823 BGB", 10).await.unwrap();
        match outcome {
            SearchOutcome::Available { documents, total } => {
                assert_eq!(total, 1);
                assert_eq!(documents[0].id, "bgb:823");
            }
            SearchOutcome::Unavailable => panic!("expected an available outcome"),
        }
    }

    #[tokio::test]
    async fn full_text_search_finds_document_by_keyword() {
        let (_dir, db_path) = build_temp_corpus().await;
        let store = Store::open(&db_path, 1000).await.unwrap();

        let outcome = store.search_documents("Schadensersatzpflicht", 10).await.unwrap();
        match outcome {
            SearchOutcome::Available { documents, .. } => {
                assert!(documents.iter().any(|d| d.id == "bgb:823"));
            }
            SearchOutcome::Unavailable => panic!("expected an available outcome"),
        }
    }
}
