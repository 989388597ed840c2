//! # Shell (typed dispatcher)
//!
//! Validates arguments, enforces capability gating, calls the adapter, and
//! returns the uniform result envelope `{tool, ok, data?, error?}`
//! (spec §4.1).

use crate::adapter::{Adapter, CitationStyle};
use crate::errors::{CoreError, ToolErrorPayload};
use crate::registry::Registry;
use crate::store::{CaseLawFilters, SearchOutcome};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub tool: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolErrorPayload>,
}

impl ToolResult {
    fn ok(tool: &str, data: Value) -> Self {
        Self {
            tool: tool.to_string(),
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(tool: &str, error: CoreError) -> Self {
        Self {
            tool: tool.to_string(),
            ok: false,
            data: None,
            error: Some(ToolErrorPayload::from(&error)),
        }
    }
}

pub struct Shell {
    registry: Registry,
}

fn required_str(args: &Value, field: &str) -> Result<String, CoreError> {
    let v = args
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or("");
    if v.is_empty() {
        return Err(CoreError::validation(field, "is required and must be non-empty"));
    }
    Ok(v.to_string())
}

fn optional_str(args: &Value, field: &str) -> Option<String> {
    args.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn optional_u32(args: &Value, field: &str) -> Result<Option<u32>, CoreError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(|n| Some(n as u32))
            .ok_or_else(|| CoreError::validation(field, "must be a non-negative number")),
    }
}

fn optional_bool(args: &Value, field: &str, default: bool) -> Result<bool, CoreError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(CoreError::validation(field, "must be a boolean")),
    }
}

fn search_outcome_to_json(outcome: SearchOutcome, upgrade_capability: &str) -> Value {
    match outcome {
        SearchOutcome::Available { documents, total } => {
            serde_json::json!({ "documents": documents, "total": total })
        }
        SearchOutcome::Unavailable => serde_json::json!({
            "documents": [],
            "total": 0,
            "upgradeNotice": {
                "capability": upgrade_capability,
                "message": format!("'{upgrade_capability}' data is not available in the current corpus snapshot"),
            }
        }),
    }
}

impl Shell {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    fn resolve_country(&self, args: &Value, tool: &str) -> Result<std::sync::Arc<dyn Adapter>, ToolResult> {
        let code = match required_str(args, "country") {
            Ok(c) => c,
            Err(e) => return Err(ToolResult::err(tool, e)),
        };
        self.registry.get(&code).map_err(|e| ToolResult::err(tool, e))
    }

    pub async fn handle_tool_call(&self, name: &str, arguments: Value) -> ToolResult {
        let args = if arguments.is_null() {
            serde_json::json!({})
        } else {
            arguments
        };

        match name {
            "list_countries" => self.list_countries().await,
            "describe_country" => self.describe_country(&args).await,
            "search_documents" => self.search_documents(&args).await,
            "get_document" => self.get_document(&args).await,
            "search_case_law" => self.search_case_law(&args).await,
            "get_preparatory_works" => self.get_preparatory_works(&args).await,
            "parse_citation" => self.parse_citation(&args).await,
            "validate_citation" => self.validate_citation(&args).await,
            "format_citation" => self.format_citation(&args).await,
            "check_currency" => self.check_currency(&args).await,
            "build_legal_stance" => self.build_legal_stance(&args).await,
            "get_eu_basis" => self.get_eu_basis(&args).await,
            "search_eu_implementations" => self.search_eu_implementations(&args).await,
            "get_national_implementations" => self.get_national_implementations(&args).await,
            "get_provision_eu_basis" => self.get_provision_eu_basis(&args).await,
            "validate_eu_compliance" => self.validate_eu_compliance(&args).await,
            "run_ingestion" => self.run_ingestion(&args).await,
            other => ToolResult::err(
                other,
                CoreError::UnknownTool {
                    name: other.to_string(),
                },
            ),
        }
    }

    async fn list_countries(&self) -> ToolResult {
        let list: Vec<Value> = self
            .registry
            .list()
            .iter()
            .map(|a| {
                serde_json::json!({
                    "country": a.descriptor().jurisdiction_code,
                    "capabilities": a.capabilities(),
                })
            })
            .collect();
        ToolResult::ok("list_countries", Value::Array(list))
    }

    async fn describe_country(&self, args: &Value) -> ToolResult {
        let adapter = match self.resolve_country(args, "describe_country") {
            Ok(a) => a,
            Err(e) => return e,
        };
        let flags = adapter.descriptor().flags;
        let tools = serde_json::json!({
            "search_documents": flags.documents,
            "get_document": flags.documents,
            "search_case_law": flags.case_law,
            "get_preparatory_works": flags.preparatory_works,
            "parse_citation": flags.citations,
            "validate_citation": flags.citations,
            "format_citation": flags.formatting,
            "check_currency": flags.currency,
            "build_legal_stance": flags.legal_stance,
            "get_eu_basis": flags.eu,
            "search_eu_implementations": flags.eu,
            "get_national_implementations": flags.eu,
            "get_provision_eu_basis": flags.eu,
            "validate_eu_compliance": flags.eu,
            "run_ingestion": flags.ingestion,
        });
        ToolResult::ok(
            "describe_country",
            serde_json::json!({
                "country": adapter.descriptor().jurisdiction_code,
                "capabilities": adapter.capabilities(),
                "tools": tools,
            }),
        )
    }

    async fn search_documents(&self, args: &Value) -> ToolResult {
        let adapter = match self.resolve_country(args, "search_documents") {
            Ok(a) => a,
            Err(e) => return e,
        };
        if !adapter.descriptor().flags.documents {
            return ToolResult::err(
                "search_documents",
                CoreError::UnsupportedCapability {
                    country: adapter.descriptor().jurisdiction_code.clone(),
                    capability: "documents".to_string(),
                },
            );
        }
        let query = match required_str(args, "query") {
            Ok(q) => q,
            Err(e) => return ToolResult::err("search_documents", e),
        };
        let limit = match optional_u32(args, "limit") {
            Ok(l) => l,
            Err(e) => return ToolResult::err("search_documents", e),
        };
        match adapter.search_documents(&query, limit).await {
            Ok(outcome) => ToolResult::ok(
                "search_documents",
                search_outcome_to_json(outcome, "core_legislation"),
            ),
            Err(e) => ToolResult::err("search_documents", e),
        }
    }

    async fn get_document(&self, args: &Value) -> ToolResult {
        let adapter = match self.resolve_country(args, "get_document") {
            Ok(a) => a,
            Err(e) => return e,
        };
        if !adapter.descriptor().flags.documents {
            return ToolResult::err(
                "get_document",
                CoreError::UnsupportedCapability {
                    country: adapter.descriptor().jurisdiction_code.clone(),
                    capability: "documents".to_string(),
                },
            );
        }
        let id = match required_str(args, "id") {
            Ok(i) => i,
            Err(e) => return ToolResult::err("get_document", e),
        };
        match adapter.get_document(&id).await {
            Ok(crate::store::Lookup::Found(doc)) => {
                ToolResult::ok("get_document", serde_json::to_value(doc).unwrap())
            }
            Ok(crate::store::Lookup::NotFound) => ToolResult::ok("get_document", Value::Null),
            Ok(crate::store::Lookup::Unavailable) => ToolResult::ok("get_document", Value::Null),
            Err(e) => ToolResult::err("get_document", e),
        }
    }

    async fn search_case_law(&self, args: &Value) -> ToolResult {
        let adapter = match self.resolve_country(args, "search_case_law") {
            Ok(a) => a,
            Err(e) => return e,
        };
        if !adapter.descriptor().flags.case_law {
            return ToolResult::err(
                "search_case_law",
                CoreError::UnsupportedCapability {
                    country: adapter.descriptor().jurisdiction_code.clone(),
                    capability: "case_law".to_string(),
                },
            );
        }
        let query = match required_str(args, "query") {
            Ok(q) => q,
            Err(e) => return ToolResult::err("search_case_law", e),
        };
        let limit = match optional_u32(args, "limit") {
            Ok(l) => l,
            Err(e) => return ToolResult::err("search_case_law", e),
        };
        let filters = CaseLawFilters {
            court: optional_str(args, "court"),
            date_from: optional_str(args, "dateFrom"),
            date_to: optional_str(args, "dateTo"),
        };
        match adapter.search_case_law(&query, limit, filters).await {
            Ok(outcome) => ToolResult::ok(
                "search_case_law",
                search_outcome_to_json(outcome, "basic_case_law"),
            ),
            Err(e) => ToolResult::err("search_case_law", e),
        }
    }

    async fn get_preparatory_works(&self, args: &Value) -> ToolResult {
        let adapter = match self.resolve_country(args, "get_preparatory_works") {
            Ok(a) => a,
            Err(e) => return e,
        };
        if !adapter.descriptor().flags.preparatory_works {
            return ToolResult::err(
                "get_preparatory_works",
                CoreError::UnsupportedCapability {
                    country: adapter.descriptor().jurisdiction_code.clone(),
                    capability: "preparatory_works".to_string(),
                },
            );
        }
        let citation = optional_str(args, "citation");
        let statute_id = optional_str(args, "statuteId");
        let query = optional_str(args, "query");
        if citation.is_none() && statute_id.is_none() && query.is_none() {
            return ToolResult::err(
                "get_preparatory_works",
                CoreError::validation(
                    "citation|statuteId|query",
                    "at least one selector is required",
                ),
            );
        }
        let limit = match optional_u32(args, "limit") {
            Ok(l) => l,
            Err(e) => return ToolResult::err("get_preparatory_works", e),
        };
        match adapter
            .get_preparatory_works(citation.as_deref(), statute_id.as_deref(), query.as_deref(), limit)
            .await
        {
            Ok(outcome) => ToolResult::ok(
                "get_preparatory_works",
                search_outcome_to_json(outcome, "full_preparatory_works"),
            ),
            Err(e) => ToolResult::err("get_preparatory_works", e),
        }
    }

    async fn parse_citation(&self, args: &Value) -> ToolResult {
        let adapter = match self.resolve_country(args, "parse_citation") {
            Ok(a) => a,
            Err(e) => return e,
        };
        if !adapter.descriptor().flags.citations {
            return ToolResult::err(
                "parse_citation",
                CoreError::UnsupportedCapability {
                    country: adapter.descriptor().jurisdiction_code.clone(),
                    capability: "citations".to_string(),
                },
            );
        }
        let citation = match required_str(args, "citation") {
            Ok(c) => c,
            Err(e) => return ToolResult::err("parse_citation", e),
        };
        match adapter.parse_citation(&citation) {
            Some(parsed) => ToolResult::ok(
                "parse_citation",
                serde_json::json!({
                    "original": citation,
                    "normalized": parsed.normalized,
                    "parsed": parsed.parsed,
                }),
            ),
            None => ToolResult::ok("parse_citation", Value::Null),
        }
    }

    async fn validate_citation(&self, args: &Value) -> ToolResult {
        let adapter = match self.resolve_country(args, "validate_citation") {
            Ok(a) => a,
            Err(e) => return e,
        };
        if !adapter.descriptor().flags.citations {
            return ToolResult::err(
                "validate_citation",
                CoreError::UnsupportedCapability {
                    country: adapter.descriptor().jurisdiction_code.clone(),
                    capability: "citations".to_string(),
                },
            );
        }
        let citation = match required_str(args, "citation") {
            Ok(c) => c,
            Err(e) => return ToolResult::err("validate_citation", e),
        };
        match adapter.validate_citation(&citation).await {
            Ok(v) => ToolResult::ok("validate_citation", serde_json::to_value(v).unwrap()),
            Err(e) => ToolResult::err("validate_citation", e),
        }
    }

    async fn format_citation(&self, args: &Value) -> ToolResult {
        let adapter = match self.resolve_country(args, "format_citation") {
            Ok(a) => a,
            Err(e) => return e,
        };
        if !adapter.descriptor().flags.formatting {
            return ToolResult::err(
                "format_citation",
                CoreError::UnsupportedCapability {
                    country: adapter.descriptor().jurisdiction_code.clone(),
                    capability: "formatting".to_string(),
                },
            );
        }
        let citation = match required_str(args, "citation") {
            Ok(c) => c,
            Err(e) => return ToolResult::err("format_citation", e),
        };
        let style_str = optional_str(args, "style").unwrap_or_else(|| "default".to_string());
        let style = match CitationStyle::parse(&style_str) {
            Some(s) => s,
            None => {
                return ToolResult::err(
                    "format_citation",
                    CoreError::validation("style", "must be one of default, short, pinpoint"),
                )
            }
        };
        let formatted = adapter.format_citation(&citation, style);
        ToolResult::ok("format_citation", serde_json::to_value(formatted).unwrap())
    }

    async fn check_currency(&self, args: &Value) -> ToolResult {
        let adapter = match self.resolve_country(args, "check_currency") {
            Ok(a) => a,
            Err(e) => return e,
        };
        if !adapter.descriptor().flags.currency {
            return ToolResult::err(
                "check_currency",
                CoreError::UnsupportedCapability {
                    country: adapter.descriptor().jurisdiction_code.clone(),
                    capability: "currency".to_string(),
                },
            );
        }
        let citation = optional_str(args, "citation");
        let statute_id = optional_str(args, "statuteId");
        if citation.is_none() && statute_id.is_none() {
            return ToolResult::err(
                "check_currency",
                CoreError::validation("citation|statuteId", "at least one selector is required"),
            );
        }
        let as_of_date = optional_str(args, "asOfDate");
        match adapter
            .check_currency(citation.as_deref(), statute_id.as_deref(), as_of_date.as_deref())
            .await
        {
            Ok(result) => ToolResult::ok("check_currency", serde_json::to_value(result).unwrap()),
            Err(e) => ToolResult::err("check_currency", e),
        }
    }

    async fn build_legal_stance(&self, args: &Value) -> ToolResult {
        let adapter = match self.resolve_country(args, "build_legal_stance") {
            Ok(a) => a,
            Err(e) => return e,
        };
        if !adapter.descriptor().flags.legal_stance {
            return ToolResult::err(
                "build_legal_stance",
                CoreError::UnsupportedCapability {
                    country: adapter.descriptor().jurisdiction_code.clone(),
                    capability: "legal_stance".to_string(),
                },
            );
        }
        let query = match required_str(args, "query") {
            Ok(q) => q,
            Err(e) => return ToolResult::err("build_legal_stance", e),
        };
        let limit = match optional_u32(args, "limit") {
            Ok(l) => l,
            Err(e) => return ToolResult::err("build_legal_stance", e),
        };
        let include_case_law = match optional_bool(args, "includeCaseLaw", false) {
            Ok(b) => b,
            Err(e) => return ToolResult::err("build_legal_stance", e),
        };
        let include_preparatory_works = match optional_bool(args, "includePreparatoryWorks", false) {
            Ok(b) => b,
            Err(e) => return ToolResult::err("build_legal_stance", e),
        };
        match adapter
            .build_legal_stance(&query, limit, include_case_law, include_preparatory_works)
            .await
        {
            Ok(stance) => ToolResult::ok(
                "build_legal_stance",
                serde_json::json!({
                    "query": stance.query,
                    "statutes": stance.statutes,
                    "caseLaw": stance.case_law,
                    "preparatoryWorks": stance.preparatory_works,
                    "keyCitations": stance.key_citations,
                }),
            ),
            Err(e) => ToolResult::err("build_legal_stance", e),
        }
    }

    async fn get_eu_basis(&self, args: &Value) -> ToolResult {
        let adapter = match self.resolve_country(args, "get_eu_basis") {
            Ok(a) => a,
            Err(e) => return e,
        };
        if !adapter.descriptor().flags.eu {
            return ToolResult::err(
                "get_eu_basis",
                CoreError::UnsupportedCapability {
                    country: adapter.descriptor().jurisdiction_code.clone(),
                    capability: "eu".to_string(),
                },
            );
        }
        let citation = optional_str(args, "citation");
        let statute_id = optional_str(args, "statuteId");
        let document_id = optional_str(args, "documentId");
        if citation.is_none() && statute_id.is_none() && document_id.is_none() {
            return ToolResult::err(
                "get_eu_basis",
                CoreError::validation(
                    "citation|statuteId|documentId",
                    "at least one selector is required",
                ),
            );
        }
        let limit = match optional_u32(args, "limit") {
            Ok(l) => l,
            Err(e) => return ToolResult::err("get_eu_basis", e),
        };
        match adapter
            .get_eu_basis(citation.as_deref(), statute_id.as_deref(), document_id.as_deref(), limit)
            .await
        {
            Ok((refs, total)) => ToolResult::ok(
                "get_eu_basis",
                serde_json::json!({ "references": refs, "total": total }),
            ),
            Err(e) => ToolResult::err("get_eu_basis", e),
        }
    }

    async fn search_eu_implementations(&self, args: &Value) -> ToolResult {
        let adapter = match self.resolve_country(args, "search_eu_implementations") {
            Ok(a) => a,
            Err(e) => return e,
        };
        if !adapter.descriptor().flags.eu {
            return ToolResult::err(
                "search_eu_implementations",
                CoreError::UnsupportedCapability {
                    country: adapter.descriptor().jurisdiction_code.clone(),
                    capability: "eu".to_string(),
                },
            );
        }
        let query = match required_str(args, "query") {
            Ok(q) => q,
            Err(e) => return ToolResult::err("search_eu_implementations", e),
        };
        let limit = match optional_u32(args, "limit") {
            Ok(l) => l,
            Err(e) => return ToolResult::err("search_eu_implementations", e),
        };
        match adapter.search_eu_implementations(&query, limit).await {
            Ok((results, total)) => ToolResult::ok(
                "search_eu_implementations",
                serde_json::json!({ "results": results, "total": total }),
            ),
            Err(e) => ToolResult::err("search_eu_implementations", e),
        }
    }

    async fn get_national_implementations(&self, args: &Value) -> ToolResult {
        let adapter = match self.resolve_country(args, "get_national_implementations") {
            Ok(a) => a,
            Err(e) => return e,
        };
        if !adapter.descriptor().flags.eu {
            return ToolResult::err(
                "get_national_implementations",
                CoreError::UnsupportedCapability {
                    country: adapter.descriptor().jurisdiction_code.clone(),
                    capability: "eu".to_string(),
                },
            );
        }
        let eu_id = match required_str(args, "euId") {
            Ok(q) => q,
            Err(e) => return ToolResult::err("get_national_implementations", e),
        };
        let limit = match optional_u32(args, "limit") {
            Ok(l) => l,
            Err(e) => return ToolResult::err("get_national_implementations", e),
        };
        match adapter.get_national_implementations(&eu_id, limit).await {
            Ok((results, total)) => ToolResult::ok(
                "get_national_implementations",
                serde_json::json!({ "results": results, "total": total }),
            ),
            Err(e) => ToolResult::err("get_national_implementations", e),
        }
    }

    async fn get_provision_eu_basis(&self, args: &Value) -> ToolResult {
        let adapter = match self.resolve_country(args, "get_provision_eu_basis") {
            Ok(a) => a,
            Err(e) => return e,
        };
        if !adapter.descriptor().flags.eu {
            return ToolResult::err(
                "get_provision_eu_basis",
                CoreError::UnsupportedCapability {
                    country: adapter.descriptor().jurisdiction_code.clone(),
                    capability: "eu".to_string(),
                },
            );
        }
        let document_id = match required_str(args, "documentId") {
            Ok(q) => q,
            Err(e) => return ToolResult::err("get_provision_eu_basis", e),
        };
        let limit = match optional_u32(args, "limit") {
            Ok(l) => l,
            Err(e) => return ToolResult::err("get_provision_eu_basis", e),
        };
        match adapter.get_provision_eu_basis(&document_id, limit).await {
            Ok((refs, total)) => ToolResult::ok(
                "get_provision_eu_basis",
                serde_json::json!({ "references": refs, "total": total }),
            ),
            Err(e) => ToolResult::err("get_provision_eu_basis", e),
        }
    }

    async fn validate_eu_compliance(&self, args: &Value) -> ToolResult {
        let adapter = match self.resolve_country(args, "validate_eu_compliance") {
            Ok(a) => a,
            Err(e) => return e,
        };
        if !adapter.descriptor().flags.eu {
            return ToolResult::err(
                "validate_eu_compliance",
                CoreError::UnsupportedCapability {
                    country: adapter.descriptor().jurisdiction_code.clone(),
                    capability: "eu".to_string(),
                },
            );
        }
        let eu_id = match required_str(args, "euId") {
            Ok(q) => q,
            Err(e) => return ToolResult::err("validate_eu_compliance", e),
        };
        let citation = optional_str(args, "citation");
        let statute_id = optional_str(args, "statuteId");
        match adapter
            .validate_eu_compliance(&eu_id, citation.as_deref(), statute_id.as_deref())
            .await
        {
            Ok(value) => ToolResult::ok("validate_eu_compliance", value),
            Err(e) => ToolResult::err("validate_eu_compliance", e),
        }
    }

    async fn run_ingestion(&self, args: &Value) -> ToolResult {
        let adapter = match self.resolve_country(args, "run_ingestion") {
            Ok(a) => a,
            Err(e) => return e,
        };
        if !adapter.descriptor().flags.ingestion {
            return ToolResult::err(
                "run_ingestion",
                CoreError::UnsupportedCapability {
                    country: adapter.descriptor().jurisdiction_code.clone(),
                    capability: "ingestion".to_string(),
                },
            );
        }
        let source_id = optional_str(args, "sourceId");
        let dry_run = match optional_bool(args, "dryRun", false) {
            Ok(b) => b,
            Err(e) => return ToolResult::err("run_ingestion", e),
        };
        match adapter.run_ingestion(source_id.as_deref(), dry_run).await {
            Ok(report) => ToolResult::ok("run_ingestion", serde_json::to_value(report).unwrap()),
            Err(e) => ToolResult::err("run_ingestion", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::GermanAdapter;
    use crate::store::Store;
    use std::sync::Arc;

    async fn test_shell() -> Shell {
        let store = Arc::new(Store::open("/nonexistent/corpus.db", 1000).await.unwrap());
        let mut registry = Registry::new();
        registry
            .register(Arc::new(GermanAdapter::new(store, None)))
            .unwrap();
        Shell::new(registry)
    }

    #[tokio::test]
    async fn s1_parse_citation() {
        let shell = test_shell().await;
        let result = shell
            .handle_tool_call(
                "parse_citation",
                serde_json::json!({ "country": "de", "citation": "§ 823 abs. 1 bgb" }),
            )
            .await;
        assert!(result.ok);
        let data = result.data.unwrap();
        assert_eq!(data["normalized"], "§ 823 Abs. 1 BGB");
        assert_eq!(data["parsed"]["code"], "BGB");
        assert_eq!(data["parsed"]["section"], "823");
        assert_eq!(data["parsed"]["paragraph"], "1");
    }

    #[tokio::test]
    async fn s2_validate_citation() {
        let shell = test_shell().await;
        let result = shell
            .handle_tool_call(
                "validate_citation",
                serde_json::json!({ "country": "de", "citation": "Artikel 1 Absatz 1 GG" }),
            )
            .await;
        assert!(result.ok);
        let data = result.data.unwrap();
        assert_eq!(data["valid"], true);
        assert_eq!(data["normalized"], "Art. 1 Abs. 1 GG");
    }

    #[tokio::test]
    async fn s3_format_citation_short() {
        let shell = test_shell().await;
        let result = shell
            .handle_tool_call(
                "format_citation",
                serde_json::json!({ "country": "de", "citation": "§ 1 Absatz 1 bdsg", "style": "short" }),
            )
            .await;
        assert!(result.ok);
        assert_eq!(result.data.unwrap()["formatted"], "§ 1 BDSG");
    }

    #[tokio::test]
    async fn s5_check_currency_likely_in_force() {
        let shell = test_shell().await;
        let result = shell
            .handle_tool_call(
                "check_currency",
                serde_json::json!({ "country": "de", "statuteId": "bdsg:1" }),
            )
            .await;
        assert!(result.ok);
        assert_eq!(result.data.unwrap()["status"], "likely_in_force");
    }

    #[tokio::test]
    async fn s6_get_eu_basis_finds_reference() {
        let shell = test_shell().await;
        let result = shell
            .handle_tool_call(
                "get_eu_basis",
                serde_json::json!({ "country": "de", "statuteId": "bdsg:1" }),
            )
            .await;
        assert!(result.ok);
        let data = result.data.unwrap();
        let refs = data["references"].as_array().unwrap();
        assert!(refs.iter().any(|r| r["euId"].as_str().unwrap().contains("2016/679")));
    }

    #[tokio::test]
    async fn s7_unknown_country() {
        let shell = test_shell().await;
        let result = shell
            .handle_tool_call("describe_country", serde_json::json!({ "country": "se" }))
            .await;
        assert!(!result.ok);
        assert_eq!(result.error.unwrap().code, "unknown_country");
    }

    #[tokio::test]
    async fn s8_run_ingestion_missing_country() {
        let shell = test_shell().await;
        let result = shell.handle_tool_call("run_ingestion", serde_json::json!({})).await;
        assert!(!result.ok);
        assert_eq!(result.error.unwrap().code, "invalid_arguments");
    }

    #[tokio::test]
    async fn unknown_tool_name_is_rejected() {
        let shell = test_shell().await;
        let result = shell.handle_tool_call("not_a_real_tool", serde_json::json!({})).await;
        assert!(!result.ok);
        assert_eq!(result.error.unwrap().code, "unknown_tool");
    }
}
