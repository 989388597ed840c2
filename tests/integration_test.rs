//! End-to-end coverage of `Shell::handle_tool_call` against a Store that is
//! deliberately unavailable (no corpus file), exercising the German
//! adapter's seed-data fallback. Covers scenarios S1-S8.

use german_law_retrieval_core::adapter::GermanAdapter;
use german_law_retrieval_core::registry::Registry;
use german_law_retrieval_core::shell::Shell;
use german_law_retrieval_core::store::Store;
use serde_json::json;
use std::sync::Arc;

async fn shell_with_seed_fallback() -> Shell {
    let store = Arc::new(
        Store::open("/nonexistent/integration/corpus.db", 1000)
            .await
            .expect("opening a missing store should not error"),
    );
    let mut registry = Registry::new();
    registry
        .register(Arc::new(GermanAdapter::new(store, None)))
        .expect("single registration should succeed");
    Shell::new(registry)
}

#[tokio::test]
async fn s1_parse_citation_normalizes_and_extracts_components() {
    let shell = shell_with_seed_fallback().await;
    let result = shell
        .handle_tool_call(
            "parse_citation",
            json!({ "country": "de", "citation": "§ 823 abs. 1 bgb" }),
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
async fn s2_validate_citation_accepts_article_form() {
    let shell = shell_with_seed_fallback().await;
    let result = shell
        .handle_tool_call(
            "validate_citation",
            json!({ "country": "de", "citation": "Artikel 1 Absatz 1 GG" }),
        )
        .await;

    assert!(result.ok);
    let data = result.data.unwrap();
    assert_eq!(data["valid"], true);
    assert_eq!(data["normalized"], "Art. 1 Abs. 1 GG");
}

#[tokio::test]
async fn s3_format_citation_short_style_drops_subdivision_tail() {
    let shell = shell_with_seed_fallback().await;
    let result = shell
        .handle_tool_call(
            "format_citation",
            json!({ "country": "de", "citation": "§ 1 Absatz 1 bdsg", "style": "short" }),
        )
        .await;

    assert!(result.ok);
    assert_eq!(result.data.unwrap()["formatted"], "§ 1 BDSG");
}

#[tokio::test]
async fn s4_search_documents_ranks_matching_citation_first() {
    let shell = shell_with_seed_fallback().await;
    let result = shell
        .handle_tool_call(
            "search_documents",
            json!({ "country": "de", "query": "§ 1 BDSG", "limit": 2 }),
        )
        .await;

    assert!(result.ok);
    let data = result.data.unwrap();
    let documents = data["documents"].as_array().unwrap();
    assert!(!documents.is_empty());
    assert_eq!(documents[0]["id"], "bdsg:1");
}

#[tokio::test]
async fn s5_check_currency_reports_likely_in_force() {
    let shell = shell_with_seed_fallback().await;
    let result = shell
        .handle_tool_call(
            "check_currency",
            json!({ "country": "de", "statuteId": "bdsg:1" }),
        )
        .await;

    assert!(result.ok);
    let data = result.data.unwrap();
    assert_eq!(data["status"], "likely_in_force");
    assert!(data["evidence"]["matches"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn s6_get_eu_basis_finds_embedded_gdpr_reference() {
    let shell = shell_with_seed_fallback().await;
    let result = shell
        .handle_tool_call(
            "get_eu_basis",
            json!({ "country": "de", "statuteId": "bdsg:1" }),
        )
        .await;

    assert!(result.ok);
    let data = result.data.unwrap();
    let references = data["references"].as_array().unwrap();
    assert!(references
        .iter()
        .any(|r| r["euId"].as_str().unwrap().contains("2016/679")));
}

#[tokio::test]
async fn s7_describe_unregistered_country_is_unknown_country() {
    let shell = shell_with_seed_fallback().await;
    let result = shell
        .handle_tool_call("describe_country", json!({ "country": "se" }))
        .await;

    assert!(!result.ok);
    assert_eq!(result.error.unwrap().code, "unknown_country");
}

#[tokio::test]
async fn s8_run_ingestion_without_country_is_invalid_arguments() {
    let shell = shell_with_seed_fallback().await;
    let result = shell.handle_tool_call("run_ingestion", json!({})).await;

    assert!(!result.ok);
    assert_eq!(result.error.unwrap().code, "invalid_arguments");
}

#[tokio::test]
async fn list_countries_reports_all_registered_adapters() {
    let shell = shell_with_seed_fallback().await;
    let result = shell.handle_tool_call("list_countries", json!({})).await;

    assert!(result.ok);
    let countries = result.data.unwrap();
    let countries = countries.as_array().unwrap();
    assert_eq!(countries.len(), 1);
    assert_eq!(countries[0]["country"], "de");
}

#[tokio::test]
async fn unsupported_capability_is_reported_for_citation_only_adapters() {
    let store = Arc::new(
        Store::open("/nonexistent/integration/corpus2.db", 1000)
            .await
            .unwrap(),
    );
    let mut registry = Registry::new();
    registry
        .register(Arc::new(GermanAdapter::new(store, None)))
        .unwrap();
    registry
        .register(Arc::new(
            german_law_retrieval_core::adapter::CitationOnlyAdapter::swedish(),
        ))
        .unwrap();
    let shell = Shell::new(registry);

    let result = shell
        .handle_tool_call(
            "search_documents",
            json!({ "country": "se", "query": "anything" }),
        )
        .await;

    assert!(!result.ok);
    assert_eq!(result.error.unwrap().code, "unsupported_capability");
}
