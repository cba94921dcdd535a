// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use facture_app::Decimal;
use facture_catalog::{CatalogLoadError, CatalogSource, Loader};
use facture_testkit::{MockCatalogServer, SAMPLE_CATALOG_JSON, temp_catalog_file};
use std::path::PathBuf;
use std::time::Duration;

fn loader() -> Result<Loader> {
    Loader::new(Duration::from_secs(1))
}

#[test]
fn http_catalog_loads_entries_in_source_order() -> Result<()> {
    let server = MockCatalogServer::json(SAMPLE_CATALOG_JSON)?;
    let source = CatalogSource::parse(&server.url("/products.json"))?;

    let entries = loader()?.load(&source)?;
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0].description, "Widget A");
    assert_eq!(entries[0].price, Decimal::from_cents(999));
    assert_eq!(entries[2].price, Decimal::from_cents(450));

    let request = server.finish()?;
    assert_eq!(request.method, "GET");
    assert_eq!(request.url, "/products.json");
    Ok(())
}

#[test]
fn http_error_status_is_reported_with_server_message() -> Result<()> {
    let server = MockCatalogServer::respond(404, "application/json", r#"{"error":"no such file"}"#)?;
    let source = CatalogSource::parse(&server.url("products.json"))?;

    let error = loader()?
        .load(&source)
        .expect_err("404 should fail the load");
    match &error {
        CatalogLoadError::Status { status, detail, .. } => {
            assert_eq!(*status, 404);
            assert_eq!(detail, ": no such file");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(error.to_string().contains("HTTP 404"));
    server.finish()?;
    Ok(())
}

#[test]
fn html_error_pages_are_not_echoed() -> Result<()> {
    let server = MockCatalogServer::respond(500, "text/html", "<html><body>boom</body></html>")?;
    let source = CatalogSource::parse(&server.url("products.json"))?;

    let error = loader()?.load(&source).expect_err("500 should fail");
    assert_eq!(error.to_string(), format!("catalog {} returned HTTP 500", error.location()));
    server.finish()?;
    Ok(())
}

#[test]
fn malformed_json_is_a_load_error() -> Result<()> {
    let server = MockCatalogServer::json("{\"products\": oops")?;
    let source = CatalogSource::parse(&server.url("products.json"))?;

    let error = loader()?.load(&source).expect_err("bad JSON should fail");
    assert!(matches!(error, CatalogLoadError::Malformed { .. }));
    server.finish()?;
    Ok(())
}

#[test]
fn unreachable_host_is_a_load_error() -> Result<()> {
    let loader = Loader::new(Duration::from_millis(50))?;
    let source = CatalogSource::parse("http://127.0.0.1:1/products.json")?;

    let error = loader.load(&source).expect_err("closed port should fail");
    assert!(matches!(error, CatalogLoadError::Unreachable { .. }));
    assert!(error.to_string().contains("cannot reach catalog"));
    Ok(())
}

#[test]
fn file_catalog_loads_from_disk() -> Result<()> {
    let (_dir, path) = temp_catalog_file(SAMPLE_CATALOG_JSON)?;
    let entries = loader()?.load(&CatalogSource::File(path))?;
    assert_eq!(entries.len(), 4);
    Ok(())
}

#[test]
fn missing_file_is_unreadable() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let source = CatalogSource::File(dir.path().join("missing.json"));
    let error = loader()?.load(&source).expect_err("missing file should fail");
    assert!(matches!(error, CatalogLoadError::Unreadable { .. }));
    Ok(())
}

#[test]
fn file_url_sources_resolve_to_paths() -> Result<()> {
    let (_dir, path) = temp_catalog_file("[]")?;
    let url = format!("file://{}", path.display());
    let source = CatalogSource::parse(&url)?;
    assert_eq!(source, CatalogSource::File(PathBuf::from(&path)));
    assert!(loader()?.load(&source)?.is_empty());
    Ok(())
}
