//! End-to-end tests for snippet/full highlighting of nested fields.

use kasane::collection::Collection;
use kasane::error::Result;
use kasane::index::WriteOperation;
use kasane::schema::{CollectionSchema, Field, FieldType};
use kasane::search::SearchRequest;
use serde_json::json;

fn collection() -> Result<Collection> {
    let schema = CollectionSchema {
        name: "coll1".to_string(),
        enable_nested_fields: true,
        fields: vec![Field::new(".*", FieldType::Auto)],
    };
    let coll = Collection::with_memory(&schema)?;
    coll.add(
        json!({
            "company_names": ["Space Corp. LLC", "Drive One Inc."],
            "company": {"names": ["Space Corp. LLC", "Drive One Inc."]},
            "locations": [
                { "pincode": 100, "country": "USA",
                  "address": { "street": "One Bowerman Drive", "city": "Beaverton",
                               "products": ["shoes", "tshirts"] }
                },
                { "pincode": 200, "country": "Canada",
                  "address": { "street": "175 Commerce Drive", "city": "Thornhill",
                               "products": ["sneakers", "shoes"] }
                }
            ]
        }),
        WriteOperation::Create,
    )?;
    Ok(coll)
}

#[test]
fn test_full_highlight_of_nested_object_path() -> Result<()> {
    let coll = collection()?;

    let results = coll.search(
        &SearchRequest::new("One")
            .query_by(["locations.address"])
            .highlight_full_fields("locations.address"),
    )?;
    assert_eq!(results.hits.len(), 1);

    assert_eq!(
        results.hits[0].highlight.full,
        json!({
            "locations": [
                {"address": {
                    "street": "<mark>One</mark> Bowerman Drive",
                    "city": "Beaverton",
                    "products": ["shoes", "tshirts"]
                }},
                {"address": {
                    "street": "175 Commerce Drive",
                    "city": "Thornhill",
                    "products": ["sneakers", "shoes"]
                }}
            ]
        })
    );
    assert!(results.hits[0].highlights.is_empty());
    Ok(())
}

#[test]
fn test_repeating_token_wraps_every_occurrence() -> Result<()> {
    let coll = collection()?;

    let results = coll.search(&SearchRequest::new("drive").query_by(["locations.address"]))?;
    assert_eq!(results.hits.len(), 1);
    assert_eq!(
        results.hits[0].highlight.snippet,
        json!({
            "locations": [
                {"address": {"street": "One Bowerman <mark>Drive</mark>"}},
                {"address": {"street": "175 Commerce <mark>Drive</mark>"}}
            ]
        })
    );
    Ok(())
}

#[test]
fn test_highlight_parent_of_searched_array_leaf() -> Result<()> {
    let coll = collection()?;

    let results = coll.search(
        &SearchRequest::new("shoes")
            .query_by(["locations.address.products"])
            .highlight_full_fields("locations.address"),
    )?;
    assert_eq!(results.hits.len(), 1);

    let expected = json!({
        "locations": [
            {"address": {
                "street": "One Bowerman Drive",
                "city": "Beaverton",
                "products": ["<mark>shoes</mark>", "tshirts"]
            }},
            {"address": {
                "street": "175 Commerce Drive",
                "city": "Thornhill",
                "products": ["sneakers", "<mark>shoes</mark>"]
            }}
        ]
    });
    assert_eq!(results.hits[0].highlight.full, expected);
    assert_eq!(results.hits[0].highlight.snippet, expected);
    Ok(())
}

#[test]
fn test_multiple_full_highlight_fields() -> Result<()> {
    let coll = collection()?;

    let results = coll.search(
        &SearchRequest::new("drive")
            .query_by(["company.names", "company_names", "locations.address"])
            .highlight_full_fields("company.names,company_names,locations.address"),
    )?;
    assert_eq!(results.hits.len(), 1);

    assert_eq!(
        results.hits[0].highlight.full,
        json!({
            "company_names": ["Space Corp. LLC", "<mark>Drive</mark> One Inc."],
            "company": {"names": ["Space Corp. LLC", "<mark>Drive</mark> One Inc."]},
            "locations": [
                {"address": {
                    "street": "One Bowerman <mark>Drive</mark>",
                    "city": "Beaverton",
                    "products": ["shoes", "tshirts"]
                }},
                {"address": {
                    "street": "175 Commerce <mark>Drive</mark>",
                    "city": "Thornhill",
                    "products": ["sneakers", "shoes"]
                }}
            ]
        })
    );
    assert_eq!(
        results.hits[0].highlight.snippet,
        results.hits[0].highlight.full
    );
    Ok(())
}

#[test]
fn test_snippet_only_covers_matching_subfields() -> Result<()> {
    let coll = collection()?;

    let results = coll.search(
        &SearchRequest::new("space").query_by([
            "company.names",
            "company_names",
            "locations.address",
        ]),
    )?;
    assert_eq!(results.hits.len(), 1);
    assert_eq!(
        results.hits[0].highlight.snippet,
        json!({
            "company_names": ["<mark>Space</mark> Corp. LLC", "Drive One Inc."],
            "company": {"names": ["<mark>Space</mark> Corp. LLC", "Drive One Inc."]}
        })
    );
    assert_eq!(results.hits[0].highlight.full, json!({}));
    Ok(())
}

#[test]
fn test_single_full_highlight_field() -> Result<()> {
    let coll = collection()?;

    let results = coll.search(
        &SearchRequest::new("space")
            .query_by(["company.names", "company_names", "locations.address"])
            .highlight_full_fields("company.names"),
    )?;

    assert_eq!(
        results.hits[0].highlight.full,
        json!({
            "company": {"names": ["<mark>Space</mark> Corp. LLC", "Drive One Inc."]}
        })
    );
    assert_eq!(
        results.hits[0].highlight.snippet,
        json!({
            "company_names": ["<mark>Space</mark> Corp. LLC", "Drive One Inc."],
            "company": {"names": ["<mark>Space</mark> Corp. LLC", "Drive One Inc."]}
        })
    );
    Ok(())
}

#[test]
fn test_unknown_and_id_highlight_fields_yield_empty_trees() -> Result<()> {
    let coll = collection()?;

    let results = coll.search(
        &SearchRequest::new("brown fox")
            .query_by(["company_names", "locations"])
            .highlight_full_fields("x"),
    )?;
    assert_eq!(results.hits.len(), 0);

    let results = coll.search(
        &SearchRequest::new("shoes")
            .query_by(["locations.address.products"])
            .highlight_full_fields("id"),
    )?;
    assert_eq!(results.hits.len(), 1);
    assert_eq!(results.hits[0].highlight.full, json!({}));
    Ok(())
}

#[test]
fn test_highlight_meta_lists_matched_tokens() -> Result<()> {
    let schema = CollectionSchema {
        name: "coll1".to_string(),
        enable_nested_fields: true,
        fields: vec![Field::new(".*", FieldType::Auto)],
    };
    let coll = Collection::with_memory(&schema)?;
    coll.add(
        json!({
            "company_names": ["Quick brown fox jumped.", "The red fox was not fast."],
            "details": {
                "description": "Quick set, go.",
                "names": ["Quick brown fox jumped.", "The red fox was not fast."]
            },
            "locations": [
                {"address": {"street": "Brown Shade Avenue"}},
                {"address": {"street": "Graywolf Lane"}}
            ]
        }),
        WriteOperation::Create,
    )?;

    let results = coll.search(
        &SearchRequest::new("brown fox").query_by(["company_names", "details", "locations"]),
    )?;
    assert_eq!(results.hits.len(), 1);

    assert_eq!(
        results.hits[0].highlight.meta,
        json!({
            "company_names": {"matched_tokens": ["brown", "fox"]},
            "details.names": {"matched_tokens": ["brown", "fox"]},
            "locations.address.street": {"matched_tokens": ["Brown"]}
        })
    );
    Ok(())
}

#[test]
fn test_custom_markers_and_snippet_threshold() -> Result<()> {
    let schema = CollectionSchema {
        name: "coll1".to_string(),
        enable_nested_fields: true,
        fields: vec![Field::new(".*", FieldType::Auto)],
    };
    let coll = Collection::with_memory(&schema)?;
    coll.add(
        json!({"details": {"description": "alpha beta gamma delta target epsilon zeta eta theta"}}),
        WriteOperation::Create,
    )?;

    let results = coll.search(
        &SearchRequest::new("target")
            .query_by(["details.description"])
            .highlight_tags("<em>", "</em>")
            .snippet_threshold(2),
    )?;
    assert_eq!(
        results.hits[0].highlight.snippet,
        json!({"details": {"description": "gamma delta <em>target</em> epsilon zeta"}})
    );
    Ok(())
}
