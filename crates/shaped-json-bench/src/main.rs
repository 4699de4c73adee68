//! Benchmark for shaped JSON using a file of JSON documents.
//!
//! Encodes every document against one shape table, checks that decoding and
//! stringifying agree with the input, and reports sizes and timings.

use std::fs;
use std::time::Instant;

use serde::Serialize;
use shaped_json::{
    decode, encode_with_options, is_system_attribute, stringify, stringify_value, EncodeOptions,
    MemoryShapeTable, ShapedJson, Value,
};

/// Summary printed at the end of a run.
#[derive(Debug, Default, Serialize)]
struct Report {
    documents: usize,
    rejected: usize,
    mismatches: usize,
    shapes: usize,
    attributes: usize,
    json_bytes: usize,
    shaped_bytes: usize,
    encode_ms: f64,
    decode_ms: f64,
    stringify_ms: f64,
}

fn convert(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::List(items.into_iter().map(convert).collect()),
        serde_json::Value::Object(map) => {
            Value::Object(map.into_iter().map(|(k, v)| (k, convert(v))).collect())
        }
    }
}

fn main() {
    let mut args = std::env::args().skip(1);
    let data_path = args
        .next()
        .unwrap_or_else(|| "data/documents.json".to_string());
    let as_json = args.any(|a| a == "--json");
    let skip_system = std::env::var_os("SHAPED_JSON_KEEP_SYSTEM").is_none();

    println!("Loading documents from: {}", data_path);
    let text = fs::read_to_string(&data_path).expect("Failed to read input file");

    let parse_start = Instant::now();
    let parsed: serde_json::Value = serde_json::from_str(&text).expect("Failed to parse JSON");
    let documents: Vec<Value> = match parsed {
        serde_json::Value::Array(items) => items.into_iter().map(convert).collect(),
        other => vec![convert(other)],
    };
    println!("Parsed {} documents in {:?}", documents.len(), parse_start.elapsed());

    let mut report = Report {
        documents: documents.len(),
        json_bytes: text.len(),
        ..Report::default()
    };

    // Encode
    let mut table = MemoryShapeTable::new();
    let options = if skip_system {
        EncodeOptions::new().with_reserved_key_filter(&is_system_attribute)
    } else {
        EncodeOptions::new()
    };
    let encode_start = Instant::now();
    let mut shaped: Vec<(usize, ShapedJson)> = Vec::with_capacity(documents.len());
    for (i, doc) in documents.iter().enumerate() {
        match encode_with_options(&mut table, doc, &options) {
            Ok(s) => shaped.push((i, s)),
            Err(e) => {
                eprintln!("document {i}: {e}");
                report.rejected += 1;
            }
        }
    }
    report.encode_ms = encode_start.elapsed().as_secs_f64() * 1000.0;
    report.shapes = table.len_shapes();
    report.attributes = table.len_attributes();
    report.shaped_bytes = shaped.iter().map(|(_, s)| s.data.len()).sum();

    // Decode
    let decode_start = Instant::now();
    let decoded: Vec<Value> = shaped
        .iter()
        .map(|(_, s)| decode(&table, s).expect("Failed to decode"))
        .collect();
    report.decode_ms = decode_start.elapsed().as_secs_f64() * 1000.0;

    // Stringify
    let stringify_start = Instant::now();
    let texts: Vec<String> = shaped
        .iter()
        .map(|(_, s)| {
            let mut out = String::new();
            stringify(&table, s, &mut out).expect("Failed to stringify");
            out
        })
        .collect();
    report.stringify_ms = stringify_start.elapsed().as_secs_f64() * 1000.0;

    // Verify
    for (((i, _), value), text) in shaped.iter().zip(&decoded).zip(&texts) {
        let mut expected = documents[*i].clone();
        if skip_system {
            if let Value::Object(members) = &mut expected {
                members.retain(|(k, _)| !is_system_attribute(k));
            }
        }
        let mut from_tree = String::new();
        stringify_value(value, &mut from_tree);
        if value.sorted() != expected.sorted() || *text != from_tree {
            eprintln!("document {i}: round trip mismatch");
            report.mismatches += 1;
        }
    }

    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).expect("Failed to serialize report")
        );
        return;
    }

    println!();
    println!("=== Shaped JSON ===");
    println!("Documents:   {} ({} rejected, {} mismatched)", report.documents, report.rejected, report.mismatches);
    println!("Shapes:      {}", report.shapes);
    println!("Attributes:  {}", report.attributes);
    println!(
        "Size:        {} JSON bytes -> {} shaped bytes ({:.1}%)",
        report.json_bytes,
        report.shaped_bytes,
        100.0 * report.shaped_bytes as f64 / report.json_bytes.max(1) as f64
    );
    println!("Encode:      {:.2} ms", report.encode_ms);
    println!("Decode:      {:.2} ms", report.decode_ms);
    println!("Stringify:   {:.2} ms", report.stringify_ms);
}
