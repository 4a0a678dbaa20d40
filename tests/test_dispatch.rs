//! End-to-end dispatch: YAML bindings -> envelopes -> functions -> outbound envelopes

use std::io::Write;
use std::thread;

use istad_stream::{
    BindingConfig, CapturedTraceSink, Dispatcher, EnvelopeBody, FunctionRegistry,
    MessageEnvelope, NdjsonWriter, OutboundEnvelope, Payload, Product, StreamError,
};
use serde_json::json;

const BINDINGS: &str = r#"
definition: processOracleMessage;processProductDetail;processProduct;processMessage
bindings:
  processOracleMessage-in-0:
    destination: oracle.records
  processProductDetail-in-0:
    destination: product.details
  processProductDetail-out-0:
    destination: product.recoded
  processProduct-in-0:
    destination: product.recoded
  processMessage-in-0:
    destination: text.messages
"#;

fn write_config() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("Should create temp file");
    file.write_all(BINDINGS.as_bytes()).expect("Should write config");
    file
}

fn process(
    dispatcher: &Dispatcher<'_>,
    envelope: MessageEnvelope,
    trace: &CapturedTraceSink,
) -> Result<Option<OutboundEnvelope>, StreamError> {
    let id = envelope.message_id;
    let payload = envelope.body.into_payload()?;
    match dispatcher.dispatch(&envelope.destination, payload, trace)? {
        Some(outbound) => OutboundEnvelope::from_outbound(id, outbound).map(Some),
        None => Ok(None),
    }
}

#[test]
fn test_feed_through_all_functions() {
    let config_file = write_config();
    let config = BindingConfig::load_from_file(config_file.path()).unwrap();
    let registry = FunctionRegistry::with_builtin_functions();
    let dispatcher = Dispatcher::new(&registry, &config).unwrap();
    let trace = CapturedTraceSink::new();

    let feed = vec![
        json!({
            "destination": "oracle.records",
            "body": {
                "kind": "record",
                "schema": {
                    "type": "record",
                    "name": "Customer",
                    "fields": [
                        {"name": "id", "type": "long"},
                        {"name": "email", "type": ["null", "string"], "default": null}
                    ]
                },
                "value": {"id": 42}
            }
        }),
        json!({"destination": "product.details", "body": {"kind": "product", "code": "x1", "qty": 3}}),
        json!({"destination": "text.messages", "body": {"kind": "text", "text": "hello"}}),
    ];

    let mut emitted = Vec::new();
    for message in feed {
        let envelope: MessageEnvelope = serde_json::from_value(message).unwrap();
        if let Some(out) = process(&dispatcher, envelope, &trace).unwrap() {
            emitted.push(out);
        }
    }

    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].destination, "product.recoded");
    assert_eq!(emitted[0].body, EnvelopeBody::Product(Product::new("ISTAD-X1", 3)));

    assert_eq!(
        trace.lines(),
        vec![
            "id: 42",
            "email: null",
            "Full Record: {id=42, email=null}",
            "Old product: x1",
            "Old product: 3",
            "Processing: hello",
        ]
    );

    // Recoded output feeds the product observer
    let recoded = MessageEnvelope::new("product.recoded", emitted.remove(0).body);
    trace.take();
    assert!(process(&dispatcher, recoded, &trace).unwrap().is_none());
    assert_eq!(trace.lines(), vec!["obj product: ISTAD-X1", "obj product: 3"]);
}

#[test]
fn test_outbound_written_as_ndjson() {
    let config = BindingConfig::from_yaml_str(BINDINGS).unwrap();
    let registry = FunctionRegistry::with_builtin_functions();
    let dispatcher = Dispatcher::new(&registry, &config).unwrap();
    let trace = CapturedTraceSink::new();

    let mut buf = Vec::new();
    let mut writer = NdjsonWriter::new(&mut buf);

    for code in ["a", "b"] {
        let envelope = MessageEnvelope::new("product.details", EnvelopeBody::Product(Product::new(code, 1)));
        let out = process(&dispatcher, envelope, &trace).unwrap().unwrap();
        writer.write(&out).unwrap();
    }
    writer.flush().unwrap();

    let output = String::from_utf8(buf).unwrap();
    let lines: Vec<serde_json::Value> = output
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["destination"], "product.recoded");
    assert_eq!(lines[0]["body"]["code"], "ISTAD-A");
    assert_eq!(lines[1]["body"]["code"], "ISTAD-B");
}

#[test]
fn test_failures_surface_to_caller() {
    let config = BindingConfig::from_yaml_str(BINDINGS).unwrap();
    let registry = FunctionRegistry::with_builtin_functions();
    let dispatcher = Dispatcher::new(&registry, &config).unwrap();
    let trace = CapturedTraceSink::new();

    let empty_code = MessageEnvelope::new(
        "product.details",
        EnvelopeBody::Product(Product { code: None, qty: 1 }),
    );
    assert!(matches!(
        process(&dispatcher, empty_code, &trace),
        Err(StreamError::InvalidField { .. })
    ));

    let wrong_kind = MessageEnvelope::new("oracle.records", EnvelopeBody::Text { text: "x".to_string() });
    assert!(matches!(
        process(&dispatcher, wrong_kind, &trace),
        Err(StreamError::UnexpectedFault(_))
    ));

    let unbound = MessageEnvelope::new("nowhere", EnvelopeBody::Text { text: "x".to_string() });
    assert!(matches!(
        process(&dispatcher, unbound, &trace),
        Err(StreamError::UnexpectedFault(_))
    ));

    assert!(trace.lines().is_empty());
}

#[test]
fn test_concurrent_dispatch() {
    let config = BindingConfig::from_yaml_str(BINDINGS).unwrap();
    let registry = FunctionRegistry::with_builtin_functions();
    let dispatcher = Dispatcher::new(&registry, &config).unwrap();
    let trace = CapturedTraceSink::new();

    thread::scope(|scope| {
        for worker in 0..4 {
            let dispatcher = &dispatcher;
            let trace = &trace;
            scope.spawn(move || {
                for i in 0..25 {
                    let product = Product::new(format!("w{}-{}", worker, i), i);
                    let out = dispatcher
                        .dispatch("product.details", Payload::Product(product), trace)
                        .unwrap()
                        .unwrap();
                    match out.payload {
                        Payload::Product(p) => {
                            assert_eq!(p.code, Some(format!("ISTAD-W{}-{}", worker, i)));
                            assert_eq!(p.qty, i);
                        }
                        other => panic!("unexpected payload {:?}", other),
                    }
                }
            });
        }
    });

    assert_eq!(trace.lines().len(), 4 * 25 * 2);
}
