//! Unit tests for request parsing, routing, and connection handling.

use std::sync::Arc;
use std::time::Duration;

use rstest::{fixture, rstest};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};

use wobridge::{InMemoryLedger, RequestId, RequestValidator, WorkOrderProxy};
use wobridge_config::BackendProfile;

use super::*;

const ORDER_ID: &str = "5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a";
const WORKER_ID: &str = "C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3C3";
const REQUESTER_ID: &str = "0f0F0f0F0f0F0f0F0f0F0f0F0f0F0f0F0f0F0f0F0f0F0f0F0f0F0f0F0f0F0f0F";

#[fixture]
fn handler() -> DispatchConnectionHandler<InMemoryLedger> {
    let profile = BackendProfile {
        ledger_provider: Some("http://127.0.0.1:8555".to_owned()),
        event_provider: Some("ws://127.0.0.1:8556".to_owned()),
        registry_address: Some("0x75a3fd17e8d6a8b1c1c5b8d6f0f8e9c1a2b3c4d5".to_owned()),
        identifier_bytes: 32,
        result_timeout: Duration::from_secs(2),
    };
    let proxy = WorkOrderProxy::new(&profile, Some(Arc::new(InMemoryLedger::new())))
        .expect("proxy");
    DispatchConnectionHandler::new(proxy, RequestValidator::default())
}

fn request(id: u64, method: &str, params: &Value) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    }))
    .expect("encode request")
}

fn submit_params() -> Value {
    json!({
        "workOrderId": ORDER_ID,
        "workerId": WORKER_ID,
        "workloadId": "6865617274",
        "requesterId": REQUESTER_ID,
        "payloadFormat": "JSON-RPC",
    })
}

fn to_json(reply: &Reply) -> Value {
    serde_json::to_value(reply).expect("encode reply")
}

async fn next_reply<R: AsyncBufRead + Unpin>(lines: &mut Lines<R>) -> Value {
    let line = lines.next_line().await.expect("read").expect("reply line");
    serde_json::from_str(&line).expect("reply json")
}

#[rstest]
#[case::trailing_newline(b"{\"method\":\"WorkOrderSubmit\"}\n".as_slice())]
#[case::trailing_crlf(b"{\"method\":\"WorkOrderSubmit\"}\r\n".as_slice())]
fn parses_request_lines(#[case] line: &[u8]) {
    let parsed = RpcRequest::parse(line).expect("parse");
    assert_eq!(parsed.method(), "WorkOrderSubmit");
    assert_eq!(parsed.id(), &RequestId::null());
    assert_eq!(parsed.params(), &Value::Null);
}

#[rstest]
fn empty_lines_are_malformed() {
    let error = RpcRequest::parse(b"  \n").expect_err("empty");
    assert!(matches!(error, DispatchError::MalformedJson { source: None, .. }));
}

#[rstest]
fn structural_errors_keep_the_request_id() {
    let error = RpcRequest::parse(br#"{"id":9,"params":{}}"#).expect_err("no method");
    let envelope = error.to_envelope();
    assert_eq!(envelope.id(), &RequestId::from(9_u64));
    assert_eq!(envelope.error().code().code(), 2);
}

#[rstest]
#[case::wrong_version(br#"{"jsonrpc":"1.0","id":3,"method":"WorkOrderSubmit"}"#.as_slice())]
#[case::blank_method(br#"{"jsonrpc":"2.0","id":3,"method":"  "}"#.as_slice())]
fn validate_rejects_bad_envelopes(#[case] line: &[u8]) {
    let parsed = RpcRequest::parse(line).expect("parse");
    let error = parsed.validate().expect_err("invalid");
    assert!(matches!(error, DispatchError::InvalidStructure { .. }));
    assert_eq!(error.to_envelope().id(), &RequestId::from(3_u64));
}

#[rstest]
#[tokio::test]
async fn malformed_json_answers_with_null_id(handler: DispatchConnectionHandler<InMemoryLedger>) {
    let reply = to_json(&handler.dispatch_line(b"not valid json\n").await);
    assert_eq!(reply["jsonrpc"], "2.0");
    assert_eq!(reply["id"], Value::Null);
    assert_eq!(reply["error"]["code"], 2);
    assert_eq!(reply["error"]["message"], "Invalid parameter format or value");
    assert!(reply["error"]["data"].as_str().is_some_and(|data| !data.is_empty()));
}

#[rstest]
#[tokio::test]
async fn unknown_methods_are_invalid_parameters(
    handler: DispatchConnectionHandler<InMemoryLedger>,
) {
    let reply = handler
        .dispatch_line(&request(4, "WorkOrderCancel", &json!({"workOrderId": ORDER_ID})))
        .await;
    assert_eq!(
        to_json(&reply),
        json!({
            "jsonrpc": "2.0",
            "id": 4,
            "error": {
                "code": 2,
                "message": "Invalid parameter format or value",
                "data": "Unknown method: WorkOrderCancel",
            },
        })
    );
}

#[rstest]
#[case::empty_params(json!({}), "Empty dictionary object received")]
#[case::not_an_object(json!([ORDER_ID]), "Parameters must be a JSON object")]
#[case::bad_worker(
    json!({
        "workOrderId": ORDER_ID,
        "workerId": "zz",
        "workloadId": "6865617274",
        "requesterId": REQUESTER_ID,
    }),
    "Invalid data format for worker id"
)]
#[tokio::test]
async fn schema_failures_echo_the_request_id(
    handler: DispatchConnectionHandler<InMemoryLedger>,
    #[case] params: Value,
    #[case] data: &str,
) {
    let reply = to_json(&handler.dispatch_line(&request(5, "WorkOrderSubmit", &params)).await);
    assert_eq!(reply["id"], 5);
    assert_eq!(reply["error"]["code"], 2);
    assert_eq!(reply["error"]["data"], data);
}

#[rstest]
#[case::get("EncryptionKeyGet", json!({"workerId": WORKER_ID}))]
#[case::set("EncryptionKeySet", json!({"workerId": WORKER_ID, "encryptionKey": "abcd"}))]
#[case::start("EncryptionKeyStart", json!({"tag": "rotation"}))]
#[case::retrieve("EncryptionKeyRetrieve", json!({"workerId": WORKER_ID}))]
#[tokio::test]
async fn encryption_key_methods_are_unsupported(
    handler: DispatchConnectionHandler<InMemoryLedger>,
    #[case] method: &str,
    #[case] params: Value,
) {
    let reply = to_json(&handler.dispatch_line(&request(6, method, &params)).await);
    assert_eq!(
        reply,
        json!({
            "jsonrpc": "2.0",
            "id": 6,
            "error": {
                "code": 1,
                "message": "Operation is not supported by this backend",
                "data": method,
            },
        })
    );
}

#[rstest]
#[tokio::test]
async fn submit_complete_and_fetch_over_the_ledger(
    handler: DispatchConnectionHandler<InMemoryLedger>,
) {
    let submitted = handler
        .dispatch_line(&request(1, "WorkOrderSubmit", &submit_params()))
        .await;
    assert_eq!(
        to_json(&submitted),
        json!({"jsonrpc": "2.0", "id": 1, "result": {"workOrderId": ORDER_ID, "code": 0}})
    );

    let response = json!({"result": {"workOrderId": ORDER_ID, "outData": []}});
    let completed = handler
        .dispatch_line(&request(
            2,
            "WorkOrderComplete",
            &json!({"workOrderId": ORDER_ID, "workOrderResponse": response.clone()}),
        ))
        .await;
    assert!(!completed.is_error());

    let fetched = handler
        .dispatch_line(&request(3, "WorkOrderGetResult", &json!({"workOrderId": ORDER_ID})))
        .await;
    assert_eq!(
        to_json(&fetched),
        json!({"jsonrpc": "2.0", "id": 3, "result": response})
    );
}

#[rstest]
#[tokio::test]
async fn duplicate_submission_reports_failure(handler: DispatchConnectionHandler<InMemoryLedger>) {
    let line = request(1, "WorkOrderSubmit", &submit_params());
    assert!(!handler.dispatch_line(&line).await.is_error());

    let reply = to_json(&handler.dispatch_line(&line).await);
    assert_eq!(reply["error"]["code"], 1);
    assert_eq!(reply["error"]["data"], ORDER_ID);
}

#[rstest]
#[tokio::test]
async fn completing_an_unknown_order_reports_failure(
    handler: DispatchConnectionHandler<InMemoryLedger>,
) {
    let reply = to_json(
        &handler
            .dispatch_line(&request(
                8,
                "WorkOrderComplete",
                &json!({"workOrderId": ORDER_ID, "workOrderResponse": {"result": {}}}),
            ))
            .await,
    );
    assert_eq!(reply["id"], 8);
    assert_eq!(reply["error"]["code"], 1);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn absent_results_answer_pending_after_the_timeout(
    handler: DispatchConnectionHandler<InMemoryLedger>,
) {
    let reply = to_json(
        &handler
            .dispatch_line(&request(7, "WorkOrderGetResult", &json!({"workOrderId": ORDER_ID})))
            .await,
    );
    assert_eq!(reply["id"], 7);
    assert_eq!(reply["error"]["code"], 5);
    assert_eq!(reply["error"]["message"], "Work order result is not available");
    assert_eq!(reply["error"]["data"]["workOrderId"], ORDER_ID);
    assert_eq!(reply["error"]["data"]["timeoutSecs"], 2);
}

#[rstest]
#[tokio::test]
async fn short_identifiers_are_rejected_before_the_ledger(
    handler: DispatchConnectionHandler<InMemoryLedger>,
) {
    let reply = to_json(
        &handler
            .dispatch_line(&request(9, "WorkOrderGetResult", &json!({"workOrderId": "5a5a"})))
            .await,
    );
    assert_eq!(reply["id"], 9);
    assert_eq!(reply["error"]["code"], 2);
}

#[rstest]
#[tokio::test]
async fn connection_answers_each_line_in_order(
    handler: DispatchConnectionHandler<InMemoryLedger>,
) {
    let (client, server) = tokio::io::duplex(4096);
    let serving = tokio::spawn(async move { handler.serve_connection(server).await });

    let (read_half, mut write_half) = tokio::io::split(client);
    let mut payload = request(1, "WorkOrderSubmit", &submit_params());
    payload.extend_from_slice(b"\n\n");
    payload.extend_from_slice(&request(2, "WorkOrderCancel", &json!({"a": 1})));
    payload.push(b'\n');
    write_half.write_all(&payload).await.expect("write");
    write_half.shutdown().await.expect("shutdown");

    let mut lines = BufReader::new(read_half).lines();
    let first = next_reply(&mut lines).await;
    let second = next_reply(&mut lines).await;
    assert_eq!(first["id"], 1);
    assert_eq!(first["result"]["code"], 0);
    assert_eq!(second["id"], 2);
    assert_eq!(second["error"]["data"], "Unknown method: WorkOrderCancel");
    assert!(lines.next_line().await.expect("read").is_none());

    serving.await.expect("connection task");
}

#[rstest]
#[tokio::test]
async fn oversized_requests_are_refused(handler: DispatchConnectionHandler<InMemoryLedger>) {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let serving = tokio::spawn(async move { handler.serve_connection(server).await });

    let (read_half, mut write_half) = tokio::io::split(client);
    let writer = tokio::spawn(async move {
        let oversized = vec![b'a'; MAX_REQUEST_BYTES + 16];
        // The server stops reading once the limit is hit.
        let _outcome = write_half.write_all(&oversized).await;
    });

    let mut lines = BufReader::new(read_half).lines();
    let reply = next_reply(&mut lines).await;
    assert_eq!(reply["id"], Value::Null);
    assert_eq!(reply["error"]["code"], 2);
    assert!(
        reply["error"]["data"]
            .as_str()
            .is_some_and(|data| data.contains("request too large"))
    );

    serving.await.expect("connection task");
    writer.abort();
}

#[rstest]
#[tokio::test]
async fn response_writer_frames_replies_as_lines() {
    let mut writer = ResponseWriter::new(Vec::new());
    let reply = Reply::from(wobridge::ResultEnvelope::new(RequestId::from("a"), json!(true)));
    writer.write_reply(&reply).await.expect("write");
    writer.write_reply(&reply).await.expect("write");
    let written = String::from_utf8(writer.into_inner()).expect("utf8");
    assert_eq!(
        written,
        "{\"jsonrpc\":\"2.0\",\"id\":\"a\",\"result\":true}\n".repeat(2)
    );
}
