//! Unit tests for the submission executor.

use std::sync::Arc;

use rstest::rstest;
use serde_json::json;

use super::*;
use crate::backend::{BackendError, Receipt};
use crate::test_support::{HEX_LEN, MockLedger, ORDER_ID, REQUESTER_ID, WORKER_ID};

fn request(work_order_id: &str, worker_id: &str, requester_id: &str) -> WorkOrderRequest {
    let params = json!({
        "workOrderId": work_order_id,
        "workerId": worker_id,
        "workloadId": "6865617274",
        "requesterId": requester_id,
    });
    WorkOrderRequest::from_params(&params, RequestId::from(42_u64)).expect("request")
}

fn executor_returning(outcome: Result<Receipt, BackendError>) -> SubmissionExecutor<MockLedger> {
    let mut ledger = MockLedger::new();
    ledger
        .expect_submit()
        .times(1)
        .return_once(move |_operation| outcome);
    SubmissionExecutor::new(Arc::new(ledger), HEX_LEN)
}

fn executor_unused() -> SubmissionExecutor<MockLedger> {
    let mut ledger = MockLedger::new();
    ledger.expect_submit().never();
    SubmissionExecutor::new(Arc::new(ledger), HEX_LEN)
}

#[rstest]
#[case::accepted(Ok(Receipt::new("0x01", Some(1))), WorkOrderStatus::Success)]
#[case::reverted(Ok(Receipt::new("0x02", Some(0))), WorkOrderStatus::Failed)]
#[case::flagless(Ok(Receipt::new("0x03", None)), WorkOrderStatus::UnknownError)]
#[case::fault(Err(BackendError::transaction("gas exhausted")), WorkOrderStatus::Failed)]
fn submit_maps_backend_outcome(
    #[case] outcome: Result<Receipt, BackendError>,
    #[case] expected: WorkOrderStatus,
) {
    let executor = executor_returning(outcome);
    let status = executor
        .submit(&request(ORDER_ID, WORKER_ID, REQUESTER_ID))
        .expect("validated request");
    assert_eq!(status, expected);
}

#[test]
fn submit_sends_normalised_identifiers_and_raw_params() {
    let mut ledger = MockLedger::new();
    ledger
        .expect_submit()
        .withf(|operation| match operation {
            LedgerOperation::Submit {
                work_order_id,
                worker_id,
                requester_id,
                request,
            } => {
                work_order_id.as_str() == ORDER_ID
                    && worker_id == &WORKER_ID.to_ascii_lowercase()
                    && requester_id == &REQUESTER_ID.to_ascii_lowercase()
                    && request.contains("6865617274")
            }
            LedgerOperation::Complete { .. } => false,
        })
        .times(1)
        .return_once(|_| Ok(Receipt::new("0x01", Some(Receipt::SUCCESS_FLAG))));
    let executor = SubmissionExecutor::new(Arc::new(ledger), HEX_LEN);

    let status = executor
        .submit(&request(ORDER_ID, WORKER_ID, REQUESTER_ID))
        .expect("validated request");
    assert_eq!(status, WorkOrderStatus::Success);
}

#[rstest]
#[case::short_order("abcd", WORKER_ID, REQUESTER_ID, "work order id")]
#[case::empty_worker(ORDER_ID, "", REQUESTER_ID, "worker id")]
#[case::non_hex_requester(
    ORDER_ID,
    WORKER_ID,
    "zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz",
    "requester id"
)]
fn submit_rejects_bad_identifiers_before_calling_backend(
    #[case] work_order_id: &str,
    #[case] worker_id: &str,
    #[case] requester_id: &str,
    #[case] named: &str,
) {
    let executor = executor_unused();
    let error = executor
        .submit(&request(work_order_id, worker_id, requester_id))
        .expect_err("invalid identifier");
    assert_eq!(error.status(), WorkOrderStatus::InvalidParameterFormatOrValue);
    assert!(error.to_string().contains(named), "{error}");
    let ProxyError::InvalidParameterFormatOrValue { request_id, .. } = error else {
        panic!("expected a parameter error");
    };
    assert_eq!(request_id, Some(RequestId::from(42_u64)));
}

#[rstest]
#[case::accepted(Ok(Receipt::new("0x04", Some(1))), WorkOrderStatus::Success)]
#[case::fault(Err(BackendError::unavailable("connection reset")), WorkOrderStatus::Failed)]
fn complete_maps_backend_outcome(
    #[case] outcome: Result<Receipt, BackendError>,
    #[case] expected: WorkOrderStatus,
) {
    let executor = executor_returning(outcome);
    let status = executor
        .complete(ORDER_ID, &json!({"result": "ok"}), &RequestId::from(1_u64))
        .expect("validated identifier");
    assert_eq!(status, expected);
}

#[test]
fn complete_sends_serialised_response() {
    let mut ledger = MockLedger::new();
    ledger
        .expect_submit()
        .withf(|operation| {
            matches!(
                operation,
                LedgerOperation::Complete { work_order_id, response }
                    if work_order_id.as_str() == ORDER_ID && response == r#"{"result":"ok"}"#
            )
        })
        .times(1)
        .return_once(|_| Ok(Receipt::new("0x05", Some(Receipt::SUCCESS_FLAG))));
    let executor = SubmissionExecutor::new(Arc::new(ledger), HEX_LEN);

    executor
        .complete(
            &ORDER_ID.to_ascii_uppercase(),
            &json!({"result": "ok"}),
            &RequestId::from(2_u64),
        )
        .expect("validated identifier");
}

#[test]
fn complete_rejects_bad_identifier_before_calling_backend() {
    let executor = executor_unused();
    let error = executor
        .complete("01", &json!({}), &RequestId::from(3_u64))
        .expect_err("short identifier");
    assert_eq!(error.status(), WorkOrderStatus::InvalidParameterFormatOrValue);
}
