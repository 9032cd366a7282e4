mod common;

use std::sync::Arc;
use std::time::Duration;

use bnb_invoice_batch::error::{ItemError, RenderError};
use bnb_invoice_batch::models::BatchRequest;
use bnb_invoice_batch::orchestrator::EventSink;
use bnb_invoice_batch::workflow::reservation_flow::PAGE_LOAD_TIMEOUT;
use bnb_invoice_batch::{ReservationCode, ReservationCtx};
use common::{
    codes, detail_url, flow, invoice_url, processor, FakeRenderer, CAPTURE_FAILURE, DOMAIN, KEY,
    LOAD_FAILURE,
};
use tokio_util::sync::CancellationToken;

const CODE: &str = "HMAAAAAAAA";

fn ctx() -> ReservationCtx {
    ReservationCtx::single(ReservationCode::new(CODE), DOMAIN)
}

#[tokio::test(start_paused = true)]
async fn detail_page_slower_than_bound_fails_with_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Arc::new(
        FakeRenderer::new().slow_load(&detail_url(CODE), Duration::from_secs(20)),
    );

    let result = flow(renderer.clone(), dir.path()).run(&ctx()).await;

    match result {
        Err(ItemError::Render(RenderError::Timeout { url, timeout })) => {
            assert_eq!(url, detail_url(CODE));
            assert_eq!(timeout, PAGE_LOAD_TIMEOUT);
        }
        other => panic!("意外结果: {:?}", other),
    }
    assert_eq!(renderer.captures(), 0);
    assert_eq!(renderer.detached(), 1);
    assert_eq!(renderer.open_pages(), 0);
}

#[tokio::test(start_paused = true)]
async fn detail_page_within_bound_is_captured() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Arc::new(
        FakeRenderer::new().slow_load(&detail_url(CODE), Duration::from_secs(10)),
    );

    let item = flow(renderer.clone(), dir.path()).run(&ctx()).await.unwrap();

    assert_eq!(item.files, vec!["Reservation_HMAAAAAAAA.pdf"]);
    assert_eq!(renderer.open_pages(), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_invoice_page_fails_with_timeout_after_receipt_is_saved() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Arc::new(
        FakeRenderer::new()
            .with_invoices(CODE, 1)
            .slow_load(&invoice_url(CODE, 1), Duration::from_secs(30)),
    );

    let result = flow(renderer.clone(), dir.path()).run(&ctx()).await;

    match result {
        Err(ItemError::Render(RenderError::Timeout { url, .. })) => {
            assert_eq!(url, invoice_url(CODE, 1))
        }
        other => panic!("意外结果: {:?}", other),
    }
    assert!(dir.path().join("Reservation_HMAAAAAAAA.pdf").exists());
    assert!(!dir.path().join("VAT_Invoice_HMAAAAAAAA.pdf").exists());
    assert_eq!(renderer.detached(), 1);
    assert_eq!(renderer.open_pages(), 0);
}

#[tokio::test(start_paused = true)]
async fn invoice_load_failure_cleans_up_and_keeps_original_error() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Arc::new(
        FakeRenderer::new()
            .with_invoices(CODE, 2)
            .failing_url_loads(&invoice_url(CODE, 1), 1),
    );

    let result = flow(renderer.clone(), dir.path()).run(&ctx()).await;

    match result {
        Err(ItemError::Render(RenderError::Navigation { url, message })) => {
            assert_eq!(url, invoice_url(CODE, 1));
            assert_eq!(message, LOAD_FAILURE);
        }
        other => panic!("意外结果: {:?}", other),
    }
    assert_eq!(renderer.captured(), vec![detail_url(CODE)]);
    assert!(dir.path().join("Reservation_HMAAAAAAAA.pdf").exists());
    assert_eq!(renderer.detached(), 1);
    assert_eq!(renderer.closed(), 1);
    assert_eq!(renderer.open_pages(), 0);
}

#[tokio::test(start_paused = true)]
async fn invoice_navigation_failure_stops_remaining_invoices() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Arc::new(
        FakeRenderer::new()
            .with_invoices(CODE, 2)
            .failing_navigations(&invoice_url(CODE, 1), 1),
    );

    let result = flow(renderer.clone(), dir.path()).run(&ctx()).await;

    match result {
        Err(ItemError::Render(RenderError::Navigation { url, message })) => {
            assert_eq!(url, invoice_url(CODE, 1));
            assert_eq!(message, "导航被拒绝");
        }
        other => panic!("意外结果: {:?}", other),
    }
    assert_eq!(renderer.navigated(), vec![invoice_url(CODE, 1)]);
    assert_eq!(renderer.detached(), 1);
    assert_eq!(renderer.open_pages(), 0);
}

#[tokio::test(start_paused = true)]
async fn invoice_capture_failure_keeps_earlier_files_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Arc::new(
        FakeRenderer::new()
            .with_invoices(CODE, 2)
            .failing_captures(&invoice_url(CODE, 2), 1),
    );

    let result = flow(renderer.clone(), dir.path()).run(&ctx()).await;

    match result {
        Err(ItemError::Render(RenderError::Capture(message))) => {
            assert_eq!(message, CAPTURE_FAILURE)
        }
        other => panic!("意外结果: {:?}", other),
    }
    assert!(dir.path().join("VAT_Invoice_HMAAAAAAAA_1.pdf").exists());
    assert!(!dir.path().join("VAT_Invoice_HMAAAAAAAA_2.pdf").exists());
    assert_eq!(renderer.detached(), 1);
    assert_eq!(renderer.open_pages(), 0);
}

#[tokio::test(start_paused = true)]
async fn close_failure_after_download_is_a_failure() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Arc::new(FakeRenderer::new().failing_closes(1));

    let result = flow(renderer.clone(), dir.path()).run(&ctx()).await;

    assert!(matches!(
        result,
        Err(ItemError::Render(RenderError::Close(_)))
    ));
    // 清理时再关一次
    assert_eq!(renderer.detached(), 1);
    assert_eq!(renderer.closed(), 2);
    assert_eq!(renderer.open_pages(), 0);
}

#[tokio::test(start_paused = true)]
async fn duplicate_invoice_links_are_each_downloaded() {
    let dir = tempfile::tempdir().unwrap();
    let link = invoice_url(CODE, 1);
    let renderer =
        Arc::new(FakeRenderer::new().with_links(CODE, vec![link.clone(), link.clone()]));

    let item = flow(renderer.clone(), dir.path()).run(&ctx()).await.unwrap();

    assert_eq!(item.invoice_count, 2);
    assert_eq!(
        item.files,
        vec![
            "Reservation_HMAAAAAAAA.pdf",
            "VAT_Invoice_HMAAAAAAAA_1.pdf",
            "VAT_Invoice_HMAAAAAAAA_2.pdf",
        ]
    );
    assert_eq!(renderer.navigated(), vec![link.clone(), link]);
}

#[tokio::test(start_paused = true)]
async fn retry_after_invoice_failure_starts_again_from_detail_page() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Arc::new(
        FakeRenderer::new()
            .with_invoices(CODE, 1)
            .failing_url_loads(&invoice_url(CODE, 1), 1),
    );
    let processor = processor(renderer.clone(), dir.path(), 5).await;

    let request = BatchRequest::new(codes(&[CODE]), DOMAIN);
    let summary = processor
        .run(&request, &CancellationToken::new(), &EventSink::detached())
        .await;

    assert_eq!(summary.succeeded, 1);
    assert_eq!(
        summary.results[0].files,
        vec!["Reservation_HMAAAAAAAA.pdf", "VAT_Invoice_HMAAAAAAAA.pdf"]
    );
    assert_eq!(renderer.opened(), vec![detail_url(CODE), detail_url(CODE)]);
    // 收据被重新捕获
    assert_eq!(
        renderer.captured(),
        vec![detail_url(CODE), detail_url(CODE), invoice_url(CODE, 1)]
    );
    assert_eq!(processor.credits().ledger().usage(KEY).await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn close_failures_on_every_attempt_fail_the_item_without_charge() {
    let dir = tempfile::tempdir().unwrap();
    // 每次尝试：成功路径关闭一次 + 清理关闭一次
    let renderer = Arc::new(FakeRenderer::new().failing_closes(4));
    let processor = processor(renderer.clone(), dir.path(), 5).await;

    let request = BatchRequest::new(codes(&[CODE]), DOMAIN);
    let summary = processor
        .run(&request, &CancellationToken::new(), &EventSink::detached())
        .await;

    assert_eq!(summary.failed, 1);
    assert!(summary.errors[0].starts_with("HMAAAAAAAA: 关闭页面失败"));
    assert_eq!(
        processor.credits().ledger().account(KEY).await.unwrap().credits_remaining,
        5
    );
}
