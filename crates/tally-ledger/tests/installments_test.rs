//! Installment reconciliation and settlement.

mod common;

use common::{date, setup, Fixture};
use tally_core::{Cart, DownPayment, InstallmentStatus, InstallmentTerms, Money, PaymentMethod};
use tally_ledger::{CheckoutReceipt, ErrorCode};

/// 1200.00 with 200.00 down over 5 months from 2024-01-01.
async fn installment_sale(fx: &Fixture, customer_id: Option<&str>) -> CheckoutReceipt {
    let tv = fx.product("Television", 120_000, 10).await;

    let mut cart = Cart::new();
    cart.add_product(&tv, 1).unwrap();

    fx.ledger
        .sales()
        .checkout(
            &cart,
            customer_id,
            &fx.cashier,
            PaymentMethod::Cash,
            InstallmentTerms::monthly(DownPayment::Amount(Money::from_cents(20_000)), 5),
            date(2024, 1, 1),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_reconcile_marks_past_due_overdue() {
    let fx = setup().await;
    let receipt = installment_sale(&fx, None).await;
    let tracker = fx.ledger.installments();

    // Due 2024-02-01 .. 2024-06-01; only those strictly before today change
    let updated = tracker.reconcile_overdue(date(2024, 4, 1)).await.unwrap();
    assert_eq!(updated, 2);

    let statuses: Vec<InstallmentStatus> = tracker
        .schedule_for(&receipt.invoice.id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            InstallmentStatus::Overdue,
            InstallmentStatus::Overdue,
            InstallmentStatus::Due,
            InstallmentStatus::Due,
            InstallmentStatus::Due,
        ]
    );
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    let fx = setup().await;
    installment_sale(&fx, None).await;
    let tracker = fx.ledger.installments();

    assert_eq!(tracker.reconcile_overdue(date(2024, 6, 1)).await.unwrap(), 4);
    assert_eq!(tracker.reconcile_overdue(date(2024, 6, 1)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_reconcile_never_touches_paid() {
    let fx = setup().await;
    let receipt = installment_sale(&fx, None).await;
    let tracker = fx.ledger.installments();

    let first = &receipt.schedule[0];
    tracker
        .record_payment(&first.id, date(2024, 1, 20), &fx.cashier)
        .await
        .unwrap();

    tracker.reconcile_overdue(date(2025, 1, 1)).await.unwrap();

    let payments = tracker.schedule_for(&receipt.invoice.id).await.unwrap();
    assert_eq!(payments[0].status, InstallmentStatus::Paid);
    assert_eq!(payments[0].paid_at, Some(date(2024, 1, 20)));
    assert!(payments[1..]
        .iter()
        .all(|p| p.status == InstallmentStatus::Overdue));
}

#[tokio::test]
async fn test_record_payment_is_one_way() {
    let fx = setup().await;
    let receipt = installment_sale(&fx, None).await;
    let tracker = fx.ledger.installments();
    let payment_id = receipt.schedule[2].id.clone();

    let paid = tracker
        .record_payment(&payment_id, date(2024, 4, 1), &fx.cashier)
        .await
        .unwrap();
    assert_eq!(paid.status, InstallmentStatus::Paid);
    assert_eq!(paid.paid_at, Some(date(2024, 4, 1)));
    assert_eq!(paid.paid_by.as_deref(), Some(fx.cashier.id.as_str()));

    let err = tracker
        .record_payment(&payment_id, date(2024, 4, 2), &fx.cashier)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentError);
    assert!(err.message.contains("already paid"));

    // The first settlement stands
    let stored = tracker.schedule_for(&receipt.invoice.id).await.unwrap();
    assert_eq!(stored[2].paid_at, Some(date(2024, 4, 1)));
}

#[tokio::test]
async fn test_record_overdue_payment() {
    let fx = setup().await;
    let receipt = installment_sale(&fx, None).await;
    let tracker = fx.ledger.installments();

    tracker.reconcile_overdue(date(2024, 3, 1)).await.unwrap();

    let paid = tracker
        .record_payment(&receipt.schedule[0].id, date(2024, 3, 1), &fx.cashier)
        .await
        .unwrap();
    assert_eq!(paid.status, InstallmentStatus::Paid);
}

#[tokio::test]
async fn test_record_unknown_payment() {
    let fx = setup().await;

    let err = fx
        .ledger
        .installments()
        .record_payment("missing", date(2024, 1, 1), &fx.cashier)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn test_overview_reconciles_then_lists() {
    let fx = setup().await;
    let customer = fx.customer("Bilal Ahmed").await;
    let with_customer = installment_sale(&fx, Some(&customer.id)).await;
    let walk_in = installment_sale(&fx, None).await;

    // Paid-in-full invoices stay out of the listing
    let kettle = fx.product("Kettle", 3_499, 5).await;
    fx.sell(&kettle, 1).await;

    let overview = fx.ledger.installments().overview(date(2024, 3, 15)).await.unwrap();
    assert_eq!(overview.len(), 2);

    let named = overview
        .iter()
        .find(|s| s.invoice.id == with_customer.invoice.id)
        .unwrap();
    assert_eq!(named.customer_name.as_deref(), Some("Bilal Ahmed"));
    assert_eq!(named.payments.len(), 5);
    assert!(named.has_overdue());
    assert_eq!(named.paid(), Money::zero());
    assert_eq!(named.outstanding().cents(), 100_000);

    let anonymous = overview
        .iter()
        .find(|s| s.invoice.id == walk_in.invoice.id)
        .unwrap();
    assert!(anonymous.customer_name.is_none());

    let due_dates: Vec<_> = anonymous.payments.iter().map(|p| p.due_date).collect();
    let mut sorted = due_dates.clone();
    sorted.sort();
    assert_eq!(due_dates, sorted);
}

#[tokio::test]
async fn test_outstanding_totals() {
    let fx = setup().await;
    let receipt = installment_sale(&fx, None).await;
    let tracker = fx.ledger.installments();

    tracker
        .record_payment(&receipt.schedule[0].id, date(2024, 2, 1), &fx.cashier)
        .await
        .unwrap();
    tracker.reconcile_overdue(date(2024, 3, 2)).await.unwrap();

    let outstanding = tracker.outstanding().await.unwrap();
    assert_eq!(outstanding.count, 4);
    assert_eq!(outstanding.overdue_count, 1);
    assert_eq!(outstanding.amount.cents(), 80_000);
}
