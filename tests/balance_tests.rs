// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use rust_decimal::Decimal;
use std::str::FromStr;
use tesoreria::db;
use tesoreria::error::LedgerError;
use tesoreria::ledger::*;
use tesoreria::models::{JournalSource, PurchaseDraft};

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn pay(conn: &Connection, purchase: i64, member: i64, qty: i64, paid: &str) {
    let q = quota_for_member(conn, purchase, member).unwrap().unwrap();
    update_quota(conn, q.id, qty, d(paid)).unwrap();
}

/// Two purchases (one open with an advance, one completed), manual fund
/// movements and a fund expense.
fn populated() -> (Connection, i64, i64) {
    let mut conn = setup();
    let a = add_member(&conn, "Mario", "Rossi", None).unwrap().id();
    let b = add_member(&conn, "Anna", "Neri", None).unwrap().id();
    add_member(&conn, "Luca", "Verdi", None).unwrap();

    let open = create_purchase(
        &mut conn,
        &PurchaseDraft {
            name: "Magliette".into(),
            unit_price: d("10"),
            advance: d("5"),
            ..Default::default()
        },
    )
    .unwrap();
    pay(&conn, open, a, 1, "10");
    pay(&conn, open, b, 1, "5");

    let done = create_purchase(
        &mut conn,
        &PurchaseDraft {
            name: "Felpe".into(),
            unit_price: d("20"),
            members: Some(vec![a, b]),
            ..Default::default()
        },
    )
    .unwrap();
    pay(&conn, done, a, 1, "20");
    pay(&conn, done, b, 2, "40");
    complete_purchase(&conn, done).unwrap();

    add_fund_movement(&conn, d("100"), "Quote sociali").unwrap();
    create_purchase(
        &mut conn,
        &PurchaseDraft {
            name: "Cancelleria".into(),
            unit_price: d("30"),
            fund_expense: true,
            ..Default::default()
        },
    )
    .unwrap();
    (conn, open, done)
}

#[test]
fn global_balance_matches_hand_computation() {
    let (conn, _, _) = populated();
    let bal = get_global_balance(&conn).unwrap();
    // inflows 15 + 60 + 100 - 30, outflows advance 5 + supplier 60
    assert_eq!(bal.real_cash, d("80"));
    assert_eq!(bal.restricted_funds, d("15"));
    assert_eq!(bal.available_cash, d("65"));
    assert_eq!(bal.available_cash, bal.real_cash - bal.restricted_funds);
}

#[test]
fn completing_releases_restricted_funds() {
    let (conn, open, _) = populated();
    let before = get_global_balance(&conn).unwrap();
    complete_purchase(&conn, open).unwrap();
    let after = get_global_balance(&conn).unwrap();
    assert_eq!(after.restricted_funds, Decimal::ZERO);
    // advance (5) no longer counted, full cost (3 × 10) paid instead
    assert_eq!(after.real_cash, before.real_cash + d("5") - d("30"));
    assert_eq!(after.available_cash, after.real_cash);
}

#[test]
fn empty_ledger_is_zero() {
    let conn = setup();
    let bal = get_global_balance(&conn).unwrap();
    assert_eq!(bal.real_cash, Decimal::ZERO);
    assert_eq!(bal.restricted_funds, Decimal::ZERO);
    assert_eq!(bal.available_cash, Decimal::ZERO);
}

#[test]
fn journal_merges_fund_and_supplier_payments() {
    let (conn, _, done) = populated();
    let journal = cash_journal(&conn, 100).unwrap();
    assert_eq!(journal.len(), 3);
    let payment = journal
        .iter()
        .find(|e| e.source == JournalSource::SupplierPayment)
        .unwrap();
    assert_eq!(payment.ref_id, done);
    assert_eq!(payment.amount, d("-60"));
    assert_eq!(payment.description, "Payment: Felpe");
    assert!(journal.windows(2).all(|w| w[0].at >= w[1].at));

    assert_eq!(cash_journal(&conn, 2).unwrap().len(), 2);
}

#[test]
fn oversized_quantities_fail_instead_of_panicking() {
    let mut conn = setup();
    let a = add_member(&conn, "Mario", "Rossi", None).unwrap().id();
    let id = create_purchase(
        &mut conn,
        &PurchaseDraft {
            name: "Container".into(),
            unit_price: d("10000000000"),
            ..Default::default()
        },
    )
    .unwrap();
    pay(&conn, id, a, i64::MAX, "0");

    assert!(matches!(debtors(&conn, id).unwrap_err(), LedgerError::Overflow(_)));
    complete_purchase(&conn, id).unwrap();
    assert!(matches!(
        get_global_balance(&conn).unwrap_err(),
        LedgerError::Overflow(_)
    ));
    assert!(matches!(
        cash_journal(&conn, 10).unwrap_err(),
        LedgerError::Overflow(_)
    ));
}
