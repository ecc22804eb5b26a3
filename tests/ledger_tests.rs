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
use tesoreria::models::{MemberOutcome, PurchaseDraft, PurchaseState};

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn draft(name: &str, price: &str) -> PurchaseDraft {
    PurchaseDraft {
        name: name.to_string(),
        unit_price: d(price),
        ..Default::default()
    }
}

fn member_ids(conn: &Connection, purchase_id: i64) -> Vec<i64> {
    list_quotas_for_purchase(conn, purchase_id)
        .unwrap()
        .into_iter()
        .map(|q| q.member_id)
        .collect()
}

#[test]
fn removed_member_is_reactivated_with_same_id() {
    let conn = setup();
    let first = add_member(&conn, " Mario ", "Rossi", Some("M-1")).unwrap();
    let id = first.id();
    assert!(matches!(first, MemberOutcome::Inserted(_)));

    let again = add_member(&conn, "Mario", "Rossi", None).unwrap();
    assert_eq!(again, MemberOutcome::AlreadyActive(id));
    assert_eq!(again.changes(), 0);

    soft_delete_member(&conn, id).unwrap();
    assert!(list_members(&conn).unwrap().is_empty());
    assert_eq!(list_all_members(&conn).unwrap().len(), 1);

    let back = add_member(&conn, "Mario", "Rossi", Some("M-2")).unwrap();
    assert_eq!(back, MemberOutcome::Reactivated(id));
    assert_eq!(back.changes(), 1);
    let m = get_member(&conn, id).unwrap();
    assert!(m.is_active());
    assert_eq!(m.external_ref.as_deref(), Some("M-2"));
}

#[test]
fn member_names_are_required() {
    let conn = setup();
    let err = add_member(&conn, "  ", "Rossi", None).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    let err = update_member(&conn, 42, "Anna", "Neri", None).unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }));
}

#[test]
fn soft_delete_all_keeps_history() {
    let conn = setup();
    add_member(&conn, "Mario", "Rossi", None).unwrap();
    add_member(&conn, "Anna", "Neri", None).unwrap();
    assert_eq!(soft_delete_all_active_members(&conn).unwrap(), 2);
    assert_eq!(soft_delete_all_active_members(&conn).unwrap(), 0);
    assert!(list_members(&conn).unwrap().is_empty());
    assert_eq!(list_all_members(&conn).unwrap().len(), 2);
}

#[test]
fn new_purchase_seeds_quotas_for_active_members() {
    let mut conn = setup();
    let a = add_member(&conn, "Mario", "Rossi", None).unwrap().id();
    let b = add_member(&conn, "Anna", "Neri", None).unwrap().id();
    let c = add_member(&conn, "Luca", "Verdi", None).unwrap().id();
    soft_delete_member(&conn, c).unwrap();

    let all = create_purchase(&mut conn, &draft("Magliette", "12.50")).unwrap();
    let mut ids = member_ids(&conn, all);
    ids.sort();
    assert_eq!(ids, vec![a, b]);
    for q in list_quotas_for_purchase(&conn, all).unwrap() {
        assert_eq!(q.quantity, 1);
        assert_eq!(q.amount_paid, Decimal::ZERO);
    }

    let mut subset = draft("Cappellini", "8");
    subset.members = Some(vec![b, b]);
    let some = create_purchase(&mut conn, &subset).unwrap();
    assert_eq!(member_ids(&conn, some), vec![b]);

    let p = get_purchase(&conn, some).unwrap();
    assert_eq!(p.state(), PurchaseState::Open);
    assert!(p.closed_at.is_none());
}

#[test]
fn purchase_validation() {
    let mut conn = setup();
    assert!(matches!(
        create_purchase(&mut conn, &draft(" ", "1")).unwrap_err(),
        LedgerError::Validation(_)
    ));
    assert!(matches!(
        create_purchase(&mut conn, &draft("X", "-1")).unwrap_err(),
        LedgerError::Validation(_)
    ));
}

#[test]
fn fund_expense_is_closed_and_debits_the_fund() {
    let mut conn = setup();
    add_member(&conn, "Mario", "Rossi", None).unwrap();
    let mut expense = draft("Cancelleria", "30");
    expense.fund_expense = true;
    let id = create_purchase(&mut conn, &expense).unwrap();

    let p = get_purchase(&conn, id).unwrap();
    assert!(p.completed && p.fund_expense);
    assert_eq!(p.closed_at, Some(p.created_at));
    assert!(list_quotas_for_purchase(&conn, id).unwrap().is_empty());

    let movements = list_fund_movements(&conn).unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].amount, d("-30"));
    assert_eq!(movements[0].description, "Fund expense: Cancelleria");

    // no supplier payment is journaled for fund expenses
    let journal = cash_journal(&conn, 10).unwrap();
    assert_eq!(journal.len(), 1);
}

#[test]
fn update_purchase_diffs_the_member_set() {
    let mut conn = setup();
    let a = add_member(&conn, "Mario", "Rossi", None).unwrap().id();
    let b = add_member(&conn, "Anna", "Neri", None).unwrap().id();
    let c = add_member(&conn, "Luca", "Verdi", None).unwrap().id();
    let mut p = draft("Felpe", "20");
    p.members = Some(vec![a, b]);
    let id = create_purchase(&mut conn, &p).unwrap();

    let qa = quota_for_member(&conn, id, a).unwrap().unwrap();
    update_quota(&conn, qa.id, 2, d("40")).unwrap();

    p.name = "Felpe blu".into();
    p.unit_price = d("22");
    p.members = Some(vec![a, c]);
    update_purchase(&mut conn, id, &p).unwrap();

    let mut ids = member_ids(&conn, id);
    ids.sort();
    assert_eq!(ids, vec![a, c]);
    // retained members keep their quota untouched
    let kept = quota_for_member(&conn, id, a).unwrap().unwrap();
    assert_eq!((kept.id, kept.quantity, kept.amount_paid), (qa.id, 2, d("40")));
    let updated = get_purchase(&conn, id).unwrap();
    assert_eq!(updated.name, "Felpe blu");
    assert_eq!(updated.unit_price, d("22"));

    p.members = None;
    update_purchase(&mut conn, id, &p).unwrap();
    assert_eq!(member_ids(&conn, id).len(), 2);
}

#[test]
fn completed_purchase_is_frozen() {
    let mut conn = setup();
    let a = add_member(&conn, "Mario", "Rossi", None).unwrap().id();
    let id = create_purchase(&mut conn, &draft("Borracce", "5")).unwrap();
    let q = quota_for_member(&conn, id, a).unwrap().unwrap();
    update_quota(&conn, q.id, 1, d("5")).unwrap();

    complete_purchase(&conn, id).unwrap();
    let p = get_purchase(&conn, id).unwrap();
    assert_eq!(p.state(), PurchaseState::Completed);
    assert!(p.closed_at.is_some());

    assert!(matches!(
        update_quota(&conn, q.id, 1, d("7")).unwrap_err(),
        LedgerError::PurchaseCompleted(_)
    ));
    assert!(matches!(
        update_purchase(&mut conn, id, &draft("Borracce", "6")).unwrap_err(),
        LedgerError::PurchaseCompleted(_)
    ));
    assert!(matches!(
        complete_purchase(&conn, id).unwrap_err(),
        LedgerError::PurchaseCompleted(_)
    ));
    assert_eq!(get_quota(&conn, q.id).unwrap().amount_paid, d("5"));
}

#[test]
fn quota_values_cannot_be_negative() {
    let mut conn = setup();
    let a = add_member(&conn, "Mario", "Rossi", None).unwrap().id();
    let id = create_purchase(&mut conn, &draft("Borracce", "5")).unwrap();
    let q = quota_for_member(&conn, id, a).unwrap().unwrap();
    assert!(update_quota(&conn, q.id, -1, d("0")).is_err());
    assert!(update_quota(&conn, q.id, 1, d("-0.01")).is_err());
    update_quota(&conn, q.id, 0, d("0")).unwrap();
}

#[test]
fn debtors_lists_what_is_still_owed() {
    let mut conn = setup();
    let a = add_member(&conn, "Mario", "Rossi", None).unwrap().id();
    let b = add_member(&conn, "Anna", "Neri", Some("N-7")).unwrap().id();
    let id = create_purchase(&mut conn, &draft("Giacche", "15")).unwrap();
    let qa = quota_for_member(&conn, id, a).unwrap().unwrap();
    let qb = quota_for_member(&conn, id, b).unwrap().unwrap();
    update_quota(&conn, qa.id, 2, d("30")).unwrap();
    update_quota(&conn, qb.id, 2, d("10")).unwrap();

    let owing = debtors(&conn, id).unwrap();
    assert_eq!(owing.len(), 1);
    assert_eq!(owing[0].member_id, b);
    assert_eq!(owing[0].due, d("20"));
    assert_eq!(owing[0].external_ref.as_deref(), Some("N-7"));
}

#[test]
fn deleting_a_purchase_removes_its_quotas() {
    let mut conn = setup();
    add_member(&conn, "Mario", "Rossi", None).unwrap();
    let id = create_purchase(&mut conn, &draft("Zaini", "40")).unwrap();
    delete_purchase(&conn, id).unwrap();
    let left: i64 = conn
        .query_row("SELECT COUNT(*) FROM quotas", [], |r| r.get(0))
        .unwrap();
    assert_eq!(left, 0);
    assert!(matches!(
        get_purchase(&conn, id).unwrap_err(),
        LedgerError::NotFound { .. }
    ));
}

#[test]
fn clear_ledger_keeps_members() {
    let mut conn = setup();
    add_member(&conn, "Mario", "Rossi", None).unwrap();
    create_purchase(&mut conn, &draft("Zaini", "40")).unwrap();
    add_fund_movement(&conn, d("10"), "donation").unwrap();
    clear_ledger(&mut conn).unwrap();
    assert!(list_purchases(&conn).unwrap().is_empty());
    assert!(list_fund_movements(&conn).unwrap().is_empty());
    assert_eq!(list_members(&conn).unwrap().len(), 1);
}
