mod common;

use std::fs;

use cashbook_core::{
    config::IdPolicy,
    domain::{TransactionId, TransactionKind, TransactionPatch},
    ledger::BalanceAggregate,
    LedgerError,
};
use common::{at, draft, refold, rows, setup_ledger, HEADER};

fn totals(agg: &BalanceAggregate) -> (u64, u64, u64) {
    (agg.count(), agg.income(), agg.expense())
}

#[test]
fn create_update_delete_scenario() {
    let (mut ledger, layout, _guard) = setup_ledger(IdPolicy::Sequential);

    let id = ledger
        .create_transaction(draft(TransactionKind::Income, 100, "salary"))
        .unwrap();
    assert_eq!(id.as_str(), "000000000");
    assert_eq!(totals(ledger.aggregate()), (1, 100, 0));

    let found = ledger
        .update_transaction(
            &id,
            &TransactionPatch::default()
                .kind(TransactionKind::Expense)
                .amount(40),
        )
        .unwrap();
    assert!(found);
    assert_eq!(totals(ledger.aggregate()), (1, 0, 40));
    assert_eq!(ledger.aggregate().balance(), -40);

    assert!(ledger.delete_transaction(&id).unwrap());
    assert_eq!(totals(ledger.aggregate()), (0, 0, 0));
    assert_eq!(fs::read_to_string(&layout.transactions).unwrap(), HEADER);
}

#[test]
fn mixed_sequence_matches_full_refold() {
    let (mut ledger, _layout, _guard) = setup_ledger(IdPolicy::Sequential);
    let mut ids = Vec::new();

    for step in 0..40u64 {
        let kind = if step % 3 == 0 {
            TransactionKind::Income
        } else {
            TransactionKind::Expense
        };
        ids.push(
            ledger
                .create_transaction(draft(kind, step * 7 + 1, "food"))
                .unwrap(),
        );

        if step % 4 == 1 {
            let target = &ids[(step as usize * 5) % ids.len()];
            let patch = TransactionPatch::default()
                .kind(TransactionKind::Income)
                .amount(step + 3);
            ledger.update_transaction(target, &patch).unwrap();
        }
        if step % 5 == 2 {
            let target = ids.remove((step as usize * 3) % ids.len());
            assert!(ledger.delete_transaction(&target).unwrap());
        }
        assert_eq!(*ledger.aggregate(), refold(&ledger), "diverged at step {step}");
    }

    ledger.verify().unwrap();
    assert_eq!(ledger.aggregate().count(), ids.len() as u64);
}

#[test]
fn aggregate_is_rebuilt_after_restart() {
    let (mut ledger, layout, _guard) = setup_ledger(IdPolicy::Sequential);
    ledger
        .create_transaction(draft(TransactionKind::Income, 500, "salary"))
        .unwrap();
    let spend = ledger
        .create_transaction(draft(TransactionKind::Expense, 120, "food"))
        .unwrap();
    ledger
        .update_transaction(&spend, &TransactionPatch::default().amount(80))
        .unwrap();

    let reopened = cashbook_core::core::services::LedgerService::with_policy(
        layout.ledger_store(),
        IdPolicy::Sequential,
        9,
    )
    .unwrap();
    assert_eq!(reopened.aggregate(), ledger.aggregate());
    assert_eq!(totals(reopened.aggregate()), (2, 500, 80));
}

#[test]
fn deleted_last_id_is_not_reissued_after_restart() {
    let (mut ledger, layout, _guard) = setup_ledger(IdPolicy::Sequential);
    ledger
        .create_transaction(draft(TransactionKind::Income, 100, "salary"))
        .unwrap();
    let last = ledger
        .create_transaction(draft(TransactionKind::Expense, 30, "food"))
        .unwrap();
    assert!(ledger.delete_transaction(&last).unwrap());
    let in_session = ledger.next_id();
    drop(ledger);

    let mut reopened = cashbook_core::core::services::LedgerService::with_policy(
        layout.ledger_store(),
        IdPolicy::Sequential,
        9,
    )
    .unwrap();
    assert_eq!(reopened.next_id(), in_session);
    assert_ne!(reopened.next_id(), last);

    let issued = reopened
        .create_transaction(draft(TransactionKind::Expense, 5, "food"))
        .unwrap();
    assert_eq!(issued.as_str(), "000000002");
}

#[test]
fn zero_amount_never_reaches_the_ledger() {
    let (mut ledger, layout, _guard) = setup_ledger(IdPolicy::Sequential);
    let err = ledger
        .create_transaction(draft(TransactionKind::Income, 0, "food"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidMutation(_)));
    assert_eq!(fs::read_to_string(&layout.transactions).unwrap(), HEADER);

    let reopened = cashbook_core::core::services::LedgerService::open(layout.ledger_store()).unwrap();
    assert_eq!(totals(reopened.aggregate()), (0, 0, 0));
}

#[test]
fn deleting_unknown_id_leaves_file_byte_identical() {
    let (mut ledger, layout, _guard) = setup_ledger(IdPolicy::Sequential);
    ledger
        .create_transaction(draft(TransactionKind::Expense, 9, "food"))
        .unwrap();
    let before = fs::read(&layout.transactions).unwrap();
    let snapshot = *ledger.aggregate();

    assert!(!ledger
        .delete_transaction(&TransactionId::new("nonexistent"))
        .unwrap());
    assert!(!ledger
        .update_transaction(
            &TransactionId::new("nonexistent"),
            &TransactionPatch::default().amount(1)
        )
        .unwrap());

    assert_eq!(fs::read(&layout.transactions).unwrap(), before);
    assert_eq!(*ledger.aggregate(), snapshot);
}

#[test]
fn id_cannot_be_rewritten() {
    let (mut ledger, _layout, _guard) = setup_ledger(IdPolicy::Sequential);
    let id = ledger
        .create_transaction(draft(TransactionKind::Income, 100, "salary"))
        .unwrap();

    let err = ledger.update_fields(&id, [("id", "x")]).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidMutation(_)));

    let stored = rows(&ledger);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, id);
    assert_eq!(stored[0].amount, 100);
}

#[test]
fn staged_rewrite_failure_before_rename_preserves_ledger() {
    let (mut ledger, layout, _guard) = setup_ledger(IdPolicy::Sequential);
    let id = ledger
        .create_transaction(draft(TransactionKind::Income, 100, "salary"))
        .unwrap();
    ledger
        .create_transaction(draft(TransactionKind::Expense, 25, "food"))
        .unwrap();
    let original = fs::read(&layout.transactions).unwrap();

    let store = layout.ledger_store();
    let staged = store
        .stage_matching(&id, |mut txn| {
            txn.amount = 1;
            Some(txn)
        })
        .unwrap()
        .expect("row exists");
    assert!(layout.tmp_csv.exists());
    // Simulated crash: the process goes away before the rename.
    drop(staged);

    assert_eq!(fs::read(&layout.transactions).unwrap(), original);
    assert!(!layout.tmp_csv.exists());
    assert_eq!(*ledger.aggregate(), refold(&ledger));
}

#[test]
fn committed_rewrite_is_fully_visible() {
    let (mut ledger, layout, _guard) = setup_ledger(IdPolicy::Sequential);
    let id = ledger
        .create_transaction(draft(TransactionKind::Income, 100, "salary"))
        .unwrap();

    let staged = layout
        .ledger_store()
        .stage_matching(&id, |mut txn| {
            txn.note = "adjusted".into();
            Some(txn)
        })
        .unwrap()
        .expect("row exists");
    let replacement = staged.commit().unwrap();

    assert_eq!(replacement.before.note, "");
    let stored = rows(&ledger);
    assert_eq!(stored[0].note, "adjusted");
    assert!(!layout.tmp_csv.exists());
}

#[test]
fn interrupted_rewrite_is_discarded_on_next_start() {
    let (mut ledger, layout, _guard) = setup_ledger(IdPolicy::Sequential);
    ledger
        .create_transaction(draft(TransactionKind::Income, 100, "salary"))
        .unwrap();
    let original = fs::read(&layout.transactions).unwrap();
    fs::write(&layout.tmp_csv, "id,type,amount\n000000000,inc").unwrap();

    layout.initialize(&["food"]).unwrap();

    assert!(!layout.tmp_csv.exists());
    assert_eq!(fs::read(&layout.transactions).unwrap(), original);
}

#[test]
fn notes_with_delimiters_survive_rewrites() {
    let (mut ledger, _layout, _guard) = setup_ledger(IdPolicy::Sequential);
    let tricky = "dinner, drinks and \"tips\"\nsplit later";
    let id = ledger
        .create_transaction(draft(TransactionKind::Expense, 60, "food").with_note(tricky))
        .unwrap();
    let other = ledger
        .create_transaction(draft(TransactionKind::Expense, 5, "food"))
        .unwrap();
    ledger
        .update_transaction(&other, &TransactionPatch::default().timestamp(at(2, 18)))
        .unwrap();

    let stored = rows(&ledger);
    assert_eq!(stored[0].id, id);
    assert_eq!(stored[0].note, tricky);
    assert_eq!(stored[1].timestamp, at(2, 18));
}

#[test]
fn corrupted_row_is_reported_not_skipped() {
    let (mut ledger, layout, _guard) = setup_ledger(IdPolicy::Sequential);
    ledger
        .create_transaction(draft(TransactionKind::Income, 100, "salary"))
        .unwrap();
    let mut raw = fs::read_to_string(&layout.transactions).unwrap();
    raw.push_str("000000001,gift,5,2025-01-01 00:00:00,food,\n");
    fs::write(&layout.transactions, raw).unwrap();

    let result = cashbook_core::core::services::LedgerService::open(layout.ledger_store());
    match result {
        Err(err) => assert!(err.is_integrity(), "unexpected error: {err}"),
        Ok(_) => panic!("opening a corrupted ledger must fail"),
    }
}
