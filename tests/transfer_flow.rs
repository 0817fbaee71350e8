//! End-to-end transfer flow over the in-memory store
//!
//! Exercises quoting, transaction creation, the status state machine,
//! lazy window expiry, and WebSocket fan-out without a database or real
//! sockets.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use uuid::Uuid;

use remitflow::auth::Role;
use remitflow::corridor::{Country, Currency, PaymentMethod, ReceivingMethod};
use remitflow::error::Error;
use remitflow::fees::{FeeRule, FeeType};
use remitflow::quote::{PreviewRequest, QuoteRequest, QuoteService};
use remitflow::rates::ExchangeRate;
use remitflow::store::MemoryStore;
use remitflow::transaction::model::NewTransaction;
use remitflow::transaction::{TransactionService, TransactionStatus};
use remitflow::websocket::ConnectionManager;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

struct World {
    store: Arc<MemoryStore>,
    ws: Arc<ConnectionManager>,
    quotes: QuoteService,
    transactions: TransactionService,
    france: Uuid,
    ivory_coast: Uuid,
    russia: Uuid,
    fr_payment_method: Uuid,
    ru_payment_method: Uuid,
    ci_receiving_method: Uuid,
}

fn seed() -> World {
    let store = Arc::new(MemoryStore::new());

    let eur = Uuid::new_v4();
    let xof = Uuid::new_v4();
    let rub = Uuid::new_v4();
    store.add_currency(Currency {
        id: eur,
        code: "EUR".into(),
        symbol: "€".into(),
        is_active: true,
    });
    store.add_currency(Currency {
        id: xof,
        code: "XOF".into(),
        symbol: "CFA".into(),
        is_active: true,
    });
    store.add_currency(Currency {
        id: rub,
        code: "RUB".into(),
        symbol: "₽".into(),
        is_active: true,
    });

    let france = Uuid::new_v4();
    let ivory_coast = Uuid::new_v4();
    let russia = Uuid::new_v4();
    store.add_country(Country {
        id: france,
        name: "France".into(),
        currency_id: eur,
        currency_code: "EUR".into(),
        currency_symbol: "€".into(),
        can_send: true,
        can_receive: false,
    });
    store.add_country(Country {
        id: ivory_coast,
        name: "Ivory Coast".into(),
        currency_id: xof,
        currency_code: "XOF".into(),
        currency_symbol: "CFA".into(),
        can_send: false,
        can_receive: true,
    });
    store.add_country(Country {
        id: russia,
        name: "Russia".into(),
        currency_id: rub,
        currency_code: "RUB".into(),
        currency_symbol: "₽".into(),
        can_send: true,
        can_receive: false,
    });

    store.add_rate(ExchangeRate {
        id: Uuid::new_v4(),
        from_currency_id: eur,
        to_currency_id: xof,
        rate: dec("655"),
        is_active: true,
        updated_at: Utc::now(),
    });
    store.add_rate(ExchangeRate {
        id: Uuid::new_v4(),
        from_currency_id: rub,
        to_currency_id: xof,
        rate: dec("7.1"),
        is_active: true,
        updated_at: Utc::now(),
    });

    // France -> Ivory Coast: 3.5% on any amount
    store.add_fee_rule(FeeRule {
        id: Uuid::new_v4(),
        from_country_id: france,
        to_country_id: ivory_coast,
        fee_type: FeeType::Percentage,
        fee_value: dec("3.5"),
        min_amount: dec("0.01"),
        max_amount: None,
        is_active: true,
    });
    // Russia -> Ivory Coast: tiered, the stored value IS the fee
    store.add_fee_rule(FeeRule {
        id: Uuid::new_v4(),
        from_country_id: russia,
        to_country_id: ivory_coast,
        fee_type: FeeType::Tiered,
        fee_value: dec("350"),
        min_amount: dec("5000"),
        max_amount: Some(dec("50000")),
        is_active: true,
    });

    let fr_payment_method = Uuid::new_v4();
    store.add_payment_method(PaymentMethod {
        id: fr_payment_method,
        country_id: france,
        kind: "Bank Transfer".into(),
        owner_name: "RemitFlow SAS".into(),
        phone_number: None,
        account_number: Some("FR7612345678901234567890123".into()),
    });
    let ru_payment_method = Uuid::new_v4();
    store.add_payment_method(PaymentMethod {
        id: ru_payment_method,
        country_id: russia,
        kind: "Card".into(),
        owner_name: "RemitFlow OOO".into(),
        phone_number: Some("+79001234567".into()),
        account_number: None,
    });
    let ci_receiving_method = Uuid::new_v4();
    store.add_receiving_method(ReceivingMethod {
        id: ci_receiving_method,
        country_id: ivory_coast,
        kind: "Mobile Money".into(),
    });

    let ws = Arc::new(ConnectionManager::new());
    let quotes = QuoteService::new(store.clone(), store.clone(), store.clone());
    let transactions = TransactionService::new(store.clone(), store.clone(), ws.clone());

    World {
        store,
        ws,
        quotes,
        transactions,
        france,
        ivory_coast,
        russia,
        fr_payment_method,
        ru_payment_method,
        ci_receiving_method,
    }
}

fn new_txn_input(w: &World, amounts: &remitflow::quote::TransferQuote) -> NewTransaction {
    NewTransaction {
        sender_country_id: w.france,
        receiver_country_id: w.ivory_coast,
        sender_currency: amounts.from_currency.clone(),
        receiver_currency: amounts.to_currency.clone(),
        sender_amount: amounts.amounts.sender_amount,
        receiver_amount: amounts.amounts.receiver_amount,
        exchange_rate: amounts.exchange_rate,
        applied_fee: amounts.amounts.fee,
        total_to_pay: amounts.amounts.total_to_pay,
        payment_method_id: w.fr_payment_method,
        receiving_method_id: w.ci_receiving_method,
        recipient_name: "Awa Kone".into(),
        recipient_phone: "+2250701234567".into(),
        notes: None,
    }
}

async fn quote_eur_xof(w: &World, amount: &str, include_fee: bool) -> remitflow::quote::TransferQuote {
    w.quotes
        .quote(QuoteRequest {
            from_country_id: w.france,
            to_country_id: w.ivory_coast,
            amount: dec(amount),
            include_fee,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn quote_fee_on_top() {
    let w = seed();
    let q = quote_eur_xof(&w, "100", false).await;
    assert_eq!(q.amounts.fee, dec("3.50"));
    assert_eq!(q.amounts.receiver_amount, dec("65500.00"));
    assert_eq!(q.amounts.total_to_pay, dec("103.50"));
    assert_eq!(q.breakdown.you_send, "100.00 EUR");
    assert_eq!(q.breakdown.fee, "3.50 EUR");
    assert_eq!(q.breakdown.total_to_pay, "103.50 EUR");
    assert_eq!(q.breakdown.exchange_rate, "1 EUR = 655.0000 XOF");
    assert_eq!(q.breakdown.they_receive, "65500.00 XOF");
}

#[tokio::test]
async fn quote_fee_included() {
    let w = seed();
    let q = quote_eur_xof(&w, "100", true).await;
    assert_eq!(q.amounts.fee, dec("3.50"));
    assert_eq!(q.amounts.sender_amount, dec("100.00"));
    assert_eq!(q.amounts.principal, dec("96.50"));
    assert_eq!(q.amounts.receiver_amount, dec("63207.50"));
    assert_eq!(q.amounts.total_to_pay, dec("100.00"));
    assert!(q.include_fee);
}

#[tokio::test]
async fn included_fee_record_keeps_entered_amount() {
    let w = seed();
    let sender = Uuid::new_v4();

    let q = quote_eur_xof(&w, "100", true).await;
    let txn = w
        .transactions
        .create(sender, new_txn_input(&w, &q))
        .await
        .unwrap();
    // The record carries what the sender typed, not the post-fee principal
    assert_eq!(txn.sender_amount, dec("100.00"));
    assert_eq!(txn.receiver_amount, dec("63207.50"));
    assert_eq!(txn.total_to_pay, dec("100.00"));
}

#[tokio::test]
async fn quote_tiered_band_uses_stored_value_as_fee() {
    let w = seed();
    let q = w
        .quotes
        .quote(QuoteRequest {
            from_country_id: w.russia,
            to_country_id: w.ivory_coast,
            amount: dec("10000"),
            include_fee: false,
        })
        .await
        .unwrap();
    assert_eq!(q.amounts.fee, dec("350.00"));
    assert_eq!(q.amounts.total_to_pay, dec("10350.00"));
}

#[tokio::test]
async fn quote_below_tiered_band_is_no_band_match() {
    let w = seed();
    let err = w
        .quotes
        .quote(QuoteRequest {
            from_country_id: w.russia,
            to_country_id: w.ivory_coast,
            amount: dec("100"),
            include_fee: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoBandMatch { .. }));
}

#[tokio::test]
async fn quote_unconfigured_direction_is_not_found() {
    let w = seed();
    // Receiving side cannot send, so flip the corridor fails fast
    let err = w
        .quotes
        .quote(QuoteRequest {
            from_country_id: w.ivory_coast,
            to_country_id: w.france,
            amount: dec("100"),
            include_fee: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn rate_lookup_never_inverts_direction() {
    let store = Arc::new(MemoryStore::new());

    let gbp = Uuid::new_v4();
    let ngn = Uuid::new_v4();
    store.add_currency(Currency {
        id: gbp,
        code: "GBP".into(),
        symbol: "£".into(),
        is_active: true,
    });
    store.add_currency(Currency {
        id: ngn,
        code: "NGN".into(),
        symbol: "₦".into(),
        is_active: true,
    });

    // Both corridor ends fully open, so only the rate table decides
    let uk = Uuid::new_v4();
    let nigeria = Uuid::new_v4();
    store.add_country(Country {
        id: uk,
        name: "United Kingdom".into(),
        currency_id: gbp,
        currency_code: "GBP".into(),
        currency_symbol: "£".into(),
        can_send: true,
        can_receive: true,
    });
    store.add_country(Country {
        id: nigeria,
        name: "Nigeria".into(),
        currency_id: ngn,
        currency_code: "NGN".into(),
        currency_symbol: "₦".into(),
        can_send: true,
        can_receive: true,
    });

    store.add_rate(ExchangeRate {
        id: Uuid::new_v4(),
        from_currency_id: gbp,
        to_currency_id: ngn,
        rate: dec("1900"),
        is_active: true,
        updated_at: Utc::now(),
    });
    store.add_fee_rule(FeeRule {
        id: Uuid::new_v4(),
        from_country_id: uk,
        to_country_id: nigeria,
        fee_type: FeeType::Percentage,
        fee_value: dec("2"),
        min_amount: dec("0.01"),
        max_amount: None,
        is_active: true,
    });

    let quotes = QuoteService::new(store.clone(), store.clone(), store.clone());

    let q = quotes
        .quote(QuoteRequest {
            from_country_id: uk,
            to_country_id: nigeria,
            amount: dec("100"),
            include_fee: false,
        })
        .await
        .unwrap();
    assert_eq!(q.exchange_rate, dec("1900"));

    // No NGN->GBP row exists; the GBP->NGN rate must never be inverted
    let err = quotes
        .quote(QuoteRequest {
            from_country_id: nigeria,
            to_country_id: uk,
            amount: dec("10000"),
            include_fee: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn preview_validates_methods_and_echoes_recipient() {
    let w = seed();
    let preview = w
        .quotes
        .preview(PreviewRequest {
            from_country_id: w.france,
            to_country_id: w.ivory_coast,
            amount: dec("100"),
            include_fee: false,
            payment_method_id: w.fr_payment_method,
            receiving_method_id: w.ci_receiving_method,
            recipient_name: "Awa Kone".into(),
            recipient_phone: "+2250701234567".into(),
        })
        .await
        .unwrap();
    assert_eq!(preview.quote.amounts.total_to_pay, dec("103.50"));
    assert_eq!(preview.payment_kind, "Bank Transfer");
    assert_eq!(preview.receiving_kind, "Mobile Money");
    assert_eq!(preview.recipient_name, "Awa Kone");
}

#[tokio::test]
async fn preview_rejects_method_from_another_country() {
    let w = seed();
    // A Russian card cannot pay for a France corridor
    let err = w
        .quotes
        .preview(PreviewRequest {
            from_country_id: w.france,
            to_country_id: w.ivory_coast,
            amount: dec("100"),
            include_fee: false,
            payment_method_id: w.ru_payment_method,
            receiving_method_id: w.ci_receiving_method,
            recipient_name: "Awa Kone".into(),
            recipient_phone: "+2250701234567".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn lifecycle_happy_path_with_audit_trail() {
    let w = seed();
    let sender = Uuid::new_v4();
    let admin = Uuid::new_v4();

    let q = quote_eur_xof(&w, "100", false).await;
    let txn = w
        .transactions
        .create(sender, new_txn_input(&w, &q))
        .await
        .unwrap();
    assert_eq!(txn.status, TransactionStatus::FundsDeposited);

    let txn = w
        .transactions
        .update_status(txn.id, TransactionStatus::InProgress, admin, None)
        .await
        .unwrap();
    assert_eq!(txn.status, TransactionStatus::InProgress);
    assert_eq!(txn.processed_by_admin_id, Some(admin));
    assert!(txn.processed_at.is_some());

    let txn = w
        .transactions
        .update_status(txn.id, TransactionStatus::Completed, admin, None)
        .await
        .unwrap();
    assert_eq!(txn.status, TransactionStatus::Completed);
    assert!(txn.completed_at.is_some());

    let history = w
        .transactions
        .history(txn.id, sender, false)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].old_status, TransactionStatus::FundsDeposited);
    assert_eq!(history[0].new_status, TransactionStatus::InProgress);
    assert_eq!(history[1].new_status, TransactionStatus::Completed);
}

#[tokio::test]
async fn illegal_transition_reports_allowed_targets() {
    let w = seed();
    let sender = Uuid::new_v4();
    let admin = Uuid::new_v4();

    let q = quote_eur_xof(&w, "100", false).await;
    let txn = w
        .transactions
        .create(sender, new_txn_input(&w, &q))
        .await
        .unwrap();

    // Entry state cannot jump straight to Completed
    let err = w
        .transactions
        .update_status(txn.id, TransactionStatus::Completed, admin, None)
        .await
        .unwrap_err();
    match err {
        Error::InvalidTransition { from, to, allowed } => {
            assert_eq!(from, TransactionStatus::FundsDeposited);
            assert_eq!(to, TransactionStatus::Completed);
            assert!(allowed.contains(&TransactionStatus::InProgress));
            assert!(allowed.contains(&TransactionStatus::Cancelled));
        }
        other => panic!("expected InvalidTransition, got {other:?}"),
    }

    // Terminal states accept nothing
    let txn = w
        .transactions
        .update_status(txn.id, TransactionStatus::InProgress, admin, None)
        .await
        .unwrap();
    let txn = w
        .transactions
        .update_status(txn.id, TransactionStatus::Completed, admin, None)
        .await
        .unwrap();
    let err = w
        .transactions
        .update_status(txn.id, TransactionStatus::Cancelled, admin, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));
}

#[tokio::test]
async fn ownership_miss_collapses_to_not_found() {
    let w = seed();
    let sender = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    let q = quote_eur_xof(&w, "100", false).await;
    let txn = w
        .transactions
        .create(sender, new_txn_input(&w, &q))
        .await
        .unwrap();

    let err = w
        .transactions
        .get_owned(txn.id, stranger, false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    // An operator sees it regardless
    let seen = w.transactions.get_owned(txn.id, stranger, true).await;
    assert!(seen.is_ok());
    assert!(Role::Admin.is_operator());
}

#[tokio::test]
async fn expired_window_cancels_on_read() {
    let w = seed();
    let sender = Uuid::new_v4();

    let q = quote_eur_xof(&w, "100", false).await;
    let txn = w
        .transactions
        .create(sender, new_txn_input(&w, &q))
        .await
        .unwrap();

    // Backdate creation past the 15-minute window
    let mut stale = txn.clone();
    stale.created_at = Utc::now() - Duration::minutes(16);
    w.store.put_transaction(stale);

    let report = w
        .transactions
        .status_report(txn.id, sender, false)
        .await
        .unwrap();
    assert_eq!(report.status, TransactionStatus::Cancelled);
    assert_eq!(report.remaining_seconds, 0);
    assert!(report.is_expired);

    let stored = w
        .transactions
        .get_owned(txn.id, sender, false)
        .await
        .unwrap();
    assert!(stored.cancelled_at.is_some());

    // The forced cancel is audited as a system action
    let history = w
        .transactions
        .history(txn.id, sender, false)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].new_status, TransactionStatus::Cancelled);
    assert!(history[0].changed_by_admin_id.is_none());
}

#[tokio::test]
async fn confirm_after_window_fails_with_window_expired() {
    let w = seed();
    let sender = Uuid::new_v4();

    let q = quote_eur_xof(&w, "100", false).await;
    let txn = w
        .transactions
        .create(sender, new_txn_input(&w, &q))
        .await
        .unwrap();

    let mut stale = txn.clone();
    stale.created_at = Utc::now() - Duration::minutes(16);
    w.store.put_transaction(stale);

    let err = w
        .transactions
        .confirm_payment(txn.id, sender)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::WindowExpired));

    let stored = w
        .transactions
        .get_owned(txn.id, sender, false)
        .await
        .unwrap();
    assert_eq!(stored.status, TransactionStatus::Cancelled);
}

#[tokio::test]
async fn confirm_within_window_moves_to_in_progress() {
    let w = seed();
    let sender = Uuid::new_v4();

    let q = quote_eur_xof(&w, "100", false).await;
    let txn = w
        .transactions
        .create(sender, new_txn_input(&w, &q))
        .await
        .unwrap();

    let confirmed = w
        .transactions
        .confirm_payment(txn.id, sender)
        .await
        .unwrap();
    assert_eq!(confirmed.status, TransactionStatus::InProgress);
    // Self-service confirmation records no operator
    assert!(confirmed.processed_by_admin_id.is_none());
}

#[tokio::test]
async fn payment_details_only_while_awaiting_deposit() {
    let w = seed();
    let sender = Uuid::new_v4();

    let q = quote_eur_xof(&w, "100", false).await;
    let txn = w
        .transactions
        .create(sender, new_txn_input(&w, &q))
        .await
        .unwrap();

    let details = w
        .transactions
        .payment_details(txn.id, sender)
        .await
        .unwrap();
    assert_eq!(details.amount_to_pay, "103.50 EUR");
    assert_eq!(details.method_kind, "Bank Transfer");
    assert!(details.remaining_seconds > 0);

    w.transactions.confirm_payment(txn.id, sender).await.unwrap();
    let err = w
        .transactions
        .payment_details(txn.id, sender)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn fanout_reaches_owner_connections_and_admins_only() {
    let w = seed();
    let sender = Uuid::new_v4();
    let bystander = Uuid::new_v4();
    let admin = Uuid::new_v4();

    // Sender on two devices, a bystander, and two admin consoles
    let (tx1, mut rx1) = mpsc::unbounded_channel();
    let (tx2, mut rx2) = mpsc::unbounded_channel();
    let (tx3, mut rx3) = mpsc::unbounded_channel();
    let (atx1, mut arx1) = mpsc::unbounded_channel();
    let (atx2, mut arx2) = mpsc::unbounded_channel();
    w.ws.add_connection(sender, tx1);
    w.ws.add_connection(sender, tx2);
    w.ws.add_connection(bystander, tx3);
    w.ws.add_admin_connection(atx1);
    w.ws.add_admin_connection(atx2);

    let q = quote_eur_xof(&w, "100", false).await;
    let txn = w
        .transactions
        .create(sender, new_txn_input(&w, &q))
        .await
        .unwrap();

    // Creation announces on the admin channel only
    assert!(arx1.try_recv().is_ok());
    assert!(arx2.try_recv().is_ok());
    assert!(rx1.try_recv().is_err());

    w.transactions
        .update_status(txn.id, TransactionStatus::InProgress, admin, None)
        .await
        .unwrap();

    // Both owner devices got the status event, the bystander none,
    // every admin console one
    assert!(rx1.try_recv().is_ok());
    assert!(rx2.try_recv().is_ok());
    assert!(rx3.try_recv().is_err());
    assert!(arx1.try_recv().is_ok());
    assert!(arx2.try_recv().is_ok());
    assert!(arx1.try_recv().is_err());
}

#[tokio::test]
async fn concurrent_transition_single_winner() {
    let w = seed();
    let sender = Uuid::new_v4();
    let admin_a = Uuid::new_v4();
    let admin_b = Uuid::new_v4();

    let q = quote_eur_xof(&w, "100", false).await;
    let txn = w
        .transactions
        .create(sender, new_txn_input(&w, &q))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        w.transactions
            .update_status(txn.id, TransactionStatus::InProgress, admin_a, None),
        w.transactions
            .update_status(txn.id, TransactionStatus::InProgress, admin_b, None),
    );

    // Exactly one writer wins; the loser sees Conflict or, if it loaded
    // after the winner committed, InvalidTransition
    let outcomes = [a.is_ok(), b.is_ok()];
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);

    let stored = w.transactions.get_owned(txn.id, sender, false).await.unwrap();
    assert_eq!(stored.status, TransactionStatus::InProgress);

    let history = w
        .transactions
        .history(txn.id, sender, false)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}
