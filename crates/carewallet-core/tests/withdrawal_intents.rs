mod common;

use carewallet_types::{
    CallerIdentity, IntentId, IntentStatus, PharmacyId, UserId, WalletError,
};
use carewallet_db::Store;
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;

use common::Harness;

#[tokio::test]
async fn test_intent_completes_once() {
    let h = Harness::new();
    let wallet = h.funded_wallet(dec!(100)).await;
    let pharmacy = h.active_pharmacy("SOW01").await;

    let intent = h
        .care
        .open_withdrawal_intent(pharmacy.id, &wallet.shareable_code.to_lowercase(), dec!(30))
        .await
        .unwrap();
    assert_eq!(intent.wallet_id, wallet.id);
    assert_eq!(intent.status, IntentStatus::Pending);

    let pending = h.care.pending_intents(&h.beneficiary, wallet.id).await.unwrap();
    assert_eq!(pending.len(), 1);

    let code = h.withdrawal_code(&h.beneficiary).await;
    let tx = h
        .care
        .complete_withdrawal_intent(&h.beneficiary, intent.id, &code)
        .await
        .unwrap();
    assert_eq!(tx.amount, dec!(30));
    assert_eq!(tx.fee, dec!(1.20));
    assert_eq!(h.balance(&wallet).await, dec!(70));

    let stored = h.store.find_intent(intent.id).await.unwrap().unwrap();
    assert_eq!(stored.status, IntentStatus::Completed);
    assert_eq!(stored.transaction_id, Some(tx.id));

    let code = h.withdrawal_code(&h.beneficiary).await;
    let err = h
        .care
        .complete_withdrawal_intent(&h.beneficiary, intent.id, &code)
        .await
        .unwrap_err();
    assert_eq!(err, WalletError::WithdrawalIntentClosed);
    assert_eq!(h.balance(&wallet).await, dec!(70));
    assert!(h.care.pending_intents(&h.owner, wallet.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_open_requires_active_pharmacy_and_wallet() {
    let h = Harness::new();
    let wallet = h.funded_wallet(dec!(10)).await;
    let pharmacy = h.active_pharmacy("KZN02").await;

    let err = h
        .care
        .open_withdrawal_intent(PharmacyId::new(), &wallet.shareable_code, dec!(5))
        .await
        .unwrap_err();
    assert_eq!(err, WalletError::PharmacyNotFound);

    let err = h
        .care
        .open_withdrawal_intent(pharmacy.id, "NOPE0000", dec!(5))
        .await
        .unwrap_err();
    assert_eq!(err, WalletError::WalletNotFound);

    let err = h
        .care
        .open_withdrawal_intent(pharmacy.id, &wallet.shareable_code, dec!(0))
        .await
        .unwrap_err();
    assert_eq!(err, WalletError::InvalidAmount);
}

#[tokio::test]
async fn test_expired_intent_is_closed_and_swept() {
    let h = Harness::new();
    let wallet = h.funded_wallet(dec!(50)).await;
    let pharmacy = h.active_pharmacy("NW03").await;
    let intent = h
        .care
        .open_withdrawal_intent(pharmacy.id, &wallet.shareable_code, dec!(20))
        .await
        .unwrap();

    h.store
        .set_intent_expiry(intent.id, Utc::now() - Duration::seconds(1))
        .await;
    assert!(h.care.pending_intents(&h.owner, wallet.id).await.unwrap().is_empty());

    let code = h.withdrawal_code(&h.owner).await;
    let err = h
        .care
        .complete_withdrawal_intent(&h.owner, intent.id, &code)
        .await
        .unwrap_err();
    assert_eq!(err, WalletError::WithdrawalIntentClosed);

    let report = h.care.sweep_expired().await.unwrap();
    assert_eq!(report.intents, 1);
    let stored = h.store.find_intent(intent.id).await.unwrap().unwrap();
    assert_eq!(stored.status, IntentStatus::Expired);
    assert_eq!(h.balance(&wallet).await, dec!(50));
}

#[tokio::test]
async fn test_only_the_opening_pharmacy_may_cancel() {
    let h = Harness::new();
    let wallet = h.funded_wallet(dec!(50)).await;
    let opener = h.active_pharmacy("MP04").await;
    let other = h.active_pharmacy("LP05").await;
    let intent = h
        .care
        .open_withdrawal_intent(opener.id, &wallet.shareable_code, dec!(20))
        .await
        .unwrap();

    assert_eq!(
        h.care.cancel_withdrawal_intent(other.id, intent.id).await.unwrap_err(),
        WalletError::WithdrawalIntentNotFound
    );
    h.care.cancel_withdrawal_intent(opener.id, intent.id).await.unwrap();
    assert_eq!(
        h.care.cancel_withdrawal_intent(opener.id, intent.id).await.unwrap_err(),
        WalletError::WithdrawalIntentClosed
    );
    assert_eq!(
        h.care
            .cancel_withdrawal_intent(opener.id, IntentId::new())
            .await
            .unwrap_err(),
        WalletError::WithdrawalIntentNotFound
    );

    let code = h.withdrawal_code(&h.owner).await;
    assert_eq!(
        h.care
            .complete_withdrawal_intent(&h.owner, intent.id, &code)
            .await
            .unwrap_err(),
        WalletError::WithdrawalIntentClosed
    );
}

#[tokio::test]
async fn test_intent_completion_requires_wallet_access() {
    let h = Harness::new();
    let wallet = h.funded_wallet(dec!(50)).await;
    let pharmacy = h.active_pharmacy("GP06").await;
    let intent = h
        .care
        .open_withdrawal_intent(pharmacy.id, &wallet.shareable_code, dec!(20))
        .await
        .unwrap();

    let stranger = CallerIdentity::new(UserId::new(), "stranger@example.com");
    assert_eq!(
        h.care.pending_intents(&stranger, wallet.id).await.unwrap_err(),
        WalletError::WalletAccessDenied
    );

    let code = h.withdrawal_code(&stranger).await;
    let err = h
        .care
        .complete_withdrawal_intent(&stranger, intent.id, &code)
        .await
        .unwrap_err();
    assert_eq!(err, WalletError::WalletAccessDenied);

    let stored = h.store.find_intent(intent.id).await.unwrap().unwrap();
    assert_eq!(stored.status, IntentStatus::Pending);
}
