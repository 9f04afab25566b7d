mod common;

use anyhow::Result;
use bankcore::application::AppError;
use bankcore::domain::{AccountRef, TransferRequest};
use common::{TwoClients, balance, client_with_accounts, fund, test_service};

fn request(amount: i64, from: AccountRef, to: AccountRef) -> TransferRequest {
    TransferRequest::to_client(
        amount,
        (from.owner_id, from.account_number),
        (to.owner_id, to.account_number),
    )
}

#[tokio::test]
async fn test_transfer_then_overdraft_scenario() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let bank = TwoClients::create(&service).await?;

    service.transfer(request(4_000, bank.alice, bank.bob)).await?;
    assert_eq!(balance(&service, bank.alice).await?, 6_000);
    assert_eq!(balance(&service, bank.bob).await?, 4_000);

    let err = service
        .transfer(request(6_001, bank.alice, bank.bob))
        .await
        .unwrap_err();
    match err {
        AppError::InsufficientFunds {
            account,
            balance,
            required,
        } => {
            assert_eq!(account, bank.alice);
            assert_eq!(balance, 6_000);
            assert_eq!(required, 6_001);
        }
        other => panic!("expected InsufficientFunds, got {other:?}"),
    }
    assert_eq!(balance(&service, bank.alice).await?, 6_000);
    assert_eq!(balance(&service, bank.bob).await?, 4_000);

    Ok(())
}

#[tokio::test]
async fn test_transfer_of_entire_balance_leaves_zero() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let bank = TwoClients::create(&service).await?;

    service.transfer(request(10_000, bank.alice, bank.bob)).await?;

    assert_eq!(balance(&service, bank.alice).await?, 0);
    assert_eq!(balance(&service, bank.bob).await?, 10_000);
    Ok(())
}

#[tokio::test]
async fn test_non_positive_amounts_are_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let bank = TwoClients::create(&service).await?;

    for amount in [0, -1, i64::MIN] {
        let err = service
            .transfer(request(amount, bank.alice, bank.bob))
            .await
            .unwrap_err();
        assert!(
            matches!(err, AppError::InvalidAmount(a) if a == amount),
            "amount {amount}: got {err:?}"
        );
    }

    assert_eq!(balance(&service, bank.alice).await?, 10_000);
    assert_eq!(balance(&service, bank.bob).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_missing_sender_account() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let bank = TwoClients::create(&service).await?;
    let ghost = AccountRef::client(bank.alice.owner_id, 7);

    let err = service
        .transfer(request(100, ghost, bank.bob))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::AccountNotFound(a) if a == ghost));
    assert_eq!(balance(&service, bank.bob).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_missing_receiver_rolls_back_debit() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let bank = TwoClients::create(&service).await?;
    let ghost = AccountRef::client(999, 0);

    // The sender is debited before the receiver is looked up; the failure
    // must undo that debit.
    let err = service
        .transfer(request(2_500, bank.alice, ghost))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::AccountNotFound(a) if a == ghost));
    assert_eq!(balance(&service, bank.alice).await?, 10_000);
    Ok(())
}

#[tokio::test]
async fn test_self_transfer_is_a_no_op() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let bank = TwoClients::create(&service).await?;

    service.transfer(request(3_000, bank.alice, bank.alice)).await?;
    assert_eq!(balance(&service, bank.alice).await?, 10_000);

    // Still bounded by the balance.
    let err = service
        .transfer(request(10_001, bank.alice, bank.alice))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientFunds { .. }));
    assert_eq!(balance(&service, bank.alice).await?, 10_000);
    Ok(())
}

#[tokio::test]
async fn test_transfer_between_own_accounts() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let carol = client_with_accounts(&service, "carol", "+300", 2).await?;
    let checking = AccountRef::client(carol.id, 0);
    let savings = AccountRef::client(carol.id, 1);
    fund(&service, checking, 500).await?;

    service.transfer(request(200, checking, savings)).await?;

    assert_eq!(balance(&service, checking).await?, 300);
    assert_eq!(balance(&service, savings).await?, 200);
    Ok(())
}

#[tokio::test]
async fn test_money_is_conserved_across_many_transfers() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let mut accounts = Vec::new();
    for (i, seed) in [7_000, 2_000, 1_000].into_iter().enumerate() {
        let client =
            client_with_accounts(&service, &format!("user{i}"), &format!("+9{i}"), 1).await?;
        let account = AccountRef::client(client.id, 0);
        fund(&service, account, seed).await?;
        accounts.push(account);
    }

    let moves = [
        (0, 1, 1_500),
        (1, 2, 3_000),
        (2, 0, 50),
        (1, 0, 9_999), // overdraft, rejected
        (2, 1, 3_950),
        (0, 2, 0), // invalid, rejected
    ];
    for (from, to, amount) in moves {
        let _ = service
            .transfer(request(amount, accounts[from], accounts[to]))
            .await;

        let mut total = 0;
        for account in &accounts {
            total += balance(&service, *account).await?;
        }
        assert_eq!(total, 10_000);
    }

    assert_eq!(balance(&service, accounts[0]).await?, 5_550);
    assert_eq!(balance(&service, accounts[1]).await?, 4_450);
    assert_eq!(balance(&service, accounts[2]).await?, 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_transfers_from_one_account_all_commit() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let bank = TwoClients::create(&service).await?;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let service = service.clone();
        let req = request(100, bank.alice, bank.bob);
        handles.push(tokio::spawn(async move { service.transfer(req).await }));
    }
    for handle in handles {
        handle.await??;
    }

    assert_eq!(balance(&service, bank.alice).await?, 8_000);
    assert_eq!(balance(&service, bank.bob).await?, 2_000);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_transfers_on_disjoint_pairs_all_commit() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let mut pairs = Vec::new();
    for i in 0..8 {
        let payer =
            client_with_accounts(&service, &format!("payer{i}"), &format!("+10{i}"), 1).await?;
        let payee =
            client_with_accounts(&service, &format!("payee{i}"), &format!("+20{i}"), 1).await?;
        let from = AccountRef::client(payer.id, 0);
        let to = AccountRef::client(payee.id, 0);
        fund(&service, from, 1_000).await?;
        pairs.push((from, to));
    }

    let mut handles = Vec::new();
    for n in 0..40 {
        let service = service.clone();
        let (from, to) = pairs[n % pairs.len()];
        handles.push(tokio::spawn(async move {
            service.transfer(request(10, from, to)).await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    // 40 transfers over 8 pairs: 5 transfers of 10 per pair.
    for (from, to) in pairs {
        assert_eq!(balance(&service, from).await?, 950);
        assert_eq!(balance(&service, to).await?, 50);
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_oversubscribed_account_serializes_transfers() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let bank = TwoClients::create(&service).await?;

    // 30 x 5.00 = 150.00 against a balance of 100.00.
    let mut handles = Vec::new();
    for _ in 0..30 {
        let service = service.clone();
        let req = request(500, bank.alice, bank.bob);
        handles.push(tokio::spawn(async move { service.transfer(req).await }));
    }

    let mut committed = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await? {
            Ok(()) => committed += 1,
            Err(AppError::InsufficientFunds { .. }) => rejected += 1,
            Err(other) => panic!("unexpected transfer error: {other:?}"),
        }
    }

    assert_eq!(committed, 20);
    assert_eq!(rejected, 10);
    assert_eq!(balance(&service, bank.alice).await?, 0);
    assert_eq!(balance(&service, bank.bob).await?, 10_000);
    Ok(())
}
