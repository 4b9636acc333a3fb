//! End-to-end economy scenarios
//!
//! These tests exercise the public crate surface, the economy service
//! over the in-memory store backend, the same way the command handlers
//! do. Each scenario seeds balances through the store's transactional
//! API, runs one operation, and checks the resulting balances:
//! - Happy-path transfers and the conservation of total coins
//! - Every precondition failure, each leaving balances untouched
//! - The concurrent double-spend race (exactly one transfer wins)
//! - Lazy account creation on the balance read path
//! - Leaderboard ordering and guild-scoped settings

use coinkeeper::core::{AccountStore, Economy, MemoryStore, SettingsStore};
use coinkeeper::types::{EconomyError, GuildId, SettingUpdate, UserId};
use futures::future::join;
use rstest::rstest;
use std::sync::Arc;

const GUILD: GuildId = -1001;

/// Build an economy whose store holds the given `(user, coins)` balances
async fn seeded(seed: &[(UserId, i64)]) -> (Economy<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    for (user, coins) in seed {
        store.get_or_create(*user, GUILD).await.unwrap();
        if *coins > 0 {
            let mut tx = store.begin().await.unwrap();
            store.apply_delta(&mut tx, *user, GUILD, *coins).await.unwrap();
            store.commit(tx).await.unwrap();
        }
    }
    (Economy::new(Arc::clone(&store)), store)
}

async fn coins_of(economy: &Economy<MemoryStore>, user: UserId) -> i64 {
    economy.balance(user, GUILD).await.unwrap().coins
}

#[tokio::test]
async fn transfer_of_40_from_100_leaves_60_and_40() {
    let (economy, _) = seeded(&[(1, 100), (2, 0)]).await;

    let receipt = economy.transfer(1, 2, GUILD, 40).await.unwrap();

    assert_eq!(receipt.sender.coins, 60);
    assert_eq!(receipt.recipient.coins, 40);
    assert_eq!(coins_of(&economy, 1).await, 60);
    assert_eq!(coins_of(&economy, 2).await, 40);
}

#[tokio::test]
async fn transfer_conserves_the_sum_of_both_balances() {
    let (economy, _) = seeded(&[(1, 70), (2, 30)]).await;

    economy.transfer(1, 2, GUILD, 25).await.unwrap();

    assert_eq!(coins_of(&economy, 1).await + coins_of(&economy, 2).await, 100);
}

#[rstest]
#[case::zero(0)]
#[case::negative(-1)]
#[case::very_negative(-1000)]
#[tokio::test]
async fn non_positive_amounts_are_rejected_and_balances_unchanged(#[case] amount: i64) {
    let (economy, _) = seeded(&[(1, 100), (2, 10)]).await;

    let err = economy.transfer(1, 2, GUILD, amount).await.unwrap_err();

    assert!(matches!(err, EconomyError::InvalidAmount { .. }));
    assert_eq!(coins_of(&economy, 1).await, 100);
    assert_eq!(coins_of(&economy, 2).await, 10);
}

#[tokio::test]
async fn self_transfer_is_rejected_and_balance_unchanged() {
    let (economy, _) = seeded(&[(1, 100)]).await;

    let err = economy.transfer(1, 1, GUILD, 30).await.unwrap_err();

    assert!(matches!(err, EconomyError::SelfTransfer { .. }));
    assert_eq!(coins_of(&economy, 1).await, 100);
}

#[tokio::test]
async fn overdraft_fails_with_insufficient_funds_and_sender_keeps_10() {
    let (economy, _) = seeded(&[(1, 10), (2, 0)]).await;

    let err = economy.transfer(1, 2, GUILD, 50).await.unwrap_err();

    assert_eq!(err, EconomyError::insufficient_funds(1, 10, 50));
    assert_eq!(coins_of(&economy, 1).await, 10);
    assert_eq!(coins_of(&economy, 2).await, 0);
}

#[tokio::test]
async fn concurrent_transfers_cannot_overdraw_the_sender() {
    // Sender holds 100; two concurrent 60-coin transfers to different
    // recipients race. Exactly one may commit, and the sender must end
    // at 40, never negative.
    let (economy, _) = seeded(&[(1, 100), (2, 0), (3, 0)]).await;

    let (a, b) = join(
        economy.transfer(1, 2, GUILD, 60),
        economy.transfer(1, 3, GUILD, 60),
    )
    .await;

    assert_eq!(
        [&a, &b].iter().filter(|r| r.is_ok()).count(),
        1,
        "exactly one transfer may win: {a:?} / {b:?}"
    );
    let loser = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
    assert!(matches!(
        loser,
        EconomyError::InsufficientFunds { .. } | EconomyError::TransactionConflict
    ));

    let sender = coins_of(&economy, 1).await;
    let winner_total = coins_of(&economy, 2).await + coins_of(&economy, 3).await;
    assert_eq!(sender, 40);
    assert_eq!(winner_total, 60);
}

#[tokio::test]
async fn transfers_on_disjoint_pairs_both_commit() {
    let (economy, _) = seeded(&[(1, 50), (2, 0), (3, 50), (4, 0)]).await;

    let (a, b) = join(
        economy.transfer(1, 2, GUILD, 20),
        economy.transfer(3, 4, GUILD, 30),
    )
    .await;

    a.unwrap();
    b.unwrap();
    assert_eq!(coins_of(&economy, 2).await, 20);
    assert_eq!(coins_of(&economy, 4).await, 30);
}

#[tokio::test]
async fn balance_query_for_unknown_user_returns_zero_and_creates_the_account() {
    let (economy, store) = seeded(&[]).await;

    assert_eq!(store.get(9, GUILD).await.unwrap(), None);

    let account = economy.balance(9, GUILD).await.unwrap();
    assert_eq!(account.coins, 0);

    let persisted = store.get(9, GUILD).await.unwrap().unwrap();
    assert_eq!(persisted.coins, 0);
}

#[tokio::test]
async fn leaderboard_lists_positive_balances_richest_first() {
    let (economy, _) = seeded(&[(1, 20), (2, 0), (3, 80), (4, 50)]).await;

    let board = economy.leaderboard(GUILD).await.unwrap();
    let users: Vec<UserId> = board.iter().map(|a| a.user_id).collect();

    assert_eq!(users, vec![3, 4, 1]);
}

#[tokio::test]
async fn settings_upserts_accumulate_per_guild() {
    let (_, store) = seeded(&[]).await;

    store
        .upsert_setting(GUILD, SettingUpdate::parse("prefix", "!").unwrap())
        .await
        .unwrap();
    store
        .upsert_setting(GUILD, SettingUpdate::parse("infochannelid", "777").unwrap())
        .await
        .unwrap();

    let settings = store.settings(GUILD).await.unwrap().unwrap();
    assert_eq!(settings.prefix.as_deref(), Some("!"));
    assert_eq!(settings.info_channel_id, Some(777));
    assert_eq!(settings.staff_channel_id, None);

    // Another guild stays untouched.
    assert_eq!(store.settings(GUILD + 1).await.unwrap(), None);
}
