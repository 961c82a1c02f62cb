pub mod execute_transaction;
pub mod get_balance;
pub mod get_ledger_history;
pub mod get_wallet_stats;
pub mod ordered_locks;
pub mod provision_wallet;
