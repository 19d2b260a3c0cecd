//! Exchange-agnostic domain types for wallet tracking and whale alerts.

pub mod alert;
pub mod cursor;
pub mod dispatch;
pub mod error;
pub mod id;
pub mod market;
pub mod trade;
pub mod wallet;

pub use alert::{AlertConfig, AlertConfigPatch, FilterVerdict, Rejection, ReloadMarker};
pub use cursor::{Cursor, CursorPosition};
pub use dispatch::{AlertOutcome, Claim, DispatchRecord, DispatchState, SuppressReason};
pub use error::ValidationError;
pub use id::{Address, TxHash, UserId};
pub use market::{MarketMetadata, MarketTag};
pub use trade::{Side, StoredTrade, Trade, UpsertOutcome};
pub use wallet::{ChannelBinding, Removal, WalletTarget};
