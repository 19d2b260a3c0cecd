//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! They are traits that adapters implement to integrate with external
//! systems (trade feeds, databases, notification services, etc.).
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!                    │                         │
//!     ┌──────────────┤  Domain + Port          ├──────────────┐
//!     │              │                         │              │
//!     │              └─────────────────────────┘              │
//!     │                         │                             │
//!     ▼                         ▼                             ▼
//! ┌─────────┐            ┌─────────────┐              ┌───────────┐
//! │  Feed   │            │   Storage   │              │  Channel  │
//! │ Adapter │            │   Adapter   │              │  Adapter  │
//! └─────────┘            └─────────────┘              └───────────┘
//! ```

pub mod outbound;

pub use outbound::feed::{FeedPage, PageToken, TradeFeed};
pub use outbound::market::{MarketCatalog, NullCatalog};
pub use outbound::notifier::{NotificationChannel, UpdateMode};
pub use outbound::store::{
    AlertConfigStore, BatchUpsert, ChannelBindings, CursorStore, DispatchLog, ReloadSignal,
    Storage, TradeStore, WalletRegistry,
};
