pub mod traits;
pub mod assets;
pub mod normalizer;
pub mod one_click;
pub mod quoter;
pub mod executor;
pub mod tracker;
pub mod presentation;
pub mod confirmation;
pub mod chat;
pub mod agent;

pub use traits::{QuoteService, SwapError, SwapResult, TransactionSigner};
pub use assets::{AssetEntry, AssetRegistry, DEFAULT_ASSETS};
pub use normalizer::{create_quote_request, QuoteOptions, TradeNormalizer};
pub use one_click::OneClickClient;
pub use quoter::{QuoteOutcome, Quoter};
pub use executor::{parse_amount, TransferExecutor};
pub use tracker::{StatusEvent, StatusStream, StatusUpdate, SwapStatusTracker, TrackingHandle, TrackingOptions};
pub use presentation::{progress_bar, progress_percent, status_info, StatusInfo};
pub use confirmation::{ConfirmOutcome, ConfirmationGate, PendingTrade};
pub use chat::{ChatMessage, ChatTranscript, MessageKind};
pub use agent::SwapAgent;
