use serde::Serialize;

use crate::types::SwapStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Yellow,
    Blue,
    Green,
    Red,
    Orange,
    Gray,
}

/// Display descriptor for a swap status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusInfo {
    pub title: &'static str,
    pub message: &'static str,
    pub description: &'static str,
    pub color: StatusColor,
}

const PENDING: StatusInfo = StatusInfo {
    title: "Swap Pending",
    message: "⏳ Waiting for your deposit to be confirmed",
    description: "The deposit was detected and is waiting to be picked up by the swap network.",
    color: StatusColor::Yellow,
};

const PROCESSING: StatusInfo = StatusInfo {
    title: "Swap Processing",
    message: "🔄 Your swap is being processed",
    description: "The cross-chain swap is in progress. This usually takes a few minutes.",
    color: StatusColor::Blue,
};

const COMPLETE: StatusInfo = StatusInfo {
    title: "Swap Complete",
    message: "✅ Swap completed successfully",
    description: "Your tokens have been delivered to the destination address.",
    color: StatusColor::Green,
};

const FAILED: StatusInfo = StatusInfo {
    title: "Swap Failed",
    message: "❌ The swap failed",
    description: "The swap could not be completed. Any deposited funds are returned to the refund address.",
    color: StatusColor::Red,
};

const REFUNDED: StatusInfo = StatusInfo {
    title: "Swap Refunded",
    message: "↩️ Your deposit was refunded",
    description: "The swap did not go through and the funds were sent back to the refund address.",
    color: StatusColor::Orange,
};

const GENERIC: StatusInfo = StatusInfo {
    title: "Status Update",
    message: "📊 Swap status updated",
    description: "The swap reported a status this assistant does not recognize yet.",
    color: StatusColor::Gray,
};

const TIMEOUT: StatusInfo = StatusInfo {
    title: "Tracking Timed Out",
    message: "⏰ Stopped tracking the swap",
    description: "The swap took longer than expected. It may still complete; check the explorer for the deposit address.",
    color: StatusColor::Orange,
};

const CHECK_FAILED: StatusInfo = StatusInfo {
    title: "Status Check Failed",
    message: "⚠️ Could not fetch the swap status",
    description: "The status service did not answer this time.",
    color: StatusColor::Red,
};

pub fn status_info(status: &SwapStatus) -> StatusInfo {
    match status {
        SwapStatus::Pending => PENDING,
        SwapStatus::Processing => PROCESSING,
        SwapStatus::Complete => COMPLETE,
        SwapStatus::Failed => FAILED,
        SwapStatus::Refunded => REFUNDED,
        SwapStatus::Unrecognized(_) => GENERIC,
    }
}

pub fn timeout_info() -> StatusInfo {
    TIMEOUT
}

pub fn check_failed_info() -> StatusInfo {
    CHECK_FAILED
}

/// Progress percentage; `None` means tracking has not reported yet.
pub fn progress_percent(status: Option<&SwapStatus>) -> u8 {
    match status {
        Some(SwapStatus::Pending) => 25,
        Some(SwapStatus::Processing) => 75,
        Some(SwapStatus::Complete | SwapStatus::Failed | SwapStatus::Refunded) => 100,
        Some(SwapStatus::Unrecognized(_)) | None => 10,
    }
}

/// Text progress indicator, e.g. `[███████░░░] 75%`.
pub fn progress_bar(percent: u8, width: usize) -> String {
    let percent = percent.min(100);
    let filled = (percent as usize * width + 50) / 100;
    format!(
        "[{}{}] {}%",
        "█".repeat(filled),
        "░".repeat(width.saturating_sub(filled)),
        percent
    )
}
