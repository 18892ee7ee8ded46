use super::format::{algo_wallet, catchup_label, compact_count, nanos_as_secs, PLACEHOLDER};
use crate::types::records::{ChainAccountInfo, ChainNetworkInfo};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletFigures {
    pub balance: String,
    pub min_balance: String,
    pub assets: String,
    pub apps: String,
}

pub fn wallet_figures(info: Option<&ChainAccountInfo>) -> WalletFigures {
    match info {
        Some(info) => WalletFigures {
            balance: algo_wallet(info.micro_algo_balance),
            min_balance: algo_wallet(info.min_balance_micro_algo),
            assets: info.asset_count.to_string(),
            apps: info.created_app_count.to_string(),
        },
        None => WalletFigures {
            balance: PLACEHOLDER.to_string(),
            min_balance: PLACEHOLDER.to_string(),
            assets: PLACEHOLDER.to_string(),
            apps: PLACEHOLDER.to_string(),
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkFigures {
    pub last_round: String,
    pub round_time: String,
    pub catchup: String,
    pub next_version: String,
}

pub fn network_figures(info: Option<&ChainNetworkInfo>) -> NetworkFigures {
    match info {
        Some(info) => NetworkFigures {
            last_round: compact_count(info.last_round),
            round_time: nanos_as_secs(info.since_last_round_ns),
            catchup: catchup_label(info.catchup_ns),
            next_version: info
                .next_version_label
                .clone()
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        },
        None => NetworkFigures {
            last_round: PLACEHOLDER.to_string(),
            round_time: PLACEHOLDER.to_string(),
            catchup: PLACEHOLDER.to_string(),
            next_version: PLACEHOLDER.to_string(),
        },
    }
}
