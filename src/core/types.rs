//! Wire vocabulary shared by REST parameters and stream payloads.
//!
//! Every enum renders to (and parses from) the exact token the exchange uses, so values
//! can be dropped straight into a [`Params`](crate::core::kernel::Params) set.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    pub enum ContractType {
        Perpetual => "PERPETUAL",
        CurrentMonth => "CURRENT_MONTH",
        NextMonth => "NEXT_MONTH",
        CurrentQuarter => "CURRENT_QUARTER",
        NextQuarter => "NEXT_QUARTER",
        PerpetualDelivering => "PERPETUAL_DELIVERING",
    }
}

wire_enum! {
    pub enum ContractStatus {
        PendingTrading => "PENDING_TRADING",
        Trading => "TRADING",
        PreDelivering => "PRE_DELIVERING",
        Delivering => "DELIVERING",
        Delivered => "DELIVERED",
        PreSettle => "PRE_SETTLE",
        Settling => "SETTLING",
        Close => "CLOSE",
    }
}

wire_enum! {
    pub enum OrderStatus {
        New => "NEW",
        PartiallyFilled => "PARTIALLY_FILLED",
        Filled => "FILLED",
        Canceled => "CANCELED",
        Rejected => "REJECTED",
        Expired => "EXPIRED",
        ExpiredInMatch => "EXPIRED_IN_MATCH",
    }
}

wire_enum! {
    pub enum OrderType {
        Limit => "LIMIT",
        Market => "MARKET",
        Stop => "STOP",
        StopMarket => "STOP_MARKET",
        TakeProfit => "TAKE_PROFIT",
        TakeProfitMarket => "TAKE_PROFIT_MARKET",
        TrailingStopMarket => "TRAILING_STOP_MARKET",
    }
}

wire_enum! {
    pub enum OrderSide {
        Buy => "BUY",
        Sell => "SELL",
    }
}

wire_enum! {
    pub enum PositionSide {
        Long => "LONG",
        Short => "SHORT",
        Both => "BOTH",
    }
}

wire_enum! {
    pub enum TimeInForce {
        Gtc => "GTC",
        Ioc => "IOC",
        Fok => "FOK",
        /// Post only.
        Gtx => "GTX",
        Gtd => "GTD",
    }
}

wire_enum! {
    pub enum WorkingType {
        MarkPrice => "MARK_PRICE",
        ContractPrice => "CONTRACT_PRICE",
    }
}

wire_enum! {
    pub enum ResponseType {
        Ack => "ACK",
        Result => "RESULT",
    }
}

wire_enum! {
    pub enum KlineInterval {
        Minutes1 => "1m",
        Minutes3 => "3m",
        Minutes5 => "5m",
        Minutes15 => "15m",
        Minutes30 => "30m",
        Hours1 => "1h",
        Hours2 => "2h",
        Hours4 => "4h",
        Hours6 => "6h",
        Hours8 => "8h",
        Hours12 => "12h",
        Days1 => "1d",
        Days3 => "3d",
        Weeks1 => "1w",
        Months1 => "1M",
    }
}

wire_enum! {
    /// Aggregation period for the `/futures/data` statistics endpoints.
    pub enum StatsPeriod {
        Minutes5 => "5m",
        Minutes15 => "15m",
        Minutes30 => "30m",
        Hours1 => "1h",
        Hours2 => "2h",
        Hours4 => "4h",
        Hours6 => "6h",
        Hours12 => "12h",
        Days1 => "1d",
    }
}

wire_enum! {
    /// Self-trade prevention mode.
    pub enum StpMode {
        None => "NONE",
        ExpireTaker => "EXPIRE_TAKER",
        ExpireBoth => "EXPIRE_BOTH",
        ExpireMaker => "EXPIRE_MAKER",
    }
}

wire_enum! {
    pub enum PriceMatch {
        None => "NONE",
        Opponent => "OPPONENT",
        Opponent5 => "OPPONENT_5",
        Opponent10 => "OPPONENT_10",
        Opponent20 => "OPPONENT_20",
        Queue => "QUEUE",
        Queue5 => "QUEUE_5",
        Queue10 => "QUEUE_10",
        Queue20 => "QUEUE_20",
    }
}

wire_enum! {
    pub enum MarginType {
        Isolated => "ISOLATED",
        Crossed => "CROSSED",
    }
}

wire_enum! {
    pub enum IncomeType {
        Transfer => "TRANSFER",
        WelcomeBonus => "WELCOME_BONUS",
        RealizedPnl => "REALIZED_PNL",
        FundingFee => "FUNDING_FEE",
        Commission => "COMMISSION",
        InsuranceClear => "INSURANCE_CLEAR",
        ReferralKickback => "REFERRAL_KICKBACK",
        CommissionRebate => "COMMISSION_REBATE",
        ApiRebate => "API_REBATE",
        ContestReward => "CONTEST_REWARD",
        CrossCollateralTransfer => "CROSS_COLLATERAL_TRANSFER",
        OptionsPremiumFee => "OPTIONS_PREMIUM_FEE",
        OptionsSettleProfit => "OPTIONS_SETTLE_PROFIT",
        InternalTransfer => "INTERNAL_TRANSFER",
        AutoExchange => "AUTO_EXCHANGE",
        DeliveredSettlement => "DELIVERED_SETTELMENT",
        CoinSwapDeposit => "COIN_SWAP_DEPOSIT",
        CoinSwapWithdraw => "COIN_SWAP_WITHDRAW",
        PositionLimitIncreaseFee => "POSITION_LIMIT_INCREASE_FEE",
    }
}

wire_enum! {
    /// Position margin adjustment direction (`1` add, `2` reduce).
    pub enum MarginAdjustment {
        Add => "1",
        Reduce => "2",
    }
}

wire_enum! {
    /// Origin of an exchange-initiated close.
    pub enum AutoCloseType {
        Liquidation => "LIQUIDATION",
        Adl => "ADL",
    }
}

wire_enum! {
    /// Asynchronous history download kinds.
    pub enum DownloadKind {
        Income => "income",
        Order => "order",
        Trade => "trade",
    }
}
