// Dataset catalogue and column-name constants.
//
// Single source of truth for the nine tables the store serves and the column
// names the aggregation layer addresses. Table identifiers are enumerated,
// not stringly typed, so a view can only ask for a dataset that exists.

// ── Shared dimension columns ────────────────────────────────────────────────
pub mod col {
    /// Raw region column as stored; the loader canonicalizes it and renames
    /// it to [`STATE`].
    pub const STATES: &str = "States";
    pub const STATE: &str = "State";
    pub const YEARS: &str = "Years";
    pub const QUARTER: &str = "Quarter";
    pub const DISTRICT: &str = "District";

    pub const TRANSACTION_TYPE: &str = "Transaction_type";
    pub const TRANSACTION_COUNT: &str = "Transaction_count";
    pub const TRANSACTION_AMOUNT: &str = "Transaction_amount";

    pub const INSURANCE_COUNT: &str = "Insurance_count";
    pub const INSURANCE_AMOUNT: &str = "Insurance_amount";

    pub const BRANDS: &str = "Brands";

    // map_user and top_user disagree on the user column; both spellings are
    // real and kept as stored.
    pub const REGISTERED_USERS: &str = "RegisteredUsers";
    pub const REGISTERED_USERS_TOP: &str = "Registered_Users";
    pub const APP_OPENS: &str = "AppOpens";
}

// ── Derived measure columns ─────────────────────────────────────────────────
pub mod derived {
    pub const AMOUNT_M: &str = "Amount_M";
    pub const USERS_K: &str = "Users_K";
    pub const AVG_VALUE: &str = "Avg_Value";
    pub const AVG_POLICY_VALUE: &str = "Avg_Policy_Value";
    pub const GROWTH_SCORE: &str = "Growth_Score";
    pub const ENGAGEMENT_RATE: &str = "Engagement_Rate";
    pub const PERIOD: &str = "Period";
}

/// The nine datasets served by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    AggTransaction,
    AggInsurance,
    AggUser,
    MapTransaction,
    MapInsurance,
    MapUser,
    TopTransaction,
    TopInsurance,
    TopUser,
}

impl Dataset {
    pub const ALL: [Dataset; 9] = [
        Dataset::AggTransaction,
        Dataset::AggInsurance,
        Dataset::AggUser,
        Dataset::MapTransaction,
        Dataset::MapInsurance,
        Dataset::MapUser,
        Dataset::TopTransaction,
        Dataset::TopInsurance,
        Dataset::TopUser,
    ];

    /// SQL table name backing the dataset.
    pub fn table_name(self) -> &'static str {
        match self {
            Dataset::AggTransaction => "aggregated_transaction",
            Dataset::AggInsurance => "aggregated_insurance",
            Dataset::AggUser => "aggregated_user",
            Dataset::MapTransaction => "map_transaction",
            Dataset::MapInsurance => "map_insurance",
            Dataset::MapUser => "map_user",
            Dataset::TopTransaction => "top_transaction",
            Dataset::TopInsurance => "top_insurance",
            Dataset::TopUser => "top_user",
        }
    }

    /// Short key used in log events and load reports.
    pub fn key(self) -> &'static str {
        match self {
            Dataset::AggTransaction => "agg_transaction",
            Dataset::AggInsurance => "agg_insurance",
            Dataset::AggUser => "agg_user",
            Dataset::MapTransaction => "map_transaction",
            Dataset::MapInsurance => "map_insurance",
            Dataset::MapUser => "map_user",
            Dataset::TopTransaction => "top_transaction",
            Dataset::TopInsurance => "top_insurance",
            Dataset::TopUser => "top_user",
        }
    }
}
