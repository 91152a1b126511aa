/// Ledger-facing settings resolved from the infrastructure config at
/// bootstrap time.
#[derive(Debug, Clone)]
pub struct CreditSettings {
    pub initial_grant: i64,
    pub generation_cost: i64,
    pub transaction_page_size: i64,
}

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub poll_timeout_secs: u64,
}
