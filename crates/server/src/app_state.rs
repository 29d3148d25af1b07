use crate::relay::LedgerRelay;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) relay: LedgerRelay,
    pub(crate) max_body_bytes: usize,
}
