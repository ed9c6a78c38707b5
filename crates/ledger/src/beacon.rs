use alloy_primitives::Address;

/// The Blessnet beacon publishes the single relayer identity accounts trust.
/// Accounts capture the relayer at construction, so rotating the beacon only
/// affects accounts deployed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Beacon {
    relayer: Address,
}

impl Beacon {
    pub const fn new(relayer: Address) -> Self {
        Self { relayer }
    }

    pub const fn relayer(&self) -> Address {
        self.relayer
    }
}
