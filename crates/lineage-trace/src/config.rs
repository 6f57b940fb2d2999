use serde::{Deserialize, Serialize};

/// Options controlling how raw trace lines are interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Drop coverage addresses whose upper 16 bits are neither all ones
    /// (kernel text) nor all zeros.
    #[serde(default = "default_kernel_address_filter")]
    pub kernel_address_filter: bool,
    /// Resolution of the `<<<ts>>>` timestamps.
    #[serde(default = "default_nanos_per_second")]
    pub nanos_per_second: u64,
}

const ADDRESS_HIGH_MASK: u64 = 0xffff_0000_0000_0000;

fn default_kernel_address_filter() -> bool {
    true
}

fn default_nanos_per_second() -> u64 {
    1_000_000_000
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            kernel_address_filter: default_kernel_address_filter(),
            nanos_per_second: default_nanos_per_second(),
        }
    }
}

impl ParserConfig {
    /// Returns whether a coverage address survives the address filter.
    pub fn accepts_address(&self, address: u64) -> bool {
        if !self.kernel_address_filter {
            return true;
        }
        let high = address & ADDRESS_HIGH_MASK;
        high == ADDRESS_HIGH_MASK || high == 0
    }

    /// Converts a raw timestamp delta to seconds.
    pub fn seconds(&self, delta: u64) -> f64 {
        delta as f64 / self.nanos_per_second.max(1) as f64
    }
}
