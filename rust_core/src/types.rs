//! Dispute game records as returned by the game list fetchers.

use ethers::types::Address;
use serde::{Deserialize, Serialize};

/// One dispute game created by the factory.
///
/// The monitor never inspects these beyond passing them along; the shape
/// follows what the factory's `gameAtIndex` returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameMetadata {
    /// Position of the game in the factory's game list
    pub index: u64,
    /// Dispute game type identifier
    pub game_type: u32,
    /// Creation time (Unix seconds)
    pub timestamp: u64,
    /// Address of the game proxy contract
    pub proxy: Address,
}

impl GameMetadata {
    pub fn new(index: u64, game_type: u32, timestamp: u64, proxy: Address) -> Self {
        Self {
            index,
            game_type,
            timestamp,
            proxy,
        }
    }
}
