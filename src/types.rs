use ethereum_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The result of an `eth_feeHistory` call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeHistory {
    /// Block number of the first block in the window.
    ///
    /// Returned as an unsigned integer up to geth v1.10.6 and as a hex string
    /// from v1.10.7 on; the custom deserializer accepts both.
    #[serde(deserialize_with = "deserialize_block_number")]
    pub oldest_block: u64,
    /// Base fee per gas for each block in the window, plus the node's own
    /// projection for the next block as the trailing entry.
    pub base_fee_per_gas: Vec<U256>,
    /// Gas used ratio for each block in the window, aligned with
    /// `base_fee_per_gas[..len - 1]`.
    pub gas_used_ratio: Vec<f64>,
    /// Effective priority fees at the requested percentiles, one row per
    /// block. Empty when no percentiles were requested.
    #[serde(default)]
    pub reward: Vec<Vec<U256>>,
}

/// A single fee suggestion, ready to be attached to an EIP-1559 transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSuggestion {
    /// Ceiling on the combined base fee and tip, in wei per gas.
    pub max_fee_per_gas: U256,
    /// Ceiling on the tip alone, in wei per gas. Never exceeds
    /// [`max_fee_per_gas`](Self::max_fee_per_gas).
    pub max_priority_fee_per_gas: U256,
}

/// Block selector for `eth_feeHistory`'s `newestBlock` parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlockNumber {
    /// Latest block
    #[default]
    Latest,
    /// Block by number from canon chain
    Number(u64),
}

impl Serialize for BlockNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            BlockNumber::Number(x) => serializer.serialize_str(&format!("0x{x:x}")),
            BlockNumber::Latest => serializer.serialize_str("latest"),
        }
    }
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            BlockNumber::Number(x) => write!(f, "0x{x:x}"),
            BlockNumber::Latest => f.write_str("latest"),
        }
    }
}

impl From<u64> for BlockNumber {
    fn from(num: u64) -> Self {
        BlockNumber::Number(num)
    }
}

/// Helper type to parse a block number from hex or int
#[derive(Deserialize)]
#[serde(untagged)]
enum NumericBlock {
    Num(u64),
    Hex(U256),
}

fn deserialize_block_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumericBlock::deserialize(deserializer)? {
        NumericBlock::Num(n) => Ok(n),
        NumericBlock::Hex(n) => {
            if n.bits() > 64 {
                return Err(serde::de::Error::custom("block number exceeds u64"))
            }
            Ok(n.as_u64())
        }
    }
}
