use serde::{Deserialize, Serialize};

/// A block as returned by `eth_getBlockBy*` with full transaction objects.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(with = "quantity")]
    pub number: u64,
    pub hash: String,
    pub parent_hash: String,
    #[serde(default)]
    pub nonce: Option<String>,
    pub sha3_uncles: String,
    #[serde(default)]
    pub logs_bloom: Option<String>,
    pub transactions_root: String,
    pub state_root: String,
    pub receipts_root: String,
    pub miner: String,
    #[serde(with = "quantity")]
    pub difficulty: u128,
    #[serde(default, with = "quantity::option")]
    pub total_difficulty: Option<u128>,
    pub extra_data: String,
    #[serde(with = "quantity")]
    pub size: u64,
    #[serde(with = "quantity")]
    pub gas_limit: u64,
    #[serde(with = "quantity")]
    pub gas_used: u64,
    #[serde(with = "quantity")]
    pub timestamp: u64,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub uncles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    #[serde(with = "quantity")]
    pub nonce: u64,
    #[serde(default)]
    pub block_hash: Option<String>,
    #[serde(default, with = "quantity::option")]
    pub block_number: Option<u64>,
    #[serde(default, with = "quantity::option")]
    pub transaction_index: Option<u64>,
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(with = "quantity")]
    pub value: u128,
    #[serde(with = "quantity")]
    pub gas: u64,
    #[serde(default, with = "quantity::option")]
    pub gas_price: Option<u128>,
    pub input: String,
}

/// Parses a JSON-RPC quantity (`0x`-prefixed hex, no leading zeroes required).
pub fn parse_quantity(raw: &str) -> Result<u128, String> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| format!("quantity {} is missing the 0x prefix", raw))?;
    if digits.is_empty() {
        return Err(format!("quantity {} has no digits", raw));
    }
    u128::from_str_radix(digits, 16).map_err(|e| format!("invalid quantity {}: {}", raw, e))
}

pub(crate) mod quantity {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Copy + Into<u128>,
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:#x}", (*value).into()))
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: TryFrom<u128>,
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let value = super::parse_quantity(&raw).map_err(D::Error::custom)?;
        T::try_from(value).map_err(|_| D::Error::custom(format!("quantity {} out of range", raw)))
    }

    pub mod option {
        use serde::de::Error as _;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
        where
            T: Copy + Into<u128>,
            S: Serializer,
        {
            match value {
                Some(v) => serializer.serialize_some(&format!("{:#x}", (*v).into())),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
        where
            T: TryFrom<u128>,
            D: Deserializer<'de>,
        {
            let Some(raw) = Option::<String>::deserialize(deserializer)? else {
                return Ok(None);
            };
            let value = super::super::parse_quantity(&raw).map_err(D::Error::custom)?;
            T::try_from(value)
                .map(Some)
                .map_err(|_| D::Error::custom(format!("quantity {} out of range", raw)))
        }
    }
}
