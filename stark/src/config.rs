//! JSON configuration for a STARK instance. Every name is resolved to a
//! closed enumeration at load time; anything unknown fails with
//! `ConfigUnknown` before any work starts.

use serde::{Deserialize, Serialize};

use quarry_util::{Error, Result};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FriConfig {
    pub fri_step_list: Vec<usize>,
    pub last_layer_degree_bound: usize,
    pub n_queries: usize,
    pub proof_of_work_bits: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StarkConfig {
    pub field: String,
    pub log_trace_length: usize,
    pub log_n_cosets: usize,
    pub fri: FriConfig,
    pub commitment_hash: String,
    pub channel_hash: String,
}

/// The closed set of supported field variants.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldId {
    TestField,
    LongField,
    PrimeField0,
    PrimeField1,
    PrimeField2,
    PrimeField3,
    PrimeField4,
    PrimeField5,
    ExtensionTestField,
    ExtensionLongField,
    ExtensionPrimeField0,
}

impl FieldId {
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(match name {
            "TestField" => Self::TestField,
            "LongField" => Self::LongField,
            "PrimeField0" => Self::PrimeField0,
            "PrimeField1" => Self::PrimeField1,
            "PrimeField2" => Self::PrimeField2,
            "PrimeField3" => Self::PrimeField3,
            "PrimeField4" => Self::PrimeField4,
            "PrimeField5" => Self::PrimeField5,
            "ExtensionTestField" => Self::ExtensionTestField,
            "ExtensionLongField" => Self::ExtensionLongField,
            "ExtensionPrimeField0" => Self::ExtensionPrimeField0,
            _ => return Err(Error::ConfigUnknown(format!("field {name:?}"))),
        })
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HashId {
    Blake3,
    Keccak256,
}

impl HashId {
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(match name {
            "blake3" => Self::Blake3,
            "keccak256" => Self::Keccak256,
            _ => return Err(Error::ConfigUnknown(format!("hash {name:?}"))),
        })
    }
}

impl StarkConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::ConfigUnknown(format!("malformed configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.field_id()?;
        self.commitment_hash_id()?;
        self.channel_hash_id()?;
        if self.log_n_cosets == 0 {
            return Err(Error::InvalidParameter(
                "blowup must be at least 2 (log_n_cosets >= 1)".to_string(),
            ));
        }
        Ok(())
    }

    pub fn field_id(&self) -> Result<FieldId> {
        FieldId::from_name(&self.field)
    }

    pub fn commitment_hash_id(&self) -> Result<HashId> {
        HashId::from_name(&self.commitment_hash)
    }

    pub fn channel_hash_id(&self) -> Result<HashId> {
        HashId::from_name(&self.channel_hash)
    }
}
