use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Type class of a tensor element, numbered like the DLPack type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataTypeCode {
    Int = 0,
    UInt = 1,
    Float = 2,
    BFloat = 4,
}

impl DataTypeCode {
    pub fn from_raw(code: u8) -> Option<Self> {
        match code {
            0 => Some(DataTypeCode::Int),
            1 => Some(DataTypeCode::UInt),
            2 => Some(DataTypeCode::Float),
            4 => Some(DataTypeCode::BFloat),
            _ => None,
        }
    }
}

/// Element type of a tensor: type class, bit width and vector lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataType {
    pub code: DataTypeCode,
    pub bits: u8,
    pub lanes: u16,
}

impl DataType {
    pub const BOOL: DataType = DataType::new(DataTypeCode::UInt, 1, 1);
    pub const I8: DataType = DataType::new(DataTypeCode::Int, 8, 1);
    pub const I16: DataType = DataType::new(DataTypeCode::Int, 16, 1);
    pub const I32: DataType = DataType::new(DataTypeCode::Int, 32, 1);
    pub const I64: DataType = DataType::new(DataTypeCode::Int, 64, 1);
    pub const U8: DataType = DataType::new(DataTypeCode::UInt, 8, 1);
    pub const U16: DataType = DataType::new(DataTypeCode::UInt, 16, 1);
    pub const U32: DataType = DataType::new(DataTypeCode::UInt, 32, 1);
    pub const F16: DataType = DataType::new(DataTypeCode::Float, 16, 1);
    pub const BF16: DataType = DataType::new(DataTypeCode::BFloat, 16, 1);
    pub const F32: DataType = DataType::new(DataTypeCode::Float, 32, 1);
    pub const F64: DataType = DataType::new(DataTypeCode::Float, 64, 1);

    pub const fn new(code: DataTypeCode, bits: u8, lanes: u16) -> Self {
        Self { code, bits, lanes }
    }

    pub const fn with_lanes(self, lanes: u16) -> Self {
        Self { lanes, ..self }
    }

    /// Storage size of one element in bytes. Sub-byte types round up.
    pub const fn bytes(self) -> usize {
        (self.bits as usize * self.lanes as usize + 7) / 8
    }

    pub fn is_float(self) -> bool {
        matches!(self.code, DataTypeCode::Float | DataTypeCode::BFloat)
    }

    /// Parse the textual form used by graph descriptions (`int8`,
    /// `float32x4`, `bool`).
    pub fn from_ident(ident: &str) -> Result<Self> {
        let ident = ident.trim();
        if ident == "bool" {
            return Ok(DataType::BOOL);
        }
        let (base, lanes) = match ident.split_once('x') {
            Some((base, lanes)) => {
                let lanes = lanes
                    .parse::<u16>()
                    .map_err(|_| unsupported(ident))?;
                (base, lanes)
            }
            None => (ident, 1),
        };
        let (code, bits) = if let Some(bits) = base.strip_prefix("uint") {
            (DataTypeCode::UInt, bits)
        } else if let Some(bits) = base.strip_prefix("int") {
            (DataTypeCode::Int, bits)
        } else if let Some(bits) = base.strip_prefix("bfloat") {
            (DataTypeCode::BFloat, bits)
        } else if let Some(bits) = base.strip_prefix("float") {
            (DataTypeCode::Float, bits)
        } else {
            return Err(unsupported(ident));
        };
        let bits = bits.parse::<u8>().map_err(|_| unsupported(ident))?;
        if bits == 0 || lanes == 0 {
            return Err(unsupported(ident));
        }
        Ok(DataType::new(code, bits, lanes))
    }
}

fn unsupported(ident: &str) -> Error {
    Error::invalid_graph(format!("unsupported dtype: {}", ident))
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == DataType::BOOL {
            return write!(f, "bool");
        }
        let prefix = match self.code {
            DataTypeCode::Int => "int",
            DataTypeCode::UInt => "uint",
            DataTypeCode::Float => "float",
            DataTypeCode::BFloat => "bfloat",
        };
        write!(f, "{}{}", prefix, self.bits)?;
        if self.lanes != 1 {
            write!(f, "x{}", self.lanes)?;
        }
        Ok(())
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DataType::from_ident(s)
    }
}

impl TryFrom<String> for DataType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        DataType::from_ident(&value)
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.to_string()
    }
}
