//! Operation request/response records
//!
//! Missing request fields decode to their zero value.

use serde::{Deserialize, Serialize};

/// Request to add two numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SumRequest {
    /// First operand
    pub a: i64,
    /// Second operand
    pub b: i64,
}

/// Response containing the sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SumResponse {
    /// The sum of a and b
    pub res: i64,
}

/// Request to concatenate two strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcatRequest {
    pub a: String,
    pub b: String,
}

/// Response containing the concatenation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcatResponse {
    pub res: String,
}
