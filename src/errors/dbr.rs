// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Errors from encoding or decoding engine-native buffers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DbrError {
    #[error("unknown DBR type code {0}")]
    UnknownType(u16),

    #[error("buffer of {actual} bytes is too short for {count} elements of {dbr_type}")]
    Truncated {
        dbr_type: &'static str,
        count: usize,
        actual: usize,
    },

    #[error("string field is not valid UTF-8")]
    InvalidString,

    #[error("buffer holds no elements")]
    Empty,

    #[error("arrays of {0} strings are not supported")]
    StringArray(usize),
}
