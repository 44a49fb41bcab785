// Copyright (c) 2025 Moneta Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use thiserror::Error;

/// Field name -> human-readable message, for form-style rejections.
pub type FieldErrors = BTreeMap<&'static str, String>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unauthorized")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("validation failed: {}", format_fields(.0))]
    Validation(FieldErrors),

    #[error("external service failure: {0}")]
    External(String),

    #[error("inconsistent stored data: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}

impl Error {
    /// Single-field validation failure.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        let mut map = FieldErrors::new();
        map.insert(field, message.into());
        Error::Validation(map)
    }
}

fn format_fields(fields: &FieldErrors) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;
