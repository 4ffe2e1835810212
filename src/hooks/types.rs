// SPDX-License-Identifier: Apache-2.0

//! Hook keys: which operation a hook belongs to and when it runs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::error::OdmError;

/// Base operation a CRUD call belongs to, as far as hooks are concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// `find` and `find_one`
    Find,
    /// `insert`, `insert_one` and `insert_many`
    Create,
    /// `update_one` and `update_many`
    Update,
    /// `delete_one` and `delete_many`
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Find,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Find => "find",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = OdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "find" => Ok(Operation::Find),
            "create" => Ok(Operation::Create),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            other => Err(OdmError::validation(format!(
                "Unknown hook operation '{}'. Expected one of: find, create, update, delete",
                other
            ))),
        }
    }
}

/// Stage of the pipeline relative to the driver call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Before,
    After,
}

impl Phase {
    pub const ALL: [Phase; 2] = [Phase::Before, Phase::After];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Before => "before",
            Phase::After => "after",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = OdmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "before" => Ok(Phase::Before),
            "after" => Ok(Phase::After),
            other => Err(OdmError::validation(format!(
                "Unknown hook phase '{}'. Expected 'before' or 'after'",
                other
            ))),
        }
    }
}
