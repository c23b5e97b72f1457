// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent agent identity.
//!
//! The identity file is written once and only read thereafter, so the same
//! logical agent keeps its id across restarts — which is what lets the
//! server hand a recovering agent its own unfinished command during sync.

use relay_core::{AgentId, IdGen, UuidIdGen};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// File name under the agent data directory
const ID_FILE: &str = "agent-id.txt";

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load the persisted identity, or generate and persist a fresh one.
pub fn load_or_create(dir: &Path) -> Result<AgentId, IdentityError> {
    let path = dir.join(ID_FILE);

    if path.exists() {
        let raw = std::fs::read_to_string(&path)?;
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Ok(AgentId::new(trimmed));
        }
    }

    std::fs::create_dir_all(dir)?;
    let id = format!("agent-{}", UuidIdGen.next());
    std::fs::write(&path, format!("{id}\n"))?;

    info!(agent_id = %id, path = %path.display(), "generated fresh agent identity");
    Ok(AgentId::new(id))
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
