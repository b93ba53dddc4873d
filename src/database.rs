// 🔗 NEO Database - linking phase + lookups
//
// Construction IS the linking phase:
//   1. index NEOs by designation (duplicates rejected)
//   2. append every approach to its NEO while NEOs are still uniquely owned
//   3. freeze NEOs behind `Arc`
//   4. resolve each approach's NEO reference exactly once
//
// Nobody sees the graph before step 4 is done. Afterwards it is read-only.

use crate::entities::{Approach, CelestialObject};
use crate::error::{NeoError, NeoResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

// ============================================================================
// UNRESOLVED POLICY
// ============================================================================

/// What to do with an approach whose designation matches no NEO
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Leave it out of the database
    #[default]
    Drop,
    /// Keep it, unlinked
    Keep,
    /// Fail construction
    Error,
}

impl UnresolvedPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnresolvedPolicy::Drop => "drop",
            UnresolvedPolicy::Keep => "keep",
            UnresolvedPolicy::Error => "error",
        }
    }
}

impl fmt::Display for UnresolvedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnresolvedPolicy {
    type Err = NeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drop" => Ok(UnresolvedPolicy::Drop),
            "keep" => Ok(UnresolvedPolicy::Keep),
            "error" => Ok(UnresolvedPolicy::Error),
            other => Err(NeoError::UnknownPolicy(other.to_string())),
        }
    }
}

// ============================================================================
// LINK REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkReport {
    pub policy: UnresolvedPolicy,
    pub neo_count: usize,
    pub approach_count: usize,
    pub linked_count: usize,
    /// Designations with no NEO, one entry per approach
    pub unresolved: Vec<String>,
}

impl LinkReport {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} NEOs, {} close approaches: {} linked, {} unresolved ({})",
            self.neo_count,
            self.approach_count,
            self.linked_count,
            self.unresolved.len(),
            self.policy
        )
    }
}

// ============================================================================
// NEO DATABASE
// ============================================================================

/// Linked, read-only graph of NEOs and close approaches
pub struct NeoDatabase {
    neos: Vec<Arc<CelestialObject>>,
    approaches: Vec<Arc<Approach>>,
    by_designation: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    report: LinkReport,
}

impl NeoDatabase {
    /// Link with the default policy (unresolved approaches are dropped)
    pub fn new(neos: Vec<CelestialObject>, approaches: Vec<Approach>) -> NeoResult<Self> {
        Self::with_policy(neos, approaches, UnresolvedPolicy::default())
    }

    pub fn with_policy(
        mut neos: Vec<CelestialObject>,
        approaches: Vec<Approach>,
        policy: UnresolvedPolicy,
    ) -> NeoResult<Self> {
        // 1. Index
        let mut by_designation = HashMap::with_capacity(neos.len());
        let mut by_name = HashMap::new();
        for (idx, neo) in neos.iter().enumerate() {
            if by_designation
                .insert(neo.designation().to_string(), idx)
                .is_some()
            {
                return Err(NeoError::DuplicateDesignation(neo.designation().to_string()));
            }
            if let Some(name) = neo.name() {
                by_name.entry(name.to_string()).or_insert(idx);
            }
        }

        // 2. Append
        let approach_count = approaches.len();
        let mut kept = Vec::with_capacity(approach_count);
        let mut unresolved = Vec::new();
        for approach in approaches {
            let approach = Arc::new(approach);
            match by_designation.get(approach.designation()) {
                Some(&idx) => {
                    neos[idx].append_approach(Arc::clone(&approach));
                    kept.push(approach);
                }
                None => {
                    warn!(
                        designation = approach.designation(),
                        time = %approach.time_str(),
                        %policy,
                        "close approach has no matching NEO"
                    );
                    if policy == UnresolvedPolicy::Error {
                        return Err(NeoError::UnresolvedReference {
                            designation: approach.designation().to_string(),
                        });
                    }
                    unresolved.push(approach.designation().to_string());
                    if policy == UnresolvedPolicy::Keep {
                        kept.push(approach);
                    }
                }
            }
        }

        // 3. Freeze, 4. Resolve
        let neos: Vec<Arc<CelestialObject>> = neos.into_iter().map(Arc::new).collect();
        let mut linked_count = 0;
        for neo in &neos {
            for approach in neo.approaches() {
                approach.link(neo)?;
                linked_count += 1;
            }
            debug!(
                designation = neo.designation(),
                approaches = neo.approaches().len(),
                "linked NEO"
            );
        }

        let report = LinkReport {
            policy,
            neo_count: neos.len(),
            approach_count,
            linked_count,
            unresolved,
        };
        info!("{}", report.summary());

        Ok(NeoDatabase {
            neos,
            approaches: kept,
            by_designation,
            by_name,
            report,
        })
    }

    /// Find a NEO by primary designation (exact match)
    pub fn get_neo_by_designation(&self, designation: &str) -> Option<&Arc<CelestialObject>> {
        self.by_designation
            .get(designation.trim())
            .map(|&idx| &self.neos[idx])
    }

    /// Find a NEO by IAU name (exact match)
    pub fn get_neo_by_name(&self, name: &str) -> Option<&Arc<CelestialObject>> {
        self.by_name.get(name.trim()).map(|&idx| &self.neos[idx])
    }

    /// All NEOs, in source order
    pub fn neos(&self) -> &[Arc<CelestialObject>] {
        &self.neos
    }

    /// All close approaches kept by the linking phase, in source order
    pub fn approaches(&self) -> &[Arc<Approach>] {
        &self.approaches
    }

    pub fn report(&self) -> &LinkReport {
        &self.report
    }
}

// ============================================================================
// TESTS
// ============================================================================
