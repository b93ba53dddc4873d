// Entity Models - NEOs and their close approaches
//
// Each entity has:
// - Stable identity (designation) that NEVER changes
// - Values coerced once from a raw source row
// - One relation, NEO → approaches, resolved by `NeoDatabase`

pub mod approach;
pub mod neo;

pub use approach::{Approach, ApproachRecord};
pub use neo::{CelestialObject, NeoRecord};
