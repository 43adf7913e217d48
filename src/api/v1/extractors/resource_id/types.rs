/*
 * Responsibility
 *  - declare the typed id of each resource (tag type + alias)
 *
 * Everything `pub` here is re-exported through ./mod.rs.
 */
use super::core::ResourceId;

// schools
pub enum SchoolTag {}
pub type SchoolId = ResourceId<SchoolTag>;
