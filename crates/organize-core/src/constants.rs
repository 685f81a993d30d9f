/// Route component constants shared across crates
pub const API_VERSION_COMPONENT: &str = "v1";
pub const API_ROUTE_PREFIX: &str = const_str::concat!("/", API_VERSION_COMPONENT);

pub const ENTITY_ROUTE_COMPONENT: &str = "entity";
pub const ENTITY_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", ENTITY_ROUTE_COMPONENT);

pub const ENTITIES_ROUTE_COMPONENT: &str = "entities";
pub const PARENTS_ROUTE_COMPONENT: &str = "parents";
pub const CHILDREN_ROUTE_COMPONENT: &str = "children";

/// Unit name used in the `Content-Range` header of entity listings.
pub const CONTENT_RANGE_UNIT: &str = "entities";
