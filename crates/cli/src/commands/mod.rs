pub mod estimate;
pub mod schema;
