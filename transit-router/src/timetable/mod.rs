//! Timetable access for the route searches.
//!
//! Loading turns the CSV export into a flat list of connections; the
//! adjacency index and stop directory are read-only views over that list,
//! built once per request and shared by every search it runs.

mod adjacency;
mod load;
mod stops;

pub use adjacency::AdjacencyIndex;
pub use load::{LoadError, load_connections, load_connections_from_path};
pub use stops::StopDirectory;
