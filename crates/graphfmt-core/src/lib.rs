//! graphfmt core: graph data model, reusable buffer pool and run statistics

pub mod graph;
pub mod model;
pub mod pool;
pub mod stats;


pub use model::{NodeId, Node, Edge};
pub use graph::Graph;
pub use pool::{BufferPool, PoolConfig, PoolStats, PooledBuffer};
pub use stats::{ConversionStats, StatsSnapshot};
