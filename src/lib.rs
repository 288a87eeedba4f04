//! # moeba
//!
//! Asynchronous multi-objective evolutionary biclustering.
//!
//! A candidate solution is a [`Genome`](genome::Genome) that a
//! [`Codec`](codec::Codec) decodes into a list of
//! [`Bicluster`](bicluster::Bicluster)s over a [`DataMatrix`](data::DataMatrix).
//! The [`AsyncEngine`](scheduler::AsyncEngine) evaluates genomes on a pool of
//! worker threads and evolves a population with NSGA-II style ranking, while
//! the master thread alone owns the population, the archive and the random
//! source.
//!
//! ```rust,no_run
//! use moeba::{AsyncEngine, DataMatrix, EngineOptions};
//!
//! let data = DataMatrix::numeric(vec![vec![1.0, 2.0, 3.0]; 8])?;
//! let options = EngineOptions::builder()
//!     .population_size(10)
//!     .max_evaluations(100)
//!     .fitness_functions("BiclusterSizeNormComp;RowVarianceNormComp")
//!     .build()?;
//!
//! let result = AsyncEngine::new(data, options)?.run()?;
//! println!("{} solutions after {} evaluations", result.solutions.len(), result.evaluations);
//! # Ok::<(), moeba::MoebaError>(())
//! ```

pub mod bicluster;
pub mod caching;
pub mod codec;
pub mod data;
pub mod error;
pub mod fitness;
pub mod genome;
pub mod operators;
pub mod options;
pub mod population;
pub mod rng;
pub mod scheduler;

pub use bicluster::Bicluster;
pub use data::{ColumnType, DataMatrix};
pub use error::{MoebaError, OptionExt, Result, ResultExt};
pub use genome::Genome;
pub use options::{EngineOptions, LogLevel};
pub use population::Individual;
pub use scheduler::{Algorithm, AsyncEngine, RunResult};
