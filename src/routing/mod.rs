//! Routing subsystem: resource allow-list and path rewriting.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     StaticResourceConfig + SchemaSnapshot
//!     → resolver.rs (every backend table name must exist, else fail)
//!     → ResolvedConfig (immutable)
//!     → router.rs installs a RequestValidator (schema-driven mode)
//!
//! Per request ("/proxy/<key>/<remainder>"):
//!     router.rs
//!     → schema-driven: validator.rs (allow-list + rewrite)
//!     → legacy:        path.rs lookups against the schema cache
//!     → upstream path handed to the forwarder verbatim
//! ```
//!
//! # Design Decisions
//! - Link aliases are matched exactly first, then with `_` read as space
//! - Resolution is all-or-nothing; a bad entry degrades startup to legacy mode
//! - Rejections carry the offending key or alias

pub mod operation;
pub mod path;
pub mod resolver;
pub mod router;
pub mod validator;

pub use operation::Operation;
pub use resolver::{ConfigResolver, ResolveError, ResolvedConfig, ResolvedEntry};
pub use router::{RequestRouter, RouteError, RoutedRequest, RoutingMode};
pub use validator::{RequestValidator, ValidationError, ValidationOutcome};
