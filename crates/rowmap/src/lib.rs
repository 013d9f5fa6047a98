//! Map plain record types onto relational tables.
//!
//! This crate provides:
//! - A conversion registry between host field types and SQL column types
//! - Schema reflection from record declarations ([`record!`])
//! - Live schema inspection and additive, idempotent migrations
//! - Parameterized CRUD over MySQL, and the same contract over YAML files
//!
//! # Declaring records
//!
//! ```
//! use rowmap::{column, record, sql_enum};
//!
//! sql_enum! {
//!     pub enum Rank { Member, Officer, Leader }
//! }
//!
//! record! {
//!     #[table = "guild_member"]
//!     #[derive(Debug, Clone)]
//!     pub struct GuildMember {
//!         pub guild: String => column("guild").limit(32).primary(),
//!         pub player: uuid::Uuid => column("player").primary(),
//!         pub rank: Rank => column("rank"),
//!         pub note: Option<String> => column("note"),
//!     }
//! }
//! ```
//!
//! # Migrations
//!
//! Migrations only ever add: missing columns are appended, mismatched types
//! are changed, and missing primary and unique keys are added. Columns are
//! never dropped or renamed. Running the same migration twice is a no-op.
//!
//! ```ignore
//! let store = MySqlStore::connect(&config).await?;
//! store.create_or_migrate::<GuildMember>().await?;
//! store.upsert_by_key(&member).await?;
//! ```

pub mod config;
pub mod crud;
pub mod diff;
mod error;
mod field;
pub mod introspect;
mod migrate;
mod query;
mod record;
pub mod reflect;
mod registry;
mod store;
mod value;

pub use config::Config;
pub use diff::{MigrationStep, SchemaDelta, diff_table};
pub use error::{BackendError, ConversionError, Error, Intent};
pub use field::{FieldType, FieldValue, ObjectId};
pub use migrate::Migrator;
pub use query::{Where, where_};
pub use record::{FieldError, Record, RowOutcome, record_to_row, row_to_record};
pub use reflect::{collect_schema, reflect};
pub use registry::{Converter, Registry};
pub use store::{BoxFuture, Executor, MySqlExecutor, MySqlStore, SqlStore, Store, YamlStore};
pub use value::{Row, Value};

// Used by `record!` expansions.
pub use inventory;

pub use rowmap_schema::*;

pub type Result<T> = std::result::Result<T, Error>;
