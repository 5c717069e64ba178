//! Synchronous SQLite connection/statement layer with owned native handles.
//!
//! The engine is consumed through its raw C surface; this crate is the
//! boundary on top of it: resource lifetimes that survive arbitrary drop
//! order, a five-class value model marshalled exactly in both directions
//! (64-bit integers at full magnitude, full Unicode text, raw blobs), and a
//! stable error taxonomy that keeps locking and constraint failures from
//! ever crashing the process.
//!
//! ```
//! use sqlite_bridge::{Connection, Value};
//!
//! let mut conn = Connection::open(":memory:")?;
//! conn.exec("create table users (name text, age integer)")?;
//!
//! let mut insert = conn.prepare("insert into users values (:name, :age)")?;
//! insert.run([(":name", Value::Text("alice".into())), (":age", Value::Integer(42))])?;
//!
//! let mut query = conn.prepare("select name, age from users")?;
//! for row in query.all(())? {
//!     println!("{:?} is {:?}", row.get("name"), row.get("age"));
//! }
//! # Ok::<_, sqlite_bridge::Error>(())
//! ```

mod connection;
mod engine;
mod error;
mod params;
mod row;
mod statement;
mod value;

pub mod prelude;

pub use connection::Connection;
pub use engine::{initialize, version};
pub use error::{ConstraintKind, Error};
pub use params::Params;
pub use row::{Row, RunResult};
pub use statement::Statement;
pub use value::Value;
