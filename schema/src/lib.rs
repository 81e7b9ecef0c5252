//! This is the runtime-side model for WIT dbi record schemas: the canonical
//! fixed-width layout of each record, and the validation outcomes the host
//! storage engine expects when it checks a stored buffer at load time.
//!
//! ```
//! use wit_dbi_schema::*;
//!
//! let layout = RecordLayout::build("dbi0_app_state_value", &[("confidence", "score")]);
//! let schema = RecordSchema::new(layout, Some(RefineExpr::Cmp {
//!     lhs: Operand::Field("confidence".to_owned()),
//!     op:  CmpOp::Ge,
//!     rhs: Operand::Float(0.0),
//! }));
//!
//! assert_eq!(schema.validate(&[]), Validation::Empty);
//! assert_eq!(schema.validate(&0.5f64.to_le_bytes()), Validation::Valid);
//! assert_eq!(schema.validate(&(-0.5f64).to_le_bytes()), Validation::RefinementViolation);
//! ```

pub mod layout;
pub mod reader;
pub mod refine;
pub mod validate;

pub use layout::*;
pub use reader::*;
pub use refine::*;
pub use validate::*;
