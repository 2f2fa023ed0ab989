//! 可编程交易块（PTB）构造器：按顺序追加 Move 调用，并在构造期校验批内引用。

pub mod batch;
pub mod codec;
pub mod error;
pub mod types;

pub use batch::{
    Argument, Batch, CallDescriptor, Command, ObjectAccess, PureValue, ResultHandle,
    SubmittableBatch, VectorLiteral,
};
pub use codec::{parse_bytes, parse_object_id, parse_optional_bytes, parse_u64};
pub use error::{BuildError, EncodingError};
pub use types::{MoveTarget, ObjectId, StructTag, TypeTag};
