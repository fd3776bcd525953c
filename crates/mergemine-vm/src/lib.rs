pub mod abi;
pub mod context;
pub mod errors;
pub mod execution_result;
pub mod methods;
pub mod validator;

pub use abi::{AbiError, DecodedCall, ParamType, Value};
pub use context::{ExecutionContext, HostContext, MethodHandler, Momentum};
pub use errors::ContractError;
pub use execution_result::CallEffect;
pub use methods::{MethodSchema, METHODS};
pub use validator::{validate_call, ContractCall};
