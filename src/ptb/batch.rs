use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use super::error::BuildError;
use super::types::{MoveTarget, ObjectId, TypeTag};

/// 单个 PTB 允许的最大命令数（与链上协议上限一致）。
pub const MAX_COMMANDS: usize = 1024;

static NEXT_BATCH_ID: AtomicU64 = AtomicU64::new(1);

/// 批次内某条命令的结果句柄，只能在产生它的批次中作为后续命令的参数。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResultHandle {
    batch: u64,
    index: u16,
}

impl ResultHandle {
    pub fn batch_id(&self) -> u64 {
        self.batch
    }

    pub fn index(&self) -> u16 {
        self.index
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectAccess {
    Immutable,
    Mutable,
}

impl ObjectAccess {
    pub fn is_mutable(self) -> bool {
        matches!(self, Self::Mutable)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PureValue {
    Bool(bool),
    U64(u64),
    Address(ObjectId),
    Bytes(Vec<u8>),
}

impl PureValue {
    /// 按 BCS 编码纯值参数。
    pub fn to_bcs(&self) -> Result<Vec<u8>, bcs::Error> {
        match self {
            PureValue::Bool(value) => bcs::to_bytes(value),
            PureValue::U64(value) => bcs::to_bytes(value),
            PureValue::Address(value) => bcs::to_bytes(value),
            PureValue::Bytes(value) => bcs::to_bytes(value),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Argument {
    Pure(PureValue),
    Object { id: ObjectId, access: ObjectAccess },
    Result(ResultHandle),
}

impl Argument {
    pub fn u64(value: u64) -> Self {
        Argument::Pure(PureValue::U64(value))
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Argument::Pure(PureValue::Bytes(value.into()))
    }

    pub fn address(value: ObjectId) -> Self {
        Argument::Pure(PureValue::Address(value))
    }

    pub fn object(id: ObjectId) -> Self {
        Argument::Object {
            id,
            access: ObjectAccess::Immutable,
        }
    }

    pub fn object_mut(id: ObjectId) -> Self {
        Argument::Object {
            id,
            access: ObjectAccess::Mutable,
        }
    }

    pub fn clock() -> Self {
        Self::object(ObjectId::CLOCK)
    }

    pub fn deny_list() -> Self {
        Self::object(ObjectId::DENY_LIST)
    }

    pub fn as_handle(&self) -> Option<ResultHandle> {
        match self {
            Argument::Result(handle) => Some(*handle),
            _ => None,
        }
    }
}

impl From<ResultHandle> for Argument {
    fn from(handle: ResultHandle) -> Self {
        Argument::Result(handle)
    }
}

/// 一次 Move 调用的完整描述，构造完成后不可变。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallDescriptor {
    target: MoveTarget,
    type_args: Vec<TypeTag>,
    args: Vec<Argument>,
}

impl CallDescriptor {
    pub fn new(target: MoveTarget) -> Self {
        Self {
            target,
            type_args: Vec::new(),
            args: Vec::new(),
        }
    }

    pub fn with_type_arg(mut self, tag: TypeTag) -> Self {
        self.type_args.push(tag);
        self
    }

    pub fn arg(mut self, arg: impl Into<Argument>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn target(&self) -> &MoveTarget {
        &self.target
    }

    pub fn type_args(&self) -> &[TypeTag] {
        &self.type_args
    }

    pub fn args(&self) -> &[Argument] {
        &self.args
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VectorLiteral {
    pub element_type: TypeTag,
    pub elements: Vec<Argument>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    MoveCall(CallDescriptor),
    MakeMoveVec(VectorLiteral),
}

impl Command {
    pub fn arguments(&self) -> &[Argument] {
        match self {
            Command::MoveCall(call) => call.args(),
            Command::MakeMoveVec(literal) => &literal.elements,
        }
    }

    pub fn as_move_call(&self) -> Option<&CallDescriptor> {
        match self {
            Command::MoveCall(call) => Some(call),
            Command::MakeMoveVec(_) => None,
        }
    }

    fn label(&self) -> String {
        match self {
            Command::MoveCall(call) => call.target().to_string(),
            Command::MakeMoveVec(literal) => format!("make_move_vec<{}>", literal.element_type),
        }
    }
}

/// 按调用方顺序构造的原子命令批次。
///
/// 每次追加都会消耗旧值并返回新批次与结果句柄，句柄携带批次 ID，
/// 因而跨批次或前向引用都会在构造阶段被拒绝。
#[derive(Debug)]
pub struct Batch {
    id: u64,
    commands: Vec<Command>,
}

impl Default for Batch {
    fn default() -> Self {
        Self::new()
    }
}

impl Batch {
    pub fn new() -> Self {
        Self {
            id: NEXT_BATCH_ID.fetch_add(1, Ordering::Relaxed),
            commands: Vec::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn move_calls(&self) -> impl Iterator<Item = &CallDescriptor> {
        self.commands.iter().filter_map(Command::as_move_call)
    }

    pub fn add_call(self, call: CallDescriptor) -> Result<(Self, ResultHandle), BuildError> {
        self.push(Command::MoveCall(call))
    }

    /// 追加同构向量字面量，常用于为 `vector<T>` 形参提供空集合。
    pub fn add_vector_literal(
        self,
        element_type: TypeTag,
        elements: Vec<Argument>,
    ) -> Result<(Self, ResultHandle), BuildError> {
        self.push(Command::MakeMoveVec(VectorLiteral {
            element_type,
            elements,
        }))
    }

    pub fn finalize(self, gas_budget: u64) -> Result<SubmittableBatch, BuildError> {
        if self.commands.is_empty() {
            return Err(BuildError::EmptyBatch);
        }
        if gas_budget == 0 {
            return Err(BuildError::ZeroGasBudget);
        }
        debug!(
            target: "ptb",
            batch = self.id,
            commands = self.commands.len(),
            gas_budget,
            "批次已封存"
        );
        Ok(SubmittableBatch {
            batch_id: self.id,
            commands: self.commands,
            gas_budget,
        })
    }

    fn push(mut self, command: Command) -> Result<(Self, ResultHandle), BuildError> {
        let index = self.commands.len();
        if index >= MAX_COMMANDS {
            return Err(BuildError::TooManyCommands {
                limit: MAX_COMMANDS,
            });
        }
        for handle in command.arguments().iter().filter_map(Argument::as_handle) {
            self.check_handle(index, handle)?;
        }

        debug!(
            target: "ptb",
            batch = self.id,
            index,
            command = %command.label(),
            "追加命令"
        );
        self.commands.push(command);
        let handle = ResultHandle {
            batch: self.id,
            index: index as u16,
        };
        Ok((self, handle))
    }

    fn check_handle(&self, index: usize, handle: ResultHandle) -> Result<(), BuildError> {
        if handle.batch != self.id {
            return Err(BuildError::ForeignHandle {
                index,
                batch: self.id,
                handle_batch: handle.batch,
            });
        }
        if usize::from(handle.index) >= index {
            return Err(BuildError::ForwardReference {
                index,
                referenced: handle.index,
            });
        }
        Ok(())
    }
}

/// 已附加 gas 预算的批次，只能整体提交，不再接受追加。
#[derive(Debug)]
pub struct SubmittableBatch {
    batch_id: u64,
    commands: Vec<Command>,
    gas_budget: u64,
}

impl SubmittableBatch {
    pub fn batch_id(&self) -> u64 {
        self.batch_id
    }

    pub fn gas_budget(&self) -> u64 {
        self.gas_budget
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn move_calls(&self) -> impl Iterator<Item = &CallDescriptor> {
        self.commands.iter().filter_map(Command::as_move_call)
    }

    /// 批次引用的全部链上对象，按首次出现顺序去重。
    pub fn object_ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = Vec::new();
        for arg in self.commands.iter().flat_map(Command::arguments) {
            if let Argument::Object { id, .. } = arg {
                if !ids.contains(id) {
                    ids.push(*id);
                }
            }
        }
        ids
    }
}
