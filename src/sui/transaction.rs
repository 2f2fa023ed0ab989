//! Sui `TransactionData` 的 BCS 线上结构，以及从 [`SubmittableBatch`] 的降级。
//!
//! 枚举变体顺序与链上定义一致，序列化时以变体下标作为标签，不可调整。

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use super::error::SubmitError;
use crate::ptb::{self, BuildError, Command, ObjectId, SubmittableBatch, TypeTag};

/// `(id, version, digest)`，digest 按 BCS 字节串（带长度前缀）编码。
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ObjectRef(pub ObjectId, pub u64, pub Vec<u8>);

impl ObjectRef {
    pub fn id(&self) -> ObjectId {
        self.0
    }
}

/// 节点返回的对象所有权，决定其在交易中的输入形态。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedObject {
    Owned(ObjectRef),
    Shared { initial_shared_version: u64 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum CallArg {
    Pure(Vec<u8>),
    Object(ObjectArg),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ObjectArg {
    ImmOrOwnedObject(ObjectRef),
    SharedObject {
        id: ObjectId,
        initial_shared_version: u64,
        mutable: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Argument {
    #[allow(dead_code)]
    GasCoin,
    Input(u16),
    Result(u16),
    #[allow(dead_code)]
    NestedResult(u16, u16),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProgrammableMoveCall {
    pub package: ObjectId,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<TypeTag>,
    pub arguments: Vec<Argument>,
}

// 只构造 MoveCall 与 MakeMoveVec，其余变体用于占位保持标签下标。
#[allow(dead_code)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum WireCommand {
    MoveCall(Box<ProgrammableMoveCall>),
    TransferObjects(Vec<Argument>, Argument),
    SplitCoins(Argument, Vec<Argument>),
    MergeCoins(Argument, Vec<Argument>),
    Publish(Vec<Vec<u8>>, Vec<ObjectId>),
    MakeMoveVec(Option<TypeTag>, Vec<Argument>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProgrammableTransaction {
    pub inputs: Vec<CallArg>,
    pub commands: Vec<WireCommand>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum TransactionKind {
    ProgrammableTransaction(ProgrammableTransaction),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GasData {
    pub payment: Vec<ObjectRef>,
    pub owner: ObjectId,
    pub price: u64,
    pub budget: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum TransactionExpiration {
    None,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionDataV1 {
    pub kind: TransactionKind,
    pub sender: ObjectId,
    pub gas_data: GasData,
    pub expiration: TransactionExpiration,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum TransactionData {
    V1(TransactionDataV1),
}

impl TransactionData {
    pub fn new(
        transaction: ProgrammableTransaction,
        sender: ObjectId,
        payment: Vec<ObjectRef>,
        price: u64,
        budget: u64,
    ) -> Self {
        TransactionData::V1(TransactionDataV1 {
            kind: TransactionKind::ProgrammableTransaction(transaction),
            sender,
            gas_data: GasData {
                payment,
                owner: sender,
                price,
                budget,
            },
            expiration: TransactionExpiration::None,
        })
    }

    pub fn to_bcs(&self) -> Result<Vec<u8>, SubmitError> {
        Ok(bcs::to_bytes(self)?)
    }
}

/// 将封存批次降级为线上 PTB：纯值按出现顺序各占一个输入，
/// 同一对象只占一个输入槽，共享对象的可变性取所有引用的并集。
pub fn lower(
    batch: &SubmittableBatch,
    objects: &HashMap<ObjectId, ResolvedObject>,
) -> Result<ProgrammableTransaction, SubmitError> {
    let mut lowering = Lowering {
        objects,
        inputs: Vec::new(),
        object_slots: HashMap::new(),
    };

    let mut commands = Vec::with_capacity(batch.commands().len());
    for command in batch.commands() {
        let lowered = match command {
            Command::MoveCall(call) => {
                let arguments = lowering.arguments(call.args())?;
                let target = call.target();
                WireCommand::MoveCall(Box::new(ProgrammableMoveCall {
                    package: target.package,
                    module: target.module.clone(),
                    function: target.function.clone(),
                    type_arguments: call.type_args().to_vec(),
                    arguments,
                }))
            }
            Command::MakeMoveVec(literal) => {
                let elements = lowering.arguments(&literal.elements)?;
                WireCommand::MakeMoveVec(Some(literal.element_type.clone()), elements)
            }
        };
        commands.push(lowered);
    }

    debug!(
        target: "sui::tx",
        batch = batch.batch_id(),
        inputs = lowering.inputs.len(),
        objects = lowering.object_slots.len(),
        commands = commands.len(),
        "PTB 已降级"
    );

    Ok(ProgrammableTransaction {
        inputs: lowering.inputs,
        commands,
    })
}

struct Lowering<'a> {
    objects: &'a HashMap<ObjectId, ResolvedObject>,
    inputs: Vec<CallArg>,
    object_slots: HashMap<ObjectId, u16>,
}

impl Lowering<'_> {
    fn arguments(&mut self, args: &[ptb::Argument]) -> Result<Vec<Argument>, SubmitError> {
        args.iter().map(|arg| self.argument(arg)).collect()
    }

    fn argument(&mut self, arg: &ptb::Argument) -> Result<Argument, SubmitError> {
        match arg {
            ptb::Argument::Pure(value) => {
                let slot = self.push_input(CallArg::Pure(value.to_bcs()?))?;
                Ok(Argument::Input(slot))
            }
            ptb::Argument::Object { id, access } => {
                let slot = self.object_input(*id, access.is_mutable())?;
                Ok(Argument::Input(slot))
            }
            ptb::Argument::Result(handle) => Ok(Argument::Result(handle.index())),
        }
    }

    fn object_input(&mut self, id: ObjectId, mutable: bool) -> Result<u16, SubmitError> {
        if let Some(&slot) = self.object_slots.get(&id) {
            if mutable {
                if let CallArg::Object(ObjectArg::SharedObject { mutable: current, .. }) =
                    &mut self.inputs[usize::from(slot)]
                {
                    *current = true;
                }
            }
            return Ok(slot);
        }

        let arg = match self.objects.get(&id) {
            Some(ResolvedObject::Owned(object_ref)) => {
                ObjectArg::ImmOrOwnedObject(object_ref.clone())
            }
            Some(ResolvedObject::Shared {
                initial_shared_version,
            }) => ObjectArg::SharedObject {
                id,
                initial_shared_version: *initial_shared_version,
                mutable,
            },
            None => return Err(SubmitError::ObjectNotFound(id)),
        };
        let slot = self.push_input(CallArg::Object(arg))?;
        self.object_slots.insert(id, slot);
        Ok(slot)
    }

    fn push_input(&mut self, input: CallArg) -> Result<u16, SubmitError> {
        let slot = u16::try_from(self.inputs.len()).map_err(|_| BuildError::TooManyInputs {
            limit: usize::from(u16::MAX),
        })?;
        self.inputs.push(input);
        Ok(slot)
    }
}
