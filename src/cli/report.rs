use crate::ptb::{Argument, Command, PureValue, SubmittableBatch};
use crate::sui::{ExecutionReceipt, ExecutionStatus};

pub const EXPECTED_RECEIVER_PAYLOAD: &str = "Hello World";

pub fn describe_argument(arg: &Argument) -> String {
    match arg {
        Argument::Pure(PureValue::Bool(value)) => format!("bool({value})"),
        Argument::Pure(PureValue::U64(value)) => format!("u64({value})"),
        Argument::Pure(PureValue::Address(value)) => format!("address({value})"),
        Argument::Pure(PureValue::Bytes(bytes)) => format!("bytes(0x{})", hex::encode(bytes)),
        Argument::Object { id, access } if access.is_mutable() => format!("&mut {id}"),
        Argument::Object { id, .. } => format!("&{id}"),
        Argument::Result(handle) => format!("Result({})", handle.index()),
    }
}

pub fn render_batch(batch: &SubmittableBatch) -> Vec<String> {
    let mut lines = vec![format!(
        "batch #{} · {} 条命令 · gas 预算 {} MIST",
        batch.batch_id(),
        batch.commands().len(),
        batch.gas_budget()
    )];
    for (index, command) in batch.commands().iter().enumerate() {
        let header = match command {
            Command::MoveCall(call) => {
                let type_args = call
                    .type_args()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>();
                if type_args.is_empty() {
                    format!("[{index}] {}", call.target())
                } else {
                    format!("[{index}] {}<{}>", call.target(), type_args.join(", "))
                }
            }
            Command::MakeMoveVec(literal) => {
                format!("[{index}] make_move_vec<{}>", literal.element_type)
            }
        };
        lines.push(header);
        for arg in command.arguments() {
            lines.push(format!("      {}", describe_argument(arg)));
        }
    }
    lines
}

pub fn print_batch(batch: &SubmittableBatch) {
    for line in render_batch(batch) {
        println!("{line}");
    }
}

pub fn render_receipt(receipt: &ExecutionReceipt) -> Vec<String> {
    let mut lines = Vec::new();
    match &receipt.status {
        ExecutionStatus::Success => lines.push(format!("✅ 交易成功: {}", receipt.digest)),
        ExecutionStatus::Failure(message) => {
            lines.push(format!("❌ 交易失败: {} ({message})", receipt.digest))
        }
    }
    lines.push(format!(
        "gas: computation={} storage={} rebate={} non_refundable={} net={}",
        receipt.gas.computation_cost,
        receipt.gas.storage_cost,
        receipt.gas.storage_rebate,
        receipt.gas.non_refundable_storage_fee,
        receipt.gas.net_cost()
    ));

    if receipt.events.is_empty() {
        lines.push("⚠️  交易未产生事件".to_string());
        return lines;
    }
    lines.push(format!("共 {} 个事件", receipt.events.len()));
    for (index, event) in receipt.events.iter().enumerate() {
        lines.push(format!("事件 {index}: {}", event.event_type));
        lines.push(format!("  sender: {}", event.sender));
        lines.push(format!("  package: {}::{}", event.package_id, event.module));
        lines.push(format!("  parsed_json: {}", event.parsed_json));
        if let Some(decoded) = event.decoded_data() {
            lines.push(format!("  decoded data: {decoded}"));
            if decoded == EXPECTED_RECEIVER_PAYLOAD {
                lines.push(format!("  ✅ 收到预期消息 \"{EXPECTED_RECEIVER_PAYLOAD}\""));
            }
        }
    }
    lines
}

pub fn print_receipt(receipt: &ExecutionReceipt) {
    for line in render_receipt(receipt) {
        println!("{line}");
    }
}
