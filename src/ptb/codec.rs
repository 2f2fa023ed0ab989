use base64::{Engine as _, engine::general_purpose};

use super::error::EncodingError;
use super::types::ObjectId;

fn strip_hex_prefix(input: &str) -> Option<&str> {
    input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
}

/// 解析 u64 标量，接受十进制或 `0x` 前缀的十六进制。
pub fn parse_u64(parameter: &str, input: &str) -> Result<u64, EncodingError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(EncodingError::new(parameter, input, "数值为空"));
    }

    match strip_hex_prefix(trimmed) {
        Some(digits) => {
            if digits.is_empty() {
                return Err(EncodingError::new(parameter, input, "`0x` 之后缺少十六进制数字"));
            }
            if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(EncodingError::new(parameter, input, "包含非十六进制字符"));
            }
            u64::from_str_radix(digits, 16)
                .map_err(|err| EncodingError::new(parameter, input, format!("十六进制解析失败: {err}")))
        }
        None if !trimmed.bytes().all(|b| b.is_ascii_digit()) => {
            Err(EncodingError::new(parameter, input, "包含非十进制字符"))
        }
        None => trimmed
            .parse::<u64>()
            .map_err(|err| EncodingError::new(parameter, input, format!("十进制解析失败: {err}"))),
    }
}

/// 解析 `vector<u8>` 参数：`0x` 十六进制或标准 base64，空串得到空字节序列。
pub fn parse_bytes(parameter: &str, input: &str) -> Result<Vec<u8>, EncodingError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    match strip_hex_prefix(trimmed) {
        Some(digits) => hex::decode(digits)
            .map_err(|err| EncodingError::new(parameter, input, format!("十六进制解码失败: {err}"))),
        None => general_purpose::STANDARD
            .decode(trimmed)
            .map_err(|err| EncodingError::new(parameter, input, format!("base64 解码失败: {err}"))),
    }
}

/// 可选字节参数：缺省等价于空串。
pub fn parse_optional_bytes(
    parameter: &str,
    input: Option<&str>,
) -> Result<Vec<u8>, EncodingError> {
    parse_bytes(parameter, input.unwrap_or_default())
}

pub fn parse_object_id(parameter: &str, input: &str) -> Result<ObjectId, EncodingError> {
    ObjectId::from_hex(input).map_err(|reason| EncodingError::new(parameter, input, reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_and_hex_selectors_agree() {
        for value in [0u64, 2, 5_009_297_550_715_157_269, 16_015_286_601_757_825_753, u64::MAX] {
            let decimal = parse_u64("dest_chain_selector", &value.to_string()).expect("decimal");
            let hex = parse_u64("dest_chain_selector", &format!("0x{value:x}")).expect("hex");
            assert_eq!(decimal, value);
            assert_eq!(hex, value);
        }
        assert_eq!(parse_u64("n", " 0XFF ").unwrap(), 255);
    }

    #[test]
    fn malformed_scalars_name_the_parameter() {
        for raw in [
            "",
            "0x",
            "12a",
            "-1",
            "+5",
            "0xnothex",
            "0x+ff",
            "0x-1",
            "18446744073709551616",
        ] {
            let err = parse_u64("dest_chain_selector", raw).expect_err(raw);
            assert_eq!(err.parameter, "dest_chain_selector");
            assert_eq!(err.value, raw);
        }
    }

    #[test]
    fn hex_and_base64_bytes_agree() {
        let payload = b"Hello World";
        let from_hex = parse_bytes("data", &format!("0x{}", hex::encode(payload))).expect("hex");
        let from_b64 =
            parse_bytes("data", &general_purpose::STANDARD.encode(payload)).expect("base64");
        assert_eq!(from_hex, payload.to_vec());
        assert_eq!(from_b64, payload.to_vec());
    }

    #[test]
    fn empty_inputs_yield_empty_bytes() {
        assert!(parse_bytes("data", "").unwrap().is_empty());
        assert!(parse_bytes("data", "   ").unwrap().is_empty());
        assert!(parse_bytes("data", "0x").unwrap().is_empty());
        assert!(parse_optional_bytes("extra_args", None).unwrap().is_empty());
    }

    #[test]
    fn malformed_bytes_are_rejected() {
        let err = parse_bytes("receiver", "0xabc").expect_err("odd hex length");
        assert_eq!(err.parameter, "receiver");
        assert!(parse_bytes("receiver", "not base64!").is_err());
    }

    #[test]
    fn object_ids_report_parameter_on_failure() {
        let err = parse_object_id("onramp_state", "0xghij").expect_err("invalid id");
        assert_eq!(err.parameter, "onramp_state");
        assert_eq!(
            parse_object_id("clock", "0x6").unwrap(),
            ObjectId::CLOCK
        );
    }
}
