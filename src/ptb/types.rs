use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::BuildError;

pub const ADDRESS_LENGTH: usize = 32;

/// Sui 地址 / 对象 ID，统一按 32 字节定长存储。
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub [u8; ADDRESS_LENGTH]);

impl ObjectId {
    /// `0x2`，Sui framework 包。
    pub const SUI_FRAMEWORK: ObjectId = ObjectId::from_low_u16(0x2);
    /// `0x6`，共享时钟对象。
    pub const CLOCK: ObjectId = ObjectId::from_low_u16(0x6);
    /// `0x403`，coin deny list 共享对象。
    pub const DENY_LIST: ObjectId = ObjectId::from_low_u16(0x403);

    pub const fn from_low_u16(value: u16) -> Self {
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes[ADDRESS_LENGTH - 2] = (value >> 8) as u8;
        bytes[ADDRESS_LENGTH - 1] = (value & 0xff) as u8;
        ObjectId(bytes)
    }

    /// 解析十六进制地址，允许省略 `0x` 与前导零（如 `0x2`）。
    pub fn from_hex(input: &str) -> Result<Self, String> {
        let trimmed = input.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.is_empty() {
            return Err("地址为空".to_string());
        }
        if digits.len() > ADDRESS_LENGTH * 2 {
            return Err(format!(
                "地址长度超过 {} 个十六进制字符",
                ADDRESS_LENGTH * 2
            ));
        }
        let padded = format!("{digits:0>width$}", width = ADDRESS_LENGTH * 2);
        let decoded = hex::decode(&padded).map_err(|err| format!("十六进制解码失败: {err}"))?;
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&decoded);
        Ok(ObjectId(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    pub fn to_hex_literal(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for ObjectId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_literal())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex_literal())
    }
}

/// Move 调用目标 `package::module::function`。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MoveTarget {
    pub package: ObjectId,
    pub module: String,
    pub function: String,
}

impl MoveTarget {
    pub fn new(
        package: ObjectId,
        module: impl Into<String>,
        function: impl Into<String>,
    ) -> Result<Self, BuildError> {
        let module = module.into();
        let function = function.into();
        for ident in [&module, &function] {
            if !is_identifier(ident) {
                return Err(BuildError::InvalidTarget {
                    target: format!("{package}::{module}::{function}"),
                    reason: format!("`{ident}` 不是合法的 Move 标识符"),
                });
            }
        }
        Ok(Self {
            package,
            module,
            function,
        })
    }

    pub fn parse(input: &str) -> Result<Self, BuildError> {
        let parts: Vec<&str> = input.trim().split("::").collect();
        let [package, module, function] = parts.as_slice() else {
            return Err(BuildError::InvalidTarget {
                target: input.to_string(),
                reason: "格式需为 package::module::function".to_string(),
            });
        };
        let package = ObjectId::from_hex(package).map_err(|reason| BuildError::InvalidTarget {
            target: input.to_string(),
            reason,
        })?;
        Self::new(package, *module, *function)
    }
}

impl fmt::Display for MoveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.package, self.module, self.function)
    }
}

// 变体顺序与链上 BCS 枚举保持一致，不可调整。
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Bool,
    U8,
    U64,
    U128,
    Address,
    Signer,
    Vector(Box<TypeTag>),
    Struct(Box<StructTag>),
    U16,
    U32,
    U256,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructTag {
    pub address: ObjectId,
    pub module: String,
    pub name: String,
    pub type_params: Vec<TypeTag>,
}

impl TypeTag {
    pub fn parse(input: &str) -> Result<Self, BuildError> {
        let mut parser = TypeTagParser::new(input);
        let tag = parser.parse_tag()?;
        parser.skip_whitespace();
        if !parser.is_done() {
            return Err(parser.error("类型之后存在多余字符"));
        }
        Ok(tag)
    }

    pub fn struct_of(
        address: ObjectId,
        module: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        TypeTag::Struct(Box::new(StructTag {
            address,
            module: module.into(),
            name: name.into(),
            type_params: Vec::new(),
        }))
    }
}

impl FromStr for TypeTag {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Bool => f.write_str("bool"),
            TypeTag::U8 => f.write_str("u8"),
            TypeTag::U16 => f.write_str("u16"),
            TypeTag::U32 => f.write_str("u32"),
            TypeTag::U64 => f.write_str("u64"),
            TypeTag::U128 => f.write_str("u128"),
            TypeTag::U256 => f.write_str("u256"),
            TypeTag::Address => f.write_str("address"),
            TypeTag::Signer => f.write_str("signer"),
            TypeTag::Vector(inner) => write!(f, "vector<{inner}>"),
            TypeTag::Struct(tag) => write!(f, "{tag}"),
        }
    }
}

impl fmt::Display for StructTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.address, self.module, self.name)?;
        if !self.type_params.is_empty() {
            f.write_str("<")?;
            for (idx, param) in self.type_params.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{param}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

fn is_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

struct TypeTagParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> TypeTagParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn error(&self, reason: &str) -> BuildError {
        BuildError::InvalidTypeTag {
            input: self.input.to_string(),
            reason: format!("{reason}（位置 {}）", self.pos),
        }
    }

    fn is_done(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), BuildError> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += c.len_utf8();
                Ok(())
            }
            _ => Err(self.error(&format!("期望字符 `{expected}`"))),
        }
    }

    fn token(&mut self) -> &'a str {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == '<' || c == '>' || c == ',' || c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.input[start..self.pos]
    }

    fn parse_tag(&mut self) -> Result<TypeTag, BuildError> {
        let token = self.token();
        let tag = match token {
            "" => return Err(self.error("缺少类型")),
            "bool" => TypeTag::Bool,
            "u8" => TypeTag::U8,
            "u16" => TypeTag::U16,
            "u32" => TypeTag::U32,
            "u64" => TypeTag::U64,
            "u128" => TypeTag::U128,
            "u256" => TypeTag::U256,
            "address" => TypeTag::Address,
            "signer" => TypeTag::Signer,
            "vector" => {
                self.expect('<')?;
                let inner = self.parse_tag()?;
                self.expect('>')?;
                TypeTag::Vector(Box::new(inner))
            }
            path => {
                let parts: Vec<&str> = path.split("::").collect();
                let [address, module, name] = parts.as_slice() else {
                    return Err(self.error("结构体类型需为 address::module::Name"));
                };
                let address = ObjectId::from_hex(address).map_err(|reason| self.error(&reason))?;
                if !is_identifier(module) || !is_identifier(name) {
                    return Err(self.error("模块或结构体名称非法"));
                }
                let type_params = self.parse_type_params()?;
                TypeTag::Struct(Box::new(StructTag {
                    address,
                    module: (*module).to_string(),
                    name: (*name).to_string(),
                    type_params,
                }))
            }
        };
        Ok(tag)
    }

    fn parse_type_params(&mut self) -> Result<Vec<TypeTag>, BuildError> {
        self.skip_whitespace();
        if self.peek() != Some('<') {
            return Ok(Vec::new());
        }
        self.expect('<')?;
        let mut params = vec![self.parse_tag()?];
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                    params.push(self.parse_tag()?);
                }
                Some('>') => {
                    self.pos += 1;
                    return Ok(params);
                }
                _ => return Err(self.error("泛型参数列表未闭合")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_addresses_are_left_padded() {
        let id = ObjectId::from_hex("0x6").expect("parse clock");
        assert_eq!(id, ObjectId::CLOCK);
        assert_eq!(
            id.to_string(),
            "0x0000000000000000000000000000000000000000000000000000000000000006"
        );
        assert_eq!(ObjectId::from_hex("403").unwrap(), ObjectId::DENY_LIST);
    }

    #[test]
    fn rejects_overlong_or_non_hex_addresses() {
        assert!(ObjectId::from_hex(&format!("0x{}", "1".repeat(65))).is_err());
        assert!(ObjectId::from_hex("0xzz").is_err());
        assert!(ObjectId::from_hex("0x").is_err());
    }

    #[test]
    fn parses_coin_type_and_nested_generics() {
        let sui = TypeTag::parse("0x2::sui::SUI").expect("parse SUI");
        assert_eq!(sui, TypeTag::struct_of(ObjectId::SUI_FRAMEWORK, "sui", "SUI"));

        let coin = TypeTag::parse("0x2::coin::Coin<0x2::sui::SUI>").expect("parse coin");
        let TypeTag::Struct(tag) = &coin else {
            panic!("expected struct tag");
        };
        assert_eq!(tag.name, "Coin");
        assert_eq!(tag.type_params, vec![sui]);

        let nested = TypeTag::parse("vector< 0x1::option::Option<u64> >").expect("parse nested");
        assert!(matches!(nested, TypeTag::Vector(_)));
    }

    #[test]
    fn rejects_malformed_type_tags() {
        for raw in ["", "0x2::sui", "vector<u8", "0x2::coin::Coin<u8,>", "u64 u8"] {
            assert!(
                matches!(TypeTag::parse(raw), Err(BuildError::InvalidTypeTag { .. })),
                "`{raw}` should be rejected"
            );
        }
    }

    #[test]
    fn move_target_round_trips_through_display() {
        let target = MoveTarget::parse("0xabc::offramp::finish_execute").expect("parse target");
        assert_eq!(target.module, "offramp");
        assert_eq!(target.function, "finish_execute");
        assert_eq!(MoveTarget::parse(&target.to_string()).unwrap(), target);
        assert!(MoveTarget::parse("0xabc::offramp").is_err());
        assert!(MoveTarget::parse("0xabc::off-ramp::run").is_err());
    }
}
