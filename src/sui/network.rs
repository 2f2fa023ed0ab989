use std::fmt;
use std::str::FromStr;

use url::{Host, Url};

pub const MAINNET_FULLNODE: &str = "https://fullnode.mainnet.sui.io:443";
pub const TESTNET_FULLNODE: &str = "https://fullnode.testnet.sui.io:443";
pub const DEVNET_FULLNODE: &str = "https://fullnode.devnet.sui.io:443";
pub const LOCALNET_FULLNODE: &str = "http://127.0.0.1:9000";

pub const TESTNET_FAUCET: &str = "https://faucet.testnet.sui.io";
pub const DEVNET_FAUCET: &str = "https://faucet.devnet.sui.io";
pub const LOCALNET_FAUCET: &str = "http://127.0.0.1:9123";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
    Localnet,
    Custom(Url),
}

impl Network {
    pub fn fullnode_url(&self) -> &str {
        match self {
            Network::Mainnet => MAINNET_FULLNODE,
            Network::Testnet => TESTNET_FULLNODE,
            Network::Devnet => DEVNET_FULLNODE,
            Network::Localnet => LOCALNET_FULLNODE,
            Network::Custom(url) => url.as_str(),
        }
    }

    /// mainnet 与自定义节点没有 faucet。
    pub fn faucet_url(&self) -> Option<&'static str> {
        match self {
            Network::Testnet => Some(TESTNET_FAUCET),
            Network::Devnet => Some(DEVNET_FAUCET),
            Network::Localnet => Some(LOCALNET_FAUCET),
            Network::Mainnet | Network::Custom(_) => None,
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        match value.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "devnet" => Ok(Network::Devnet),
            "localnet" | "local" => Ok(Network::Localnet),
            _ => {
                let url = Url::parse(value)
                    .map_err(|err| format!("无法识别的网络 `{value}`: {err}"))?;
                match url.scheme() {
                    "http" | "https" if is_local_fullnode(&url) => Ok(Network::Localnet),
                    "http" | "https" => Ok(Network::Custom(url)),
                    scheme => Err(format!("全节点 URL 仅支持 http/https，实际为 {scheme}")),
                }
            }
        }
    }
}

/// 本机 9000 端口即 `sui start` 的本地全节点。
fn is_local_fullnode(url: &Url) -> bool {
    let loopback = match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    };
    loopback && url.port_or_known_default() == Some(9000)
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => f.write_str("mainnet"),
            Network::Testnet => f.write_str("testnet"),
            Network::Devnet => f.write_str("devnet"),
            Network::Localnet => f.write_str("localnet"),
            Network::Custom(url) => write!(f, "{url}"),
        }
    }
}
