//! 部署状态文件（`state.json`）的强类型表示，以及从中提取 offramp 调用目标。

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::ConfigError;
use crate::ptb::ObjectId;
use crate::sui::network::LOCALNET_FULLNODE;

pub const DEFAULT_STATE_PATH: &str = "state.json";

pub const ENV_CCIP_PACKAGE_ID: &str = "CCIP_PACKAGE_ID";
pub const ENV_OFFRAMP_PACKAGE_ID: &str = "OFFRAMP_PACKAGE_ID";
pub const ENV_RECEIVER_PACKAGE_ID: &str = "RECEIVER_PACKAGE_ID";
pub const ENV_CCIP_OBJECT_REF: &str = "CCIP_OBJECT_REF";
pub const ENV_OFFRAMP_STATE: &str = "OFFRAMP_STATE";
pub const ENV_SUI_URL: &str = "SUI_URL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeploymentState {
    #[serde(default)]
    pub network_url: Option<String>,
    #[serde(default)]
    pub chain_selectors: ChainSelectors,
    #[serde(default)]
    pub ccip_package_id: Option<String>,
    #[serde(default)]
    pub offramp_package_id: Option<String>,
    #[serde(default)]
    pub dummy_receiver_package_id: Option<String>,
    #[serde(default)]
    pub mock_link_package_id: Option<String>,
    #[serde(default)]
    pub mcms_package_id: Option<String>,
    #[serde(default)]
    pub ccip_object_ref_object_id: Option<String>,
    #[serde(default)]
    pub offramp_state_object_id: Option<String>,
    #[serde(default)]
    pub offramp_owner_cap_id: Option<String>,
    #[serde(default)]
    pub ccip_objects: CcipObjects,
    #[serde(default)]
    pub dummy_receiver_objects: DummyReceiverObjects,
    #[serde(default)]
    pub mock_link_objects: MockLinkObjects,
    #[serde(default)]
    pub signer_address: Option<String>,
    #[serde(default)]
    pub public_keys: Vec<String>,
    #[serde(default)]
    pub signer_addresses: Vec<String>,
    #[serde(default)]
    pub deployed_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainSelectors {
    #[serde(default)]
    pub sui_chain_selector: Option<u64>,
    #[serde(default)]
    pub ethereum_chain_selector: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CcipObjects {
    #[serde(default)]
    pub owner_cap_object_id: Option<String>,
    #[serde(default)]
    pub fee_quoter_cap_object_id: Option<String>,
    #[serde(default)]
    pub fee_quoter_state_object_id: Option<String>,
    #[serde(default)]
    pub nonce_manager_state_object_id: Option<String>,
    #[serde(default)]
    pub nonce_manager_cap_object_id: Option<String>,
    #[serde(default)]
    pub receiver_registry_state_object_id: Option<String>,
    #[serde(default)]
    pub rmn_remote_state_object_id: Option<String>,
    #[serde(default)]
    pub token_admin_registry_state_object_id: Option<String>,
    #[serde(default)]
    pub source_transfer_cap_object_id: Option<String>,
    #[serde(default)]
    pub dest_transfer_cap_object_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DummyReceiverObjects {
    #[serde(default)]
    pub owner_cap_object_id: Option<String>,
    #[serde(default)]
    pub ccip_receiver_state_object_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MockLinkObjects {
    #[serde(default)]
    pub coin_metadata_object_id: Option<String>,
    #[serde(default)]
    pub treasury_cap_object_id: Option<String>,
}

pub fn load_deployment_state(path: &Path) -> Result<DeploymentState, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let state: DeploymentState =
        serde_json::from_str(&contents).map_err(|source| ConfigError::State {
            path: path.to_path_buf(),
            source,
        })?;
    info!(
        target: "config",
        path = %path.display(),
        deployed_at = state.deployed_at.as_deref().unwrap_or("<unknown>"),
        network_url = state.network_url.as_deref().unwrap_or("<unset>"),
        "已加载部署状态"
    );
    Ok(state)
}

/// offramp 完成流程所需的包与对象 ID，加载时即完成校验。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfframpTargets {
    pub ccip_package: ObjectId,
    pub offramp_package: ObjectId,
    pub receiver_package: Option<ObjectId>,
    pub ccip_object_ref: ObjectId,
    pub offramp_state: ObjectId,
    pub network_url: Option<String>,
}

impl OfframpTargets {
    pub fn from_state(state: &DeploymentState) -> Result<Self, ConfigError> {
        Ok(Self {
            ccip_package: required_id("ccip_package_id", state.ccip_package_id.as_deref())?,
            offramp_package: required_id(
                "offramp_package_id",
                state.offramp_package_id.as_deref(),
            )?,
            receiver_package: optional_id(
                "dummy_receiver_package_id",
                state.dummy_receiver_package_id.as_deref(),
            )?,
            ccip_object_ref: required_id(
                "ccip_object_ref_object_id",
                state.ccip_object_ref_object_id.as_deref(),
            )?,
            offramp_state: required_id(
                "offramp_state_object_id",
                state.offramp_state_object_id.as_deref(),
            )?,
            network_url: non_empty(state.network_url.as_deref()).map(str::to_string),
        })
    }

    /// 从环境变量读取；`lookup` 便于测试时替换真实环境。
    /// 未设置 `SUI_URL` 时指向本地全节点。
    pub fn from_env<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ccip_package = lookup(ENV_CCIP_PACKAGE_ID);
        let offramp_package = lookup(ENV_OFFRAMP_PACKAGE_ID);
        let receiver_package = lookup(ENV_RECEIVER_PACKAGE_ID);
        let ccip_object_ref = lookup(ENV_CCIP_OBJECT_REF);
        let offramp_state = lookup(ENV_OFFRAMP_STATE);
        let network_url = lookup(ENV_SUI_URL);

        Ok(Self {
            ccip_package: required_id(ENV_CCIP_PACKAGE_ID, ccip_package.as_deref())?,
            offramp_package: required_id(ENV_OFFRAMP_PACKAGE_ID, offramp_package.as_deref())?,
            receiver_package: optional_id(ENV_RECEIVER_PACKAGE_ID, receiver_package.as_deref())?,
            ccip_object_ref: required_id(ENV_CCIP_OBJECT_REF, ccip_object_ref.as_deref())?,
            offramp_state: required_id(ENV_OFFRAMP_STATE, offramp_state.as_deref())?,
            network_url: Some(
                non_empty(network_url.as_deref())
                    .unwrap_or(LOCALNET_FULLNODE)
                    .to_string(),
            ),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn required_id(field: &'static str, value: Option<&str>) -> Result<ObjectId, ConfigError> {
    optional_id(field, value)?.ok_or(ConfigError::MissingField(field))
}

fn optional_id(field: &'static str, value: Option<&str>) -> Result<Option<ObjectId>, ConfigError> {
    non_empty(value)
        .map(|raw| {
            ObjectId::from_hex(raw).map_err(|reason| ConfigError::InvalidValue { field, reason })
        })
        .transpose()
}
