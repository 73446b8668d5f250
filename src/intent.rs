//! Declarative intents.
//!
//! An [`Intent`] describes the desired state of exactly one device attribute.
//! It carries a `kind` tag and a JSON parameter object so the argument layer
//! can hand over anything it parsed, including kinds this crate does not know
//! about. Each built-in kind has a typed parameter struct implementing
//! [`IntentParams`]; renderers decode into those structs.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ReconcileError;

/// A typed description of desired state for one configurable attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Renderer registry key, e.g. `vlan` or `ntp_server`.
    pub kind: String,
    /// Kind-specific parameters.
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

/// Parameter struct bound to one intent kind.
pub trait IntentParams: Serialize + DeserializeOwned {
    /// Registry key of the kind.
    const KIND: &'static str;

    /// Wraps the parameters into an [`Intent`].
    fn into_intent(self) -> Result<Intent, ReconcileError> {
        Intent::new(Self::KIND, self)
    }
}

impl Intent {
    /// Builds an intent from any serializable parameter object.
    pub fn new(kind: impl Into<String>, params: impl Serialize) -> Result<Self, ReconcileError> {
        let kind = kind.into();
        match serde_json::to_value(params) {
            Ok(Value::Object(params)) => Ok(Self { kind, params }),
            Ok(other) => Err(ReconcileError::InvalidIntent {
                kind,
                reason: format!("parameters must be an object, got {other}"),
            }),
            Err(e) => Err(ReconcileError::InvalidIntent {
                kind,
                reason: e.to_string(),
            }),
        }
    }

    /// Decodes the parameters into the kind's typed struct.
    pub fn params<P: DeserializeOwned>(&self) -> Result<P, ReconcileError> {
        serde_json::from_value(Value::Object(self.params.clone())).map_err(|e| {
            ReconcileError::InvalidIntent {
                kind: self.kind.clone(),
                reason: e.to_string(),
            }
        })
    }
}

/// Desired presence of a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DesiredState {
    #[default]
    Present,
    Absent,
    /// Tolerate the line if it exists; never add or remove it.
    Keep,
}

/// Desired state of a literal config line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LineState {
    #[default]
    Present,
    Absent,
    /// Present, and every unclaimed sibling in the parent block is removed.
    Replace,
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdminState {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    Access,
    Trunk,
    Hybrid,
}

impl LinkType {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkType::Access => "access",
            LinkType::Trunk => "trunk",
            LinkType::Hybrid => "hybrid",
        }
    }
}

/// A VLAN, optionally with a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VlanParams {
    #[serde(alias = "vlan_id")]
    pub id: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub state: DesiredState,
}

impl IntentParams for VlanParams {
    const KIND: &'static str = "vlan";
}

/// Interface description; an empty or missing description removes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InterfaceDescriptionParams {
    pub interface: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl IntentParams for InterfaceDescriptionParams {
    const KIND: &'static str = "interface_description";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InterfaceAdminParams {
    pub interface: String,
    pub admin_state: AdminState,
}

impl IntentParams for InterfaceAdminParams {
    const KIND: &'static str = "interface_admin";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InterfaceSpeedParams {
    pub interface: String,
    pub speed: String,
    #[serde(default)]
    pub state: DesiredState,
}

impl IntentParams for InterfaceSpeedParams {
    const KIND: &'static str = "interface_speed";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InterfaceMtuParams {
    pub interface: String,
    pub mtu: u32,
    #[serde(default)]
    pub state: DesiredState,
}

impl IntentParams for InterfaceMtuParams {
    const KIND: &'static str = "interface_mtu";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PortLinkTypeParams {
    pub interface: String,
    pub link_type: LinkType,
    #[serde(default)]
    pub state: DesiredState,
}

impl IntentParams for PortLinkTypeParams {
    const KIND: &'static str = "port_link_type";
}

/// Access VLAN (PVID of an access port).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PortDefaultVlanParams {
    pub interface: String,
    pub vlan: u16,
    #[serde(default)]
    pub state: DesiredState,
}

impl IntentParams for PortDefaultVlanParams {
    const KIND: &'static str = "port_default_vlan";
}

/// VLAN list in VRP syntax, e.g. `10 20 to 30`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PortVlanListParams {
    pub interface: String,
    pub vlans: String,
    #[serde(default)]
    pub state: DesiredState,
}

/// Allowed VLANs of a trunk port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct PortTrunkVlansParams(pub PortVlanListParams);

impl IntentParams for PortTrunkVlansParams {
    const KIND: &'static str = "port_trunk_vlans";
}

/// Tagged VLANs of a hybrid port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct PortHybridTaggedVlansParams(pub PortVlanListParams);

impl IntentParams for PortHybridTaggedVlansParams {
    const KIND: &'static str = "port_hybrid_tagged_vlans";
}

/// Native VLAN of a trunk port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PortTrunkPvidParams {
    pub interface: String,
    pub vlan: u16,
    #[serde(default)]
    pub state: DesiredState,
}

impl IntentParams for PortTrunkPvidParams {
    const KIND: &'static str = "port_trunk_pvid";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StpEdgedPortParams {
    pub interface: String,
    pub enabled: bool,
}

impl IntentParams for StpEdgedPortParams {
    const KIND: &'static str = "stp_edged_port";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NtpServerParams {
    pub address: String,
    #[serde(default)]
    pub state: DesiredState,
}

impl IntentParams for NtpServerParams {
    const KIND: &'static str = "ntp_server";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NtpSourceInterfaceParams {
    pub interface: String,
    #[serde(default)]
    pub state: DesiredState,
}

impl IntentParams for NtpSourceInterfaceParams {
    const KIND: &'static str = "ntp_source_interface";
}

/// The device's built-in NTP server for one address family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NtpServiceDisableParams {
    #[serde(default)]
    pub ipv6: bool,
    pub disabled: bool,
}

impl IntentParams for NtpServiceDisableParams {
    const KIND: &'static str = "ntp_service_disable";
}

/// Timezone as a signed offset from UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClockTimezoneParams {
    pub name: String,
    pub offset_hours: i8,
    #[serde(default)]
    pub offset_minutes: u8,
    #[serde(default)]
    pub state: DesiredState,
}

impl IntentParams for ClockTimezoneParams {
    const KIND: &'static str = "clock_timezone";
}

/// One-year daylight saving window; times are `HH:MM YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClockDstParams {
    pub name: String,
    pub start: String,
    pub end: String,
    pub offset: String,
    #[serde(default)]
    pub state: DesiredState,
}

impl IntentParams for ClockDstParams {
    const KIND: &'static str = "clock_dst";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DomainNameParams {
    pub domain: String,
    #[serde(default)]
    pub state: DesiredState,
}

impl IntentParams for DomainNameParams {
    const KIND: &'static str = "domain_name";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DnsServerParams {
    pub address: String,
    #[serde(default)]
    pub ipv6: bool,
    #[serde(default)]
    pub state: DesiredState,
}

impl IntentParams for DnsServerParams {
    const KIND: &'static str = "dns_server";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StpBpduProtectionParams {
    pub enabled: bool,
}

impl IntentParams for StpBpduProtectionParams {
    const KIND: &'static str = "stp_bpdu_protection";
}

/// One attribute of a local AAA user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserAttribute {
    /// Stored with `irreversible-cipher`.
    Password(String),
    PrivilegeLevel(u8),
    ServiceType(String),
}

/// A local user under `aaa`; without an attribute the intent addresses the
/// whole account, which is only meaningful for removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LocalUserParams {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<UserAttribute>,
    #[serde(default)]
    pub state: DesiredState,
}

impl IntentParams for LocalUserParams {
    const KIND: &'static str = "local_user";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SshUserSetting {
    AuthenticationType(String),
    AssignRsaKey(String),
    ServiceType(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SshUserParams {
    pub name: String,
    pub setting: SshUserSetting,
    #[serde(default)]
    pub state: DesiredState,
}

impl IntentParams for SshUserParams {
    const KIND: &'static str = "ssh_user";
}

/// A literal config line below an optional parent path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConfigLineParams {
    #[serde(default)]
    pub parents: Vec<String>,
    pub line: String,
    #[serde(default)]
    pub state: LineState,
}

impl IntentParams for ConfigLineParams {
    const KIND: &'static str = "config_line";
}
