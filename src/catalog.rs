//! Built-in intent kinds.
//!
//! Each kind maps one VRP device attribute to a renderer. The catalog also
//! exposes metadata and JSON schemas of the parameter structs so the argument
//! layer can validate its input before building intents.

use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;
use crate::intent::{
    AdminState, ClockDstParams, ClockTimezoneParams, ConfigLineParams, DesiredState,
    DnsServerParams, DomainNameParams, Intent, IntentParams, InterfaceAdminParams,
    InterfaceDescriptionParams, InterfaceMtuParams, InterfaceSpeedParams, LineState,
    LocalUserParams, NtpServerParams, NtpServiceDisableParams, NtpSourceInterfaceParams,
    PortDefaultVlanParams, PortHybridTaggedVlansParams, PortLinkTypeParams, PortTrunkPvidParams,
    PortTrunkVlansParams, SshUserParams, SshUserSetting, StpBpduProtectionParams,
    StpEdgedPortParams, UserAttribute, VlanParams,
};
use crate::render::{PairDraft, RenderFn};

/// Parent line of the AAA view.
const AAA_VIEW: &str = "aaa";

/// Names of all built-in kinds.
pub const BUILTIN_KINDS: &[&str] = &[
    VlanParams::KIND,
    InterfaceDescriptionParams::KIND,
    InterfaceAdminParams::KIND,
    InterfaceSpeedParams::KIND,
    InterfaceMtuParams::KIND,
    PortLinkTypeParams::KIND,
    PortDefaultVlanParams::KIND,
    PortTrunkVlansParams::KIND,
    PortHybridTaggedVlansParams::KIND,
    PortTrunkPvidParams::KIND,
    StpEdgedPortParams::KIND,
    NtpServerParams::KIND,
    NtpSourceInterfaceParams::KIND,
    NtpServiceDisableParams::KIND,
    ClockTimezoneParams::KIND,
    ClockDstParams::KIND,
    DomainNameParams::KIND,
    DnsServerParams::KIND,
    StpBpduProtectionParams::KIND,
    LocalUserParams::KIND,
    SshUserParams::KIND,
    ConfigLineParams::KIND,
];

/// View a kind's commands are issued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum KindScope {
    System,
    Vlan,
    Interface,
    Aaa,
    /// Caller-supplied parent path.
    Custom,
}

/// Metadata for a built-in kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct KindMetadata {
    pub kind: String,
    pub scope: KindScope,
    pub summary: String,
}

fn metadata_for(kind: &str) -> Option<KindMetadata> {
    let (scope, summary) = match kind {
        "vlan" => (KindScope::Vlan, "VLAN existence and name"),
        "interface_description" => (KindScope::Interface, "interface description"),
        "interface_admin" => (KindScope::Interface, "interface administrative state"),
        "interface_speed" => (KindScope::Interface, "fixed interface speed"),
        "interface_mtu" => (KindScope::Interface, "interface MTU"),
        "port_link_type" => (KindScope::Interface, "layer-2 port link type"),
        "port_default_vlan" => (KindScope::Interface, "access port VLAN"),
        "port_trunk_vlans" => (KindScope::Interface, "trunk allowed VLANs"),
        "port_hybrid_tagged_vlans" => (KindScope::Interface, "hybrid tagged VLANs"),
        "port_trunk_pvid" => (KindScope::Interface, "trunk native VLAN"),
        "stp_edged_port" => (KindScope::Interface, "STP edge port"),
        "ntp_server" => (KindScope::System, "NTP unicast server"),
        "ntp_source_interface" => (KindScope::System, "NTP source interface"),
        "ntp_service_disable" => (KindScope::System, "built-in NTP server"),
        "clock_timezone" => (KindScope::System, "clock timezone"),
        "clock_dst" => (KindScope::System, "daylight saving time"),
        "domain_name" => (KindScope::System, "DNS domain name"),
        "dns_server" => (KindScope::System, "DNS server"),
        "stp_bpdu_protection" => (KindScope::System, "global BPDU protection"),
        "local_user" => (KindScope::Aaa, "local AAA user"),
        "ssh_user" => (KindScope::System, "SSH user binding"),
        "config_line" => (KindScope::Custom, "literal config line"),
        _ => return None,
    };
    Some(KindMetadata {
        kind: kind.to_string(),
        scope,
        summary: summary.to_string(),
    })
}

/// Returns names of all built-in kinds.
pub fn available_kinds() -> &'static [&'static str] {
    BUILTIN_KINDS
}

/// Returns metadata for all built-in kinds.
pub fn kind_catalog() -> Vec<KindMetadata> {
    BUILTIN_KINDS
        .iter()
        .filter_map(|kind| metadata_for(kind))
        .collect()
}

/// Returns metadata for one kind.
pub fn kind_metadata(kind: &str) -> Result<KindMetadata, ReconcileError> {
    metadata_for(kind).ok_or_else(|| ReconcileError::UnsupportedIntent {
        kind: kind.to_string(),
    })
}

/// JSON schema of a kind's parameters.
pub fn kind_schema(kind: &str) -> Result<serde_json::Value, ReconcileError> {
    let schema = match kind {
        "vlan" => schema_for!(VlanParams),
        "interface_description" => schema_for!(InterfaceDescriptionParams),
        "interface_admin" => schema_for!(InterfaceAdminParams),
        "interface_speed" => schema_for!(InterfaceSpeedParams),
        "interface_mtu" => schema_for!(InterfaceMtuParams),
        "port_link_type" => schema_for!(PortLinkTypeParams),
        "port_default_vlan" => schema_for!(PortDefaultVlanParams),
        "port_trunk_vlans" => schema_for!(PortTrunkVlansParams),
        "port_hybrid_tagged_vlans" => schema_for!(PortHybridTaggedVlansParams),
        "port_trunk_pvid" => schema_for!(PortTrunkPvidParams),
        "stp_edged_port" => schema_for!(StpEdgedPortParams),
        "ntp_server" => schema_for!(NtpServerParams),
        "ntp_source_interface" => schema_for!(NtpSourceInterfaceParams),
        "ntp_service_disable" => schema_for!(NtpServiceDisableParams),
        "clock_timezone" => schema_for!(ClockTimezoneParams),
        "clock_dst" => schema_for!(ClockDstParams),
        "domain_name" => schema_for!(DomainNameParams),
        "dns_server" => schema_for!(DnsServerParams),
        "stp_bpdu_protection" => schema_for!(StpBpduProtectionParams),
        "local_user" => schema_for!(LocalUserParams),
        "ssh_user" => schema_for!(SshUserParams),
        "config_line" => schema_for!(ConfigLineParams),
        _ => {
            return Err(ReconcileError::UnsupportedIntent {
                kind: kind.to_string(),
            });
        }
    };
    serde_json::to_value(&schema)
        .map_err(|e| ReconcileError::Serialization(format!("encode schema for {kind}: {e}")))
}

/// Exports the schemas of all built-in kinds as pretty JSON keyed by kind.
pub fn all_kind_schemas_json() -> Result<String, ReconcileError> {
    let mut schemas = std::collections::BTreeMap::new();
    for kind in BUILTIN_KINDS {
        schemas.insert((*kind).to_string(), kind_schema(kind)?);
    }
    serde_json::to_string_pretty(&schemas)
        .map_err(|e| ReconcileError::Serialization(format!("encode schemas json: {e}")))
}

pub(crate) fn builtin_renderers() -> Vec<(&'static str, RenderFn)> {
    vec![
        (VlanParams::KIND, render_vlan as RenderFn),
        (InterfaceDescriptionParams::KIND, render_interface_description as RenderFn),
        (InterfaceAdminParams::KIND, render_interface_admin as RenderFn),
        (InterfaceSpeedParams::KIND, render_interface_speed as RenderFn),
        (InterfaceMtuParams::KIND, render_interface_mtu as RenderFn),
        (PortLinkTypeParams::KIND, render_port_link_type as RenderFn),
        (PortDefaultVlanParams::KIND, render_port_default_vlan as RenderFn),
        (PortTrunkVlansParams::KIND, render_port_trunk_vlans as RenderFn),
        (PortHybridTaggedVlansParams::KIND, render_port_hybrid_tagged_vlans as RenderFn),
        (PortTrunkPvidParams::KIND, render_port_trunk_pvid as RenderFn),
        (StpEdgedPortParams::KIND, render_stp_edged_port as RenderFn),
        (NtpServerParams::KIND, render_ntp_server as RenderFn),
        (NtpSourceInterfaceParams::KIND, render_ntp_source_interface as RenderFn),
        (NtpServiceDisableParams::KIND, render_ntp_service_disable as RenderFn),
        (ClockTimezoneParams::KIND, render_clock_timezone as RenderFn),
        (ClockDstParams::KIND, render_clock_dst as RenderFn),
        (DomainNameParams::KIND, render_domain_name as RenderFn),
        (DnsServerParams::KIND, render_dns_server as RenderFn),
        (StpBpduProtectionParams::KIND, render_stp_bpdu_protection as RenderFn),
        (LocalUserParams::KIND, render_local_user as RenderFn),
        (SshUserParams::KIND, render_ssh_user as RenderFn),
        (ConfigLineParams::KIND, render_config_line as RenderFn),
    ]
}

fn invalid(kind: &str, reason: impl Into<String>) -> ReconcileError {
    ReconcileError::InvalidIntent {
        kind: kind.to_string(),
        reason: reason.into(),
    }
}

fn interface_view(interface: &str) -> Vec<String> {
    vec![format!("interface {}", interface.trim())]
}

fn presence(enabled: bool) -> DesiredState {
    if enabled {
        DesiredState::Present
    } else {
        DesiredState::Absent
    }
}

/// A named present VLAN renders its name inside the VLAN view. A nameless
/// present VLAN owns its view, so a leftover name is undone. Removal is
/// `undo vlan N` from system view.
fn render_vlan(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let p: VlanParams = intent.params()?;
    if !(1..=4094).contains(&p.id) {
        return Err(invalid(&intent.kind, format!("vlan id {} out of range", p.id)));
    }
    let vlan = format!("vlan {}", p.id);
    match (p.state, p.name.as_deref().map(str::trim)) {
        (DesiredState::Present, Some(name)) if !name.is_empty() => {
            Ok(PairDraft::scoped(vec![vlan], format!("name {name}"))
                .keyed("name")
                .order_insensitive())
        }
        (DesiredState::Present, _) => Ok(PairDraft::global(vlan).owns_block()),
        (state, _) => Ok(PairDraft::global(vlan).state(state)),
    }
}

fn render_interface_description(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let p: InterfaceDescriptionParams = intent.params()?;
    let draft = match p.description.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => {
            PairDraft::scoped(interface_view(&p.interface), format!("description {text}"))
        }
        _ => PairDraft::scoped(interface_view(&p.interface), "description")
            .state(DesiredState::Absent),
    };
    Ok(draft.keyed("description").order_insensitive())
}

/// `shutdown` only appears in the running config of a disabled interface, so
/// an enabled interface is the absence of that line.
fn render_interface_admin(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let p: InterfaceAdminParams = intent.params()?;
    let state = presence(p.admin_state == AdminState::Down);
    Ok(PairDraft::scoped(interface_view(&p.interface), "shutdown").state(state))
}

fn render_interface_speed(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let p: InterfaceSpeedParams = intent.params()?;
    Ok(
        PairDraft::scoped(interface_view(&p.interface), format!("speed {}", p.speed))
            .keyed("speed")
            .order_insensitive()
            .state(p.state),
    )
}

fn render_interface_mtu(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let p: InterfaceMtuParams = intent.params()?;
    Ok(
        PairDraft::scoped(interface_view(&p.interface), format!("mtu {}", p.mtu))
            .keyed("mtu")
            .order_insensitive()
            .state(p.state),
    )
}

fn render_port_link_type(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let p: PortLinkTypeParams = intent.params()?;
    Ok(PairDraft::scoped(
        interface_view(&p.interface),
        format!("port link-type {}", p.link_type.as_str()),
    )
    .keyed("port link-type")
    .state(p.state))
}

fn render_port_default_vlan(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let p: PortDefaultVlanParams = intent.params()?;
    Ok(PairDraft::scoped(
        interface_view(&p.interface),
        format!("port default vlan {}", p.vlan),
    )
    .keyed("port default vlan")
    .order_insensitive()
    .state(p.state))
}

/// Allowed-VLAN lists are additive on VRP, so a stale list is withdrawn
/// before the new one is applied.
fn render_port_trunk_vlans(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let PortTrunkVlansParams(p) = intent.params()?;
    if p.vlans.trim().is_empty() {
        return Err(invalid(&intent.kind, "empty vlan list"));
    }
    Ok(PairDraft::scoped(
        interface_view(&p.interface),
        format!("port trunk allow-pass vlan {}", p.vlans),
    )
    .keyed("port trunk allow-pass vlan")
    .state(p.state))
}

fn render_port_hybrid_tagged_vlans(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let PortHybridTaggedVlansParams(p) = intent.params()?;
    if p.vlans.trim().is_empty() {
        return Err(invalid(&intent.kind, "empty vlan list"));
    }
    Ok(PairDraft::scoped(
        interface_view(&p.interface),
        format!("port hybrid tagged vlan {}", p.vlans),
    )
    .keyed("port hybrid tagged vlan")
    .state(p.state))
}

fn render_port_trunk_pvid(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let p: PortTrunkPvidParams = intent.params()?;
    Ok(PairDraft::scoped(
        interface_view(&p.interface),
        format!("port trunk pvid vlan {}", p.vlan),
    )
    .keyed("port trunk pvid vlan")
    .order_insensitive()
    .state(p.state))
}

fn render_stp_edged_port(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let p: StpEdgedPortParams = intent.params()?;
    Ok(
        PairDraft::scoped(interface_view(&p.interface), "stp edged-port enable")
            .state(presence(p.enabled)),
    )
}

fn render_ntp_server(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let p: NtpServerParams = intent.params()?;
    Ok(PairDraft::global(format!("ntp unicast-server {}", p.address)).state(p.state))
}

fn render_ntp_source_interface(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let p: NtpSourceInterfaceParams = intent.params()?;
    Ok(
        PairDraft::global(format!("ntp server source-interface {}", p.interface))
            .keyed("ntp server source-interface")
            .order_insensitive()
            .state(p.state),
    )
}

fn render_ntp_service_disable(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let p: NtpServiceDisableParams = intent.params()?;
    let apply = if p.ipv6 {
        "ntp ipv6 server disable"
    } else {
        "ntp server disable"
    };
    Ok(PairDraft::global(apply).state(presence(p.disabled)))
}

/// Renders the offset the way `display current-configuration` shows it,
/// e.g. `clock timezone CET add 01:00:00`.
fn render_clock_timezone(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let p: ClockTimezoneParams = intent.params()?;
    if p.offset_hours.unsigned_abs() > 14 || p.offset_minutes > 59 {
        return Err(invalid(&intent.kind, "offset out of range"));
    }
    let direction = if p.offset_hours < 0 { "minus" } else { "add" };
    Ok(PairDraft::global(format!(
        "clock timezone {} {} {:02}:{:02}:00",
        p.name,
        direction,
        p.offset_hours.unsigned_abs(),
        p.offset_minutes
    ))
    .keyed("clock timezone")
    .order_insensitive()
    .state(p.state))
}

fn render_clock_dst(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let p: ClockDstParams = intent.params()?;
    Ok(PairDraft::global(format!(
        "clock daylight-saving-time {} one-year {} {} {}",
        p.name, p.start, p.end, p.offset
    ))
    .keyed("clock daylight-saving-time")
    .order_insensitive()
    .state(p.state))
}

fn render_domain_name(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let p: DomainNameParams = intent.params()?;
    Ok(PairDraft::global(format!("ip domain-name {}", p.domain))
        .keyed("ip domain-name")
        .order_insensitive()
        .state(p.state))
}

fn render_dns_server(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let p: DnsServerParams = intent.params()?;
    let family = if p.ipv6 { "dns ipv6 server" } else { "dns server" };
    Ok(PairDraft::global(format!("{family} {}", p.address)).state(p.state))
}

fn render_stp_bpdu_protection(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let p: StpBpduProtectionParams = intent.params()?;
    Ok(PairDraft::global("stp bpdu-protection").state(presence(p.enabled)))
}

fn render_local_user(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let p: LocalUserParams = intent.params()?;
    let user = format!("local-user {}", p.name);
    let aaa = vec![AAA_VIEW.to_string()];
    let draft = match p.attribute {
        None if p.state == DesiredState::Absent => PairDraft::scoped(aaa, user.as_str())
            .keyed(user.as_str())
            .state(DesiredState::Absent),
        None => {
            return Err(invalid(
                &intent.kind,
                "an attribute is required unless the user is removed",
            ));
        }
        Some(UserAttribute::Password(password)) => PairDraft::scoped(
            aaa,
            format!("{user} password irreversible-cipher {password}"),
        )
        .keyed(format!("{user} password"))
        .order_insensitive()
        .state(p.state),
        Some(UserAttribute::PrivilegeLevel(level)) => {
            PairDraft::scoped(aaa, format!("{user} privilege level {level}"))
                .keyed(format!("{user} privilege level"))
                .order_insensitive()
                .state(p.state)
        }
        Some(UserAttribute::ServiceType(service)) => {
            PairDraft::scoped(aaa, format!("{user} service-type {service}"))
                .keyed(format!("{user} service-type"))
                .order_insensitive()
                .state(p.state)
        }
    };
    Ok(draft)
}

fn render_ssh_user(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let p: SshUserParams = intent.params()?;
    let user = format!("ssh user {}", p.name);
    let (apply, key) = match p.setting {
        SshUserSetting::AuthenticationType(kind) => (
            format!("{user} authentication-type {kind}"),
            format!("{user} authentication-type"),
        ),
        SshUserSetting::AssignRsaKey(key) => (
            format!("{user} assign rsa-key {key}"),
            format!("{user} assign rsa-key"),
        ),
        SshUserSetting::ServiceType(service) => (
            format!("{user} service-type {service}"),
            format!("{user} service-type"),
        ),
    };
    Ok(PairDraft::global(apply).keyed(key).state(p.state))
}

fn render_config_line(intent: &Intent) -> Result<PairDraft, ReconcileError> {
    let p: ConfigLineParams = intent.params()?;
    if p.line.trim().is_empty() {
        return Err(invalid(&intent.kind, "empty line"));
    }
    let draft = PairDraft::scoped(p.parents, p.line);
    Ok(match p.state {
        LineState::Present => draft,
        LineState::Absent => draft.state(DesiredState::Absent),
        LineState::Keep => draft.state(DesiredState::Keep),
        LineState::Replace => draft.exclusive(),
    })
}
