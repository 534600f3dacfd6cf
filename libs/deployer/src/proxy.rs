use std::{fmt, str::FromStr};

use common::log::Logger;
use common_ethers::{
    contracts::{GetDelegateAddressCall, GetDelegateAddressReturn, UpgradeCall},
    read,
};
use ethers::{abi::Token, types::Address};
use eyre::bail;
use itertools::Itertools;

use crate::{
    artifacts::Artifacts,
    dispatcher::{ContractCall, Dispatcher},
    registry::{RegistryClient, SettingKey},
};

/// Upgradeable modules, each one a proxy in front of a facet set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModuleId {
    Market,
    FeeBank,
    EntityImpl,
    PolicyImpl,
}

/// Everything fixed about a module ahead of time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModuleSpec {
    pub id: ModuleId,
    /// Name in the address manifest.
    pub name: &'static str,
    pub proxy_contract: &'static str,
    pub proxy_key: SettingKey,
    pub facets_key: SettingKey,
    pub facets: &'static [&'static str],
}

const MARKET: ModuleSpec = ModuleSpec {
    id: ModuleId::Market,
    name: "Market",
    proxy_contract: "MarketProxy",
    proxy_key: SettingKey::new("MARKET"),
    facets_key: SettingKey::new("MARKET_FACETS"),
    facets: &["MarketCoreFacet", "MarketDataFacet"],
};

const FEE_BANK: ModuleSpec = ModuleSpec {
    id: ModuleId::FeeBank,
    name: "FeeBank",
    proxy_contract: "FeeBankProxy",
    proxy_key: SettingKey::new("FEEBANK"),
    facets_key: SettingKey::new("FEEBANK_FACETS"),
    facets: &["FeeBankCoreFacet"],
};

const ENTITY_IMPL: ModuleSpec = ModuleSpec {
    id: ModuleId::EntityImpl,
    name: "EntityDelegate",
    proxy_contract: "EntityDelegate",
    proxy_key: SettingKey::new("ENTITY_IMPL"),
    facets_key: SettingKey::new("ENTITY_IMPL_FACETS"),
    facets: &[
        "EntityCoreFacet",
        "EntityFundingFacet",
        "EntityTokensFacet",
        "EntityDividendsFacet",
        "EntityTreasuryFacet",
        "EntityTreasuryBridgeFacet",
    ],
};

const POLICY_IMPL: ModuleSpec = ModuleSpec {
    id: ModuleId::PolicyImpl,
    name: "PolicyDelegate",
    proxy_contract: "PolicyDelegate",
    proxy_key: SettingKey::new("POLICY_IMPL"),
    facets_key: SettingKey::new("POLICY_IMPL_FACETS"),
    facets: &[
        "PolicyCoreFacet",
        "PolicyClaimsFacet",
        "PolicyCommissionsFacet",
        "PolicyPremiumsFacet",
        "PolicyTrancheTokensFacet",
        "PolicyApprovalsFacet",
    ],
};

impl ModuleId {
    pub const ALL: [ModuleId; 4] = [
        ModuleId::Market,
        ModuleId::FeeBank,
        ModuleId::EntityImpl,
        ModuleId::PolicyImpl,
    ];

    pub fn spec(self) -> ModuleSpec {
        match self {
            ModuleId::Market => MARKET,
            ModuleId::FeeBank => FEE_BANK,
            ModuleId::EntityImpl => ENTITY_IMPL,
            ModuleId::PolicyImpl => POLICY_IMPL,
        }
    }

    fn cli_name(self) -> &'static str {
        match self {
            ModuleId::Market => "market",
            ModuleId::FeeBank => "fee-bank",
            ModuleId::EntityImpl => "entity-impl",
            ModuleId::PolicyImpl => "policy-impl",
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

impl FromStr for ModuleId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModuleId::ALL
            .into_iter()
            .find(|m| m.cli_name() == s)
            .ok_or_else(|| {
                format!(
                    "unknown module {:?}, expected one of: {}",
                    s,
                    ModuleId::ALL.iter().join(", ")
                )
            })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProxyOutcome {
    /// No proxy was registered, a new one was deployed and registered.
    Deployed,
    /// Existing proxy upgraded in place.
    Upgraded,
    /// Upgrade proposed to the multisig.
    UpgradeQueued,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyRecord {
    pub module: ModuleId,
    pub proxy: Address,
    pub facets: Vec<Address>,
    pub proxy_key: SettingKey,
    pub facets_key: SettingKey,
    pub outcome: ProxyOutcome,
}

/// Make sure `spec`'s proxy exists and delegates to `facets`.
///
/// The registry decides: no proxy registered means deploy one and register
/// it, a registered proxy is upgraded in place. The proxy address of a module
/// never changes once registered.
///
/// A new proxy picks its facets up from the registry's facet list, which the
/// caller must have written before.
pub async fn ensure_proxy(
    registry: &RegistryClient,
    dispatcher: &Dispatcher,
    artifacts: &Artifacts,
    spec: &ModuleSpec,
    facets: Vec<Address>,
    logger: &Logger,
) -> eyre::Result<ProxyRecord> {
    let existing = registry.get_address(spec.proxy_key).await?;

    let (proxy, outcome) = if existing.is_zero() {
        logger.info(spec.name, "No proxy registered, deploying");
        let initcode =
            artifacts.initcode(spec.proxy_contract, &[Token::Address(registry.address())])?;
        let proxy = dispatcher.deploy(spec.proxy_contract, initcode).await?;
        registry
            .set_address(registry.address(), spec.proxy_key, proxy)
            .await?;
        (proxy, ProxyOutcome::Deployed)
    } else {
        logger.info(spec.name, format!("Proxy found at {:?}, upgrading", existing));
        let delegate: GetDelegateAddressReturn =
            read(dispatcher.client(), existing, GetDelegateAddressCall).await?;
        if delegate.0.is_zero() {
            bail!(
                "{} proxy at {:?} has no upgrade delegate",
                spec.name,
                existing
            );
        }
        let dispatched = dispatcher
            .execute(ContractCall::new(
                existing,
                UpgradeCall {
                    facets: facets.clone(),
                },
            ))
            .await?;
        let outcome = if dispatched.is_queued() {
            ProxyOutcome::UpgradeQueued
        } else {
            ProxyOutcome::Upgraded
        };
        (existing, outcome)
    };

    Ok(ProxyRecord {
        module: spec.id,
        proxy,
        facets,
        proxy_key: spec.proxy_key,
        facets_key: spec.facets_key,
        outcome,
    })
}
