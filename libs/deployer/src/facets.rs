use ethers::{abi::Token, types::Address};
use futures::future::try_join_all;
use itertools::Itertools;

use crate::{artifacts::Artifacts, dispatcher::Dispatcher};

/// Facet exposing the upgrade control surface of every module.
pub const ADMIN_FACET: &str = "CommonUpgradeFacet";

/// Ordered list of facet contract names making up one module.
///
/// Invariant: contains [`ADMIN_FACET`] exactly once and no name twice. The
/// administrative facet keeps its position when listed by the caller and is
/// appended last otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacetSet(Vec<String>);

impl FacetSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            names
                .into_iter()
                .map(Into::into)
                .chain(std::iter::once(ADMIN_FACET.to_owned()))
                .unique()
                .collect(),
        )
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Deploy a fresh instance of every facet in `set`.
///
/// Each facet gets the registry address as its only constructor argument.
/// Facets do not depend on each other, so all of them are sent at once. The
/// returned addresses are in the order of `set`.
pub async fn deploy_facets(
    dispatcher: &Dispatcher,
    artifacts: &Artifacts,
    registry: Address,
    set: &FacetSet,
) -> eyre::Result<Vec<Address>> {
    let deployments = set
        .names()
        .iter()
        .map(|name| async move {
            let initcode = artifacts.initcode(name, &[Token::Address(registry)])?;
            dispatcher.deploy(name, initcode).await
        })
        .collect_vec();

    try_join_all(deployments).await
}
